// Control toolkit over a Canvas.
// Region geometry, the Control trait and its shared state, the stock
// controls, and Screen, which batches invalidations into one transfer.

mod color_box;
mod control;
mod label;
mod layout;
mod list_box;
mod progress_bar;
mod screen;
mod text_area;
mod widget;

pub use color_box::ColorBox;
pub use control::{Control, ControlState};
pub use label::Label;
pub use layout::Layout;
pub use list_box::ListBox;
pub use progress_bar::ProgressBar;
pub use screen::{Batch, ControlId, Screen, ScreenError, ScreenResult};
pub use text_area::ScrollingTextArea;
pub use widget::{Alignment, Region, wrap_step};
