// Display targets: anything that owns a PixelBuffer and can push it out.
//
// The canvas draws straight into `buffer_mut()`; `show`/`show_region`
// transmit. Regions handed to a target are physical (unrotated) and
// already clipped to the buffer.

mod spi;
mod virtual_display;

pub use spi::{DisplayError, SpiDisplay};
pub use virtual_display::{TransferStats, VirtualDisplay};

use crate::buffer::PixelBuffer;
use crate::color::ColorMode;
use crate::ui::Region;

pub trait DisplayTarget {
    /// Transport failure raised by `show`; the core never retries.
    type Error;

    fn buffer(&self) -> &PixelBuffer;

    fn buffer_mut(&mut self) -> &mut PixelBuffer;

    /// Transmit the whole buffer.
    fn show(&mut self) -> Result<(), Self::Error>;

    /// Transmit only `region` (physical coordinates).
    fn show_region(&mut self, region: Region) -> Result<(), Self::Error>;

    fn width(&self) -> u32 {
        self.buffer().width()
    }

    fn height(&self) -> u32 {
        self.buffer().height()
    }

    fn color_mode(&self) -> ColorMode {
        self.buffer().mode()
    }
}
