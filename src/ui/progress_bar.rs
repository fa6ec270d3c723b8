// Horizontal progress bar, value 0..=100.

use crate::canvas::Canvas;
use crate::color::Color;
use crate::display::DisplayTarget;
use crate::error::Result;

use super::control::{Control, ControlState};
use super::widget::Region;

pub const MAX_VALUE: u8 = 100;

pub struct ProgressBar {
    state: ControlState,
    value: u8,
    fill: Color,
    background: Color,
    border: Option<Color>,
}

impl ProgressBar {
    pub const fn new(bounds: Region) -> Self {
        Self {
            state: ControlState::new(bounds),
            value: 0,
            fill: Color::WHITE,
            background: Color::BLACK,
            border: None,
        }
    }

    pub const fn colors(mut self, fill: Color, background: Color) -> Self {
        self.fill = fill;
        self.background = background;
        self
    }

    pub const fn border(mut self, border: Color) -> Self {
        self.border = Some(border);
        self
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Values above 100 are clamped.
    pub fn set_value(&mut self, value: u8) {
        let value = value.min(MAX_VALUE);
        if self.value != value {
            self.value = value;
            self.state.invalidate();
        }
    }

    // filled width inside the border
    fn fill_width(&self, inner: u32) -> u32 {
        (inner as u64 * self.value as u64 / MAX_VALUE as u64) as u32
    }
}

impl<T: DisplayTarget + 'static> Control<T> for ProgressBar {
    fn state(&self) -> &ControlState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ControlState {
        &mut self.state
    }

    fn render(&self, canvas: &mut Canvas<T>) -> Result<()> {
        let b = self.state.bounds();
        canvas.draw_rectangle(b.x, b.y, b.w, b.h, self.background, true)?;

        let inner = match self.border {
            Some(color) => {
                canvas.draw_rectangle(b.x, b.y, b.w, b.h, color, false)?;
                Region::new(b.x, b.y, b.w.saturating_sub(2), b.h.saturating_sub(2)).offset(1, 1)
            }
            None => b,
        };
        let w = self.fill_width(inner.w);
        if w > 0 {
            canvas.draw_rectangle(inner.x, inner.y, w, inner.h, self.fill, true)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_clamped() {
        let mut bar = ProgressBar::new(Region::new(0, 0, 50, 4));
        bar.set_value(250);
        assert_eq!(bar.value(), 100);
        assert_eq!(bar.fill_width(50), 50);
        bar.set_value(30);
        assert_eq!(bar.fill_width(50), 15);
    }
}
