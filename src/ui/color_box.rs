// Solid or outlined rectangle, optionally with rounded corners.

use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{CornerRadii, PrimitiveStyle, RoundedRectangle},
};

use crate::canvas::Canvas;
use crate::color::Color;
use crate::display::DisplayTarget;
use crate::error::Result;

use super::control::{Control, ControlState};
use super::widget::Region;

pub struct ColorBox {
    state: ControlState,
    color: Color,
    filled: bool,
    radius: u32,
}

impl ColorBox {
    pub const fn new(bounds: Region, color: Color) -> Self {
        Self {
            state: ControlState::new(bounds),
            color,
            filled: true,
            radius: 0,
        }
    }

    /// Corner radius in pixels; 0 draws square corners.
    pub const fn rounded(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    pub const fn filled(mut self, filled: bool) -> Self {
        self.filled = filled;
        self
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        if self.color != color {
            self.color = color;
            self.state.invalidate();
        }
    }

    pub fn set_filled(&mut self, filled: bool) {
        if self.filled != filled {
            self.filled = filled;
            self.state.invalidate();
        }
    }
}

impl<T: DisplayTarget + 'static> Control<T> for ColorBox {
    fn state(&self) -> &ControlState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ControlState {
        &mut self.state
    }

    fn render(&self, canvas: &mut Canvas<T>) -> Result<()> {
        let b = self.state.bounds();
        if self.radius == 0 {
            return canvas.draw_rectangle(b.x, b.y, b.w, b.h, self.color, self.filled);
        }
        let color = Rgb888::from(self.color);
        let style = match self.filled {
            true => PrimitiveStyle::with_fill(color),
            false => PrimitiveStyle::with_stroke(color, 1),
        };
        let corners = CornerRadii::new(Size::new(self.radius, self.radius));
        RoundedRectangle::new(b.to_rect(), corners)
            .into_styled(style)
            .draw(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorMode;
    use crate::display::VirtualDisplay;

    fn render(bx: &ColorBox) -> Canvas<VirtualDisplay> {
        let disp = VirtualDisplay::new(16, 16, ColorMode::Format16bppRgb565).unwrap();
        let mut canvas = Canvas::new(disp);
        Control::<VirtualDisplay>::render(bx, &mut canvas).unwrap();
        canvas
    }

    #[test]
    fn test_square_box_fills_corners() {
        let c = render(&ColorBox::new(Region::new(2, 2, 8, 8), Color::RED));
        assert_eq!(c.get_pixel(2, 2).unwrap(), Color::RED);
        assert_eq!(c.get_pixel(9, 9).unwrap(), Color::RED);
        assert_eq!(c.get_pixel(10, 10).unwrap(), Color::BLACK);
    }

    #[test]
    fn test_rounded_box_skips_corners() {
        let c = render(&ColorBox::new(Region::new(2, 2, 8, 8), Color::RED).rounded(3));
        assert_eq!(c.get_pixel(2, 2).unwrap(), Color::BLACK);
        assert_eq!(c.get_pixel(9, 9).unwrap(), Color::BLACK);
        assert_eq!(c.get_pixel(6, 6).unwrap(), Color::RED);
        assert_eq!(c.get_pixel(2, 6).unwrap(), Color::RED);
    }

    #[test]
    fn test_rounded_outline_leaves_inside_empty() {
        let c = render(
            &ColorBox::new(Region::new(2, 2, 8, 8), Color::RED)
                .rounded(2)
                .filled(false),
        );
        assert_eq!(c.get_pixel(6, 2).unwrap(), Color::RED);
        assert_eq!(c.get_pixel(6, 6).unwrap(), Color::BLACK);
    }
}
