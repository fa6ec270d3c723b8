// Text label: one line of bitmap text placed by Alignment inside its
// bounds, over an optional background fill.

use alloc::string::String;

use crate::canvas::Canvas;
use crate::color::Color;
use crate::display::DisplayTarget;
use crate::error::Result;
use crate::fonts::BitmapFont;

use super::control::{Control, ControlState};
use super::widget::{Alignment, Region};

pub struct Label {
    state: ControlState,
    text: String,
    font: Option<&'static BitmapFont>,
    color: Color,
    background: Option<Color>,
    alignment: Alignment,
    scale: u32,
}

impl Label {
    pub fn new(bounds: Region, text: &str, font: &'static BitmapFont) -> Self {
        Self {
            state: ControlState::new(bounds),
            text: String::from(text),
            font: Some(font),
            color: Color::WHITE,
            background: None,
            alignment: Alignment::CenterLeft,
            scale: 1,
        }
    }

    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn background(mut self, background: Color) -> Self {
        self.background = Some(background);
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = scale.max(1);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        if self.text != text {
            self.text.clear();
            self.text.push_str(text);
            self.state.invalidate();
        }
    }

    pub fn set_color(&mut self, color: Color) {
        if self.color != color {
            self.color = color;
            self.state.invalidate();
        }
    }

    pub fn set_font(&mut self, font: Option<&'static BitmapFont>) {
        self.font = font;
        self.state.invalidate();
    }
}

impl<T: DisplayTarget + 'static> Control<T> for Label {
    fn state(&self) -> &ControlState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ControlState {
        &mut self.state
    }

    fn render(&self, canvas: &mut Canvas<T>) -> Result<()> {
        let b = self.state.bounds();
        if let Some(bg) = self.background {
            canvas.draw_rectangle(b.x, b.y, b.w, b.h, bg, true)?;
        }
        let Some(font) = self.font else {
            return Ok(());
        };
        if self.text.is_empty() {
            return Ok(());
        }
        let size = font.measure(&self.text, self.scale);
        let pos = self.alignment.position(b, size);
        canvas.draw_text_with(font, pos.x, pos.y, &self.text, self.color, self.scale)
    }
}
