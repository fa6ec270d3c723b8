// Append-only text log; once the area is full the oldest line scrolls off
// the top.

use alloc::collections::VecDeque;
use alloc::string::String;

use crate::canvas::Canvas;
use crate::color::Color;
use crate::display::DisplayTarget;
use crate::error::Result;
use crate::fonts::BitmapFont;

use super::control::{Control, ControlState};
use super::widget::Region;

pub struct ScrollingTextArea {
    state: ControlState,
    lines: VecDeque<String>,
    font: Option<&'static BitmapFont>,
    scale: u32,
    color: Color,
    background: Color,
    line_spacing: u32,
}

impl ScrollingTextArea {
    pub fn new(bounds: Region, font: &'static BitmapFont) -> Self {
        Self {
            state: ControlState::new(bounds),
            lines: VecDeque::new(),
            font: Some(font),
            scale: 1,
            color: Color::WHITE,
            background: Color::BLACK,
            line_spacing: 1,
        }
    }

    pub fn colors(mut self, text: Color, background: Color) -> Self {
        self.color = text;
        self.background = background;
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = scale.max(1);
        self
    }

    pub fn line_spacing(mut self, spacing: u32) -> Self {
        self.line_spacing = spacing;
        self
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines that fit in the bounds.
    pub fn capacity(&self) -> usize {
        match self.line_height() {
            0 => 0,
            h => (self.state.bounds().h / h) as usize,
        }
    }

    pub fn append(&mut self, line: &str) {
        self.lines.push_back(String::from(line));
        let cap = self.capacity().max(1);
        while self.lines.len() > cap {
            self.lines.pop_front();
        }
        self.state.invalidate();
    }

    pub fn clear(&mut self) {
        if !self.lines.is_empty() {
            self.lines.clear();
            self.state.invalidate();
        }
    }

    fn line_height(&self) -> u32 {
        self.font
            .map_or(0, |f| f.height as u32 * self.scale + self.line_spacing)
    }
}

impl<T: DisplayTarget + 'static> Control<T> for ScrollingTextArea {
    fn state(&self) -> &ControlState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ControlState {
        &mut self.state
    }

    fn render(&self, canvas: &mut Canvas<T>) -> Result<()> {
        let b = self.state.bounds();
        canvas.draw_rectangle(b.x, b.y, b.w, b.h, self.background, true)?;
        let Some(font) = self.font else {
            return Ok(());
        };
        let lh = self.line_height();
        for (i, line) in self.lines.iter().enumerate() {
            let y = b.y.saturating_add_unsigned((i as u32).saturating_mul(lh));
            canvas.draw_text_with(font, b.x, y, line, self.color, self.scale)?;
        }
        Ok(())
    }
}
