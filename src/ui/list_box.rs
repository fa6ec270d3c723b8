// Scrollable list of text rows with one highlighted selection.
// Navigation wraps; the view scrolls just enough to keep the selection
// on screen.

use alloc::string::String;
use alloc::vec::Vec;

use crate::canvas::Canvas;
use crate::color::Color;
use crate::display::DisplayTarget;
use crate::error::Result;
use crate::fonts::BitmapFont;

use super::control::{Control, ControlState};
use super::widget::{Region, wrap_step};

const ROW_PAD: u32 = 2;

pub struct ListBox {
    state: ControlState,
    items: Vec<String>,
    selected: Option<usize>,
    top: usize,
    font: Option<&'static BitmapFont>,
    scale: u32,
    text: Color,
    background: Color,
    highlight_text: Color,
    highlight: Color,
}

impl ListBox {
    pub fn new(bounds: Region, font: &'static BitmapFont) -> Self {
        Self {
            state: ControlState::new(bounds),
            items: Vec::new(),
            selected: None,
            top: 0,
            font: Some(font),
            scale: 1,
            text: Color::WHITE,
            background: Color::BLACK,
            highlight_text: Color::BLACK,
            highlight: Color::WHITE,
        }
    }

    pub fn colors(mut self, text: Color, background: Color) -> Self {
        self.text = text;
        self.background = background;
        self
    }

    pub fn highlight(mut self, text: Color, background: Color) -> Self {
        self.highlight_text = text;
        self.highlight = background;
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = scale.max(1);
        self
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn set_items<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = items.into_iter().map(Into::into).collect();
        self.top = 0;
        self.selected = if self.items.is_empty() { None } else { Some(0) };
        self.state.invalidate();
    }

    pub fn push_item(&mut self, item: &str) {
        self.items.push(String::from(item));
        if self.selected.is_none() {
            self.selected = Some(0);
        }
        self.state.invalidate();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.selected = None;
        self.top = 0;
        self.state.invalidate();
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.items.get(i))
            .map(String::as_str)
    }

    /// Select `index`; out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) {
        if index >= self.items.len() || self.selected == Some(index) {
            return;
        }
        self.selected = Some(index);
        self.scroll_to(index);
        self.state.invalidate();
    }

    pub fn select_next(&mut self) {
        if let Some(i) = self.selected {
            self.select(wrap_step(i, self.items.len(), true));
        }
    }

    pub fn select_prev(&mut self) {
        if let Some(i) = self.selected {
            self.select(wrap_step(i, self.items.len(), false));
        }
    }

    /// Index of the first visible row.
    pub fn top(&self) -> usize {
        self.top
    }

    pub fn row_height(&self) -> u32 {
        self.font
            .map_or(0, |f| f.height as u32 * self.scale + ROW_PAD)
    }

    pub fn visible_rows(&self) -> usize {
        match self.row_height() {
            0 => 0,
            h => (self.state.bounds().h / h) as usize,
        }
    }

    fn scroll_to(&mut self, index: usize) {
        let rows = self.visible_rows().max(1);
        if index < self.top {
            self.top = index;
        } else if index >= self.top + rows {
            self.top = index + 1 - rows;
        }
    }
}

impl<T: DisplayTarget + 'static> Control<T> for ListBox {
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

        let row_h = self.row_height();
        let visible = self.items.iter().enumerate().skip(self.top).take(self.visible_rows());
        for (row, (i, item)) in visible.enumerate() {
            let y = b.y.saturating_add_unsigned((row as u32).saturating_mul(row_h));
            let fg = if self.selected == Some(i) {
                canvas.draw_rectangle(b.x, y, b.w, row_h, self.highlight, true)?;
                self.highlight_text
            } else {
                self.text
            };
            let pad = (ROW_PAD / 2) as i32;
            let (tx, ty) = (b.x.saturating_add(pad), y.saturating_add(pad));
            canvas.draw_text_with(font, tx, ty, item, fg, self.scale)?;
        }
        Ok(())
    }
}
