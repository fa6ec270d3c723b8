// Container control. Children are positioned relative to the layout's
// top-left corner and drawn after it, in insertion order.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;

use crate::canvas::Canvas;
use crate::color::Color;
use crate::display::DisplayTarget;
use crate::error::Result;

use super::control::{Control, ControlState};
use super::widget::Region;

pub struct Layout<T: DisplayTarget + 'static> {
    state: ControlState,
    background: Option<Color>,
    children: Vec<Box<dyn Control<T>>>,
}

impl<T: DisplayTarget + 'static> Layout<T> {
    pub fn new(bounds: Region) -> Self {
        Self {
            state: ControlState::new(bounds),
            background: None,
            children: Vec::new(),
        }
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Append a child; returns its index.
    pub fn add<C: Control<T>>(&mut self, child: C) -> usize {
        self.children.push(Box::new(child));
        self.state.invalidate();
        self.children.len() - 1
    }

    pub fn with<C: Control<T>>(mut self, child: C) -> Self {
        self.add(child);
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child<C: Control<T>>(&self, index: usize) -> Option<&C> {
        let c: &(dyn Control<T> + 'static) = &**self.children.get(index)?;
        let c: &(dyn Any + 'static) = c;
        c.downcast_ref()
    }

    pub fn child_mut<C: Control<T>>(&mut self, index: usize) -> Option<&mut C> {
        let c: &mut (dyn Control<T> + 'static) = &mut **self.children.get_mut(index)?;
        let c: &mut (dyn Any + 'static) = c;
        c.downcast_mut()
    }
}

impl<T: DisplayTarget + 'static> Control<T> for Layout<T> {
    fn state(&self) -> &ControlState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ControlState {
        &mut self.state
    }

    fn render(&self, canvas: &mut Canvas<T>) -> Result<()> {
        match self.background {
            Some(bg) => {
                let b = self.state.bounds();
                canvas.draw_rectangle(b.x, b.y, b.w, b.h, bg, true)
            }
            None => Ok(()),
        }
    }

    fn children(&self) -> &[Box<dyn Control<T>>] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut [Box<dyn Control<T>>] {
        &mut self.children
    }
}
