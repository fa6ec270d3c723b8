// Screen: owns the canvas and the top-level controls.
//
// Mutations mark controls dirty; refresh() repaints the union of all
// damage in one pass and transmits it with a single show_region. Between
// begin_update() and end_update() refreshes triggered by update() are held
// back, so a burst of changes costs one transfer.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;
use core::ops::{Deref, DerefMut};

use log::{info, warn};

use crate::canvas::Canvas;
use crate::color::Color;
use crate::display::DisplayTarget;
use crate::error::GraphicsError;
use crate::notify::{Subscribers, Subscription};

use super::control::{Control, render_tree};
use super::widget::Region;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ControlId(u32);

#[derive(Debug)]
pub enum ScreenError<E> {
    /// A control failed to render.
    Draw(GraphicsError),
    /// The display rejected the transfer.
    Show(E),
}

impl<E: fmt::Debug> fmt::Display for ScreenError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenError::Draw(e) => write!(f, "render failed: {}", e),
            ScreenError::Show(e) => write!(f, "display transfer failed: {:?}", e),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for ScreenError<E> {}

impl<E> From<GraphicsError> for ScreenError<E> {
    fn from(e: GraphicsError) -> Self {
        ScreenError::Draw(e)
    }
}

pub type ScreenResult<T, E> = core::result::Result<T, ScreenError<E>>;

pub struct Screen<T: DisplayTarget + 'static> {
    canvas: Canvas<T>,
    controls: Vec<(ControlId, Box<dyn Control<T>>)>,
    next_id: u32,
    background: Color,
    batch_depth: u32,
    // areas vacated by removed controls
    pending: Option<Region>,
    redraw: Subscribers<Region>,
}

impl<T: DisplayTarget + 'static> Screen<T> {
    pub fn new(canvas: Canvas<T>) -> Self {
        Self {
            canvas,
            controls: Vec::new(),
            next_id: 0,
            background: Color::BLACK,
            batch_depth: 0,
            pending: None,
            redraw: Subscribers::new(),
        }
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
        self.damage(self.full_area());
    }

    pub fn canvas(&self) -> &Canvas<T> {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas<T> {
        &mut self.canvas
    }

    pub fn into_canvas(self) -> Canvas<T> {
        self.canvas
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Add a top-level control above the existing ones. It is painted on
    /// the next refresh.
    pub fn add<C: Control<T>>(&mut self, control: C) -> ControlId {
        let id = ControlId(self.next_id);
        self.next_id += 1;
        let mut control: Box<dyn Control<T>> = Box::new(control);
        control.invalidate();
        self.controls.push((id, control));
        id
    }

    /// Detach a control; the area it covered is repainted on the next refresh.
    pub fn remove(&mut self, id: ControlId) -> Option<Box<dyn Control<T>>> {
        let idx = self.controls.iter().position(|(cid, _)| *cid == id)?;
        let (_, control) = self.controls.remove(idx);
        if control.is_visible() {
            self.damage(control.bounds());
        }
        Some(control)
    }

    pub fn control<C: Control<T>>(&self, id: ControlId) -> Option<&C> {
        let c: &(dyn Control<T> + 'static) = &**self.find(id)?;
        let c: &(dyn Any + 'static) = c;
        c.downcast_ref()
    }

    /// Mutable access without an automatic refresh.
    pub fn control_mut<C: Control<T>>(&mut self, id: ControlId) -> Option<&mut C> {
        let c: &mut (dyn Control<T> + 'static) = &mut **self.find_mut(id)?;
        let c: &mut (dyn Any + 'static) = c;
        c.downcast_mut()
    }

    /// Mutate a control, then refresh unless a batch is open. `None` when
    /// the id is unknown or the control is not a `C`.
    pub fn update<C, R, F>(&mut self, id: ControlId, f: F) -> ScreenResult<Option<R>, T::Error>
    where
        C: Control<T>,
        F: FnOnce(&mut C) -> R,
    {
        let Some(control) = self.control_mut::<C>(id) else {
            return Ok(None);
        };
        let out = f(control);
        if self.batch_depth == 0 {
            self.refresh()?;
        }
        Ok(Some(out))
    }

    pub fn begin_update(&mut self) {
        self.batch_depth += 1;
    }

    /// Close one batch level; the outermost one refreshes.
    pub fn end_update(&mut self) -> ScreenResult<(), T::Error> {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        if self.batch_depth == 0 {
            self.refresh()?;
        }
        Ok(())
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Scoped batch: ends when the guard drops.
    pub fn batch(&mut self) -> Batch<'_, T> {
        self.begin_update();
        Batch {
            screen: self,
            open: true,
        }
    }

    /// Be told about every region a refresh transmits.
    pub fn on_redraw<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&Region) + 'static,
    {
        self.redraw.subscribe(callback)
    }

    /// Union of everything waiting to be repainted, in screen coordinates.
    pub fn damage_region(&self) -> Option<Region> {
        self.controls
            .iter()
            .filter_map(|(_, c)| c.damage())
            .fold(self.pending, |acc, d| Some(acc.map_or(d, |a| a.union(d))))
    }

    /// Repaint and transmit the damaged area. Returns the region sent.
    pub fn refresh(&mut self) -> ScreenResult<Option<Region>, T::Error> {
        let Some(damage) = self.damage_region() else {
            return Ok(None);
        };
        let area = self.full_area();
        let Some(region) = damage.intersection(area) else {
            self.mark_clean();
            return Ok(None);
        };

        let painted = self.paint(region);
        self.canvas.set_clip(None);
        self.canvas.set_origin(0, 0);
        painted?;

        self.canvas.show_region(region).map_err(ScreenError::Show)?;
        self.mark_clean();
        info!(
            "[UI] refresh {}x{}+{}+{}",
            region.w, region.h, region.x, region.y
        );
        self.redraw.publish(&region);
        Ok(Some(region))
    }

    /// Repaint and transmit the whole screen.
    pub fn redraw_all(&mut self) -> ScreenResult<Option<Region>, T::Error> {
        for (_, c) in self.controls.iter_mut() {
            c.invalidate();
        }
        self.damage(self.full_area());
        self.refresh()
    }

    fn paint(&mut self, region: Region) -> Result<(), GraphicsError> {
        self.canvas.set_origin(0, 0);
        self.canvas.set_clip(Some(region));
        self.canvas.draw_rectangle(
            region.x,
            region.y,
            region.w,
            region.h,
            self.background,
            true,
        )?;
        for (_, c) in self.controls.iter() {
            if c.is_visible() && c.bounds().intersects(region) {
                render_tree(&**c, &mut self.canvas, 0, 0)?;
            }
        }
        Ok(())
    }

    fn mark_clean(&mut self) {
        for (_, c) in self.controls.iter_mut() {
            c.mark_clean();
        }
        self.pending = None;
    }

    fn damage(&mut self, r: Region) {
        self.pending = Some(match self.pending {
            Some(p) => p.union(r),
            None => r,
        });
    }

    fn full_area(&self) -> Region {
        Region::new(0, 0, self.canvas.width(), self.canvas.height())
    }

    fn find(&self, id: ControlId) -> Option<&Box<dyn Control<T>>> {
        self.controls
            .iter()
            .find(|(cid, _)| *cid == id)
            .map(|(_, c)| c)
    }

    fn find_mut(&mut self, id: ControlId) -> Option<&mut Box<dyn Control<T>>> {
        self.controls
            .iter_mut()
            .find(|(cid, _)| *cid == id)
            .map(|(_, c)| c)
    }
}

/// Guard returned by `Screen::batch`.
pub struct Batch<'a, T: DisplayTarget + 'static> {
    screen: &'a mut Screen<T>,
    open: bool,
}

impl<T: DisplayTarget + 'static> Batch<'_, T> {
    /// End the batch now and see the refresh result.
    pub fn finish(mut self) -> ScreenResult<(), T::Error> {
        self.open = false;
        self.screen.end_update()
    }
}

impl<T: DisplayTarget + 'static> Deref for Batch<'_, T> {
    type Target = Screen<T>;

    fn deref(&self) -> &Screen<T> {
        self.screen
    }
}

impl<T: DisplayTarget + 'static> DerefMut for Batch<'_, T> {
    fn deref_mut(&mut self) -> &mut Screen<T> {
        self.screen
    }
}

impl<T: DisplayTarget + 'static> Drop for Batch<'_, T> {
    fn drop(&mut self) {
        if self.open && self.screen.end_update().is_err() {
            warn!("[UI] refresh at end of batch failed");
        }
    }
}
