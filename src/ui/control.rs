// Control tree: shared per-control state plus the Control trait.
//
// Bounds are relative to the parent (a Layout) or to the screen for
// top-level controls. Damage is what must be repainted: the current bounds
// when the control is dirty and visible, plus anywhere it used to be.

use alloc::boxed::Box;
use core::any::Any;

use crate::canvas::Canvas;
use crate::display::DisplayTarget;
use crate::error::Result;

use super::widget::Region;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlState {
    bounds: Region,
    visible: bool,
    dirty: bool,
    /// Previously painted area that must be cleared.
    stale: Option<Region>,
}

impl ControlState {
    pub const fn new(bounds: Region) -> Self {
        Self {
            bounds,
            visible: true,
            dirty: true,
            stale: None,
        }
    }

    pub fn bounds(&self) -> Region {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Region) {
        if self.bounds != bounds {
            self.forget(self.bounds);
            self.bounds = bounds;
            self.dirty = true;
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            if !visible {
                self.forget(self.bounds);
            }
            self.visible = visible;
            self.dirty = true;
        }
    }

    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
        self.stale = None;
    }

    pub fn damage(&self) -> Option<Region> {
        let own = (self.dirty && self.visible).then_some(self.bounds);
        match (own, self.stale) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        }
    }

    fn forget(&mut self, painted: Region) {
        self.stale = Some(match self.stale {
            Some(s) => s.union(painted),
            None => painted,
        });
    }
}

/// A rectangular element that paints itself into a canvas.
///
/// `render` draws at `bounds()` with the canvas origin already set to the
/// parent's top-left corner. Children are rendered after their parent.
pub trait Control<T: DisplayTarget + 'static>: Any {
    fn state(&self) -> &ControlState;

    fn state_mut(&mut self) -> &mut ControlState;

    fn render(&self, canvas: &mut Canvas<T>) -> Result<()>;

    fn children(&self) -> &[Box<dyn Control<T>>] {
        &[]
    }

    fn children_mut(&mut self) -> &mut [Box<dyn Control<T>>] {
        &mut []
    }

    fn bounds(&self) -> Region {
        self.state().bounds()
    }

    fn set_bounds(&mut self, bounds: Region) {
        self.state_mut().set_bounds(bounds);
    }

    fn is_visible(&self) -> bool {
        self.state().visible()
    }

    fn set_visible(&mut self, visible: bool) {
        self.state_mut().set_visible(visible);
    }

    fn invalidate(&mut self) {
        self.state_mut().invalidate();
    }

    fn is_dirty(&self) -> bool {
        self.state().is_dirty() || self.children().iter().any(|c| c.is_dirty())
    }

    fn mark_clean(&mut self) {
        self.state_mut().mark_clean();
        for child in self.children_mut() {
            child.mark_clean();
        }
    }

    /// Area needing repaint, in the parent's coordinates.
    fn damage(&self) -> Option<Region> {
        let origin = self.bounds();
        let mut damage = self.state().damage();
        if self.is_visible() {
            for child in self.children() {
                if let Some(d) = child.damage() {
                    let d = d.offset(origin.x, origin.y);
                    damage = Some(damage.map_or(d, |acc| acc.union(d)));
                }
            }
        }
        damage
    }
}

/// Paint `control` and then its children; `x`/`y` is the parent's
/// absolute top-left corner. Drawing is clipped to the control's bounds
/// (and so to every ancestor's), so nothing lands outside its damage.
pub(crate) fn render_tree<T: DisplayTarget + 'static>(
    control: &dyn Control<T>,
    canvas: &mut Canvas<T>,
    x: i32,
    y: i32,
) -> Result<()> {
    if !control.is_visible() {
        return Ok(());
    }
    let b = control.bounds();
    let outer = canvas.clip();
    let own = b.offset(x, y);
    let Some(clip) = outer.map_or(Some(own), |c| c.intersection(own)) else {
        return Ok(());
    };
    canvas.set_clip(Some(clip));
    let painted = paint_clipped(control, canvas, x, y);
    canvas.set_clip(outer);
    painted
}

fn paint_clipped<T: DisplayTarget + 'static>(
    control: &dyn Control<T>,
    canvas: &mut Canvas<T>,
    x: i32,
    y: i32,
) -> Result<()> {
    canvas.set_origin(x, y);
    control.render(canvas)?;
    let b = control.bounds();
    for child in control.children() {
        render_tree(&**child, canvas, x.saturating_add(b.x), y.saturating_add(b.y))?;
    }
    Ok(())
}
