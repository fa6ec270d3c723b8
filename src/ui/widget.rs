// Region geometry and alignment helpers
// Coordinates are logical (rotation aware) unless a caller says otherwise.
// x/y are signed so controls may hang off the screen edge and get clipped.

use embedded_graphics::{prelude::*, primitives::Rectangle};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Region {
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// From edge coordinates; `right` and `bottom` are exclusive.
    pub fn from_corners(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            x: left,
            y: top,
            w: span(left, right),
            h: span(top, bottom),
        }
    }

    pub fn top_left(self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn to_rect(self) -> Rectangle {
        Rectangle::new(self.top_left(), Size::new(self.w, self.h))
    }

    /// Exclusive right edge, saturating at `i32::MAX`.
    pub const fn right(self) -> i32 {
        self.x.saturating_add_unsigned(self.w)
    }

    pub const fn bottom(self) -> i32 {
        self.y.saturating_add_unsigned(self.h)
    }

    pub const fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub const fn area(self) -> u32 {
        self.w.saturating_mul(self.h)
    }

    pub fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.w,
            self.h,
        )
    }

    /// Widen horizontally so both edges fall on multiples of `step`
    /// (8 for whole 1bpp bytes, 2 for 12bpp column pairs).
    pub fn align_columns(self, step: u32) -> Self {
        if step <= 1 {
            return self;
        }
        let step = step as i64;
        let left = (self.x as i64).div_euclid(step) * step;
        let right = (self.right() as i64 + step - 1).div_euclid(step) * step;
        Self {
            x: left.max(i32::MIN as i64) as i32,
            y: self.y,
            w: (right - left).clamp(0, u32::MAX as i64) as u32,
            h: self.h,
        }
    }

    pub fn union(self, other: Region) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = self.right().max(other.right());
        let y2 = self.bottom().max(other.bottom());
        Self::from_corners(x1, y1, x2, y2)
    }

    pub fn intersection(self, other: Region) -> Option<Self> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        (x1 < x2 && y1 < y2).then(|| Self::from_corners(x1, y1, x2, y2))
    }

    pub fn intersects(self, other: Region) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Clip to `0..width` x `0..height`; `None` when nothing is left.
    pub fn clamp_to(self, width: u32, height: u32) -> Option<Self> {
        self.intersection(Region::new(0, 0, width, height))
    }
}

// distance from `a` to `b`, zero when `b` is not past `a`
fn span(a: i32, b: i32) -> u32 {
    (b as i64 - a as i64).clamp(0, u32::MAX as i64) as u32
}

impl From<Rectangle> for Region {
    fn from(r: Rectangle) -> Self {
        Region::new(r.top_left.x, r.top_left.y, r.size.width, r.size.height)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Alignment {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

// placement along one axis
#[derive(Clone, Copy)]
enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    // offset of `content` inside `extent`; negative slack hangs over both edges
    fn place(self, origin: i32, extent: u32, content: u32) -> i32 {
        let slack = extent as i64 - content as i64;
        let off = match self {
            Anchor::Start => 0,
            Anchor::Middle => slack / 2,
            Anchor::End => slack,
        };
        (origin as i64 + off).clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }
}

impl Alignment {
    const fn anchors(self) -> (Anchor, Anchor) {
        use Anchor::{End, Middle, Start};
        match self {
            Alignment::TopLeft => (Start, Start),
            Alignment::TopCenter => (Middle, Start),
            Alignment::TopRight => (End, Start),
            Alignment::CenterLeft => (Start, Middle),
            Alignment::Center => (Middle, Middle),
            Alignment::CenterRight => (End, Middle),
            Alignment::BottomLeft => (Start, End),
            Alignment::BottomCenter => (Middle, End),
            Alignment::BottomRight => (End, End),
        }
    }

    /// Top-left corner that puts `content` at this anchor of `region`.
    pub fn position(self, region: Region, content: Size) -> Point {
        let (h, v) = self.anchors();
        Point::new(
            h.place(region.x, region.w, content.width),
            v.place(region.y, region.h, content.height),
        )
    }
}

/// Step `current` one place through `0..count`, wrapping at both ends.
pub fn wrap_step(current: usize, count: usize, forward: bool) -> usize {
    if count == 0 {
        return 0;
    }
    let current = current % count;
    match forward {
        true => (current + 1) % count,
        false => (current + count - 1) % count,
    }
}
