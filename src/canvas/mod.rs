// Drawing surface over a DisplayTarget's buffer.
// Primitives take logical (rotation-aware) coordinates relative to the
// current origin. Every pixel goes through one funnel that applies origin,
// clip, bounds policy and rotation, and widens the dirty rectangle.
// Spans and filled areas go to the buffer's rectangle fill instead.

mod rotation;

pub use rotation::Rotation;

use alloc::vec;

use embedded_graphics_core::{
    Pixel,
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    pixelcolor::Rgb888,
    primitives::Rectangle,
};
use log::debug;

use crate::buffer::PixelBuffer;
use crate::color::{Color, ColorMode};
use crate::display::DisplayTarget;
use crate::error::{GraphicsError, Result};
use crate::fonts::BitmapFont;
use crate::image::Image;
use crate::ui::Region;

// encoded colour for one primitive plus the first pixel it failed to place
struct Pen {
    raw: u32,
    err: Option<GraphicsError>,
}

impl Pen {
    fn new(raw: u32) -> Self {
        Self { raw, err: None }
    }

    fn finish(self) -> Result<()> {
        match self.err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

pub struct Canvas<T: DisplayTarget> {
    target: T,
    rotation: Rotation,
    font: Option<&'static BitmapFont>,
    ignore_out_of_bounds: bool,
    origin: Point,
    clip: Option<Region>,
    /// Physical rectangle touched since the last show.
    dirty: Option<Region>,
}

impl<T: DisplayTarget> Canvas<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            rotation: Rotation::Deg0,
            font: None,
            ignore_out_of_bounds: true,
            origin: Point::zero(),
            clip: None,
            dirty: None,
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_font(mut self, font: &'static BitmapFont) -> Self {
        self.font = Some(font);
        self
    }

    pub fn with_ignore_out_of_bounds(mut self, ignore: bool) -> Self {
        self.ignore_out_of_bounds = ignore;
        self
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }

    pub fn buffer(&self) -> &PixelBuffer {
        self.target.buffer()
    }

    pub fn color_mode(&self) -> ColorMode {
        self.target.buffer().mode()
    }

    /// Logical width; swaps with height at 90/270.
    pub fn width(&self) -> u32 {
        self.logical_size().0
    }

    pub fn height(&self) -> u32 {
        self.logical_size().1
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    pub fn font(&self) -> Option<&'static BitmapFont> {
        self.font
    }

    pub fn set_font(&mut self, font: Option<&'static BitmapFont>) {
        self.font = font;
    }

    pub fn ignore_out_of_bounds(&self) -> bool {
        self.ignore_out_of_bounds
    }

    pub fn set_ignore_out_of_bounds(&mut self, ignore: bool) {
        self.ignore_out_of_bounds = ignore;
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Translation added to every coordinate passed to a primitive.
    pub fn set_origin(&mut self, x: i32, y: i32) {
        self.origin = Point::new(x, y);
    }

    pub fn clip(&self) -> Option<Region> {
        self.clip
    }

    /// Restrict drawing to `clip` (logical, absolute). Always silent.
    pub fn set_clip(&mut self, clip: Option<Region>) {
        self.clip = clip;
    }

    /// Physical rectangle changed since the last show, if any.
    pub fn dirty_region(&self) -> Option<Region> {
        self.dirty
    }

    pub fn clear(&mut self, color: Color) {
        let buf = self.target.buffer_mut();
        buf.fill(color);
        let full = buf.bounds();
        self.mark_dirty(full);
    }

    pub fn clear_default(&mut self) {
        self.clear(Color::BLACK);
    }

    /// Read back through the rotation and origin.
    /// Outside the surface this is `Color::BLACK`, or an error when
    /// out-of-bounds access is not ignored.
    pub fn get_pixel(&self, x: i32, y: i32) -> Result<Color> {
        let (ax, ay) = (
            x.saturating_add(self.origin.x),
            y.saturating_add(self.origin.y),
        );
        if !self.in_logical_bounds(ax, ay) {
            return match self.ignore_out_of_bounds {
                true => Ok(Color::BLACK),
                false => Err(GraphicsError::OutOfBounds { x: ax, y: ay }),
            };
        }
        let (px, py) = self.to_physical(ax, ay);
        self.target.buffer().get_pixel(px, py)
    }

    pub fn draw_pixel(&mut self, x: i32, y: i32, color: Color) -> Result<()> {
        let mut pen = self.pen(color);
        self.plot(x, y, &mut pen);
        pen.finish()
    }

    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) -> Result<()> {
        let mut pen = self.pen(color);
        self.line(x0, y0, x1, y1, &mut pen);
        pen.finish()
    }

    pub fn draw_horizontal_line(&mut self, x: i32, y: i32, length: u32, color: Color) -> Result<()> {
        let mut pen = self.pen(color);
        self.fill_region(Region::new(x, y, length, 1), &mut pen);
        pen.finish()
    }

    pub fn draw_vertical_line(&mut self, x: i32, y: i32, length: u32, color: Color) -> Result<()> {
        let mut pen = self.pen(color);
        self.fill_region(Region::new(x, y, 1, length), &mut pen);
        pen.finish()
    }

    pub fn draw_rectangle(
        &mut self,
        x: i32,
        y: i32,
        w: u32,
        h: u32,
        color: Color,
        filled: bool,
    ) -> Result<()> {
        let mut pen = self.pen(color);
        if filled {
            self.fill_region(Region::new(x, y, w, h), &mut pen);
            return pen.finish();
        }
        if w == 0 || h == 0 {
            return Ok(());
        }
        let right = x.saturating_add_unsigned(w - 1);
        let bottom = y.saturating_add_unsigned(h - 1);
        self.fill_region(Region::new(x, y, w, 1), &mut pen);
        if h > 1 {
            self.fill_region(Region::new(x, bottom, w, 1), &mut pen);
        }
        if h > 2 {
            self.fill_region(Region::new(x, y.saturating_add(1), 1, h - 2), &mut pen);
            if w > 1 {
                self.fill_region(Region::new(right, y.saturating_add(1), 1, h - 2), &mut pen);
            }
        }
        pen.finish()
    }

    /// Midpoint circle; the filled form paints one span per scanline.
    pub fn draw_circle(
        &mut self,
        cx: i32,
        cy: i32,
        radius: u32,
        color: Color,
        filled: bool,
    ) -> Result<()> {
        let mut pen = self.pen(color);
        let r = radius.min(i32::MAX as u32) as i32;
        if r == 0 {
            self.plot(cx, cy, &mut pen);
            return pen.finish();
        }

        if filled {
            let half = circle_half_widths(r);
            for (dy, &hw) in half.iter().enumerate() {
                let dy = dy as i32;
                let (left, w) = (cx.saturating_sub(hw), hw as u32 * 2 + 1);
                self.fill_region(Region::new(left, cy.saturating_add(dy), w, 1), &mut pen);
                if dy != 0 {
                    self.fill_region(Region::new(left, cy.saturating_sub(dy), w, 1), &mut pen);
                }
            }
            return pen.finish();
        }

        let (mut x, mut y, mut d) = (r, 0i32, 1 - r as i64);
        while x >= y {
            for (px, py) in [
                (cx.saturating_add(x), cy.saturating_add(y)),
                (cx.saturating_add(y), cy.saturating_add(x)),
                (cx.saturating_sub(y), cy.saturating_add(x)),
                (cx.saturating_sub(x), cy.saturating_add(y)),
                (cx.saturating_sub(x), cy.saturating_sub(y)),
                (cx.saturating_sub(y), cy.saturating_sub(x)),
                (cx.saturating_add(y), cy.saturating_sub(x)),
                (cx.saturating_add(x), cy.saturating_sub(y)),
            ] {
                self.plot(px, py, &mut pen);
            }
            y += 1;
            if d < 0 {
                d += 2 * y as i64 + 1;
            } else {
                x -= 1;
                d += 2 * (y as i64 - x as i64) + 1;
            }
        }
        pen.finish()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_triangle(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: Color,
        filled: bool,
    ) -> Result<()> {
        let mut pen = self.pen(color);
        if filled {
            let mut v = [(x0, y0), (x1, y1), (x2, y2)];
            v.sort_by_key(|p| p.1);
            let (top, bottom) = (v[0].1, v[2].1);
            // rows that can reach the surface, plus the first off-surface
            // row when errors are reported
            let (_, lh) = self.logical_size();
            let first = top.max(self.origin.y.saturating_neg());
            let last = bottom.min(
                (lh.min(i32::MAX as u32) as i32)
                    .saturating_sub(1)
                    .saturating_sub(self.origin.y),
            );
            let report = !self.ignore_out_of_bounds;
            if report && (top < first || top > last) {
                self.triangle_row(v, top, &mut pen);
            }
            if first <= last {
                for y in first..=last {
                    self.triangle_row(v, y, &mut pen);
                }
                if report && pen.err.is_none() && last < bottom {
                    self.triangle_row(v, last + 1, &mut pen);
                }
            }
        }
        self.line(x0, y0, x1, y1, &mut pen);
        self.line(x1, y1, x2, y2, &mut pen);
        self.line(x2, y2, x0, y0, &mut pen);
        pen.finish()
    }

    /// Text in the current font; nothing happens without one.
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, color: Color, scale: u32) -> Result<()> {
        match self.font {
            Some(font) => self.draw_text_with(font, x, y, text, color, scale),
            None => Ok(()),
        }
    }

    pub fn draw_text_with(
        &mut self,
        font: &BitmapFont,
        x: i32,
        y: i32,
        text: &str,
        color: Color,
        scale: u32,
    ) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let scale = scale.max(1);
        let advance = (font.width as u32).saturating_mul(scale);
        let mut pen = self.pen(color);
        let mut cx = x;
        for ch in text.chars() {
            for (gx, gy) in font.pixels(ch) {
                let px = cx.saturating_add_unsigned(gx.saturating_mul(scale));
                let py = y.saturating_add_unsigned(gy.saturating_mul(scale));
                if scale == 1 {
                    self.plot(px, py, &mut pen);
                } else {
                    self.fill_region(Region::new(px, py, scale, scale), &mut pen);
                }
            }
            cx = cx.saturating_add_unsigned(advance);
        }
        pen.finish()
    }

    pub fn measure_text(&self, text: &str, font: &BitmapFont, scale: u32) -> Size {
        font.measure(text, scale)
    }

    /// Blit another buffer; raw copy when unrotated and unclipped.
    pub fn draw_buffer(&mut self, x: i32, y: i32, src: &PixelBuffer) -> Result<()> {
        let dst = Region::new(x, y, src.width(), src.height()).offset(self.origin.x, self.origin.y);
        let (lw, lh) = self.logical_size();
        let fits = dst.clamp_to(lw, lh) == Some(dst);
        if self.rotation == Rotation::Deg0 && self.clip.is_none() && (fits || self.ignore_out_of_bounds) {
            self.target.buffer_mut().write_buffer(dst.x, dst.y, src);
            if let Some(d) = dst.clamp_to(lw, lh) {
                self.mark_dirty(d);
            }
            return Ok(());
        }

        let mut pen = Pen::new(0);
        for sy in 0..src.height() as i32 {
            for sx in 0..src.width() as i32 {
                let Some(raw) = src.get_raw(sx, sy) else {
                    continue;
                };
                pen.raw = self.target.buffer().encode(src.decode(raw));
                self.plot(x.saturating_add(sx), y.saturating_add(sy), &mut pen);
            }
        }
        pen.finish()
    }

    /// Draw an image; RGBA sources are alpha-blended over the canvas.
    pub fn draw_image(&mut self, x: i32, y: i32, image: &Image) -> Result<()> {
        let src = image.buffer();
        if src.mode() != ColorMode::Format32bppRgba8888 {
            return self.draw_buffer(x, y, src);
        }

        let mut pen = Pen::new(0);
        for sy in 0..src.height() as i32 {
            for sx in 0..src.width() as i32 {
                let Some(raw) = src.get_raw(sx, sy) else {
                    continue;
                };
                let c = src.decode(raw);
                let (dx, dy) = (x.saturating_add(sx), y.saturating_add(sy));
                let out = match c.a {
                    0 => continue,
                    255 => c,
                    a => {
                        let under = self.get_pixel(dx, dy).unwrap_or(Color::BLACK);
                        let mut mixed = under.blend(c, a);
                        mixed.a = 255;
                        mixed
                    }
                };
                pen.raw = self.target.buffer().encode(out);
                self.plot(dx, dy, &mut pen);
            }
        }
        pen.finish()
    }

    pub fn invert_rectangle(&mut self, x: i32, y: i32, w: u32, h: u32) {
        if let Some(phys) = self.physical_region(Region::new(x, y, w, h)) {
            self.target
                .buffer_mut()
                .invert_rect(phys.x, phys.y, phys.w, phys.h);
            self.mark_dirty(phys);
        }
    }

    pub fn show(&mut self) -> core::result::Result<(), T::Error> {
        self.target.show()?;
        self.dirty = None;
        Ok(())
    }

    /// Transmit a logical rectangle only.
    pub fn show_region(&mut self, region: Region) -> core::result::Result<(), T::Error> {
        let (lw, lh) = self.logical_size();
        let Some(r) = region.clamp_to(lw, lh) else {
            return Ok(());
        };
        let phys = self.rotation.transform_region(r, self.target.width(), self.target.height());
        self.target.show_region(phys)?;
        if let Some(d) = self.dirty {
            if d.intersection(phys) == Some(d) {
                self.dirty = None;
            }
        }
        Ok(())
    }

    /// `show_region` from edges; `right`/`bottom` exclusive.
    pub fn show_rect(
        &mut self,
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
    ) -> core::result::Result<(), T::Error> {
        self.show_region(Region::from_corners(left, top, right, bottom))
    }

    /// Transmit what changed since the last show. Returns false if nothing did.
    pub fn show_dirty(&mut self) -> core::result::Result<bool, T::Error> {
        let Some(d) = self.dirty.take() else {
            return Ok(false);
        };
        debug!("[GFX] dirty flush {}x{}+{}+{}", d.w, d.h, d.x, d.y);
        if let Err(e) = self.target.show_region(d) {
            self.dirty = Some(d);
            return Err(e);
        }
        Ok(true)
    }

    fn logical_size(&self) -> (u32, u32) {
        self.rotation
            .logical_size(self.target.width(), self.target.height())
    }

    #[inline]
    fn to_physical(&self, x: i32, y: i32) -> (i32, i32) {
        self.rotation
            .to_physical(x, y, self.target.width(), self.target.height())
    }

    fn pen(&self, color: Color) -> Pen {
        Pen::new(self.target.buffer().encode(color))
    }

    fn mark_dirty(&mut self, phys: Region) {
        self.dirty = Some(match self.dirty {
            Some(d) => d.union(phys),
            None => phys,
        });
    }

    #[inline]
    fn plot(&mut self, x: i32, y: i32, pen: &mut Pen) {
        self.plot_abs(
            x.saturating_add(self.origin.x),
            y.saturating_add(self.origin.y),
            pen,
        );
    }

    fn plot_abs(&mut self, x: i32, y: i32, pen: &mut Pen) {
        if let Some(clip) = self.clip {
            if !clip.contains(x, y) {
                return;
            }
        }
        if !self.in_logical_bounds(x, y) {
            if !self.ignore_out_of_bounds {
                pen.err.get_or_insert(GraphicsError::OutOfBounds { x, y });
            }
            return;
        }
        let (px, py) = self.to_physical(x, y);
        if self.target.buffer_mut().set_raw(px, py, pen.raw).is_ok() {
            self.mark_dirty(Region::new(px, py, 1, 1));
        }
    }

    #[inline]
    fn in_logical_bounds(&self, x: i32, y: i32) -> bool {
        let (lw, lh) = self.logical_size();
        x >= 0 && y >= 0 && (x as u32) < lw && (y as u32) < lh
    }

    // logical (origin-relative) rect -> clipped physical rect
    fn physical_region(&self, r: Region) -> Option<Region> {
        let mut r = r.offset(self.origin.x, self.origin.y);
        if let Some(clip) = self.clip {
            r = r.intersection(clip)?;
        }
        let (lw, lh) = self.logical_size();
        let r = r.clamp_to(lw, lh)?;
        Some(
            self.rotation
                .transform_region(r, self.target.width(), self.target.height()),
        )
    }

    fn fill_region(&mut self, r: Region, pen: &mut Pen) {
        if r.is_empty() {
            return;
        }
        if !self.ignore_out_of_bounds && pen.err.is_none() {
            if let Some((x, y)) = self.first_off_surface(r) {
                pen.err = Some(GraphicsError::OutOfBounds { x, y });
            }
        }
        if let Some(phys) = self.physical_region(r) {
            self.target.buffer_mut().fill_region_raw(phys, pen.raw);
            self.mark_dirty(phys);
        }
    }

    // first pixel of `r`, row-major after origin and clip, that misses the surface
    fn first_off_surface(&self, r: Region) -> Option<(i32, i32)> {
        let mut r = r.offset(self.origin.x, self.origin.y);
        if let Some(clip) = self.clip {
            r = r.intersection(clip)?;
        }
        let (lw, lh) = self.logical_size();
        let (lw, lh) = (lw.min(i32::MAX as u32) as i32, lh.min(i32::MAX as u32) as i32);
        if r.x < 0 || r.x >= lw || r.y < 0 || r.y >= lh {
            Some((r.x, r.y))
        } else if r.right() > lw {
            Some((lw, r.y))
        } else if r.bottom() > lh {
            Some((r.x, lh))
        } else {
            None
        }
    }

    // one scanline of a filled triangle whose vertices are sorted by y
    fn triangle_row(&mut self, v: [(i32, i32); 3], y: i32, pen: &mut Pen) {
        let [(ax, ay), (bx, by), (cx, cy)] = v;
        let long = interpolate(ax, ay, cx, cy, y);
        let short = if y < by {
            interpolate(ax, ay, bx, by, y)
        } else {
            interpolate(bx, by, cx, cy, y)
        };
        let (l, r) = (long.min(short), long.max(short));
        let row = Region::from_corners(l, y, r.saturating_add(1), y.saturating_add(1));
        if row.is_empty() {
            self.plot(l, y, pen);
        } else {
            self.fill_region(row, pen);
        }
    }

    // Bresenham; endpoints ordered first so (a, b) and (b, a) light the same pixels
    fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, pen: &mut Pen) {
        let ((x0, y0), (x1, y1)) = if (x1, y1) < (x0, y0) {
            ((x1, y1), (x0, y0))
        } else {
            ((x0, y0), (x1, y1))
        };

        if (x0, y0) == (x1, y1) {
            self.plot(x0, y0, pen);
            return;
        }
        if y0 == y1 {
            let span = Region::from_corners(x0, y0, x1.saturating_add(1), y0.saturating_add(1));
            self.fill_region(span, pen);
            return;
        }
        if x0 == x1 {
            let span = Region::from_corners(x0, y0, x0.saturating_add(1), y1.saturating_add(1));
            self.fill_region(span, pen);
            return;
        }

        // x only ever steps right after the ordering above
        let (mut x, mut y) = (x0 as i64, y0 as i64);
        let (x1, y1) = (x1 as i64, y1 as i64);
        let dx = x1 - x;
        let dy = -(y1 - y).abs();
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (lw, lh) = self.logical_size();
        let (lw, lh) = (lw as i64, lh as i64);
        let (ox, oy) = (self.origin.x as i64, self.origin.y as i64);

        if !self.ignore_out_of_bounds && pen.err.is_none() {
            // an off-surface start pixel names the error
            self.plot(x as i32, y as i32, pen);
        }
        if self.ignore_out_of_bounds || pen.err.is_some() {
            let x_major = dx > -dy;
            let (major, minor) = if x_major { (dx, -dy) } else { (-dy, dx) };
            let y_need = if sy > 0 { -(y + oy) } else { y + oy - lh + 1 };
            let x_need = -(x + ox);
            let (major_need, minor_need) = match x_major {
                true => (x_need, y_need),
                false => (y_need, x_need),
            };
            let Some(k) = first_visible_step(major, minor, major_need, minor_need) else {
                return;
            };
            // minor-axis steps taken during the first k major steps
            let m = ((k as i128 * minor as i128 + (major / 2) as i128) / major as i128) as i64;
            let (xs, ys) = if x_major { (k, m) } else { (m, k) };
            x += xs;
            y += sy * ys;
            err = (err as i128 + xs as i128 * dy as i128 + ys as i128 * dx as i128) as i64;
        }

        loop {
            self.plot(x as i32, y as i32, pen);
            if x == x1 && y == y1 {
                break;
            }
            if self.ignore_out_of_bounds || pen.err.is_some() {
                // walked off the right edge, or past the edge it is heading for
                let (ax, ay) = (x + ox, y + oy);
                if ax >= lw || (sy > 0 && ay >= lh) || (sy < 0 && ay < 0) {
                    break;
                }
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += 1;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

// First Bresenham step (along the major axis) that can land on the surface,
// given how many major and minor steps are needed to reach it. The minor
// axis advances floor((k * minor + major / 2) / major) times in k steps.
fn first_visible_step(major: i64, minor: i64, major_need: i64, minor_need: i64) -> Option<i64> {
    let mut k = major_need.max(0);
    if minor_need > 0 && minor > 0 {
        let num = minor_need as i128 * major as i128 - (major / 2) as i128;
        let from_minor = (num + minor as i128 - 1) / minor as i128;
        k = k.max(from_minor.min(i64::MAX as i128) as i64);
    }
    (k <= major).then_some(k)
}

// widest x offset per row of a midpoint circle, rows 0..=r
fn circle_half_widths(r: i32) -> alloc::vec::Vec<i32> {
    let mut half = vec![0i32; r as usize + 1];
    let (mut x, mut y, mut d) = (r, 0i32, 1 - r as i64);
    while x >= y {
        half[y as usize] = half[y as usize].max(x);
        half[x as usize] = half[x as usize].max(y);
        y += 1;
        if d < 0 {
            d += 2 * y as i64 + 1;
        } else {
            x -= 1;
            d += 2 * (y as i64 - x as i64) + 1;
        }
    }
    half
}

fn interpolate(x0: i32, y0: i32, x1: i32, y1: i32, y: i32) -> i32 {
    if y1 == y0 {
        return x0;
    }
    let (x0, y0, x1, y1, y) = (x0 as i128, y0 as i128, x1 as i128, y1 as i128, y as i128);
    let x = x0 + (x1 - x0) * (y - y0) / (y1 - y0);
    x.clamp(i32::MIN as i128, i32::MAX as i128) as i32
}

impl<T: DisplayTarget> OriginDimensions for Canvas<T> {
    fn size(&self) -> Size {
        let (w, h) = self.logical_size();
        Size::new(w, h)
    }
}

impl<T: DisplayTarget> DrawTarget for Canvas<T> {
    type Color = Rgb888;
    type Error = GraphicsError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<()>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let mut pen = Pen::new(0);
        for Pixel(p, color) in pixels {
            pen.raw = self.target.buffer().encode(color.into());
            self.plot(p.x, p.y, &mut pen);
        }
        pen.finish()
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<()> {
        let mut pen = self.pen(color.into());
        self.fill_region((*area).into(), &mut pen);
        pen.finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::VirtualDisplay;
    use crate::fonts::FONT_6X8;

    fn canvas(w: u32, h: u32, mode: ColorMode) -> Canvas<VirtualDisplay> {
        Canvas::new(VirtualDisplay::new(w, h, mode).unwrap())
    }

    fn lit(c: &Canvas<VirtualDisplay>) -> usize {
        let mut n = 0;
        for y in 0..c.height() as i32 {
            for x in 0..c.width() as i32 {
                if c.get_pixel(x, y).unwrap() != Color::BLACK {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn test_clear_every_mode() {
        for mode in ColorMode::ALL {
            let mut c = canvas(17, 3, mode);
            c.clear(Color::WHITE);
            let want = Color::WHITE.quantized(mode);
            for y in 0..3 {
                for x in 0..17 {
                    assert_eq!(c.get_pixel(x, y).unwrap(), want, "{:?} ({}, {})", mode, x, y);
                }
            }
            assert_eq!(c.dirty_region(), Some(Region::new(0, 0, 17, 3)));
        }
    }

    #[test]
    fn test_rotation_places_origin_at_physical_corner() {
        let expected = [
            (Rotation::Deg0, (0, 0)),
            (Rotation::Deg90, (7, 0)),
            (Rotation::Deg180, (7, 3)),
            (Rotation::Deg270, (0, 3)),
        ];
        for (rot, (px, py)) in expected {
            let mut c = canvas(8, 4, ColorMode::Format8bppGray).with_rotation(rot);
            c.draw_pixel(0, 0, Color::WHITE).unwrap();
            assert_eq!(c.buffer().get_pixel(px, py).unwrap(), Color::WHITE, "{:?}", rot);
            assert_eq!(c.get_pixel(0, 0).unwrap(), Color::WHITE);
            assert_eq!(c.dirty_region(), Some(Region::new(px, py, 1, 1)));
        }
        let c = canvas(8, 4, ColorMode::Format8bppGray).with_rotation(Rotation::Deg90);
        assert_eq!((c.width(), c.height()), (4, 8));
    }

    #[test]
    fn test_line_is_symmetric() {
        let pairs = [
            ((1, 1), (14, 6)),
            ((2, 13), (9, 0)),
            ((0, 0), (15, 15)),
            ((15, 3), (0, 9)),
            ((4, 4), (4, 12)),
            ((3, 7), (11, 7)),
        ];
        for ((x0, y0), (x1, y1)) in pairs {
            let mut a = canvas(16, 16, ColorMode::Format1bpp);
            let mut b = canvas(16, 16, ColorMode::Format1bpp);
            a.draw_line(x0, y0, x1, y1, Color::WHITE).unwrap();
            b.draw_line(x1, y1, x0, y0, Color::WHITE).unwrap();
            assert_eq!(a.buffer().data(), b.buffer().data());
            assert_eq!(a.get_pixel(x0, y0).unwrap(), Color::WHITE);
            assert_eq!(a.get_pixel(x1, y1).unwrap(), Color::WHITE);
        }
    }

    #[test]
    fn test_rectangle_outline_pixel_count() {
        let mut c = canvas(20, 20, ColorMode::Format8bppGray);
        c.draw_rectangle(2, 3, 10, 6, Color::WHITE, false).unwrap();
        assert_eq!(lit(&c), 28);
        assert_eq!(c.get_pixel(6, 5).unwrap(), Color::BLACK);

        c.draw_rectangle(2, 3, 10, 6, Color::WHITE, true).unwrap();
        assert_eq!(lit(&c), 60);
    }

    #[test]
    fn test_filled_circle_covers_outline() {
        let mut outline = canvas(32, 32, ColorMode::Format8bppGray);
        let mut filled = canvas(32, 32, ColorMode::Format8bppGray);
        outline.draw_circle(15, 15, 9, Color::WHITE, false).unwrap();
        filled.draw_circle(15, 15, 9, Color::WHITE, true).unwrap();

        for y in 0..32 {
            for x in 0..32 {
                if outline.get_pixel(x, y).unwrap() == Color::WHITE {
                    assert_eq!(filled.get_pixel(x, y).unwrap(), Color::WHITE, "({}, {})", x, y);
                }
            }
        }
        assert_eq!(filled.get_pixel(15, 15).unwrap(), Color::WHITE);
        assert_eq!(outline.get_pixel(15, 15).unwrap(), Color::BLACK);
        assert_eq!(outline.get_pixel(24, 15).unwrap(), Color::WHITE);
        assert_eq!(outline.get_pixel(25, 15).unwrap(), Color::BLACK);
    }

    #[test]
    fn test_filled_triangle() {
        let mut c = canvas(12, 12, ColorMode::Format8bppGray);
        c.draw_triangle(0, 0, 9, 0, 0, 9, Color::WHITE, true).unwrap();
        for (x, y) in [(0, 0), (9, 0), (0, 9), (1, 1), (3, 3)] {
            assert_eq!(c.get_pixel(x, y).unwrap(), Color::WHITE, "({}, {})", x, y);
        }
        assert_eq!(c.get_pixel(8, 8).unwrap(), Color::BLACK);
    }

    #[test]
    fn test_text_draws_glyph() {
        let mut c = canvas(24, 16, ColorMode::Format1bpp).with_font(&FONT_6X8);
        c.draw_text(0, 0, "I", Color::WHITE, 1).unwrap();
        assert_eq!(lit(&c), 11);
        assert_eq!(c.get_pixel(2, 3).unwrap(), Color::WHITE);
        assert_eq!(c.get_pixel(0, 0).unwrap(), Color::BLACK);

        let mut c = canvas(24, 16, ColorMode::Format1bpp).with_font(&FONT_6X8);
        c.draw_text(0, 0, "I", Color::WHITE, 2).unwrap();
        assert_eq!(lit(&c), 44);
        assert_eq!(c.measure_text("II", &FONT_6X8, 2), Size::new(24, 16));
    }

    #[test]
    fn test_text_without_font_is_noop() {
        let mut c = canvas(24, 16, ColorMode::Format1bpp);
        c.draw_text(0, 0, "hello", Color::WHITE, 1).unwrap();
        assert_eq!(lit(&c), 0);
        assert_eq!(c.dirty_region(), None);
    }

    #[test]
    fn test_out_of_bounds_reports_after_drawing() {
        let mut c = canvas(10, 10, ColorMode::Format8bppGray).with_ignore_out_of_bounds(false);
        let err = c.draw_horizontal_line(5, 2, 10, Color::WHITE).unwrap_err();
        assert_eq!(err, GraphicsError::OutOfBounds { x: 10, y: 2 });
        for x in 5..10 {
            assert_eq!(c.get_pixel(x, 2).unwrap(), Color::WHITE);
        }
        assert!(c.get_pixel(-1, 0).is_err());

        let mut c = canvas(10, 10, ColorMode::Format8bppGray);
        c.draw_pixel(-1, 0, Color::WHITE).unwrap();
        c.draw_line(-5, -5, 20, 20, Color::WHITE).unwrap();
        assert_eq!(c.get_pixel(-1, 0).unwrap(), Color::BLACK);
        assert_eq!(lit(&c), 10);
    }

    #[test]
    fn test_every_primitive_reports_first_off_surface_pixel() {
        let strict = || canvas(10, 10, ColorMode::Format8bppGray).with_ignore_out_of_bounds(false);

        let mut c = strict();
        let err = c.draw_circle(8, 5, 3, Color::WHITE, false).unwrap_err();
        assert_eq!(err, GraphicsError::OutOfBounds { x: 11, y: 5 });
        assert_eq!(c.get_pixel(5, 5).unwrap(), Color::WHITE);

        let mut c = strict();
        let err = c.draw_circle(8, 5, 3, Color::WHITE, true).unwrap_err();
        assert_eq!(err, GraphicsError::OutOfBounds { x: 10, y: 5 });
        assert_eq!(c.get_pixel(9, 5).unwrap(), Color::WHITE);

        let mut c = strict();
        let err = c.draw_triangle(2, 2, 12, 2, 2, 7, Color::WHITE, false).unwrap_err();
        assert_eq!(err, GraphicsError::OutOfBounds { x: 10, y: 2 });
        assert_eq!(c.get_pixel(9, 2).unwrap(), Color::WHITE);
        assert_eq!(c.get_pixel(2, 7).unwrap(), Color::WHITE);

        let mut c = strict();
        let err = c.draw_triangle(3, -2, 8, 6, 1, 6, Color::WHITE, true).unwrap_err();
        assert_eq!(err, GraphicsError::OutOfBounds { x: 3, y: -2 });
        assert_eq!(c.get_pixel(4, 5).unwrap(), Color::WHITE);

        let mut c = strict().with_font(&FONT_6X8);
        let err = c.draw_text(4, 0, "II", Color::WHITE, 1).unwrap_err();
        let (gx, gy) = FONT_6X8.pixels('I').next().unwrap();
        assert_eq!(err, GraphicsError::OutOfBounds { x: 10 + gx as i32, y: gy as i32 });
        assert_eq!(lit(&c), 11);

        let mut c = strict();
        c.draw_rectangle(2, 2, 3, 3, Color::WHITE, true).unwrap();
        c.draw_circle(5, 5, 2, Color::WHITE, false).unwrap();
    }

    #[test]
    fn test_rotated_canvas_reports_logical_coordinates() {
        let mut c = canvas(10, 6, ColorMode::Format8bppGray)
            .with_rotation(Rotation::Deg90)
            .with_ignore_out_of_bounds(false);
        assert_eq!((c.width(), c.height()), (6, 10));

        let err = c.draw_horizontal_line(2, 3, 10, Color::WHITE).unwrap_err();
        assert_eq!(err, GraphicsError::OutOfBounds { x: 6, y: 3 });
        for x in 2..6 {
            assert_eq!(c.get_pixel(x, 3).unwrap(), Color::WHITE);
        }
        assert_eq!(
            c.draw_pixel(0, 10, Color::WHITE),
            Err(GraphicsError::OutOfBounds { x: 0, y: 10 })
        );
        c.draw_pixel(5, 9, Color::WHITE).unwrap();
    }

    #[test]
    fn test_far_coordinates_clip_instead_of_overflowing() {
        let mut c = canvas(10, 10, ColorMode::Format8bppGray).with_font(&FONT_6X8);
        c.draw_rectangle(i32::MAX - 1, 0, 4, 4, Color::WHITE, true).unwrap();
        c.draw_rectangle(i32::MIN, i32::MIN, u32::MAX, u32::MAX, Color::WHITE, false).unwrap();
        c.draw_circle(i32::MAX, i32::MIN, 1000, Color::WHITE, true).unwrap();
        c.draw_circle(i32::MIN, 5, 3, Color::WHITE, false).unwrap();
        c.draw_text(i32::MAX - 3, 0, "WW", Color::WHITE, u32::MAX).unwrap();
        c.draw_pixel(i32::MAX, i32::MAX, Color::WHITE).unwrap();
        assert_eq!(lit(&c), 0);

        c.draw_line(0, 0, i32::MAX, 0, Color::WHITE).unwrap();
        c.draw_line(i32::MIN, 9, i32::MAX, 9, Color::WHITE).unwrap();
        c.draw_line(0, 3, i32::MAX, 4, Color::WHITE).unwrap();
        c.draw_line(i32::MIN, 5, 9, 6, Color::WHITE).unwrap();
        assert_eq!(lit(&c), 40);
        for x in 0..10 {
            assert_eq!(c.get_pixel(x, 6).unwrap(), Color::WHITE);
        }

        let mut c = canvas(10, 10, ColorMode::Format8bppGray);
        c.draw_triangle(0, 0, i32::MAX, 0, 0, i32::MAX, Color::WHITE, true).unwrap();
        assert_eq!(lit(&c), 100);

        let mut c = canvas(10, 10, ColorMode::Format8bppGray).with_ignore_out_of_bounds(false);
        let err = c.draw_rectangle(i32::MAX - 1, 0, 4, 4, Color::WHITE, true).unwrap_err();
        assert_eq!(err, GraphicsError::OutOfBounds { x: i32::MAX - 1, y: 0 });
    }

    #[test]
    fn test_lines_entering_from_off_surface_keep_their_pixels() {
        // same segment drawn whole on a larger canvas, shifted into view
        fn check(x0: i32, y0: i32, x1: i32, y1: i32, dx: i32, dy: i32) {
            let mut small = canvas(10, 10, ColorMode::Format8bppGray);
            small.draw_line(x0, y0, x1, y1, Color::WHITE).unwrap();
            let mut big = canvas(32, 32, ColorMode::Format8bppGray);
            big.draw_line(x0 + dx, y0 + dy, x1 + dx, y1 + dy, Color::WHITE).unwrap();
            for y in 0..10 {
                for x in 0..10 {
                    assert_eq!(
                        small.get_pixel(x, y).unwrap(),
                        big.get_pixel(x + dx, y + dy).unwrap(),
                        "({}, {}) of {:?}",
                        x,
                        y,
                        (x0, y0, x1, y1)
                    );
                }
            }
        }
        check(-7, -3, 9, 8, 7, 3);
        check(-3, -7, 8, 9, 3, 7);
        check(-7, 12, 9, 1, 7, 0);
        check(-11, 4, 12, 6, 11, 0);
        check(2, -13, 5, 9, 0, 13);
    }

    #[test]
    fn test_show_dirty_moves_only_changed_bytes() {
        let mut c = canvas(64, 32, ColorMode::Format16bppRgb565);
        c.show().unwrap();
        c.target_mut().reset_stats();

        c.draw_rectangle(10, 5, 4, 3, Color::RED, true).unwrap();
        assert!(c.show_dirty().unwrap());
        let stats = c.target().stats();
        assert_eq!(stats.bytes, 4 * 2 * 3);
        assert_eq!(c.target().history(), &[Region::new(10, 5, 4, 3)]);
        assert!(!c.show_dirty().unwrap());
        assert_eq!(c.target().front().get_pixel(12, 6).unwrap(), Color::RED);
    }

    #[test]
    fn test_rotated_show_region_maps_to_physical() {
        let mut c = canvas(8, 4, ColorMode::Format8bppGray).with_rotation(Rotation::Deg90);
        c.show_region(Region::new(0, 0, 2, 3)).unwrap();
        assert_eq!(c.target().history(), &[Region::new(5, 0, 3, 2)]);

        c.show_rect(0, 0, 100, 100).unwrap();
        assert_eq!(c.target().history()[1], Region::new(0, 0, 8, 4));
    }

    #[test]
    fn test_origin_and_clip() {
        let mut c = canvas(20, 20, ColorMode::Format8bppGray);
        c.set_origin(5, 5);
        c.draw_pixel(0, 0, Color::WHITE).unwrap();
        assert_eq!(c.buffer().get_pixel(5, 5).unwrap(), Color::WHITE);

        let mut c = canvas(20, 20, ColorMode::Format8bppGray);
        c.set_clip(Some(Region::new(2, 2, 4, 4)));
        c.draw_rectangle(0, 0, 20, 20, Color::WHITE, true).unwrap();
        c.draw_line(0, 0, 19, 19, Color::WHITE).unwrap();
        assert_eq!(lit(&c), 16);
        assert_eq!(c.get_pixel(1, 1).unwrap(), Color::BLACK);
    }

    #[test]
    fn test_invert_rectangle() {
        let mut c = canvas(8, 8, ColorMode::Format4bppGray);
        c.invert_rectangle(0, 0, 2, 2);
        assert_eq!(lit(&c), 4);
        assert_eq!(c.get_pixel(1, 1).unwrap(), Color::WHITE);
    }

    #[test]
    fn test_draw_buffer_rotated() {
        let mut src = PixelBuffer::new(2, 1, ColorMode::Format1bpp).unwrap();
        src.set_pixel(0, 0, Color::WHITE).unwrap();

        let mut c = canvas(4, 2, ColorMode::Format8bppGray).with_rotation(Rotation::Deg180);
        c.draw_buffer(0, 0, &src).unwrap();
        assert_eq!(c.buffer().get_pixel(3, 1).unwrap(), Color::WHITE);
        assert_eq!(c.buffer().get_pixel(2, 1).unwrap(), Color::BLACK);

        let mut c = canvas(4, 2, ColorMode::Format8bppGray);
        c.draw_buffer(3, 1, &src).unwrap();
        assert_eq!(c.buffer().get_pixel(3, 1).unwrap(), Color::WHITE);
    }

    #[test]
    fn test_draw_image_blends_alpha() {
        let mut rgba = PixelBuffer::new(3, 1, ColorMode::Format32bppRgba8888).unwrap();
        rgba.set_pixel(0, 0, Color::RED).unwrap();
        rgba.set_pixel(1, 0, Color::new(255, 255, 255, 0)).unwrap();
        rgba.set_pixel(2, 0, Color::new(255, 255, 255, 128)).unwrap();
        let image = Image::from_buffer(rgba);

        let mut c = canvas(3, 1, ColorMode::Format24bppRgb888);
        c.clear(Color::BLUE);
        c.draw_image(0, 0, &image).unwrap();
        assert_eq!(c.get_pixel(0, 0).unwrap(), Color::RED);
        assert_eq!(c.get_pixel(1, 0).unwrap(), Color::BLUE);
        assert_eq!(c.get_pixel(2, 0).unwrap(), Color::rgb(128, 128, 255));
    }

    #[test]
    fn test_embedded_graphics_primitives() {
        use embedded_graphics::prelude::*;
        use embedded_graphics::primitives::{PrimitiveStyle, Rectangle as EgRect};

        let mut c = canvas(8, 8, ColorMode::Format16bppRgb565);
        EgRect::new(Point::new(1, 1), Size::new(3, 2))
            .into_styled(PrimitiveStyle::with_fill(Rgb888::WHITE))
            .draw(&mut c)
            .unwrap();
        assert_eq!(lit(&c), 6);
        assert_eq!(c.size(), Size::new(8, 8));
    }
}
