// Packed in-memory framebuffer.
// One ColorMode per buffer; rows padded to a byte boundary independently.
// Sub-byte pixels are MSB-first, multi-byte pixels big-endian, 12bpp packs
// two pixels into three bytes. Coordinates here are physical; rotation and
// clipping live in the canvas.

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;
use core::fmt;
use core::ops::Range;

use embedded_graphics_core::{
    Pixel,
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    pixelcolor::Rgb888,
    primitives::Rectangle,
};

use crate::color::{Color, ColorMode, PixelCodec};
use crate::error::{GraphicsError, Result};
use crate::ui::Region;

/// What `get_pixel`/`set_pixel` do with coordinates outside the buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutOfBounds {
    /// Drop writes, read back `Color::BLACK`.
    #[default]
    Ignore,
    /// Report `GraphicsError::OutOfBounds`.
    Error,
}

#[derive(Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    mode: ColorMode,
    stride: usize,
    data: Vec<u8>,
    codec: &'static PixelCodec,
    policy: OutOfBounds,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, mode: ColorMode) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GraphicsError::InvalidDimension { width, height });
        }
        let stride = mode.row_stride(width);
        Ok(Self {
            width,
            height,
            mode,
            stride,
            data: vec![0u8; stride * height as usize],
            codec: mode.codec(),
            policy: OutOfBounds::Ignore,
        })
    }

    pub const fn with_policy(mut self, policy: OutOfBounds) -> Self {
        self.policy = policy;
        self
    }

    pub fn set_policy(&mut self, policy: OutOfBounds) {
        self.policy = policy;
    }

    pub fn policy(&self) -> OutOfBounds {
        self.policy
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    /// Bytes per row, padding included.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn bounds(&self) -> Region {
        Region::new(0, 0, self.width, self.height)
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[inline]
    pub fn encode(&self, color: Color) -> u32 {
        (self.codec.encode)(color)
    }

    #[inline]
    pub fn decode(&self, raw: u32) -> Color {
        (self.codec.decode)(raw)
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Result<Color> {
        if !self.in_bounds(x, y) {
            return match self.policy {
                OutOfBounds::Ignore => Ok(Color::BLACK),
                OutOfBounds::Error => Err(GraphicsError::OutOfBounds { x, y }),
            };
        }
        Ok(self.decode(self.read_raw(x as u32, y as u32)))
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) -> Result<()> {
        let raw = self.encode(color);
        self.set_raw(x, y, raw)
    }

    /// Packed value at (x, y), or `None` outside the buffer.
    pub fn get_raw(&self, x: i32, y: i32) -> Option<u32> {
        self.in_bounds(x, y)
            .then(|| self.read_raw(x as u32, y as u32))
    }

    /// Store an already-encoded value; obeys the out-of-bounds policy.
    pub fn set_raw(&mut self, x: i32, y: i32, raw: u32) -> Result<()> {
        if !self.in_bounds(x, y) {
            return match self.policy {
                OutOfBounds::Ignore => Ok(()),
                OutOfBounds::Error => Err(GraphicsError::OutOfBounds { x, y }),
            };
        }
        self.write_raw(x as u32, y as u32, raw);
        Ok(())
    }

    pub fn fill(&mut self, color: Color) {
        let raw = self.encode(color);
        match self.mode.storage_bits() {
            bits @ (1 | 2 | 4) => self.data.fill(replicate(raw, bits)),
            _ => self.fill_raw(0, 0, self.width, self.height, raw),
        }
    }

    /// Fill a rectangle, clipped to the buffer. Encodes `color` once.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Color) {
        let raw = self.encode(color);
        self.fill_region_raw(Region::new(x, y, w, h), raw);
    }

    /// `fill_rect` with a pre-encoded value.
    pub fn fill_region_raw(&mut self, region: Region, raw: u32) {
        let Some(r) = region.clamp_to(self.width, self.height) else {
            return;
        };
        self.fill_raw(
            r.x as u32,
            r.y as u32,
            r.x as u32 + r.w,
            r.y as u32 + r.h,
            raw,
        );
    }

    /// XOR the colour bits of every pixel in the rectangle.
    pub fn invert_rect(&mut self, x: i32, y: i32, w: u32, h: u32) {
        let Some(r) = Region::new(x, y, w, h).clamp_to(self.width, self.height) else {
            return;
        };
        let mask = self.codec.invert_mask;
        for py in r.y as u32..r.y as u32 + r.h {
            for px in r.x as u32..r.x as u32 + r.w {
                let v = self.read_raw(px, py);
                self.write_raw(px, py, v ^ mask);
            }
        }
    }

    pub fn invert(&mut self) {
        self.invert_rect(0, 0, self.width, self.height);
    }

    /// Copy `src` with its top-left corner at (x, y), clipped.
    pub fn write_buffer(&mut self, x: i32, y: i32, src: &PixelBuffer) {
        let Some((dst, sx, sy)) = self.blit_window(x, y, src) else {
            return;
        };

        if src.mode == self.mode && self.byte_aligned_copy(&dst, sx, sy, src) {
            return;
        }

        let same_mode = src.mode == self.mode;
        for row in 0..dst.h {
            for col in 0..dst.w {
                let raw = src.read_raw(sx + col, sy + row);
                let raw = if same_mode {
                    raw
                } else {
                    self.encode(src.decode(raw))
                };
                self.write_raw(dst.x as u32 + col, dst.y as u32 + row, raw);
            }
        }
    }

    /// Sprite blit: pixels of `src` whose colour is `key` are skipped.
    pub fn write_buffer_keyed(&mut self, x: i32, y: i32, src: &PixelBuffer, key: Color) {
        let Some((dst, sx, sy)) = self.blit_window(x, y, src) else {
            return;
        };
        for row in 0..dst.h {
            for col in 0..dst.w {
                let c = src.decode(src.read_raw(sx + col, sy + row));
                if c == key {
                    continue;
                }
                let raw = self.encode(c);
                self.write_raw(dst.x as u32 + col, dst.y as u32 + row, raw);
            }
        }
    }

    /// Byte range within one row covering pixel columns `x0..x1`.
    pub fn row_span(&self, x0: u32, x1: u32) -> Range<usize> {
        let bits = self.mode.storage_bits() as usize;
        let start = x0 as usize * bits / 8;
        let end = (x1 as usize * bits).div_ceil(8);
        start..end.min(self.stride)
    }

    /// Bytes of row `y` covering columns `x0..x1`.
    pub fn row_bytes(&self, y: u32, x0: u32, x1: u32) -> &[u8] {
        let base = y as usize * self.stride;
        let span = self.row_span(x0, x1);
        &self.data[base + span.start..base + span.end]
    }

    pub(crate) fn row_bytes_mut(&mut self, y: u32, x0: u32, x1: u32) -> &mut [u8] {
        let base = y as usize * self.stride;
        let span = self.row_span(x0, x1);
        &mut self.data[base + span.start..base + span.end]
    }

    // clip src placed at (x, y); returns dest window and src origin
    fn blit_window(&self, x: i32, y: i32, src: &PixelBuffer) -> Option<(Region, u32, u32)> {
        let dst = Region::new(x, y, src.width, src.height).clamp_to(self.width, self.height)?;
        let sx = (dst.x - x) as u32;
        let sy = (dst.y - y) as u32;
        Some((dst, sx, sy))
    }

    // same-mode fast path; false unless the window starts and ends on bytes
    fn byte_aligned_copy(&mut self, dst: &Region, sx: u32, sy: u32, src: &PixelBuffer) -> bool {
        let bits = self.mode.storage_bits() as usize;
        let aligned = |px: u32| (px as usize * bits) % 8 == 0;
        if !(aligned(dst.x as u32) && aligned(sx) && aligned(dst.w)) {
            return false;
        }

        let from = src.row_span(sx, sx + dst.w);
        let to = self.row_span(dst.x as u32, dst.x as u32 + dst.w);
        for row in 0..dst.h {
            let src_base = (sy + row) as usize * src.stride;
            let dst_base = (dst.y as u32 + row) as usize * self.stride;
            self.data[dst_base + to.start..dst_base + to.end]
                .copy_from_slice(&src.data[src_base + from.start..src_base + from.end]);
        }
        true
    }

    fn read_raw(&self, x: u32, y: u32) -> u32 {
        let row = y as usize * self.stride;
        let x = x as usize;
        match self.mode.storage_bits() {
            bits @ (1 | 2 | 4) => {
                let bits = bits as usize;
                let bit = x * bits;
                let shift = 8 - bits - (bit % 8);
                ((self.data[row + bit / 8] >> shift) as u32) & ((1 << bits) - 1)
            }
            12 => {
                let off = row + x * 12 / 8;
                if x % 2 == 0 {
                    ((self.data[off] as u32) << 4) | (self.data[off + 1] >> 4) as u32
                } else {
                    (((self.data[off] & 0x0F) as u32) << 8) | self.data[off + 1] as u32
                }
            }
            bits => {
                let n = bits as usize / 8;
                let off = row + x * n;
                self.data[off..off + n]
                    .iter()
                    .fold(0u32, |acc, &b| (acc << 8) | b as u32)
            }
        }
    }

    fn write_raw(&mut self, x: u32, y: u32, raw: u32) {
        let row = y as usize * self.stride;
        let x = x as usize;
        match self.mode.storage_bits() {
            bits @ (1 | 2 | 4) => {
                let bits = bits as usize;
                let bit = x * bits;
                let shift = 8 - bits - (bit % 8);
                let mask = (((1u32 << bits) - 1) as u8) << shift;
                let byte = &mut self.data[row + bit / 8];
                *byte = (*byte & !mask) | (((raw as u8) << shift) & mask);
            }
            12 => {
                let off = row + x * 12 / 8;
                if x % 2 == 0 {
                    self.data[off] = (raw >> 4) as u8;
                    self.data[off + 1] = (self.data[off + 1] & 0x0F) | (((raw & 0xF) as u8) << 4);
                } else {
                    self.data[off] = (self.data[off] & 0xF0) | ((raw >> 8) & 0xF) as u8;
                    self.data[off + 1] = raw as u8;
                }
            }
            bits => {
                let n = bits as usize / 8;
                let off = row + x * n;
                let be = raw.to_be_bytes();
                self.data[off..off + n].copy_from_slice(&be[4 - n..]);
            }
        }
    }

    // fill [x0, x1) x [y0, y1) with a pre-encoded value; caller clips
    fn fill_raw(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, raw: u32) {
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        match self.mode.storage_bits() {
            bits @ (1 | 2 | 4) => {
                let bits = bits as usize;
                let pattern = replicate(raw, bits as u32);
                let start_bit = x0 as usize * bits;
                let end_bit = x1 as usize * bits;
                let first_byte = start_bit / 8;
                let last_byte = (end_bit - 1) / 8;
                let first_mask: u8 = 0xFF >> (start_bit & 7);
                let last_mask: u8 = 0xFF << (7 - ((end_bit - 1) & 7));
                let merge = |b: &mut u8, m: u8| *b = (*b & !m) | (pattern & m);

                for y in y0..y1 {
                    let row = y as usize * self.stride;
                    if first_byte == last_byte {
                        merge(&mut self.data[row + first_byte], first_mask & last_mask);
                    } else {
                        merge(&mut self.data[row + first_byte], first_mask);
                        self.data[row + first_byte + 1..row + last_byte].fill(pattern);
                        merge(&mut self.data[row + last_byte], last_mask);
                    }
                }
            }
            12 => {
                for y in y0..y1 {
                    for x in x0..x1 {
                        self.write_raw(x, y, raw);
                    }
                }
            }
            bits => {
                let n = bits as usize / 8;
                let be = raw.to_be_bytes();
                let px = &be[4 - n..];
                let uniform = px.iter().all(|&b| b == px[0]);
                for y in y0..y1 {
                    let row = y as usize * self.stride;
                    let span = &mut self.data[row + x0 as usize * n..row + x1 as usize * n];
                    if uniform {
                        span.fill(px[0]);
                    } else {
                        for chunk in span.chunks_exact_mut(n) {
                            chunk.copy_from_slice(px);
                        }
                    }
                }
            }
        }
    }
}

// repeat a sub-byte value across a whole byte
fn replicate(raw: u32, bits: u32) -> u8 {
    let v = (raw & ((1 << bits) - 1)) as u8;
    (0..8 / bits).fold(0u8, |acc, _| (acc << bits) | v)
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("mode", &self.mode)
            .field("stride", &self.stride)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl OriginDimensions for PixelBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for PixelBuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            if self.in_bounds(p.x, p.y) {
                let raw = self.encode(color.into());
                self.write_raw(p.x as u32, p.y as u32, raw);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> core::result::Result<(), Self::Error> {
        self.fill_rect(
            area.top_left.x,
            area.top_left.y,
            area.size.width,
            area.size.height,
            color.into(),
        );
        Ok(())
    }
}
