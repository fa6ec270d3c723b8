// Windows BMP decoder
//
// Handles what image editors actually write: BITMAPINFOHEADER plus the V4
// and V5 extensions, uncompressed or BI_BITFIELDS pixel data, 1/2/4/8 bpp
// palettes, 16/24/32 bpp direct colour, bottom-up or top-down rows, each
// row padded to four bytes. RLE is rejected.
//
// Output modes: 32 bpp -> RGBA8888, 16 bpp -> RGB565, everything else
// RGB888. The source depth is reported separately.

use log::debug;

use crate::buffer::PixelBuffer;
use crate::color::{Color, ColorMode};
use crate::error::{DecodeError, GraphicsError};

// ── Header layout ───────────────────────────────────────────────

const SIGNATURE: &[u8; 2] = b"BM";
const FILE_HEADER_LEN: usize = 14;

const INFO_HEADER_LEN: u32 = 40;
const V4_HEADER_LEN: u32 = 108;
const V5_HEADER_LEN: u32 = 124;

const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;
const BI_ALPHABITFIELDS: u32 = 6;

// refuse anything larger before allocating
const MAX_DIMENSION: u32 = 16_384;

// ── Little-endian helpers ───────────────────────────────────────

#[inline]
fn le_u16(d: &[u8], o: usize) -> Result<u16, DecodeError> {
    d.get(o..o + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(DecodeError::Truncated)
}

#[inline]
fn le_u32(d: &[u8], o: usize) -> Result<u32, DecodeError> {
    d.get(o..o + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(DecodeError::Truncated)
}

// ── Channel masks ───────────────────────────────────────────────

/// One colour channel described by a BI_BITFIELDS mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Channel {
    shift: u32,
    max: u32,
}

impl Channel {
    const fn from_mask(mask: u32) -> Self {
        if mask == 0 {
            return Self { shift: 0, max: 0 };
        }
        let shift = mask.trailing_zeros();
        let bits = (mask >> shift).count_ones();
        let max = if bits >= 32 { u32::MAX } else { (1 << bits) - 1 };
        Self { shift, max }
    }

    const fn is_present(self) -> bool {
        self.max != 0
    }

    #[inline]
    fn extract(self, px: u32) -> u8 {
        if self.max == 0 {
            return 0;
        }
        let v = (px >> self.shift) & self.max;
        ((v as u64 * 255 + self.max as u64 / 2) / self.max as u64) as u8
    }
}

#[derive(Clone, Copy, Debug)]
struct Masks {
    r: Channel,
    g: Channel,
    b: Channel,
    a: Channel,
}

impl Masks {
    fn new(r: u32, g: u32, b: u32, a: u32) -> Self {
        Self {
            r: Channel::from_mask(r),
            g: Channel::from_mask(g),
            b: Channel::from_mask(b),
            a: Channel::from_mask(a),
        }
    }

    fn default_for(bpp: u16) -> Self {
        match bpp {
            16 => Self::new(0x7C00, 0x03E0, 0x001F, 0),
            _ => Self::new(0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000),
        }
    }

    fn color(&self, px: u32) -> Color {
        let a = if self.a.is_present() {
            self.a.extract(px)
        } else {
            255
        };
        Color::new(self.r.extract(px), self.g.extract(px), self.b.extract(px), a)
    }
}

// ── Parsed header ───────────────────────────────────────────────

#[derive(Debug)]
pub(super) struct Header {
    pub width: u32,
    pub height: u32,
    pub top_down: bool,
    pub bpp: u16,
    compression: u32,
    data_offset: usize,
    header_len: u32,
    colors_used: u32,
}

impl Header {
    pub(super) fn parse(d: &[u8]) -> Result<Self, DecodeError> {
        if d.len() < 2 || &d[..2] != SIGNATURE {
            return Err(DecodeError::InvalidSignature);
        }
        let data_offset = le_u32(d, 10)? as usize;
        let header_len = le_u32(d, 14)?;
        if !matches!(header_len, INFO_HEADER_LEN | V4_HEADER_LEN | V5_HEADER_LEN) {
            return Err(DecodeError::UnsupportedHeader(header_len));
        }
        if d.len() < FILE_HEADER_LEN + header_len as usize {
            return Err(DecodeError::Truncated);
        }

        let raw_w = le_u32(d, 18)? as i32;
        let raw_h = le_u32(d, 22)? as i32;
        let bpp = le_u16(d, 28)?;
        let compression = le_u32(d, 30)?;
        let colors_used = le_u32(d, 46)?;

        if raw_w <= 0 || raw_h == 0 || raw_h == i32::MIN {
            return Err(DecodeError::InvalidDimension);
        }
        let width = raw_w as u32;
        let height = raw_h.unsigned_abs();
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(DecodeError::InvalidDimension);
        }

        if !matches!(bpp, 1 | 2 | 4 | 8 | 16 | 24 | 32) {
            return Err(DecodeError::UnsupportedBitDepth(bpp));
        }
        let masked = matches!(compression, BI_BITFIELDS | BI_ALPHABITFIELDS);
        if !(compression == BI_RGB || (masked && matches!(bpp, 16 | 32))) {
            return Err(DecodeError::UnsupportedCompression(compression));
        }

        Ok(Self {
            width,
            height,
            top_down: raw_h < 0,
            bpp,
            compression,
            data_offset,
            header_len,
            colors_used,
        })
    }

    /// Bytes per stored row, padding included.
    pub(super) fn row_len(&self) -> usize {
        (self.width as usize * self.bpp as usize).div_ceil(32) * 4
    }

    fn masks(&self, d: &[u8]) -> Result<Masks, DecodeError> {
        if self.compression == BI_RGB {
            return Ok(Masks::default_for(self.bpp));
        }
        // masks sit right after a bare info header, inside V4/V5 ones
        let o = FILE_HEADER_LEN + INFO_HEADER_LEN as usize;
        let with_alpha = self.header_len > INFO_HEADER_LEN || self.compression == BI_ALPHABITFIELDS;
        let a = if with_alpha { le_u32(d, o + 12)? } else { 0 };
        Ok(Masks::new(le_u32(d, o)?, le_u32(d, o + 4)?, le_u32(d, o + 8)?, a))
    }

    fn palette(&self, d: &[u8]) -> Result<alloc::vec::Vec<Color>, DecodeError> {
        let max = 1usize << self.bpp;
        let count = match self.colors_used as usize {
            0 => max,
            n => n.min(max),
        };
        let mut start = FILE_HEADER_LEN + self.header_len as usize;
        if self.header_len == INFO_HEADER_LEN && self.compression == BI_BITFIELDS {
            start += 12;
        }
        let table = d
            .get(start..start + count * 4)
            .ok_or(DecodeError::Truncated)?;
        Ok(table
            .chunks_exact(4)
            .map(|e| Color::rgb(e[2], e[1], e[0]))
            .collect())
    }

    fn output_mode(&self) -> ColorMode {
        match self.bpp {
            32 => ColorMode::Format32bppRgba8888,
            16 => ColorMode::Format16bppRgb565,
            _ => ColorMode::Format24bppRgb888,
        }
    }
}

// ── Decoder ─────────────────────────────────────────────────────

/// Decode a complete BMP file held in memory.
pub(super) fn decode(d: &[u8]) -> Result<(PixelBuffer, u16), GraphicsError> {
    let h = Header::parse(d)?;
    debug!(
        "[BMP] {}x{} {}bpp, header {} bytes, compression {}, {}",
        h.width,
        h.height,
        h.bpp,
        h.header_len,
        h.compression,
        if h.top_down { "top-down" } else { "bottom-up" }
    );

    let row_len = h.row_len();
    let pixels = d
        .get(h.data_offset..)
        .filter(|p| p.len() >= row_len * h.height as usize)
        .ok_or(DecodeError::Truncated)?;

    let mut out = PixelBuffer::new(h.width, h.height, h.output_mode())?;

    match h.bpp {
        1 | 2 | 4 | 8 => {
            let palette = h.palette(d)?;
            let bits = h.bpp as usize;
            let mask = (1u8 << bits) - 1;
            for_each_row(&h, pixels, |y, row| {
                for x in 0..h.width as usize {
                    let bit = x * bits;
                    let idx = (row[bit / 8] >> (8 - bits - bit % 8)) & mask;
                    // out-of-range indices fall back to black
                    let c = palette.get(idx as usize).copied().unwrap_or(Color::BLACK);
                    out.set_pixel(x as i32, y, c)?;
                }
                Ok(())
            })?;
        }
        24 => {
            for_each_row(&h, pixels, |y, row| {
                for (x, px) in row.chunks_exact(3).take(h.width as usize).enumerate() {
                    out.set_pixel(x as i32, y, Color::rgb(px[2], px[1], px[0]))?;
                }
                Ok(())
            })?;
        }
        16 => {
            let masks = h.masks(d)?;
            for_each_row(&h, pixels, |y, row| {
                for (x, px) in row.chunks_exact(2).take(h.width as usize).enumerate() {
                    let v = u16::from_le_bytes([px[0], px[1]]) as u32;
                    out.set_pixel(x as i32, y, masks.color(v))?;
                }
                Ok(())
            })?;
        }
        _ => {
            let masks = h.masks(d)?;
            let mut any_alpha = false;
            for_each_row(&h, pixels, |y, row| {
                for (x, px) in row.chunks_exact(4).take(h.width as usize).enumerate() {
                    let c = masks.color(u32::from_le_bytes([px[0], px[1], px[2], px[3]]));
                    any_alpha |= c.a != 0;
                    out.set_pixel(x as i32, y, c)?;
                }
                Ok(())
            })?;
            // BI_RGB files usually leave the fourth byte zero; treat as opaque
            if !any_alpha {
                debug!("[BMP] no alpha channel content, forcing opaque");
                make_opaque(&mut out);
            }
        }
    }

    Ok((out, h.bpp))
}

// visit stored rows in display order (y = 0 is the top)
fn for_each_row<F>(h: &Header, pixels: &[u8], mut f: F) -> Result<(), GraphicsError>
where
    F: FnMut(i32, &[u8]) -> Result<(), GraphicsError>,
{
    let row_len = h.row_len();
    for (i, row) in pixels
        .chunks_exact(row_len)
        .take(h.height as usize)
        .enumerate()
    {
        let y = if h.top_down {
            i
        } else {
            h.height as usize - 1 - i
        };
        f(y as i32, row)?;
    }
    Ok(())
}

fn make_opaque(buf: &mut PixelBuffer) {
    for px in buf.data_mut().chunks_exact_mut(4) {
        px[3] = 0xFF;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    // minimal BITMAPINFOHEADER file around `pixels`
    fn bmp(width: i32, height: i32, bpp: u16, palette: &[[u8; 4]], pixels: &[u8]) -> Vec<u8> {
        let offset = 14 + 40 + palette.len() * 4;
        let mut d = Vec::new();
        d.extend_from_slice(b"BM");
        d.extend_from_slice(&((offset + pixels.len()) as u32).to_le_bytes());
        d.extend_from_slice(&[0; 4]);
        d.extend_from_slice(&(offset as u32).to_le_bytes());
        d.extend_from_slice(&40u32.to_le_bytes());
        d.extend_from_slice(&width.to_le_bytes());
        d.extend_from_slice(&height.to_le_bytes());
        d.extend_from_slice(&1u16.to_le_bytes());
        d.extend_from_slice(&bpp.to_le_bytes());
        d.extend_from_slice(&[0; 24]);
        for e in palette {
            d.extend_from_slice(e);
        }
        d.extend_from_slice(pixels);
        d
    }

    #[test]
    fn test_rejects_bad_signature() {
        let mut d = bmp(1, 1, 24, &[], &[0; 4]);
        d[0] = b'X';
        assert_eq!(
            decode(&d).unwrap_err(),
            GraphicsError::Decode(DecodeError::InvalidSignature)
        );
    }

    #[test]
    fn test_rejects_truncated_pixels() {
        let d = bmp(4, 4, 24, &[], &[0; 20]);
        assert_eq!(
            decode(&d).unwrap_err(),
            GraphicsError::Decode(DecodeError::Truncated)
        );
    }

    #[test]
    fn test_rejects_rle() {
        let mut d = bmp(1, 1, 8, &[[0; 4]], &[0; 4]);
        d[30] = 1;
        assert_eq!(
            decode(&d).unwrap_err(),
            GraphicsError::Decode(DecodeError::UnsupportedCompression(1))
        );
    }

    #[test]
    fn test_rejects_zero_width() {
        let d = bmp(0, 1, 24, &[], &[]);
        assert_eq!(
            decode(&d).unwrap_err(),
            GraphicsError::Decode(DecodeError::InvalidDimension)
        );
    }

    #[test]
    fn test_bottom_up_24bpp() {
        // 2x2, rows stored bottom first, each padded to 8 bytes
        let pixels = [
            0, 0, 255, 0, 255, 0, 0, 0, // bottom: red, green
            255, 0, 0, 255, 255, 255, 0, 0, // top: blue, white
        ];
        let (buf, bpp) = decode(&bmp(2, 2, 24, &[], &pixels)).unwrap();
        assert_eq!(bpp, 24);
        assert_eq!(buf.mode(), ColorMode::Format24bppRgb888);
        assert_eq!(buf.get_pixel(0, 0).unwrap(), Color::BLUE);
        assert_eq!(buf.get_pixel(1, 0).unwrap(), Color::WHITE);
        assert_eq!(buf.get_pixel(0, 1).unwrap(), Color::RED);
        assert_eq!(buf.get_pixel(1, 1).unwrap(), Color::GREEN);
    }

    #[test]
    fn test_top_down_palette_1bpp() {
        let palette = [[0, 0, 0, 0], [255, 255, 255, 0]];
        let pixels = [0b1010_0000, 0, 0, 0, 0b0101_0000, 0, 0, 0];
        let (buf, bpp) = decode(&bmp(4, -2, 1, &palette, &pixels)).unwrap();
        assert_eq!(bpp, 1);
        assert_eq!(buf.get_pixel(0, 0).unwrap(), Color::WHITE);
        assert_eq!(buf.get_pixel(1, 0).unwrap(), Color::BLACK);
        assert_eq!(buf.get_pixel(1, 1).unwrap(), Color::WHITE);
    }

    #[test]
    fn test_palette_4bpp() {
        let palette = [[0, 0, 0, 0], [0, 0, 255, 0], [0, 255, 0, 0]];
        let pixels = [0x12, 0, 0, 0];
        let mut d = bmp(2, 1, 4, &palette, &pixels);
        d[46] = 3;
        let (buf, _) = decode(&d).unwrap();
        assert_eq!(buf.get_pixel(0, 0).unwrap(), Color::RED);
        assert_eq!(buf.get_pixel(1, 0).unwrap(), Color::GREEN);
    }

    #[test]
    fn test_16bpp_defaults_to_555() {
        let red: u16 = 0x1F << 10;
        let mut pixels = Vec::new();
        pixels.extend_from_slice(&red.to_le_bytes());
        pixels.extend_from_slice(&[0, 0]);
        let (buf, bpp) = decode(&bmp(1, 1, 16, &[], &pixels)).unwrap();
        assert_eq!(bpp, 16);
        assert_eq!(buf.mode(), ColorMode::Format16bppRgb565);
        assert_eq!(buf.get_pixel(0, 0).unwrap(), Color::RED);
    }

    #[test]
    fn test_32bpp_without_alpha_is_opaque() {
        let (buf, _) = decode(&bmp(1, 1, 32, &[], &[0, 0, 255, 0])).unwrap();
        assert_eq!(buf.mode(), ColorMode::Format32bppRgba8888);
        assert_eq!(buf.get_pixel(0, 0).unwrap(), Color::RED);
    }

    #[test]
    fn test_channel_scaling() {
        let c = Channel::from_mask(0x7C00);
        assert_eq!(c.extract(0x7C00), 255);
        assert_eq!(c.extract(0), 0);
        assert!(!Channel::from_mask(0).is_present());
    }
}
