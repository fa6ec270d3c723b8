//! Device-independent colour and the packed pixel formats.
//!
//! Every [`PixelBuffer`](crate::buffer::PixelBuffer) carries one
//! [`ColorMode`] for its whole life. The mode picks a [`PixelCodec`]
//! once, at construction, so per-pixel work is a plain function call
//! instead of a match on the format.

use embedded_graphics_core::pixelcolor::{BinaryColor, Rgb565, Rgb888, RgbColor};

/// RGBA colour with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour (alpha = 255).
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn gray(v: u8) -> Self {
        Self::rgb(v, v, v)
    }

    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    /// Integer luma, exact for gray inputs.
    pub const fn luminance(self) -> u8 {
        ((self.r as u32 * 30 + self.g as u32 * 59 + self.b as u32 * 11) / 100) as u8
    }

    /// RGB complement; alpha is kept.
    pub const fn invert(self) -> Self {
        Self::new(!self.r, !self.g, !self.b, self.a)
    }

    /// Mix `other` over `self` with `alpha` (0 = self, 255 = other).
    pub fn blend(self, other: Color, alpha: u8) -> Self {
        let mix = |a: u8, b: u8| -> u8 {
            let a = a as u32;
            let b = b as u32;
            let t = alpha as u32;
            ((a * (255 - t) + b * t + 127) / 255) as u8
        };
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    /// The colour a buffer of `mode` hands back after storing `self`.
    pub fn quantized(self, mode: ColorMode) -> Self {
        let codec = mode.codec();
        (codec.decode)((codec.encode)(self))
    }
}

impl From<Rgb888> for Color {
    fn from(c: Rgb888) -> Self {
        Color::rgb(c.r(), c.g(), c.b())
    }
}

impl From<Color> for Rgb888 {
    fn from(c: Color) -> Self {
        Rgb888::new(c.r, c.g, c.b)
    }
}

impl From<Rgb565> for Color {
    fn from(c: Rgb565) -> Self {
        Color::rgb(expand5(c.r()), expand6(c.g()), expand5(c.b()))
    }
}

impl From<Color> for Rgb565 {
    fn from(c: Color) -> Self {
        Rgb565::new(c.r >> 3, c.g >> 2, c.b >> 3)
    }
}

impl From<BinaryColor> for Color {
    fn from(c: BinaryColor) -> Self {
        if c.is_on() { Color::WHITE } else { Color::BLACK }
    }
}

/// Bit depth and channel layout of a packed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorMode {
    Format1bpp,
    Format2bppGray,
    Format4bppGray,
    Format8bppGray,
    Format8bppRgb332,
    Format12bppRgb444,
    Format16bppRgb565,
    /// Three bytes per pixel, each channel in the top six bits.
    Format18bppRgb666,
    Format24bppRgb888,
    Format24bppGrb888,
    Format32bppRgba8888,
}

impl ColorMode {
    pub const ALL: [ColorMode; 11] = [
        ColorMode::Format1bpp,
        ColorMode::Format2bppGray,
        ColorMode::Format4bppGray,
        ColorMode::Format8bppGray,
        ColorMode::Format8bppRgb332,
        ColorMode::Format12bppRgb444,
        ColorMode::Format16bppRgb565,
        ColorMode::Format18bppRgb666,
        ColorMode::Format24bppRgb888,
        ColorMode::Format24bppGrb888,
        ColorMode::Format32bppRgba8888,
    ];

    /// Nominal colour depth.
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            ColorMode::Format1bpp => 1,
            ColorMode::Format2bppGray => 2,
            ColorMode::Format4bppGray => 4,
            ColorMode::Format8bppGray | ColorMode::Format8bppRgb332 => 8,
            ColorMode::Format12bppRgb444 => 12,
            ColorMode::Format16bppRgb565 => 16,
            ColorMode::Format18bppRgb666 => 18,
            ColorMode::Format24bppRgb888 | ColorMode::Format24bppGrb888 => 24,
            ColorMode::Format32bppRgba8888 => 32,
        }
    }

    /// Bits one pixel occupies in memory.
    pub const fn storage_bits(self) -> u32 {
        match self {
            ColorMode::Format18bppRgb666 => 24,
            other => other.bits_per_pixel(),
        }
    }

    /// Whole bytes per pixel, or `None` for sub-byte and 12bpp packing.
    pub const fn bytes_per_pixel(self) -> Option<usize> {
        let bits = self.storage_bits();
        if bits % 8 == 0 {
            Some((bits / 8) as usize)
        } else {
            None
        }
    }

    pub const fn is_grayscale(self) -> bool {
        matches!(
            self,
            ColorMode::Format1bpp
                | ColorMode::Format2bppGray
                | ColorMode::Format4bppGray
                | ColorMode::Format8bppGray
        )
    }

    /// Bytes per row; every row is padded to a byte boundary on its own.
    pub const fn row_stride(self, width: u32) -> usize {
        (width as usize * self.storage_bits() as usize).div_ceil(8)
    }

    pub const fn buffer_len(self, width: u32, height: u32) -> usize {
        self.row_stride(width) * height as usize
    }

    pub fn codec(self) -> &'static PixelCodec {
        match self {
            ColorMode::Format1bpp => &CODEC_1BPP,
            ColorMode::Format2bppGray => &CODEC_GRAY2,
            ColorMode::Format4bppGray => &CODEC_GRAY4,
            ColorMode::Format8bppGray => &CODEC_GRAY8,
            ColorMode::Format8bppRgb332 => &CODEC_RGB332,
            ColorMode::Format12bppRgb444 => &CODEC_RGB444,
            ColorMode::Format16bppRgb565 => &CODEC_RGB565,
            ColorMode::Format18bppRgb666 => &CODEC_RGB666,
            ColorMode::Format24bppRgb888 => &CODEC_RGB888,
            ColorMode::Format24bppGrb888 => &CODEC_GRB888,
            ColorMode::Format32bppRgba8888 => &CODEC_RGBA8888,
        }
    }
}

/// Encode/decode pair for one format, right-aligned in a `u32`.
pub struct PixelCodec {
    pub encode: fn(Color) -> u32,
    pub decode: fn(u32) -> Color,
    /// Bits flipped by an invert; alpha bits are excluded.
    pub invert_mask: u32,
}

static CODEC_1BPP: PixelCodec = PixelCodec {
    encode: |c| (c.luminance() > 127) as u32,
    decode: |v| if v & 1 != 0 { Color::WHITE } else { Color::BLACK },
    invert_mask: 0x1,
};

static CODEC_GRAY2: PixelCodec = PixelCodec {
    encode: |c| (c.luminance() >> 6) as u32,
    decode: |v| Color::gray((v & 0x3) as u8 * 85),
    invert_mask: 0x3,
};

static CODEC_GRAY4: PixelCodec = PixelCodec {
    encode: |c| (c.luminance() >> 4) as u32,
    decode: |v| Color::gray((v & 0xF) as u8 * 17),
    invert_mask: 0xF,
};

static CODEC_GRAY8: PixelCodec = PixelCodec {
    encode: |c| c.luminance() as u32,
    decode: |v| Color::gray(v as u8),
    invert_mask: 0xFF,
};

static CODEC_RGB332: PixelCodec = PixelCodec {
    encode: |c| ((c.r as u32 >> 5) << 5) | ((c.g as u32 >> 5) << 2) | (c.b as u32 >> 6),
    decode: |v| {
        Color::rgb(
            expand3(((v >> 5) & 0x7) as u8),
            expand3(((v >> 2) & 0x7) as u8),
            (v & 0x3) as u8 * 85,
        )
    },
    invert_mask: 0xFF,
};

static CODEC_RGB444: PixelCodec = PixelCodec {
    encode: |c| ((c.r as u32 >> 4) << 8) | ((c.g as u32 >> 4) << 4) | (c.b as u32 >> 4),
    decode: |v| {
        Color::rgb(
            ((v >> 8) & 0xF) as u8 * 17,
            ((v >> 4) & 0xF) as u8 * 17,
            (v & 0xF) as u8 * 17,
        )
    },
    invert_mask: 0xFFF,
};

static CODEC_RGB565: PixelCodec = PixelCodec {
    encode: |c| ((c.r as u32 >> 3) << 11) | ((c.g as u32 >> 2) << 5) | (c.b as u32 >> 3),
    decode: |v| {
        Color::rgb(
            expand5(((v >> 11) & 0x1F) as u8),
            expand6(((v >> 5) & 0x3F) as u8),
            expand5((v & 0x1F) as u8),
        )
    },
    invert_mask: 0xFFFF,
};

static CODEC_RGB666: PixelCodec = PixelCodec {
    encode: |c| ((c.r as u32 & 0xFC) << 16) | ((c.g as u32 & 0xFC) << 8) | (c.b as u32 & 0xFC),
    decode: |v| {
        let ch = |x: u32| -> u8 {
            let x = (x & 0xFC) as u8;
            x | (x >> 6)
        };
        Color::rgb(ch(v >> 16), ch(v >> 8), ch(v))
    },
    invert_mask: 0xFC_FCFC,
};

static CODEC_RGB888: PixelCodec = PixelCodec {
    encode: |c| ((c.r as u32) << 16) | ((c.g as u32) << 8) | c.b as u32,
    decode: |v| Color::rgb((v >> 16) as u8, (v >> 8) as u8, v as u8),
    invert_mask: 0xFF_FFFF,
};

static CODEC_GRB888: PixelCodec = PixelCodec {
    encode: |c| ((c.g as u32) << 16) | ((c.r as u32) << 8) | c.b as u32,
    decode: |v| Color::rgb((v >> 8) as u8, (v >> 16) as u8, v as u8),
    invert_mask: 0xFF_FFFF,
};

static CODEC_RGBA8888: PixelCodec = PixelCodec {
    encode: |c| ((c.r as u32) << 24) | ((c.g as u32) << 16) | ((c.b as u32) << 8) | c.a as u32,
    decode: |v| Color::new((v >> 24) as u8, (v >> 16) as u8, (v >> 8) as u8, v as u8),
    invert_mask: 0xFFFF_FF00,
};

#[inline]
const fn expand3(v: u8) -> u8 {
    (v << 5) | (v << 2) | (v >> 1)
}

#[inline]
const fn expand5(v: u8) -> u8 {
    (v << 3) | (v >> 2)
}

#[inline]
const fn expand6(v: u8) -> u8 {
    (v << 2) | (v >> 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_is_idempotent() {
        let samples = [
            Color::BLACK,
            Color::WHITE,
            Color::RED,
            Color::rgb(0x12, 0x9A, 0xF3),
            Color::new(0x40, 0x80, 0xC0, 0x33),
        ];
        for mode in ColorMode::ALL {
            for c in samples {
                let q = c.quantized(mode);
                assert_eq!(q.quantized(mode), q, "{:?} {:?}", mode, c);
            }
        }
    }

    #[test]
    fn test_lossless_formats_keep_rgb() {
        let c = Color::rgb(0x12, 0x34, 0x56);
        assert_eq!(c.quantized(ColorMode::Format24bppRgb888), c);
        assert_eq!(c.quantized(ColorMode::Format24bppGrb888), c);
        let a = Color::new(1, 2, 3, 4);
        assert_eq!(a.quantized(ColorMode::Format32bppRgba8888), a);
    }

    #[test]
    fn test_extremes_survive_every_mode() {
        for mode in ColorMode::ALL {
            assert_eq!(Color::BLACK.quantized(mode), Color::BLACK, "{:?}", mode);
            assert_eq!(Color::WHITE.quantized(mode), Color::WHITE, "{:?}", mode);
        }
    }

    #[test]
    fn test_one_bit_threshold() {
        let mode = ColorMode::Format1bpp;
        assert_eq!(Color::gray(127).quantized(mode), Color::BLACK);
        assert_eq!(Color::gray(128).quantized(mode), Color::WHITE);
        assert_eq!(Color::BLUE.quantized(mode), Color::BLACK);
    }

    #[test]
    fn test_rgb565_encoding() {
        let codec = ColorMode::Format16bppRgb565.codec();
        assert_eq!((codec.encode)(Color::RED), 0xF800);
        assert_eq!((codec.encode)(Color::GREEN), 0x07E0);
        assert_eq!((codec.encode)(Color::BLUE), 0x001F);
    }

    #[test]
    fn test_row_stride_pads_each_row() {
        assert_eq!(ColorMode::Format1bpp.row_stride(17), 3);
        assert_eq!(ColorMode::Format4bppGray.row_stride(17), 9);
        assert_eq!(ColorMode::Format12bppRgb444.row_stride(17), 26);
        assert_eq!(ColorMode::Format18bppRgb666.row_stride(17), 51);
        assert_eq!(ColorMode::Format24bppRgb888.buffer_len(17, 3), 153);
    }

    #[test]
    fn test_embedded_graphics_conversions() {
        let c = Color::from(Rgb565::new(31, 0, 31));
        assert_eq!(c, Color::MAGENTA);
        let back: Rgb565 = Color::CYAN.into();
        assert_eq!(back, Rgb565::new(0, 63, 31));
        assert_eq!(Color::from(BinaryColor::On), Color::WHITE);
    }
}
