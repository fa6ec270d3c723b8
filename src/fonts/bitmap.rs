// Fixed-size 1-bit bitmap font types
//
// All data lives in flash (.rodata) via &'static references. Zero heap at
// runtime. Glyph bitmaps are packed 1-bit, MSB-first, row-major,
// ceil(width/8) bytes per row, glyphs stored back to back in ASCII order.

use embedded_graphics_core::geometry::Size;

pub struct BitmapFont {
    pub width: u8,
    pub height: u8,
    pub first_char: u8,
    pub last_char: u8,
    pub data: &'static [u8],
}

impl BitmapFont {
    #[inline]
    pub const fn row_bytes(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    #[inline]
    pub const fn glyph_len(&self) -> usize {
        self.row_bytes() * self.height as usize
    }

    pub fn contains(&self, ch: char) -> bool {
        let code = ch as u32;
        code >= self.first_char as u32 && code <= self.last_char as u32
    }

    /// Bitmap for `ch`; characters outside the table render as '?'.
    pub fn glyph(&self, ch: char) -> &'static [u8] {
        let ch = if self.contains(ch) { ch } else { '?' };
        let idx = (ch as u32).saturating_sub(self.first_char as u32) as usize;
        let len = self.glyph_len();
        let start = idx * len;
        self.data.get(start..start + len).unwrap_or(&[])
    }

    #[inline]
    pub fn is_set(&self, glyph: &[u8], x: u32, y: u32) -> bool {
        let idx = y as usize * self.row_bytes() + x as usize / 8;
        glyph
            .get(idx)
            .is_some_and(|b| b & (0x80 >> (x % 8)) != 0)
    }

    /// Lit pixel offsets of one glyph, row by row.
    pub fn pixels(&self, ch: char) -> impl Iterator<Item = (u32, u32)> + '_ {
        let glyph = self.glyph(ch);
        let (w, h) = (self.width as u32, self.height as u32);
        (0..h).flat_map(move |y| {
            (0..w).filter_map(move |x| self.is_set(glyph, x, y).then_some((x, y)))
        })
    }

    /// Size of `text` drawn at integer `scale`; monospace, no kerning.
    pub fn measure(&self, text: &str, scale: u32) -> Size {
        let scale = scale.max(1);
        let chars = text.chars().count() as u32;
        Size::new(
            chars * self.width as u32 * scale,
            self.height as u32 * scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::FONT_6X8;
    use super::*;

    #[test]
    fn test_table_covers_printable_ascii() {
        let font = &FONT_6X8;
        assert_eq!(font.data.len(), 95 * font.glyph_len());
        assert!(font.pixels(' ').next().is_none());
        assert!(font.pixels('~').count() > 0);
    }

    #[test]
    fn test_unknown_char_falls_back_to_question_mark() {
        let font = &FONT_6X8;
        assert_eq!(font.glyph('\u{e9}'), font.glyph('?'));
    }

    #[test]
    fn test_glyph_bits_match_letter_shape() {
        // 'I' is a vertical bar with serifs: column 2 lit on every row 0..7
        let font = &FONT_6X8;
        let glyph = font.glyph('I');
        for y in 0..7 {
            assert!(font.is_set(glyph, 2, y), "row {}", y);
        }
        assert!(!font.is_set(glyph, 5, 0));
    }

    #[test]
    fn test_measure_scales() {
        assert_eq!(FONT_6X8.measure("abc", 1), Size::new(18, 8));
        assert_eq!(FONT_6X8.measure("abc", 2), Size::new(36, 16));
        assert_eq!(FONT_6X8.measure("", 1), Size::new(0, 8));
    }
}
