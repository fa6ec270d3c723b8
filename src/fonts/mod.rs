// Monospace bitmap fonts for DrawText.
// Tables are static; glyphs are looked up by ASCII code at draw time.

pub mod bitmap;
mod font_6x8;

pub use bitmap::BitmapFont;
pub use font_6x8::FONT_6X8;
