// Error types shared by buffers, canvas and the image decoder.
// Bus failures are not here; each DisplayTarget names its own error.

use core::fmt;

use crate::color::ColorMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicsError {
    /// Width or height of zero at buffer creation.
    InvalidDimension { width: u32, height: u32 },
    /// The requested operation has no implementation for this format.
    UnsupportedColorMode(ColorMode),
    /// Pixel outside the buffer; only raised under `OutOfBounds::Error`.
    OutOfBounds { x: i32, y: i32 },
    /// Malformed or unsupported image data.
    Decode(DecodeError),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::InvalidDimension { width, height } => {
                write!(f, "invalid buffer dimension {}x{}", width, height)
            }
            GraphicsError::UnsupportedColorMode(mode) => {
                write!(f, "unsupported color mode {:?}", mode)
            }
            GraphicsError::OutOfBounds { x, y } => write!(f, "pixel ({}, {}) out of bounds", x, y),
            GraphicsError::Decode(e) => write!(f, "image decode failed: {}", e),
        }
    }
}

impl core::error::Error for GraphicsError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            GraphicsError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for GraphicsError {
    fn from(e: DecodeError) -> Self {
        GraphicsError::Decode(e)
    }
}

/// Reasons a BMP stream is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Missing "BM" magic.
    InvalidSignature,
    /// Data ends before a header, palette or pixel row.
    Truncated,
    /// DIB header size we do not parse.
    UnsupportedHeader(u32),
    UnsupportedBitDepth(u16),
    UnsupportedCompression(u32),
    /// Zero or absurd width/height in the header.
    InvalidDimension,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidSignature => write!(f, "not a BMP file (missing BM signature)"),
            DecodeError::Truncated => write!(f, "unexpected end of BMP data"),
            DecodeError::UnsupportedHeader(size) => {
                write!(f, "unsupported DIB header size {}", size)
            }
            DecodeError::UnsupportedBitDepth(bpp) => write!(f, "unsupported bit depth {}", bpp),
            DecodeError::UnsupportedCompression(c) => {
                write!(f, "unsupported compression method {}", c)
            }
            DecodeError::InvalidDimension => write!(f, "invalid image dimensions"),
        }
    }
}

impl core::error::Error for DecodeError {}

pub type Result<T> = core::result::Result<T, GraphicsError>;
