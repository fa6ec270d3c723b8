// Decoded raster images.
//
// An Image is a PixelBuffer plus the bit depth of the file it came from.
// Resources compiled into the binary go through `Image::from_bmp` with
// `include_bytes!`; `load_from_file` needs the `std` feature.

mod bmp;

use crate::buffer::PixelBuffer;
use crate::error::Result;

#[derive(Clone, Debug)]
pub struct Image {
    buffer: PixelBuffer,
    bits_per_pixel: u16,
}

impl Image {
    /// Decode a BMP file held in memory.
    pub fn from_bmp(bytes: &[u8]) -> Result<Self> {
        let (buffer, bits_per_pixel) = bmp::decode(bytes)?;
        Ok(Self {
            buffer,
            bits_per_pixel,
        })
    }

    /// Wrap an existing buffer; the depth is the buffer's own.
    pub fn from_buffer(buffer: PixelBuffer) -> Self {
        let bits_per_pixel = buffer.mode().bits_per_pixel() as u16;
        Self {
            buffer,
            bits_per_pixel,
        }
    }

    #[cfg(feature = "std")]
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> core::result::Result<Self, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(LoadError::Io)?;
        log::info!("[BMP] loading {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::from_bmp(&bytes)?)
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Depth of the source file, not of the decoded buffer.
    pub fn bits_per_pixel(&self) -> u16 {
        self.bits_per_pixel
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn into_buffer(self) -> PixelBuffer {
        self.buffer
    }
}

#[cfg(feature = "std")]
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Graphics(crate::error::GraphicsError),
}

#[cfg(feature = "std")]
impl core::fmt::Display for LoadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "image read failed: {}", e),
            LoadError::Graphics(e) => write!(f, "image decode failed: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            LoadError::Graphics(e) => Some(e),
        }
    }
}

#[cfg(feature = "std")]
impl From<crate::error::GraphicsError> for LoadError {
    fn from(e: crate::error::GraphicsError) -> Self {
        LoadError::Graphics(e)
    }
}
