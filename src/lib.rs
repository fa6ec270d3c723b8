// Framebuffer, rasteriser and micro-layout for small displays
// (SPI/I2C TFT, OLED, e-paper). no_std + alloc; `std` adds file loading.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod buffer;
pub mod canvas;
pub mod color;
pub mod display;
pub mod error;
pub mod fonts;
pub mod image;
pub mod notify;
pub mod ui;

pub use buffer::{OutOfBounds, PixelBuffer};
pub use canvas::{Canvas, Rotation};
pub use color::{Color, ColorMode};
pub use display::{DisplayTarget, SpiDisplay, VirtualDisplay};
pub use error::{DecodeError, GraphicsError, Result};
pub use image::Image;
