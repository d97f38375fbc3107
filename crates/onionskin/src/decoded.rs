use image::{Rgba, RgbaImage};
use thiserror::Error;

/// Bytes per pixel in every buffer the engine handles (RGBA8).
pub const CHANNELS: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("image dimensions must be positive, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },

    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// An immutable RGBA8 raster, row-major, produced by the decode collaborator.
///
/// Width and height are always positive. The engine never mutates a
/// `DecodedImage` once built; sessions share them behind `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    buf: RgbaImage,
}

impl DecodedImage {
    /// Build from a raw RGBA buffer. The buffer length must be exactly
    /// `width * height * 4`.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::EmptyDimensions { width, height });
        }
        let expected = width as usize * height as usize * CHANNELS;
        let actual = pixels.len();
        // `from_raw` only accepts buffers that are at least large enough;
        // oversized ones are rejected too so the stride stays `width * 4`.
        match RgbaImage::from_raw(width, height, pixels) {
            Some(buf) if actual == expected => Ok(Self { buf }),
            _ => Err(ImageError::BufferLength {
                width,
                height,
                expected,
                actual,
            }),
        }
    }

    /// Wrap an already decoded `RgbaImage`.
    pub fn from_rgba(buf: RgbaImage) -> Result<Self, ImageError> {
        let (width, height) = buf.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageError::EmptyDimensions { width, height });
        }
        Ok(Self { buf })
    }

    /// A `width x height` image where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, ImageError> {
        Self::from_rgba(RgbaImage::from_pixel(width, height, Rgba(rgba)))
    }

    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buf.dimensions()
    }

    /// Row-major RGBA samples; the row stride is `width * 4` bytes.
    pub fn pixels(&self) -> &[u8] {
        self.buf.as_raw()
    }

    /// RGBA sample at `(x, y)`. Callers must stay in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.buf.get_pixel(x, y).0
    }
}
