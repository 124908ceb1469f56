//! Background image decoding.
//!
//! Raw bytes (embedded in the document or fetched from a URL) become a
//! [`DecodedImage`] through an [`ImageDecoder`]. [`RasterDecoder`] is the
//! default, backed by the `image` crate.

use std::fmt;

use crate::error::ImageDecodeError;

/// Decoded RGBA image ready for display.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel).
    pub rgba: Vec<u8>,
    /// Format the image was decoded from.
    pub format: ImageFormat,
}

impl DecodedImage {
    /// Whether the image has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// Pixel data is omitted; it can be megabytes.
impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// Source format of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// GIF (first frame).
    Gif,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }
}

/// Turns raw bytes into a displayable image.
pub trait ImageDecoder: Send + Sync {
    /// Decode `data` synchronously.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are empty or not a supported image.
    fn decode(&self, data: &[u8]) -> Result<DecodedImage, ImageDecodeError>;
}

/// Decoder for common raster formats, backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

impl ImageDecoder for RasterDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedImage, ImageDecodeError> {
        if data.is_empty() {
            return Err(ImageDecodeError::Empty);
        }

        let format = ImageFormat::from_magic_bytes(data);
        let img = image::load_from_memory(data)
            .map_err(|e| ImageDecodeError::Decode(e.to_string()))?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(DecodedImage {
            width,
            height,
            rgba: rgba.into_raw(),
            format,
        })
    }
}
