//! Lossy JPEG recompression using the image crate

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::ImageEncoder as _;

use super::error::OptimizeError;

/// Re-encodes a raster image at a lower quality
pub trait Recompressor: Send + Sync {
    fn recompress(&self, payload: &[u8], quality: u8) -> Result<Vec<u8>, OptimizeError>;
}

/// Decodes any supported raster format and re-encodes it as baseline JPEG
#[derive(Debug, Clone, Default)]
pub struct JpegRecompressor;

impl Recompressor for JpegRecompressor {
    fn recompress(&self, payload: &[u8], quality: u8) -> Result<Vec<u8>, OptimizeError> {
        let decoded = image::load_from_memory(payload).map_err(|e| OptimizeError::DecodeFailed {
            message: e.to_string(),
        })?;

        // JPEG has no alpha channel
        let rgb = decoded.to_rgb8();

        let mut output = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100))
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), image::ColorType::Rgb8)
            .map_err(|e| OptimizeError::EncodeFailed {
                message: e.to_string(),
            })?;

        Ok(output.into_inner())
    }
}
