//! HEIC/HEIF to JPEG transcoding
//!
//! Thin binding over libheif: decode the primary image to interleaved RGB
//! and re-encode it as a lossy JPEG. Built without the `heic` feature the
//! type still exists but its constructor reports the capability as missing,
//! which the pipeline surfaces as an error tile.

use crate::error::{PipelineError, Result};

pub struct Transcoder {
    _private: (),
}

#[cfg(feature = "heic")]
impl Transcoder {
    pub fn new() -> Result<Self> {
        Ok(Self { _private: () })
    }

    /// Decode HEIC/HEIF bytes and re-encode as JPEG at the given quality.
    pub fn to_jpeg(&self, data: &[u8], quality: u8) -> Result<Vec<u8>> {
        use image::ImageEncoder;
        use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

        let lib = LibHeif::new();
        let ctx = HeifContext::read_from_bytes(data)
            .map_err(|e| PipelineError::TranscodeFailed(e.to_string()))?;
        let handle = ctx
            .primary_image_handle()
            .map_err(|e| PipelineError::TranscodeFailed(e.to_string()))?;
        let decoded = lib
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
            .map_err(|e| PipelineError::TranscodeFailed(e.to_string()))?;

        let planes = decoded.planes();
        let plane = planes.interleaved.ok_or_else(|| {
            PipelineError::TranscodeFailed("no interleaved RGB plane".to_string())
        })?;

        let width = plane.width as usize;
        let height = plane.height as usize;
        let mut rgb = Vec::with_capacity(width * height * 3);
        for row in 0..height {
            let start = row * plane.stride;
            rgb.extend_from_slice(&plane.data[start..start + width * 3]);
        }

        let mut jpeg = Vec::new();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, quality);
        encoder
            .write_image(
                &rgb,
                plane.width,
                plane.height,
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| PipelineError::TranscodeFailed(e.to_string()))?;

        Ok(jpeg)
    }
}

#[cfg(not(feature = "heic"))]
impl Transcoder {
    pub fn new() -> Result<Self> {
        Err(PipelineError::TranscoderUnavailable(
            "built without the `heic` feature".to_string(),
        ))
    }

    pub fn to_jpeg(&self, _data: &[u8], _quality: u8) -> Result<Vec<u8>> {
        Err(PipelineError::TranscoderUnavailable(
            "built without the `heic` feature".to_string(),
        ))
    }
}
