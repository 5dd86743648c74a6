//! Encoding of normalized 8-bit frames.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder};

use super::config::OutputFormat;
use super::PreviewError;

/// Encode a grayscale frame.
///
/// `quality` applies to JPEG only (the encoder's floor is 1). PNG and WebP
/// output is lossless.
pub fn encode(image: &GrayImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>, PreviewError> {
    let (width, height) = image.dimensions();
    let mut buf = Vec::new();
    let result = match format {
        OutputFormat::Png => {
            PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive)
                .write_image(image.as_raw(), width, height, ExtendedColorType::L8)
        }
        OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
            .write_image(image.as_raw(), width, height, ExtendedColorType::L8),
        OutputFormat::Webp => WebPEncoder::new_lossless(&mut buf).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::L8,
        ),
    };
    result.map_err(|e| PreviewError::EncodeFailure(format!("{format} encoder: {e}")))?;
    Ok(buf)
}
