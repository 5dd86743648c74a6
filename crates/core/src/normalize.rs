//! 16-bit → 8-bit intensity normalization for B-scan previews.
//!
//! Everything in this module is pure: decoding works on an in-memory byte
//! slice and normalization maps one pixel buffer onto another. File access
//! lives in [`crate::preview`].

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageBuffer, ImageReader, Luma};
use serde::{Deserialize, Serialize};

use crate::preview::PreviewError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default lower percentile for [`Normalization::Percentile`].
pub const DEFAULT_PERCENTILE_LOW: f64 = 1.0;

/// Default upper percentile for [`Normalization::Percentile`].
pub const DEFAULT_PERCENTILE_HIGH: f64 = 99.0;

/// Default lower bound for [`Normalization::FixedWindow`].
pub const DEFAULT_WINDOW_MIN: u16 = 0;

/// Default upper bound for [`Normalization::FixedWindow`].
pub const DEFAULT_WINDOW_MAX: u16 = u16::MAX;

/// Output value used when the intensity window collapses to a single value.
pub const MID_GRAY: u8 = 128;

/// Single-channel 16-bit source image.
pub type Gray16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

// ---------------------------------------------------------------------------
// Normalization method
// ---------------------------------------------------------------------------

/// Windowing policy applied when converting a source frame to 8 bits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Normalization {
    /// Clip to the `low`..`high` percentile intensities of each image.
    Percentile { low: f64, high: f64 },
    /// Clip to a fixed `min`..`max` intensity window shared by all images.
    FixedWindow { min: u16, max: u16 },
}

impl Default for Normalization {
    fn default() -> Self {
        Self::Percentile {
            low: DEFAULT_PERCENTILE_LOW,
            high: DEFAULT_PERCENTILE_HIGH,
        }
    }
}

impl Normalization {
    /// Build a normalization from its configuration name and parameters.
    ///
    /// Only the parameters belonging to the chosen method are used.
    pub fn from_config(
        method: &str,
        percentile_low: f64,
        percentile_high: f64,
        window_min: u16,
        window_max: u16,
    ) -> Result<Self, PreviewError> {
        let normalization = match method.trim().to_ascii_lowercase().as_str() {
            "percentile" => Self::Percentile {
                low: percentile_low,
                high: percentile_high,
            },
            "fixed_window" => Self::FixedWindow {
                min: window_min,
                max: window_max,
            },
            other => {
                return Err(PreviewError::InvalidParameters(format!(
                    "Unknown normalization method '{other}'. Must be one of: percentile, fixed_window"
                )))
            }
        };
        normalization.validate()?;
        Ok(normalization)
    }

    /// Configuration name of the method.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Percentile { .. } => "percentile",
            Self::FixedWindow { .. } => "fixed_window",
        }
    }

    /// Check the method parameters.
    ///
    /// Percentile bounds must be finite, within `[0, 100]` and strictly
    /// increasing; a fixed window must satisfy `min < max`.
    pub fn validate(&self) -> Result<(), PreviewError> {
        match *self {
            Self::Percentile { low, high } => {
                for (name, value) in [("low", low), ("high", high)] {
                    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                        return Err(PreviewError::InvalidParameters(format!(
                            "Percentile {name} bound {value} must be within [0, 100]"
                        )));
                    }
                }
                if low >= high {
                    return Err(PreviewError::InvalidParameters(format!(
                        "Percentile low bound {low} must be below high bound {high}"
                    )));
                }
                Ok(())
            }
            Self::FixedWindow { min, max } => {
                if min >= max {
                    return Err(PreviewError::InvalidParameters(format!(
                        "Window minimum {min} must be below window maximum {max}"
                    )));
                }
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode an encoded source frame into a single-channel 16-bit buffer.
///
/// 8-bit grayscale sources keep their raw values (0–255) rather than being
/// rescaled. Colour-typed images are accepted only when every pixel has equal
/// red, green and blue components; alpha is ignored.
pub fn decode_gray16(bytes: &[u8]) -> Result<Gray16Image, PreviewError> {
    let decoded = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PreviewError::UnsupportedFormat(e.to_string()))?
        .decode()
        .map_err(|e| PreviewError::UnsupportedFormat(e.to_string()))?;

    match decoded {
        DynamicImage::ImageLuma16(img) => Ok(img),
        DynamicImage::ImageLuma8(img) => {
            let (width, height) = img.dimensions();
            buffer_from(width, height, img.into_raw().into_iter().map(u16::from).collect())
        }
        DynamicImage::ImageLumaA8(img) => {
            let (width, height) = img.dimensions();
            let data = img.pixels().map(|p| u16::from(p.0[0])).collect();
            buffer_from(width, height, data)
        }
        DynamicImage::ImageLumaA16(img) => {
            let (width, height) = img.dimensions();
            let data = img.pixels().map(|p| p.0[0]).collect();
            buffer_from(width, height, data)
        }
        DynamicImage::ImageRgb8(img) => {
            let (width, height) = img.dimensions();
            let data = gray_channel(img.pixels().map(|p| p.0))?;
            buffer_from(width, height, data.into_iter().map(u16::from).collect())
        }
        DynamicImage::ImageRgba8(img) => {
            let (width, height) = img.dimensions();
            let data = gray_channel(img.pixels().map(|p| [p.0[0], p.0[1], p.0[2]]))?;
            buffer_from(width, height, data.into_iter().map(u16::from).collect())
        }
        DynamicImage::ImageRgb16(img) => {
            let (width, height) = img.dimensions();
            let data = gray_channel(img.pixels().map(|p| p.0))?;
            buffer_from(width, height, data)
        }
        DynamicImage::ImageRgba16(img) => {
            let (width, height) = img.dimensions();
            let data = gray_channel(img.pixels().map(|p| [p.0[0], p.0[1], p.0[2]]))?;
            buffer_from(width, height, data)
        }
        other => Err(PreviewError::UnsupportedFormat(format!(
            "Unsupported pixel layout {:?}; expected a single-channel integer image",
            other.color()
        ))),
    }
}

fn buffer_from(width: u32, height: u32, data: Vec<u16>) -> Result<Gray16Image, PreviewError> {
    Gray16Image::from_raw(width, height, data).ok_or_else(|| {
        PreviewError::UnsupportedFormat(format!("Pixel buffer does not match {width}x{height}"))
    })
}

/// Collapse RGB triplets into one channel, failing on the first non-gray pixel.
fn gray_channel<T: Copy + PartialEq>(
    pixels: impl Iterator<Item = [T; 3]>,
) -> Result<Vec<T>, PreviewError> {
    pixels
        .map(|[r, g, b]| {
            if r == g && g == b {
                Ok(r)
            } else {
                Err(PreviewError::UnsupportedFormat(
                    "Image has distinct colour channels; expected a single-channel image".into(),
                ))
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Map a 16-bit image onto 8 bits with the given windowing policy.
///
/// Values below the window map to 0, values above to 255, values inside are
/// rescaled linearly (fractional results truncate). A window whose bounds
/// coincide produces a constant [`MID_GRAY`] image.
pub fn normalize(image: &Gray16Image, method: &Normalization) -> Result<GrayImage, PreviewError> {
    method.validate()?;
    let (width, height) = image.dimensions();
    let len = width as usize * height as usize;
    let pixels = image.as_raw().get(..len).ok_or_else(|| {
        PreviewError::UnsupportedFormat(format!("Pixel buffer does not match {width}x{height}"))
    })?;
    if pixels.is_empty() {
        return Ok(GrayImage::new(width, height));
    }

    let (low, high) = match *method {
        Normalization::Percentile { low, high } => percentile_bounds(pixels, low, high),
        Normalization::FixedWindow { min, max } => (f64::from(min), f64::from(max)),
    };

    let table = lookup_table(low, high);
    let data = pixels.iter().map(|&v| table[v as usize]).collect();
    GrayImage::from_raw(width, height, data).ok_or_else(|| {
        PreviewError::UnsupportedFormat(format!("Pixel buffer does not match {width}x{height}"))
    })
}

/// Build the full 16-bit → 8-bit mapping for one window.
fn lookup_table(low: f64, high: f64) -> Vec<u8> {
    let span = high - low;
    if span <= 0.0 {
        return vec![MID_GRAY; 1 << 16];
    }
    (0..=u16::MAX)
        .map(|v| {
            let scaled = (f64::from(v) - low) / span * 255.0;
            scaled.clamp(0.0, 255.0) as u8
        })
        .collect()
}

/// Low and high percentile intensities, linearly interpolated between the
/// neighbouring order statistics.
fn percentile_bounds(pixels: &[u16], low: f64, high: f64) -> (f64, f64) {
    let mut histogram = vec![0u64; 1 << 16];
    for &p in pixels {
        histogram[p as usize] += 1;
    }
    let count = pixels.len() as u64;
    (
        percentile(&histogram, count, low),
        percentile(&histogram, count, high),
    )
}

fn percentile(histogram: &[u64], count: u64, pct: f64) -> f64 {
    let rank = pct / 100.0 * (count - 1) as f64;
    let lower = rank.floor() as u64;
    let upper = rank.ceil() as u64;
    let a = order_statistic(histogram, lower);
    if upper == lower {
        return a;
    }
    let b = order_statistic(histogram, upper);
    a + (b - a) * (rank - lower as f64)
}

/// Value of the `n`-th smallest pixel (0-based).
fn order_statistic(histogram: &[u64], n: u64) -> f64 {
    let mut seen = 0u64;
    for (value, &c) in histogram.iter().enumerate() {
        seen += c;
        if seen > n {
            return value as f64;
        }
    }
    f64::from(u16::MAX)
}
