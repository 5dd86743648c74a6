//! Render configuration: output encoding plus normalization policy.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PreviewError;
use crate::normalize::Normalization;

/// Default quality for lossy encodings.
pub const DEFAULT_QUALITY: u8 = 85;

/// Encoded preview format served to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Webp,
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    /// File extension used for cache entries.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// MIME type for the `Content-Type` header.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Webp => "image/webp",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = PreviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webp" => Ok(Self::Webp),
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            other => Err(PreviewError::EncodeFailure(format!(
                "Unsupported output format '{other}'. Must be one of: webp, png, jpeg"
            ))),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything besides the source image that determines a preview's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub format: OutputFormat,
    /// Encoder quality, 0–100.
    pub quality: u8,
    pub normalization: Normalization,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Webp,
            quality: DEFAULT_QUALITY,
            normalization: Normalization::default(),
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), PreviewError> {
        if self.quality > 100 {
            return Err(PreviewError::InvalidParameters(format!(
                "Quality {} must be within [0, 100]",
                self.quality
            )));
        }
        self.normalization.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_formats_and_aliases() {
        assert_eq!("webp".parse::<OutputFormat>().unwrap(), OutputFormat::Webp);
        assert_eq!(" PNG ".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!("jpg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_matches!(
            "gif".parse::<OutputFormat>(),
            Err(PreviewError::EncodeFailure(_))
        );
    }

    #[test]
    fn content_types_match_format() {
        assert_eq!(OutputFormat::Webp.content_type(), "image/webp");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
    }

    #[test]
    fn quality_above_100_is_invalid() {
        let config = RenderConfig {
            quality: 101,
            ..RenderConfig::default()
        };
        assert_matches!(config.validate(), Err(PreviewError::InvalidParameters(_)));
        assert!(RenderConfig::default().validate().is_ok());
    }
}
