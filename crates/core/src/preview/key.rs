//! Content-addressed cache keys.

use std::path::Path;

use sha2::{Digest, Sha256};

use super::config::RenderConfig;
use crate::normalize::Normalization;

/// Bump when the rendering pipeline changes output for identical inputs.
const KEY_VERSION: &str = "bscan-preview/v1";

/// SHA-256 hex digest identifying one rendered preview.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for an already-resolved absolute source path.
    ///
    /// Every field is written as `name=value` on its own line; the raw path
    /// bytes are length-prefixed so no two distinct inputs share a
    /// description.
    pub fn derive(resolved_source: &Path, config: &RenderConfig) -> Self {
        let source = resolved_source.as_os_str().as_encoded_bytes();
        let mut hasher = Sha256::new();
        hasher.update(format!("{KEY_VERSION}\nsource={}:", source.len()));
        hasher.update(source);

        let mut fields = format!("\nmethod={}\n", config.normalization.method_name());
        match config.normalization {
            Normalization::Percentile { low, high } => {
                fields.push_str(&format!("low={low}\nhigh={high}\n"));
            }
            Normalization::FixedWindow { min, max } => {
                fields.push_str(&format!("min={min}\nmax={max}\n"));
            }
        }
        fields.push_str(&format!(
            "format={}\nquality={}\n",
            config.format.name(),
            config.quality
        ));
        hasher.update(fields);

        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-character shard directory name.
    pub fn shard(&self) -> &str {
        &self.0[..2]
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::OutputFormat;

    fn key(path: &str, config: &RenderConfig) -> CacheKey {
        CacheKey::derive(Path::new(path), config)
    }

    #[test]
    fn key_is_deterministic_hex() {
        let config = RenderConfig::default();
        let a = key("/data/scans/S1/1.png", &config);
        assert_eq!(a, key("/data/scans/S1/1.png", &config));
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a.shard(), &a.as_str()[..2]);
    }

    #[test]
    fn every_config_field_changes_the_key() {
        let base = RenderConfig::default();
        let variants = [
            RenderConfig {
                format: OutputFormat::Png,
                ..base
            },
            RenderConfig {
                quality: 90,
                ..base
            },
            RenderConfig {
                normalization: Normalization::Percentile {
                    low: 2.0,
                    high: 99.0,
                },
                ..base
            },
            RenderConfig {
                normalization: Normalization::Percentile {
                    low: 1.0,
                    high: 98.5,
                },
                ..base
            },
            RenderConfig {
                normalization: Normalization::FixedWindow { min: 1, max: 99 },
                ..base
            },
        ];
        let base_key = key("/a.png", &base);
        for variant in &variants {
            assert_ne!(key("/a.png", variant), base_key, "{variant:?}");
        }
        assert_ne!(key("/b.png", &base), base_key);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_get_distinct_keys() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let config = RenderConfig::default();
        let a = CacheKey::derive(Path::new(OsStr::from_bytes(b"/scans/\xff.png")), &config);
        let b = CacheKey::derive(Path::new(OsStr::from_bytes(b"/scans/\xfe.png")), &config);
        assert_ne!(a, b);
    }
}
