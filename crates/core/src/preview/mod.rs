//! Disk-backed preview cache.
//!
//! Previews are a pure function of (source image, [`RenderConfig`]), so the
//! cache is content-addressed: the file name is the [`CacheKey`] and nothing
//! else is recorded anywhere. Clearing the directory only costs latency.
//!
//! Layout: `<cache_dir>/previews/<key[0..2]>/<key>.<ext>`.
//!
//! Writes go to a temp file in the destination directory which is then
//! renamed over the final path, so readers never observe a partial file and
//! concurrent misses for the same key are harmless (identical bytes, last
//! rename wins). No lock is taken.

pub mod codec;
pub mod config;
pub mod key;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

use crate::normalize;

pub use config::{OutputFormat, RenderConfig, DEFAULT_QUALITY};
pub use key::CacheKey;

/// Subdirectory of the cache root holding preview entries.
pub const PREVIEWS_DIR: &str = "previews";

/// Prefix of in-flight temp files; never counted as cache entries.
const PARTIAL_PREFIX: &str = ".partial-";

/// Errors raised while producing a preview.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("Source image not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid normalization parameters: {0}")]
    InvalidParameters(String),

    #[error("Failed to encode preview: {0}")]
    EncodeFailure(String),

    #[error("Preview cache I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A rendered (or cached) preview ready to be served.
#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub key: CacheKey,
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
    /// `true` if served from disk without rendering.
    pub cache_hit: bool,
}

/// Entry count and size of the cache directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: u64,
    pub total_bytes: u64,
}

pub struct PreviewCache {
    root: PathBuf,
    renders: AtomicU64,
}

impl PreviewCache {
    /// Create a cache rooted at `<cache_dir>/previews`. Directories are
    /// created lazily on first write.
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            root: cache_dir.as_ref().join(PREVIEWS_DIR),
            renders: AtomicU64::new(0),
        }
    }

    /// Number of full renders (decode + normalize + encode) performed by
    /// this instance.
    pub fn render_count(&self) -> u64 {
        self.renders.load(Ordering::Relaxed)
    }

    /// Resolve `source` and derive its key for `config`.
    pub fn key_for(&self, source: &Path, config: &RenderConfig) -> Result<CacheKey, PreviewError> {
        let resolved = resolve_source(source)?;
        Ok(CacheKey::derive(&resolved, config))
    }

    /// Final on-disk location of an entry.
    pub fn entry_path(&self, key: &CacheKey, format: OutputFormat) -> PathBuf {
        self.root
            .join(key.shard())
            .join(format!("{key}.{}", format.extension()))
    }

    /// Return the stored preview for `source` under `config` without
    /// rendering. `Ok(None)` on a miss.
    pub fn get_cached(
        &self,
        source: &Path,
        config: &RenderConfig,
    ) -> Result<Option<PreviewImage>, PreviewError> {
        config.validate()?;
        let resolved = resolve_source(source)?;
        let key = CacheKey::derive(&resolved, config);
        self.read_entry(key, &resolved, config.format)
    }

    /// Return the preview for `source` under `config`, rendering and storing
    /// it first if absent.
    pub fn get_or_create(
        &self,
        source: &Path,
        config: &RenderConfig,
    ) -> Result<PreviewImage, PreviewError> {
        config.validate()?;
        let resolved = resolve_source(source)?;
        let key = CacheKey::derive(&resolved, config);
        if let Some(hit) = self.read_entry(key.clone(), &resolved, config.format)? {
            return Ok(hit);
        }
        let path = self.entry_path(&key, config.format);

        tracing::debug!(%key, source = %resolved.display(), "Preview cache miss");
        let started = Instant::now();
        let bytes = render(&resolved, config)?;
        self.renders.fetch_add(1, Ordering::Relaxed);
        write_atomically(&path, &bytes)?;
        tracing::info!(
            %key,
            source = %resolved.display(),
            format = %config.format,
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rendered preview"
        );

        Ok(PreviewImage {
            key,
            format: config.format,
            bytes,
            cache_hit: false,
        })
    }

    fn read_entry(
        &self,
        key: CacheKey,
        resolved: &Path,
        format: OutputFormat,
    ) -> Result<Option<PreviewImage>, PreviewError> {
        match fs::read(self.entry_path(&key, format)) {
            Ok(bytes) => {
                tracing::debug!(%key, source = %resolved.display(), "Preview cache hit");
                Ok(Some(PreviewImage {
                    key,
                    format,
                    bytes,
                    cache_hit: true,
                }))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PreviewError::Io(e)),
        }
    }

    /// Remove the entry for `source` under `config`. Returns `true` if a
    /// file was deleted.
    pub fn invalidate(&self, source: &Path, config: &RenderConfig) -> Result<bool, PreviewError> {
        let key = self.key_for(source, config)?;
        match fs::remove_file(self.entry_path(&key, config.format)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PreviewError::Io(e)),
        }
    }

    /// Delete every cached entry. Returns the number of entries removed.
    pub fn clear(&self) -> Result<u64, PreviewError> {
        let mut removed = 0;
        for shard in read_dir_if_exists(&self.root)? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            for entry in fs::read_dir(shard.path())? {
                let entry = entry?;
                if is_entry(&entry)? {
                    match fs::remove_file(entry.path()) {
                        Ok(()) => removed += 1,
                        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                        Err(e) => return Err(PreviewError::Io(e)),
                    }
                }
            }
            // Ignore failures: the shard may hold an in-flight temp file.
            let _ = fs::remove_dir(shard.path());
        }
        tracing::info!(removed, root = %self.root.display(), "Cleared preview cache");
        Ok(removed)
    }

    pub fn stats(&self) -> Result<CacheStats, PreviewError> {
        let mut stats = CacheStats::default();
        for shard in read_dir_if_exists(&self.root)? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            for entry in fs::read_dir(shard.path())? {
                let entry = entry?;
                if is_entry(&entry)? {
                    stats.entries += 1;
                    stats.total_bytes += entry.metadata()?.len();
                }
            }
        }
        Ok(stats)
    }
}

/// Canonicalize the source path; any failure means the source is unusable.
fn resolve_source(source: &Path) -> Result<PathBuf, PreviewError> {
    fs::canonicalize(source).map_err(|e| {
        tracing::warn!(source = %source.display(), error = %e, "Cannot resolve preview source");
        PreviewError::SourceNotFound {
            path: source.to_path_buf(),
        }
    })
}

fn render(resolved: &Path, config: &RenderConfig) -> Result<Vec<u8>, PreviewError> {
    let raw = fs::read(resolved).map_err(|e| {
        tracing::warn!(source = %resolved.display(), error = %e, "Cannot read preview source");
        PreviewError::SourceNotFound {
            path: resolved.to_path_buf(),
        }
    })?;
    let frame = normalize::decode_gray16(&raw)?;
    let gray = normalize::normalize(&frame, &config.normalization)?;
    codec::encode(&gray, config.format, config.quality)
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), PreviewError> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "cache entry has no parent"))?;
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::Builder::new()
        .prefix(PARTIAL_PREFIX)
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| PreviewError::Io(e.error))?;
    Ok(())
}

fn read_dir_if_exists(dir: &Path) -> Result<Vec<io::Result<fs::DirEntry>>, PreviewError> {
    match fs::read_dir(dir) {
        Ok(entries) => Ok(entries.collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(PreviewError::Io(e)),
    }
}

fn is_entry(entry: &fs::DirEntry) -> io::Result<bool> {
    Ok(entry.file_type()?.is_file() && !entry.file_name().to_string_lossy().starts_with(PARTIAL_PREFIX))
}
