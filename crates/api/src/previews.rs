//! Bounded preview rendering for request handlers.
//!
//! [`PreviewCache`] is synchronous (file I/O plus CPU-heavy decoding), so
//! every call runs on the blocking pool. A semaphore caps concurrent renders
//! at `PREVIEW_WORKERS` so navigation and stats requests keep their share of
//! the runtime, and each render is bounded by `PREVIEW_TIMEOUT_SECS`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bscan_core::preview::{CacheStats, PreviewCache, PreviewError, PreviewImage, RenderConfig};
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::config::ServerConfig;

/// Snapshot returned by `GET /api/v1/cache/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewCacheStats {
    #[serde(flatten)]
    pub disk: CacheStats,
    /// Renders performed since startup.
    pub renders: u64,
    pub format: &'static str,
}

pub struct PreviewService {
    cache: Arc<PreviewCache>,
    render: RenderConfig,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl PreviewService {
    pub fn new(
        cache: PreviewCache,
        render: RenderConfig,
        workers: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            cache: Arc::new(cache),
            render,
            permits: Arc::new(Semaphore::new(workers.max(1))),
            timeout,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            PreviewCache::new(&config.cache_dir),
            config.render,
            config.preview_workers,
            Duration::from_secs(config.preview_timeout_secs),
        )
    }

    pub fn render_config(&self) -> &RenderConfig {
        &self.render
    }

    /// Fetch or render the preview of `source`.
    ///
    /// Cache hits are read without a worker slot. A miss waits for a slot and
    /// renders under one `PREVIEW_TIMEOUT_SECS` deadline covering both. The
    /// permit travels with the blocking job, so a render that outlives its
    /// deadline still counts against the worker limit until it finishes.
    pub async fn get_or_create(&self, source: PathBuf) -> Result<PreviewImage, PreviewError> {
        let cache = Arc::clone(&self.cache);
        let render = self.render;
        let lookup = source.clone();
        if let Some(hit) = run_blocking(move || cache.get_cached(&lookup, &render)).await? {
            return Ok(hit);
        }

        let permits = Arc::clone(&self.permits);
        let cache = Arc::clone(&self.cache);
        let bounded = async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|_| PreviewError::EncodeFailure("Preview workers shut down".into()))?;
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                cache.get_or_create(&source, &render)
            })
            .await
            .map_err(|join_err| {
                tracing::error!(error = %join_err, "Preview render task failed");
                PreviewError::EncodeFailure("Preview render task failed".into())
            })?
        };

        match tokio::time::timeout(self.timeout, bounded).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "Preview render timed out");
                Err(PreviewError::EncodeFailure(format!(
                    "Preview render timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
        }
    }

    /// Drop the cached preview of `source`, if any.
    pub async fn invalidate(&self, source: PathBuf) -> Result<bool, PreviewError> {
        let cache = Arc::clone(&self.cache);
        let render = self.render;
        run_blocking(move || cache.invalidate(&source, &render)).await
    }

    pub async fn clear(&self) -> Result<u64, PreviewError> {
        let cache = Arc::clone(&self.cache);
        run_blocking(move || cache.clear()).await
    }

    pub async fn stats(&self) -> Result<PreviewCacheStats, PreviewError> {
        let cache = Arc::clone(&self.cache);
        let disk = run_blocking(move || cache.stats()).await?;
        Ok(PreviewCacheStats {
            disk,
            renders: self.cache.render_count(),
            format: self.render.format.name(),
        })
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, PreviewError>
where
    F: FnOnce() -> Result<T, PreviewError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PreviewError::Io(std::io::Error::other(e.to_string())))?
}
