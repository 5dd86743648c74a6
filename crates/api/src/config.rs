use std::path::PathBuf;

use bscan_core::normalize::Normalization;
use bscan_core::preview::{OutputFormat, RenderConfig};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. Invalid values
/// abort startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// SQLite database URL.
    pub database_url: String,
    /// Root directory that scan imports are confined to.
    pub scans_dir: PathBuf,
    /// Root of the on-disk preview cache.
    pub cache_dir: PathBuf,
    /// Format, quality and normalization used for every preview.
    pub render: RenderConfig,
    /// Maximum number of previews rendered concurrently.
    pub preview_workers: usize,
    /// Upper bound on a single preview render, in seconds.
    pub preview_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                                      |
    /// |---------------------------|----------------------------------------------|
    /// | `HOST`                    | `0.0.0.0`                                    |
    /// | `PORT`                    | `8000`                                       |
    /// | `CORS_ORIGINS`            | `http://localhost:5173,http://localhost:3000,http://localhost` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                                         |
    /// | `DATABASE_URL`            | `sqlite://./data/database/bscan_labeler.db`  |
    /// | `SCANS_DIR`               | `./data/scans`                               |
    /// | `CACHE_DIR`               | `./data/cache`                               |
    /// | `PREVIEW_FORMAT`          | `webp`                                       |
    /// | `PREVIEW_QUALITY`         | `85`                                         |
    /// | `NORMALIZATION_METHOD`    | `percentile`                                 |
    /// | `PERCENTILE_LOW`          | `1.0`                                        |
    /// | `PERCENTILE_HIGH`         | `99.0`                                       |
    /// | `WINDOW_MIN`              | `0`                                          |
    /// | `WINDOW_MAX`              | `65535`                                      |
    /// | `PREVIEW_WORKERS`         | number of CPUs                               |
    /// | `PREVIEW_TIMEOUT_SECS`    | `30`                                         |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| {
                "http://localhost:5173,http://localhost:3000,http://localhost".into()
            })
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/database/bscan_labeler.db".into());

        let scans_dir =
            PathBuf::from(std::env::var("SCANS_DIR").unwrap_or_else(|_| "./data/scans".into()));
        let cache_dir =
            PathBuf::from(std::env::var("CACHE_DIR").unwrap_or_else(|_| "./data/cache".into()));

        let render = render_config_from_env();

        let preview_workers: usize = match std::env::var("PREVIEW_WORKERS") {
            Ok(v) => v
                .parse::<usize>()
                .expect("PREVIEW_WORKERS must be a valid usize")
                .max(1),
            Err(_) => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        };

        let preview_timeout_secs: u64 = std::env::var("PREVIEW_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("PREVIEW_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            scans_dir,
            cache_dir,
            render,
            preview_workers,
            preview_timeout_secs,
        }
    }
}

fn render_config_from_env() -> RenderConfig {
    let format: OutputFormat = std::env::var("PREVIEW_FORMAT")
        .unwrap_or_else(|_| "webp".into())
        .parse()
        .unwrap_or_else(|e| panic!("Invalid PREVIEW_FORMAT: {e}"));

    let quality: u8 = std::env::var("PREVIEW_QUALITY")
        .unwrap_or_else(|_| "85".into())
        .parse()
        .expect("PREVIEW_QUALITY must be an integer between 0 and 100");

    let method = std::env::var("NORMALIZATION_METHOD").unwrap_or_else(|_| "percentile".into());
    let percentile_low: f64 = std::env::var("PERCENTILE_LOW")
        .unwrap_or_else(|_| "1.0".into())
        .parse()
        .expect("PERCENTILE_LOW must be a number");
    let percentile_high: f64 = std::env::var("PERCENTILE_HIGH")
        .unwrap_or_else(|_| "99.0".into())
        .parse()
        .expect("PERCENTILE_HIGH must be a number");
    let window_min: u16 = std::env::var("WINDOW_MIN")
        .unwrap_or_else(|_| "0".into())
        .parse()
        .expect("WINDOW_MIN must be a valid u16");
    let window_max: u16 = std::env::var("WINDOW_MAX")
        .unwrap_or_else(|_| "65535".into())
        .parse()
        .expect("WINDOW_MAX must be a valid u16");

    let normalization = Normalization::from_config(
        &method,
        percentile_low,
        percentile_high,
        window_min,
        window_max,
    )
    .unwrap_or_else(|e| panic!("Invalid normalization settings: {e}"));

    let render = RenderConfig {
        format,
        quality,
        normalization,
    };
    render
        .validate()
        .unwrap_or_else(|e| panic!("Invalid preview settings: {e}"));
    render
}
