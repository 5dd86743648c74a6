use std::sync::Arc;

use crate::config::ServerConfig;
use crate::previews::PreviewService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: bscan_db::DbPool,
    /// Server configuration (scans root for imports, CORS, timeouts).
    pub config: Arc<ServerConfig>,
    /// Preview cache with bounded rendering.
    pub previews: Arc<PreviewService>,
}

impl AppState {
    pub fn new(pool: bscan_db::DbPool, config: ServerConfig) -> Self {
        let previews = Arc::new(PreviewService::from_config(&config));
        Self {
            pool,
            config: Arc::new(config),
            previews,
        }
    }
}
