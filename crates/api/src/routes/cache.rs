use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::cache;
use crate::state::AppState;

/// Routes mounted at `/cache`.
///
/// ```text
/// DELETE /            -> clear_cache
/// GET    /stats       -> cache_stats
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", delete(cache::clear_cache))
        .route("/stats", get(cache::cache_stats))
}
