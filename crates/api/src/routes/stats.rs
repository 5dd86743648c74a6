use axum::routing::get;
use axum::Router;

use crate::handlers::stats;
use crate::state::AppState;

/// Routes mounted at `/stats`.
///
/// ```text
/// GET    /            -> global_stats
/// GET    /summary     -> stats_summary
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(stats::global_stats))
        .route("/summary", get(stats::stats_summary))
}
