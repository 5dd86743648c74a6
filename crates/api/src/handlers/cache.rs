//! Handlers for inspecting and clearing the preview cache.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClearCacheResult {
    pub removed: u64,
}

/// GET /api/v1/cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let stats = state.previews.stats().await?;

    Ok(Json(DataResponse { data: stats }))
}

/// DELETE /api/v1/cache
///
/// Delete every cached preview. Entries are re-rendered on next request.
pub async fn clear_cache(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let removed = state.previews.clear().await?;

    Ok(Json(DataResponse {
        data: ClearCacheResult { removed },
    }))
}
