//! Route definitions for frames addressed by id.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::bscans;
use crate::state::AppState;

/// Routes mounted at `/bscans`.
///
/// ```text
/// POST   /labels          -> bulk_update_labels
/// GET    /{id}            -> get_bscan
/// POST   /{id}/label      -> set_label
/// DELETE /{id}/label      -> clear_label
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/labels", post(bscans::bulk_update_labels))
        .route("/{id}", get(bscans::get_bscan))
        .route(
            "/{id}/label",
            post(bscans::set_label).delete(bscans::clear_label),
        )
}
