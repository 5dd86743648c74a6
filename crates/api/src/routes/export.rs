use axum::routing::get;
use axum::Router;

use crate::handlers::export;
use crate::state::AppState;

/// Routes mounted at `/export`.
///
/// ```text
/// GET    /labels      -> export_labels
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/labels", get(export::export_labels))
}
