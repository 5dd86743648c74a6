/// Domain errors shared by the labeler crates.
///
/// Preview rendering has its own error type ([`crate::preview::PreviewError`])
/// because its variants map to distinct HTTP conditions.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Frame {index} not found in scan '{scan_id}'")]
    FrameNotFound { scan_id: String, index: i64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
