//! Sequential and unlabeled-only navigation between frames of a scan.
//!
//! The resolver never loads a scan's frame list. It asks a [`FrameLookup`]
//! for point answers ("largest index below 7", "first unlabeled index above
//! 7"), which the database answers with indexed `ORDER BY .. LIMIT 1`
//! queries.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::BScanIndex;

/// Ordered per-scan index space of B-scans.
#[async_trait]
pub trait FrameLookup: Send + Sync {
    type Error: Send;

    async fn frame_exists(&self, scan_id: &str, index: BScanIndex) -> Result<bool, Self::Error>;

    /// Largest existing index strictly below `index`.
    async fn previous_index(
        &self,
        scan_id: &str,
        index: BScanIndex,
    ) -> Result<Option<BScanIndex>, Self::Error>;

    /// Smallest existing index strictly above `index`.
    async fn next_index(
        &self,
        scan_id: &str,
        index: BScanIndex,
    ) -> Result<Option<BScanIndex>, Self::Error>;

    /// Smallest unlabeled index strictly above `index`. Does not wrap.
    async fn next_unlabeled_index(
        &self,
        scan_id: &str,
        index: BScanIndex,
    ) -> Result<Option<BScanIndex>, Self::Error>;
}

/// Navigation pointers around one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameNeighbors {
    pub prev_index: Option<BScanIndex>,
    pub next_index: Option<BScanIndex>,
    pub next_unlabeled_index: Option<BScanIndex>,
}

#[derive(Debug, thiserror::Error)]
pub enum NavigationError<E> {
    #[error("Frame {index} not found in scan '{scan_id}'")]
    FrameNotFound { scan_id: String, index: BScanIndex },

    #[error("Frame lookup failed")]
    Lookup(E),
}

impl<E> NavigationError<E> {
    /// Split into a domain error or the underlying lookup error.
    pub fn into_parts(self) -> Result<CoreError, E> {
        match self {
            Self::FrameNotFound { scan_id, index } => Ok(CoreError::FrameNotFound { scan_id, index }),
            Self::Lookup(e) => Err(e),
        }
    }
}

/// Compute prev / next / next-unlabeled for `index` in `scan_id`.
///
/// Fails with [`NavigationError::FrameNotFound`] if the scan has no frame at
/// `index`.
pub async fn resolve<L: FrameLookup + ?Sized>(
    frames: &L,
    scan_id: &str,
    index: BScanIndex,
) -> Result<FrameNeighbors, NavigationError<L::Error>> {
    if !frames
        .frame_exists(scan_id, index)
        .await
        .map_err(NavigationError::Lookup)?
    {
        return Err(NavigationError::FrameNotFound {
            scan_id: scan_id.to_string(),
            index,
        });
    }

    let prev_index = frames
        .previous_index(scan_id, index)
        .await
        .map_err(NavigationError::Lookup)?;
    let next_index = frames
        .next_index(scan_id, index)
        .await
        .map_err(NavigationError::Lookup)?;
    let next_unlabeled_index = frames
        .next_unlabeled_index(scan_id, index)
        .await
        .map_err(NavigationError::Lookup)?;

    Ok(FrameNeighbors {
        prev_index,
        next_index,
        next_unlabeled_index,
    })
}
