//! Database-backed [`FrameLookup`] for the navigation resolver.
//!
//! Every method is a single indexed query; no frame list is loaded.

use async_trait::async_trait;
use bscan_core::label::LABEL_UNLABELED;
use bscan_core::navigation::FrameLookup;
use bscan_core::types::BScanIndex;

use crate::DbPool;

/// Answers navigation queries from the `bscans` table.
#[derive(Debug, Clone, Copy)]
pub struct PoolFrameLookup<'a> {
    pool: &'a DbPool,
}

impl<'a> PoolFrameLookup<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FrameLookup for PoolFrameLookup<'_> {
    type Error = sqlx::Error;

    async fn frame_exists(&self, scan_id: &str, index: BScanIndex) -> Result<bool, sqlx::Error> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM bscans WHERE scan_id = $1 AND bscan_index = $2")
                .bind(scan_id)
                .bind(index)
                .fetch_optional(self.pool)
                .await?;
        Ok(found.is_some())
    }

    async fn previous_index(
        &self,
        scan_id: &str,
        index: BScanIndex,
    ) -> Result<Option<BScanIndex>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT bscan_index FROM bscans
             WHERE scan_id = $1 AND bscan_index < $2
             ORDER BY bscan_index DESC
             LIMIT 1",
        )
        .bind(scan_id)
        .bind(index)
        .fetch_optional(self.pool)
        .await
    }

    async fn next_index(
        &self,
        scan_id: &str,
        index: BScanIndex,
    ) -> Result<Option<BScanIndex>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT bscan_index FROM bscans
             WHERE scan_id = $1 AND bscan_index > $2
             ORDER BY bscan_index ASC
             LIMIT 1",
        )
        .bind(scan_id)
        .bind(index)
        .fetch_optional(self.pool)
        .await
    }

    async fn next_unlabeled_index(
        &self,
        scan_id: &str,
        index: BScanIndex,
    ) -> Result<Option<BScanIndex>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT bscan_index FROM bscans
             WHERE scan_id = $1 AND label = $3 AND bscan_index > $2
             ORDER BY bscan_index ASC
             LIMIT 1",
        )
        .bind(scan_id)
        .bind(index)
        .bind(LABEL_UNLABELED)
        .fetch_optional(self.pool)
        .await
    }
}
