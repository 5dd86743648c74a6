//! Label completion statistics.
//!
//! The database only supplies raw label counts; every derived figure is
//! computed here so per-scan and global numbers follow the same rules.

use serde::Serialize;

use crate::label::Label;

/// Raw per-label frame counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelCounts {
    pub unlabeled: i64,
    pub healthy: i64,
    pub unhealthy: i64,
}

impl LabelCounts {
    /// Build from `(label_code, count)` rows of a `GROUP BY label` query.
    /// Unknown codes are counted as unlabeled.
    pub fn from_rows(rows: impl IntoIterator<Item = (i64, i64)>) -> Self {
        let mut counts = Self::default();
        for (code, count) in rows {
            match Label::from_code(code) {
                Ok(Label::Healthy) => counts.healthy += count,
                Ok(Label::Unhealthy) => counts.unhealthy += count,
                Ok(Label::Unlabeled) | Err(_) => counts.unlabeled += count,
            }
        }
        counts
    }

    pub fn total(&self) -> i64 {
        self.unlabeled + self.healthy + self.unhealthy
    }

    pub fn labeled(&self) -> i64 {
        self.healthy + self.unhealthy
    }
}

impl std::ops::Add for LabelCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            unlabeled: self.unlabeled + rhs.unlabeled,
            healthy: self.healthy + rhs.healthy,
            unhealthy: self.unhealthy + rhs.unhealthy,
        }
    }
}

/// Completion figures for one scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanStats {
    pub total_bscans: i64,
    pub labeled: i64,
    pub unlabeled: i64,
    pub healthy: i64,
    pub unhealthy: i64,
    pub percent_complete: f64,
}

impl From<LabelCounts> for ScanStats {
    fn from(counts: LabelCounts) -> Self {
        let total = counts.total();
        let labeled = counts.labeled();
        Self {
            total_bscans: total,
            labeled,
            unlabeled: total - labeled,
            healthy: counts.healthy,
            unhealthy: counts.unhealthy,
            percent_complete: completion_percentage(labeled, total),
        }
    }
}

/// Completion figures across all scans.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalStats {
    pub total_scans: i64,
    pub total_bscans: i64,
    pub total_labeled: i64,
    pub total_unlabeled: i64,
    pub total_healthy: i64,
    pub total_unhealthy: i64,
    pub percent_complete: f64,
}

impl GlobalStats {
    pub fn new(total_scans: i64, counts: LabelCounts) -> Self {
        let scan = ScanStats::from(counts);
        Self {
            total_scans,
            total_bscans: scan.total_bscans,
            total_labeled: scan.labeled,
            total_unlabeled: scan.unlabeled,
            total_healthy: scan.healthy,
            total_unhealthy: scan.unhealthy,
            percent_complete: scan.percent_complete,
        }
    }
}

/// `labeled / total * 100` rounded to two decimals; 0 for an empty scan.
pub fn completion_percentage(labeled: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let pct = labeled as f64 / total as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}
