//! Tri-state B-scan label.
//!
//! Stored as a small integer in the `bscans.label` column:
//! `0` = unlabeled, `1` = healthy, `2` = unhealthy.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Label code for a frame nobody has reviewed yet.
pub const LABEL_UNLABELED: i64 = 0;
/// Label code for a healthy frame.
pub const LABEL_HEALTHY: i64 = 1;
/// Label code for an unhealthy frame.
pub const LABEL_UNHEALTHY: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Unlabeled,
    Healthy,
    Unhealthy,
}

impl Label {
    /// Parse a stored label code.
    pub fn from_code(code: i64) -> Result<Self, CoreError> {
        match code {
            LABEL_UNLABELED => Ok(Self::Unlabeled),
            LABEL_HEALTHY => Ok(Self::Healthy),
            LABEL_UNHEALTHY => Ok(Self::Unhealthy),
            other => Err(CoreError::Validation(format!(
                "Invalid label {other}. Must be 0 (unlabeled), 1 (healthy) or 2 (unhealthy)"
            ))),
        }
    }

    /// Parse a label submitted by a labeling request.
    ///
    /// Only `1` and `2` are accepted; clearing a label has its own operation.
    pub fn from_assignment(code: i64) -> Result<Self, CoreError> {
        match code {
            LABEL_HEALTHY => Ok(Self::Healthy),
            LABEL_UNHEALTHY => Ok(Self::Unhealthy),
            other => Err(CoreError::Validation(format!(
                "Invalid label {other}. Must be 1 (healthy) or 2 (unhealthy)"
            ))),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Unlabeled => LABEL_UNLABELED,
            Self::Healthy => LABEL_HEALTHY,
            Self::Unhealthy => LABEL_UNHEALTHY,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Unlabeled => "unlabeled",
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
        }
    }
}

/// Human-readable name for a raw label code, `"unknown"` for anything else.
pub fn label_name(code: i64) -> &'static str {
    Label::from_code(code).map(Label::name).unwrap_or("unknown")
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
