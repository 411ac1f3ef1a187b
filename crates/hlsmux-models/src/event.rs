//! Job event message types.
//!
//! Events are the only channel between a running job and its caller: zero or
//! more `Progress`/`Status` messages followed by exactly one `Completed`.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::request::ConversionResult;

/// Message envelope delivered to the job's caller.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// Progress update. Percent is strictly ascending within a job, in
    /// (0, 100]; 100 is only ever emitted after a clean subprocess exit.
    Progress { percent: f64 },

    /// Human-readable status line with timestamp
    Status {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Terminal notification; emitted exactly once per job
    Completed {
        success: bool,
        message: String,
    },
}

impl JobEvent {
    /// Status event stamped with the current time.
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Terminal event from a conversion result.
    pub fn completed(result: &ConversionResult) -> Self {
        Self::Completed {
            success: result.success,
            message: result.message.clone(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}
