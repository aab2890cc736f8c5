//! The block flag value object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An active block on a group or a job.
///
/// Flags are immutable once created: re-blocking a scope replaces the whole
/// value. Records written before message, actor and timestamp were tracked
/// deserialize with empty strings and the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockFlag {
    #[serde(default)]
    message: String,
    #[serde(default)]
    actor: String,
    #[serde(default = "epoch")]
    timestamp: DateTime<Utc>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

impl BlockFlag {
    /// Create a flag stamped with the current time.
    pub fn new(message: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            actor: actor.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a job-scope flag. Job flags carry no message or actor.
    pub fn anonymous() -> Self {
        Self::new("", "")
    }

    /// Rebuild a flag from stored parts, keeping the original timestamp.
    pub fn restore(
        message: impl Into<String>,
        actor: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            message: message.into(),
            actor: actor.into(),
            timestamp,
        }
    }

    /// Operator-supplied explanation; may be empty.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Who set the flag; empty when unknown.
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// When the flag was set; the epoch for legacy records.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
