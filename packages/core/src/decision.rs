//! Admission results and the cause rendered for a refused job.

use serde::{Deserialize, Serialize};

/// Which flag slot fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockScope {
    /// The job's enclosing group is blocked.
    Group,
    /// The job itself is blocked.
    Job,
}

impl std::fmt::Display for BlockScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockScope::Group => write!(f, "group"),
            BlockScope::Job => write!(f, "job"),
        }
    }
}

/// Why a job was refused admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCause {
    /// Scope reported for the block. Group wins when both scopes are active.
    pub scope: BlockScope,
    /// Message of the group flag; job flags carry none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl BlockCause {
    /// Cause for a block inherited from the group.
    pub fn group(message: impl Into<String>) -> Self {
        Self {
            scope: BlockScope::Group,
            reason: Some(message.into()),
        }
    }

    /// Cause for a block set on the job alone.
    pub fn job() -> Self {
        Self {
            scope: BlockScope::Job,
            reason: None,
        }
    }

    /// The reported reason, empty when there is none.
    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or_default()
    }

    /// One-line description shown next to a waiting queue item.
    pub fn short_description(&self) -> String {
        match self.reason() {
            "" => "Blocked".to_string(),
            reason => format!("Blocked: {}", reason),
        }
    }
}

impl std::fmt::Display for BlockCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.short_description())
    }
}

/// Outcome of evaluating one job at the admission path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AdmissionDecision {
    /// No flag is active at job or group scope.
    Proceed,
    /// At least one flag is active; the scheduler should retry later.
    Blocked(BlockCause),
}

impl AdmissionDecision {
    /// Check if the job may start now.
    pub fn is_proceed(&self) -> bool {
        matches!(self, AdmissionDecision::Proceed)
    }

    /// Check if the job was refused.
    pub fn is_blocked(&self) -> bool {
        matches!(self, AdmissionDecision::Blocked(_))
    }

    /// The cause, when blocked.
    pub fn cause(&self) -> Option<&BlockCause> {
        match self {
            AdmissionDecision::Proceed => None,
            AdmissionDecision::Blocked(cause) => Some(cause),
        }
    }

    /// The reported reason, when blocked.
    pub fn reason(&self) -> Option<&str> {
        self.cause().map(BlockCause::reason)
    }
}
