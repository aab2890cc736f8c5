//! Group domain types for multi-branch projects.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::JobId;

/// Unique identifier for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub Ulid);

impl GroupId {
    /// Create a new unique group ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse a group ID from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A group collects related jobs, e.g. the per-branch jobs of one
/// multi-branch pipeline project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier for this group.
    pub id: GroupId,
    /// Human-readable project name.
    pub name: String,
    /// Current member jobs.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub members: BTreeSet<JobId>,
    /// When the group was registered with the host.
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Create a new empty group with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GroupId::new(),
            name: name.into(),
            members: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Check if a job is a current member.
    pub fn contains(&self, job_id: JobId) -> bool {
        self.members.contains(&job_id)
    }
}
