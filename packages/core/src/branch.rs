//! Branch build strategies consulted when branch indexing finds a change.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A branch change discovered by indexing a source repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRevision {
    /// Branch (or change request) name.
    pub head: String,
    /// Revision just discovered.
    pub current: String,
    /// Revision of the last build, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_built: Option<String>,
    /// Revision seen by the previous indexing run, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
}

impl BranchRevision {
    pub fn new(head: impl Into<String>, current: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            current: current.into(),
            last_built: None,
            last_seen: None,
        }
    }
}

/// Decides whether indexing should trigger a build for a branch change.
pub trait BranchBuildStrategy: Send + Sync {
    /// Name shown when configuring the project.
    fn display_name(&self) -> &str;

    /// Whether the change should be built without manual intervention.
    fn is_automatic_build(&self, revision: &BranchRevision) -> bool;
}

/// Never triggers builds from indexing. Branch jobs are still discovered and
/// can be started by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisableBranchBuildStrategy;

impl BranchBuildStrategy for DisableBranchBuildStrategy {
    fn display_name(&self) -> &str {
        "Disable automatic branch builds"
    }

    fn is_automatic_build(&self, _revision: &BranchRevision) -> bool {
        false
    }
}

/// The strategies configured on one project.
///
/// With no strategies the host's default applies and every change builds;
/// otherwise a change builds when any strategy asks for it.
#[derive(Default, Clone)]
pub struct BranchBuildStrategies {
    strategies: Vec<Arc<dyn BranchBuildStrategy>>,
}

impl BranchBuildStrategies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a strategy.
    pub fn with(mut self, strategy: Arc<dyn BranchBuildStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Decide for one change.
    pub fn is_automatic_build(&self, revision: &BranchRevision) -> bool {
        if self.strategies.is_empty() {
            return true;
        }
        let build = self
            .strategies
            .iter()
            .any(|strategy| strategy.is_automatic_build(revision));
        if !build {
            tracing::debug!("Skipping automatic build of {} at {}", revision.head, revision.current);
        }
        build
    }
}
