//! Admission decisions for the scheduler.

use std::sync::Arc;

use crate::{AdmissionDecision, BlockCause, FlagStore, JobDirectory, JobId};

/// A check the scheduler runs before starting a job.
///
/// Checkers are consulted in registration order; the first one that blocks
/// decides.
pub trait AdmissionChecker: Send + Sync {
    /// Decide whether the job may start now.
    fn check(&self, job: JobId) -> AdmissionDecision;
}

/// Blocks jobs whose own flag or whose group's flag is set.
///
/// Reads current store state on every call; nothing is cached.
pub struct AdmissionGate {
    store: Arc<dyn FlagStore>,
    directory: Arc<dyn JobDirectory>,
}

impl AdmissionGate {
    pub fn new(store: Arc<dyn FlagStore>, directory: Arc<dyn JobDirectory>) -> Self {
        Self { store, directory }
    }

    /// Evaluate one job against its own flag and its group's flag.
    ///
    /// The outcome is blocked if either scope is flagged. The reported reason
    /// comes from the group flag whenever it is present, so a job blocked at
    /// both scopes reports the group's message.
    pub fn evaluate(&self, job: JobId) -> AdmissionDecision {
        let group_flag = self
            .directory
            .group_of(job)
            .and_then(|group| self.store.get_group_flag(group));

        if let Some(flag) = group_flag {
            return AdmissionDecision::Blocked(BlockCause::group(flag.message()));
        }

        if self.store.is_job_blocked(job) {
            return AdmissionDecision::Blocked(BlockCause::job());
        }

        AdmissionDecision::Proceed
    }
}

impl AdmissionChecker for AdmissionGate {
    fn check(&self, job: JobId) -> AdmissionDecision {
        self.evaluate(job)
    }
}

/// Ordered list of checkers consulted at admission time.
#[derive(Default, Clone)]
pub struct AdmissionCheckers {
    checkers: Vec<Arc<dyn AdmissionChecker>>,
}

impl AdmissionCheckers {
    /// Create an empty list. An empty list admits everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a checker after the ones already registered.
    pub fn register(&mut self, checker: Arc<dyn AdmissionChecker>) {
        self.checkers.push(checker);
    }

    /// Builder form of [`AdmissionCheckers::register`].
    pub fn with(mut self, checker: Arc<dyn AdmissionChecker>) -> Self {
        self.register(checker);
        self
    }

    /// Number of registered checkers.
    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    /// Run the checkers in order and return the first refusal.
    pub fn evaluate(&self, job: JobId) -> AdmissionDecision {
        for checker in &self.checkers {
            let decision = checker.check(job);
            if decision.is_blocked() {
                tracing::debug!("Job {} refused: {:?}", job, decision.cause());
                return decision;
            }
        }
        AdmissionDecision::Proceed
    }
}
