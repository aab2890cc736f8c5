//! Block and unblock operations, including the group-to-member fan-out.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{FlagStore, GroupId, JobDirectory, JobId};

/// A toggle target that the directory does not know.
///
/// This is not a failure of the toggle: the surface calling it shows the
/// message to the user as a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum Missing {
    #[error("No job '{0}' available")]
    Job(JobId),
    #[error("No group '{0}' available")]
    Group(GroupId),
}

/// Effect of a single toggle on its target scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The scope's flag changed.
    Applied,
    /// The scope was already in the requested state.
    Unchanged,
    /// The target does not exist; nothing was touched.
    Missing(Missing),
}

impl ToggleOutcome {
    fn from_change(changed: bool) -> Self {
        if changed {
            ToggleOutcome::Applied
        } else {
            ToggleOutcome::Unchanged
        }
    }

    /// Check if the flag changed.
    pub fn is_applied(&self) -> bool {
        matches!(self, ToggleOutcome::Applied)
    }

    /// User-facing message for a missing target.
    pub fn validation_message(&self) -> Option<String> {
        match self {
            ToggleOutcome::Missing(missing) => Some(missing.to_string()),
            _ => None,
        }
    }
}

/// Result of a group toggle: the group's own outcome plus the members whose
/// job flag changed during the fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleReport {
    pub outcome: ToggleOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_jobs: Vec<JobId>,
}

impl ToggleReport {
    fn missing(group: GroupId) -> Self {
        Self {
            outcome: ToggleOutcome::Missing(Missing::Group(group)),
            changed_jobs: Vec::new(),
        }
    }
}

/// Toggle interface used by operator-facing surfaces.
///
/// Group toggles fan out to every current member job. The fan-out reads the
/// member list once and updates each member independently: no lock is held
/// across members and there is no rollback if the host goes away midway.
#[derive(Clone)]
pub struct BlockToggle {
    store: Arc<dyn FlagStore>,
    directory: Arc<dyn JobDirectory>,
}

impl BlockToggle {
    pub fn new(store: Arc<dyn FlagStore>, directory: Arc<dyn JobDirectory>) -> Self {
        Self { store, directory }
    }

    /// Block a group and every member job.
    ///
    /// Re-blocking an already blocked group replaces its flag. Members that
    /// already carry a job flag keep it untouched.
    pub fn block_group(&self, group: GroupId, message: &str, actor: &str) -> ToggleReport {
        if !self.directory.contains_group(group) {
            return ToggleReport::missing(group);
        }

        self.store.set_group_flag(group, message, actor);
        tracing::debug!("Group {} blocked by '{}': {}", group, actor, message);

        let changed_jobs = self
            .directory
            .members(group)
            .into_iter()
            .filter(|job| self.store.set_job_flag(*job))
            .collect();

        ToggleReport {
            outcome: ToggleOutcome::Applied,
            changed_jobs,
        }
    }

    /// Unblock a group and every member job.
    pub fn unblock_group(&self, group: GroupId) -> ToggleReport {
        if !self.directory.contains_group(group) {
            return ToggleReport::missing(group);
        }

        let cleared = self.store.clear_group_flag(group).is_some();
        if cleared {
            tracing::debug!("Group {} unblocked", group);
        }

        let changed_jobs = self
            .directory
            .members(group)
            .into_iter()
            .filter(|job| self.store.clear_job_flag(*job).is_some())
            .collect();

        ToggleReport {
            outcome: ToggleOutcome::from_change(cleared),
            changed_jobs,
        }
    }

    /// Block a single job.
    pub fn block_job(&self, job: JobId) -> ToggleOutcome {
        if !self.directory.contains_job(job) {
            return ToggleOutcome::Missing(Missing::Job(job));
        }
        ToggleOutcome::from_change(self.store.set_job_flag(job))
    }

    /// Unblock a single job. A block inherited from the group stays in force.
    pub fn unblock_job(&self, job: JobId) -> ToggleOutcome {
        if !self.directory.contains_job(job) {
            return ToggleOutcome::Missing(Missing::Job(job));
        }
        ToggleOutcome::from_change(self.store.clear_job_flag(job).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AdmissionDecision, AdmissionGate, Catalog, Group, Job, MemoryFlagStore};

    struct Fixture {
        store: Arc<MemoryFlagStore>,
        catalog: Arc<Catalog>,
        toggle: BlockToggle,
        gate: AdmissionGate,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryFlagStore::new());
        let catalog = Arc::new(Catalog::new());
        Fixture {
            toggle: BlockToggle::new(store.clone(), catalog.clone()),
            gate: AdmissionGate::new(store.clone(), catalog.clone()),
            store,
            catalog,
        }
    }

    fn group_with_jobs(catalog: &Catalog, names: &[&str]) -> (GroupId, Vec<JobId>) {
        let group = catalog.insert_group(Group::new("project"));
        let jobs = names
            .iter()
            .map(|name| catalog.insert_job(Job::new(*name).in_group(group)))
            .collect();
        (group, jobs)
    }

    #[test]
    fn block_group_fans_out_to_members() {
        let f = fixture();
        let (group, jobs) = group_with_jobs(&f.catalog, &["a", "b", "c"]);

        let report = f.toggle.block_group(group, "msg", "alice");

        assert_eq!(report.outcome, ToggleOutcome::Applied);
        assert_eq!(report.changed_jobs.len(), 3);
        assert!(jobs.iter().all(|job| f.store.is_job_blocked(*job)));
        let flag = f.store.get_group_flag(group).unwrap();
        assert_eq!(flag.message(), "msg");
        assert_eq!(flag.actor(), "alice");
    }

    #[test]
    fn fan_out_skips_already_flagged_members() {
        let f = fixture();
        let (group, jobs) = group_with_jobs(&f.catalog, &["a", "b"]);
        f.toggle.block_job(jobs[0]);
        let original = f.store.get_job_flag(jobs[0]).unwrap();

        let report = f.toggle.block_group(group, "msg", "alice");

        assert_eq!(report.changed_jobs, vec![jobs[1]]);
        assert_eq!(f.store.get_job_flag(jobs[0]).unwrap(), original);
    }

    #[test]
    fn reblocking_group_replaces_message() {
        let f = fixture();
        let (group, _) = group_with_jobs(&f.catalog, &["a"]);

        f.toggle.block_group(group, "first", "alice");
        let report = f.toggle.block_group(group, "second", "bob");

        assert!(report.outcome.is_applied());
        assert!(report.changed_jobs.is_empty());
        assert_eq!(f.store.get_group_flag(group).unwrap().message(), "second");
    }

    #[test]
    fn unblock_group_clears_group_and_members() {
        let f = fixture();
        let (group, jobs) = group_with_jobs(&f.catalog, &["a", "b", "c"]);
        f.toggle.block_group(group, "msg", "alice");

        let report = f.toggle.unblock_group(group);

        assert_eq!(report.outcome, ToggleOutcome::Applied);
        assert_eq!(report.changed_jobs.len(), 3);
        assert!(!f.store.is_group_blocked(group));
        assert!(jobs.iter().all(|job| !f.store.is_job_blocked(*job)));
        assert!(jobs.iter().all(|job| f.gate.evaluate(*job).is_proceed()));
    }

    #[test]
    fn unblock_unblocked_group_is_unchanged() {
        let f = fixture();
        let (group, _) = group_with_jobs(&f.catalog, &["a"]);

        let report = f.toggle.unblock_group(group);

        assert_eq!(report.outcome, ToggleOutcome::Unchanged);
        assert!(report.changed_jobs.is_empty());
    }

    #[test]
    fn detached_job_stays_blocked_after_group_unblock() {
        let f = fixture();
        let (group, jobs) = group_with_jobs(&f.catalog, &["j1", "j3"]);
        let j1 = jobs[0];
        f.toggle.block_group(group, "maintenance", "bob");

        f.catalog.detach_job(j1);
        f.toggle.unblock_group(group);

        assert!(f.store.is_job_blocked(j1));
        assert_eq!(
            f.gate.evaluate(j1),
            AdmissionDecision::Blocked(crate::BlockCause::job())
        );
        assert!(f.gate.evaluate(jobs[1]).is_proceed());
    }

    #[test]
    fn job_toggles_are_idempotent() {
        let f = fixture();
        let job = f.catalog.insert_job(Job::new("solo"));

        assert_eq!(f.toggle.block_job(job), ToggleOutcome::Applied);
        assert_eq!(f.toggle.block_job(job), ToggleOutcome::Unchanged);
        assert_eq!(f.toggle.unblock_job(job), ToggleOutcome::Applied);
        assert_eq!(f.toggle.unblock_job(job), ToggleOutcome::Unchanged);
    }

    #[test]
    fn unblocking_member_keeps_group_block() {
        let f = fixture();
        let (group, jobs) = group_with_jobs(&f.catalog, &["a"]);
        f.toggle.block_group(group, "hold", "ops");

        f.toggle.unblock_job(jobs[0]);

        assert_eq!(f.gate.evaluate(jobs[0]).reason(), Some("hold"));
    }

    #[test]
    fn missing_targets_are_reported_not_failed() {
        let f = fixture();
        let job = JobId::new();
        let group = GroupId::new();

        let outcome = f.toggle.block_job(job);
        assert_eq!(outcome, ToggleOutcome::Missing(Missing::Job(job)));
        assert_eq!(
            outcome.validation_message(),
            Some(format!("No job '{}' available", job))
        );

        let report = f.toggle.block_group(group, "m", "a");
        assert_eq!(report.outcome, ToggleOutcome::Missing(Missing::Group(group)));
        assert!(!f.store.is_group_blocked(group));
        assert!(!f.store.is_job_blocked(job));
    }
}
