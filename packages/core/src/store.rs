//! Flag storage at group and job scope.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};

use crate::{BlockFlag, GroupId, JobId};

/// Holds at most one [`BlockFlag`] per group and per job.
///
/// None of the operations fail: a scope that was never flagged simply reads
/// as absent. Writes to the same scope serialize and the last one wins;
/// writes to different scopes must not contend.
pub trait FlagStore: Send + Sync {
    /// Create or replace the group's flag with a freshly stamped value.
    fn set_group_flag(&self, group: GroupId, message: &str, actor: &str) -> BlockFlag;

    /// Remove the group's flag, returning it if there was one.
    fn clear_group_flag(&self, group: GroupId) -> Option<BlockFlag>;

    /// Create the job's flag if absent. Returns `false` when a flag already
    /// existed; the existing flag keeps its timestamp.
    fn set_job_flag(&self, job: JobId) -> bool;

    /// Remove the job's flag, returning it if there was one.
    fn clear_job_flag(&self, job: JobId) -> Option<BlockFlag>;

    /// Current group flag.
    fn get_group_flag(&self, group: GroupId) -> Option<BlockFlag>;

    /// Current job flag.
    fn get_job_flag(&self, job: JobId) -> Option<BlockFlag>;

    /// Install a previously persisted group flag verbatim.
    fn restore_group_flag(&self, group: GroupId, flag: BlockFlag);

    /// Install a previously persisted job flag verbatim.
    fn restore_job_flag(&self, job: JobId, flag: BlockFlag);

    /// Copy of every flag currently held.
    fn snapshot(&self) -> FlagSnapshot;

    fn is_group_blocked(&self, group: GroupId) -> bool {
        self.get_group_flag(group).is_some()
    }

    fn is_job_blocked(&self, job: JobId) -> bool {
        self.get_job_flag(job).is_some()
    }
}

/// Point-in-time copy of a store's contents, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSnapshot {
    pub groups: Vec<(GroupId, BlockFlag)>,
    pub jobs: Vec<(JobId, BlockFlag)>,
}

impl FlagSnapshot {
    /// Check if no flags are present.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.jobs.is_empty()
    }

    /// Load every flag into a store.
    pub fn restore_into(self, store: &dyn FlagStore) {
        for (group, flag) in self.groups {
            store.restore_group_flag(group, flag);
        }
        for (job, flag) in self.jobs {
            store.restore_job_flag(job, flag);
        }
    }
}

/// In-memory store with one sharded slot per scope.
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    groups: DashMap<GroupId, BlockFlag>,
    jobs: DashMap<JobId, BlockFlag>,
}

impl MemoryFlagStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryFlagStore {
    fn set_group_flag(&self, group: GroupId, message: &str, actor: &str) -> BlockFlag {
        let flag = BlockFlag::new(message, actor);
        self.groups.insert(group, flag.clone());
        flag
    }

    fn clear_group_flag(&self, group: GroupId) -> Option<BlockFlag> {
        self.groups.remove(&group).map(|(_, flag)| flag)
    }

    fn set_job_flag(&self, job: JobId) -> bool {
        match self.jobs.entry(job) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(BlockFlag::anonymous());
                true
            }
        }
    }

    fn clear_job_flag(&self, job: JobId) -> Option<BlockFlag> {
        self.jobs.remove(&job).map(|(_, flag)| flag)
    }

    fn get_group_flag(&self, group: GroupId) -> Option<BlockFlag> {
        self.groups.get(&group).map(|flag| flag.value().clone())
    }

    fn get_job_flag(&self, job: JobId) -> Option<BlockFlag> {
        self.jobs.get(&job).map(|flag| flag.value().clone())
    }

    fn restore_group_flag(&self, group: GroupId, flag: BlockFlag) {
        self.groups.insert(group, flag);
    }

    fn restore_job_flag(&self, job: JobId, flag: BlockFlag) {
        self.jobs.insert(job, flag);
    }

    fn snapshot(&self) -> FlagSnapshot {
        let mut groups: Vec<_> = self
            .groups
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        let mut jobs: Vec<_> = self
            .jobs
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        groups.sort_by_key(|(id, _)| *id);
        jobs.sort_by_key(|(id, _)| *id);
        FlagSnapshot { groups, jobs }
    }

    fn is_group_blocked(&self, group: GroupId) -> bool {
        self.groups.contains_key(&group)
    }

    fn is_job_blocked(&self, job: JobId) -> bool {
        self.jobs.contains_key(&job)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn set_group_flag_replaces_previous_value() {
        let store = MemoryFlagStore::new();
        let group = GroupId::new();

        store.set_group_flag(group, "first", "alice");
        store.set_group_flag(group, "second", "bob");

        let flag = store.get_group_flag(group).unwrap();
        assert_eq!(flag.message(), "second");
        assert_eq!(flag.actor(), "bob");
        assert_eq!(store.snapshot().groups.len(), 1);
    }

    #[test]
    fn clear_group_flag_is_noop_when_absent() {
        let store = MemoryFlagStore::new();
        let group = GroupId::new();

        assert!(store.clear_group_flag(group).is_none());
        store.set_group_flag(group, "m", "a");
        assert!(store.clear_group_flag(group).is_some());
        assert!(!store.is_group_blocked(group));
        assert!(store.clear_group_flag(group).is_none());
    }

    #[test]
    fn set_job_flag_twice_keeps_original_metadata() {
        let store = MemoryFlagStore::new();
        let job = JobId::new();

        assert!(store.set_job_flag(job));
        let first = store.get_job_flag(job).unwrap();
        assert!(!store.set_job_flag(job));
        let second = store.get_job_flag(job).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.snapshot().jobs.len(), 1);
        assert_eq!(second.message(), "");
        assert_eq!(second.actor(), "");
    }

    #[test]
    fn unknown_scopes_read_as_absent() {
        let store = MemoryFlagStore::new();
        assert!(!store.is_group_blocked(GroupId::new()));
        assert!(!store.is_job_blocked(JobId::new()));
        assert!(store.get_group_flag(GroupId::new()).is_none());
        assert!(store.clear_job_flag(JobId::new()).is_none());
    }

    #[test]
    fn snapshot_restores_into_fresh_store() {
        let store = MemoryFlagStore::new();
        let group = GroupId::new();
        let job = JobId::new();
        store.set_group_flag(group, "hold", "ops");
        store.set_job_flag(job);

        let snapshot = store.snapshot();
        let fresh = MemoryFlagStore::new();
        snapshot.clone().restore_into(&fresh);

        assert_eq!(fresh.snapshot(), snapshot);
    }

    #[test]
    fn concurrent_job_toggles_do_not_interfere() {
        let store = Arc::new(MemoryFlagStore::new());
        let jobs: Vec<JobId> = (0..64).map(|_| JobId::new()).collect();

        let handles: Vec<_> = jobs
            .chunks(16)
            .map(|chunk| {
                let store = store.clone();
                let chunk = chunk.to_vec();
                thread::spawn(move || {
                    for job in chunk {
                        store.set_job_flag(job);
                        store.set_job_flag(job);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(jobs.iter().all(|job| store.is_job_blocked(*job)));
        assert_eq!(store.snapshot().jobs.len(), jobs.len());
    }
}
