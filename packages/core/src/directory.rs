//! Job-to-group membership as seen by the block machinery.

use dashmap::DashMap;

use crate::{Group, GroupId, Job, JobId};

/// Read-only view of the host's job hierarchy.
///
/// Membership is owned by the host. The gate only asks for a job's immediate
/// group and the toggle only asks for a group's current members.
pub trait JobDirectory: Send + Sync {
    /// The job's enclosing group, if it has one that still exists.
    fn group_of(&self, job: JobId) -> Option<GroupId>;

    /// Current member jobs of a group; empty for unknown groups.
    fn members(&self, group: GroupId) -> Vec<JobId>;

    /// Check if the job is known.
    fn contains_job(&self, job: JobId) -> bool;

    /// Check if the group is known.
    fn contains_group(&self, group: GroupId) -> bool;
}

/// In-memory job hierarchy for embedding hosts and tests.
#[derive(Debug, Default)]
pub struct Catalog {
    groups: DashMap<GroupId, Group>,
    jobs: DashMap<JobId, Job>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a group. Any members listed on it are ignored:
    /// membership is rebuilt from the registered jobs that point at it, so
    /// re-registering a group keeps its members.
    pub fn insert_group(&self, mut group: Group) -> GroupId {
        let id = group.id;
        group.members = self
            .jobs
            .iter()
            .filter(|job| job.group_id == Some(id))
            .map(|job| job.id)
            .collect();
        self.groups.insert(id, group);
        id
    }

    /// Register or replace a job, joining its group when the group is known.
    /// A job naming an unknown group is stored standalone. A re-registered
    /// job leaves its previous group first.
    pub fn insert_job(&self, mut job: Job) -> JobId {
        let id = job.id;
        self.detach_job(id);
        if let Some(group_id) = job.group_id {
            match self.groups.get_mut(&group_id) {
                Some(mut group) => {
                    group.members.insert(id);
                }
                None => {
                    tracing::debug!("Job {} names unknown group {}", id, group_id);
                    job.group_id = None;
                }
            }
        }
        self.jobs.insert(id, job);
        id
    }

    /// Take a job out of its group. The job itself stays registered.
    pub fn detach_job(&self, job: JobId) -> Option<GroupId> {
        let group_id = self.jobs.get_mut(&job)?.group_id.take()?;
        if let Some(mut group) = self.groups.get_mut(&group_id) {
            group.members.remove(&job);
        }
        Some(group_id)
    }

    /// Remove a job entirely.
    pub fn remove_job(&self, job: JobId) -> Option<Job> {
        self.detach_job(job);
        self.jobs.remove(&job).map(|(_, job)| job)
    }

    /// Remove a group. Former members keep their back-reference, which then
    /// resolves to no group.
    pub fn remove_group(&self, group: GroupId) -> Option<Group> {
        self.groups.remove(&group).map(|(_, group)| group)
    }

    /// Get a job by ID.
    pub fn get_job(&self, job: JobId) -> Option<Job> {
        self.jobs.get(&job).map(|job| job.value().clone())
    }

    /// Get a group by ID.
    pub fn get_group(&self, group: GroupId) -> Option<Group> {
        self.groups.get(&group).map(|group| group.value().clone())
    }

    /// Look up a member job by its name within a group.
    pub fn find_job(&self, group: GroupId, name: &str) -> Option<JobId> {
        self.members(group).into_iter().find(|id| {
            self.jobs
                .get(id)
                .is_some_and(|job| job.name == name)
        })
    }
}

impl JobDirectory for Catalog {
    fn group_of(&self, job: JobId) -> Option<GroupId> {
        let group_id = self.jobs.get(&job)?.group_id?;
        self.groups.contains_key(&group_id).then_some(group_id)
    }

    fn members(&self, group: GroupId) -> Vec<JobId> {
        self.groups
            .get(&group)
            .map(|group| group.members.iter().copied().collect())
            .unwrap_or_default()
    }

    fn contains_job(&self, job: JobId) -> bool {
        self.jobs.contains_key(&job)
    }

    fn contains_group(&self, group: GroupId) -> bool {
        self.groups.contains_key(&group)
    }
}
