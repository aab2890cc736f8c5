//! Event types for block state changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BlockFlag, GroupId, JobId};

/// Events emitted whenever a flag is set or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BlockEvent {
    /// A group flag was set or replaced.
    GroupBlocked {
        group_id: GroupId,
        flag: BlockFlag,
        timestamp: DateTime<Utc>,
    },
    /// A group flag was removed.
    GroupUnblocked {
        group_id: GroupId,
        timestamp: DateTime<Utc>,
    },
    /// A job flag was created.
    JobBlocked {
        job_id: JobId,
        timestamp: DateTime<Utc>,
    },
    /// A job flag was removed.
    JobUnblocked {
        job_id: JobId,
        timestamp: DateTime<Utc>,
    },
}

impl BlockEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            BlockEvent::GroupBlocked { timestamp, .. } => *timestamp,
            BlockEvent::GroupUnblocked { timestamp, .. } => *timestamp,
            BlockEvent::JobBlocked { timestamp, .. } => *timestamp,
            BlockEvent::JobUnblocked { timestamp, .. } => *timestamp,
        }
    }

    /// Get the group ID associated with this event, if any.
    pub fn group_id(&self) -> Option<GroupId> {
        match self {
            BlockEvent::GroupBlocked { group_id, .. } => Some(*group_id),
            BlockEvent::GroupUnblocked { group_id, .. } => Some(*group_id),
            _ => None,
        }
    }

    /// Get the job ID associated with this event, if any.
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            BlockEvent::JobBlocked { job_id, .. } => Some(*job_id),
            BlockEvent::JobUnblocked { job_id, .. } => Some(*job_id),
            _ => None,
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            BlockEvent::GroupBlocked { group_id, flag, .. } => {
                let by = match flag.actor() {
                    "" => String::new(),
                    actor => format!(" by {}", actor),
                };
                match flag.message() {
                    "" => format!("Group {} blocked{}", group_id, by),
                    message => format!("Group {} blocked{}: {}", group_id, by, message),
                }
            }
            BlockEvent::GroupUnblocked { group_id, .. } => format!("Group {} unblocked", group_id),
            BlockEvent::JobBlocked { job_id, .. } => format!("Job {} blocked", job_id),
            BlockEvent::JobUnblocked { job_id, .. } => format!("Job {} unblocked", job_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_names_actor_and_message() {
        let group_id = GroupId::new();
        let event = BlockEvent::GroupBlocked {
            group_id,
            flag: BlockFlag::new("maintenance", "bob"),
            timestamp: Utc::now(),
        };
        assert_eq!(
            event.description(),
            format!("Group {} blocked by bob: maintenance", group_id)
        );
        assert_eq!(event.group_id(), Some(group_id));
        assert_eq!(event.job_id(), None);
    }

    #[test]
    fn events_serialize_with_snake_case_tag() {
        let event = BlockEvent::JobUnblocked {
            job_id: JobId::new(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "job_unblocked");
    }
}
