//! Message types for actor communication.

use block_core::{BlockEvent, GroupId, JobId, ToggleOutcome, ToggleReport};
use ractor::RpcReplyPort;

/// Messages for the BlockActor.
#[derive(Debug)]
pub enum BlockMessage {
    /// Block a group and fan out to its members.
    BlockGroup {
        group_id: GroupId,
        message: String,
        actor: String,
        reply: RpcReplyPort<ToggleReport>,
    },

    /// Unblock a group and its members.
    UnblockGroup {
        group_id: GroupId,
        reply: RpcReplyPort<ToggleReport>,
    },

    /// Block a single job.
    BlockJob {
        job_id: JobId,
        reply: RpcReplyPort<ToggleOutcome>,
    },

    /// Unblock a single job.
    UnblockJob {
        job_id: JobId,
        reply: RpcReplyPort<ToggleOutcome>,
    },

    /// Subscribe to events.
    Subscribe {
        sender: tokio::sync::broadcast::Sender<BlockEvent>,
    },

    /// Stop accepting toggles.
    Shutdown,
}

/// Result type for actor-layer operations.
pub type ActorResult<T> = Result<T, ActorError>;

/// Error type for actor operations.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    #[error("Actor error: {0}")]
    Actor(String),

    #[error("Failed to spawn actor: {0}")]
    Spawn(#[from] ractor::SpawnErr),

    #[error("Database error: {0}")]
    Database(#[from] block_db::DbError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
