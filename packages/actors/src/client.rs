//! Request/reply helpers over the block actor.

use block_core::{BlockEvent, GroupId, JobId, ToggleOutcome, ToggleReport};
use ractor::ActorRef;
use tokio::sync::broadcast;

use crate::messages::{ActorError, ActorResult, BlockMessage};

/// Toggle interface for external surfaces, backed by the block actor.
#[derive(Clone)]
pub struct BlockClient {
    actor: ActorRef<BlockMessage>,
}

impl BlockClient {
    pub fn new(actor: ActorRef<BlockMessage>) -> Self {
        Self { actor }
    }

    /// Underlying actor reference.
    pub fn actor(&self) -> &ActorRef<BlockMessage> {
        &self.actor
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(ractor::RpcReplyPort<T>) -> BlockMessage,
    ) -> ActorResult<T> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.actor
            .send_message(build(tx.into()))
            .map_err(|e| ActorError::Actor(format!("Failed to send message: {}", e)))?;

        rx.await
            .map_err(|_| ActorError::Actor("Failed to receive response".into()))
    }

    /// Block a group and its members.
    pub async fn block_group(
        &self,
        group_id: GroupId,
        message: impl Into<String>,
        actor: impl Into<String>,
    ) -> ActorResult<ToggleReport> {
        let message = message.into();
        let actor = actor.into();
        self.request(|reply| BlockMessage::BlockGroup {
            group_id,
            message,
            actor,
            reply,
        })
        .await
    }

    /// Unblock a group and its members.
    pub async fn unblock_group(&self, group_id: GroupId) -> ActorResult<ToggleReport> {
        self.request(|reply| BlockMessage::UnblockGroup { group_id, reply })
            .await
    }

    /// Block a single job.
    pub async fn block_job(&self, job_id: JobId) -> ActorResult<ToggleOutcome> {
        self.request(|reply| BlockMessage::BlockJob { job_id, reply })
            .await
    }

    /// Unblock a single job.
    pub async fn unblock_job(&self, job_id: JobId) -> ActorResult<ToggleOutcome> {
        self.request(|reply| BlockMessage::UnblockJob { job_id, reply })
            .await
    }

    /// Forward block events into the given channel.
    pub fn subscribe(&self, sender: broadcast::Sender<BlockEvent>) -> ActorResult<()> {
        self.actor
            .send_message(BlockMessage::Subscribe { sender })
            .map_err(|e| ActorError::Actor(format!("Failed to send message: {}", e)))
    }

    /// Stop the actor.
    pub fn shutdown(&self) -> ActorResult<()> {
        self.actor
            .send_message(BlockMessage::Shutdown)
            .map_err(|e| ActorError::Actor(format!("Failed to send message: {}", e)))
    }
}
