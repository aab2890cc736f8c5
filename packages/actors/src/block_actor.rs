//! Block actor that applies toggles, persists them and announces them.

use std::sync::Arc;

use block_core::{
    BlockEvent, BlockToggle, FlagStore, GroupId, JobDirectory, JobId, ToggleOutcome,
};
use block_db::repositories::FlagRepository;
use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::sync::broadcast;

use crate::messages::BlockMessage;

/// State for the block actor.
pub struct BlockActorState {
    /// Flag store shared with the admission gate.
    store: Arc<dyn FlagStore>,
    /// Toggle logic over the same store.
    toggle: BlockToggle,
    /// Event broadcaster.
    event_tx: Option<broadcast::Sender<BlockEvent>>,
    /// Whether changes are written through to the database.
    persist: bool,
}

impl BlockActorState {
    /// Create a new block actor state.
    pub fn new(store: Arc<dyn FlagStore>, directory: Arc<dyn JobDirectory>) -> Self {
        Self {
            toggle: BlockToggle::new(store.clone(), directory),
            store,
            event_tx: None,
            persist: false,
        }
    }

    /// Set the event broadcaster.
    pub fn with_event_tx(mut self, tx: broadcast::Sender<BlockEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Write changes through to the database (requires `block_db::init`).
    pub fn with_persistence(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Broadcast an event.
    fn broadcast(&self, event: BlockEvent) {
        tracing::debug!("{}", event.description());
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }

    async fn group_blocked(&self, group_id: GroupId) {
        let Some(flag) = self.store.get_group_flag(group_id) else {
            return;
        };

        if self.persist
            && let Err(e) = FlagRepository::save_group_flag(group_id, &flag).await
        {
            tracing::warn!("Failed to persist block of group {}: {}", group_id, e);
        }

        self.broadcast(BlockEvent::GroupBlocked {
            group_id,
            flag,
            timestamp: Utc::now(),
        });
    }

    async fn group_unblocked(&self, group_id: GroupId) {
        if self.persist
            && let Err(e) = FlagRepository::delete_group_flag(group_id).await
        {
            tracing::warn!("Failed to persist unblock of group {}: {}", group_id, e);
        }

        self.broadcast(BlockEvent::GroupUnblocked {
            group_id,
            timestamp: Utc::now(),
        });
    }

    async fn job_blocked(&self, job_id: JobId) {
        let Some(flag) = self.store.get_job_flag(job_id) else {
            return;
        };

        if self.persist
            && let Err(e) = FlagRepository::save_job_flag(job_id, &flag).await
        {
            tracing::warn!("Failed to persist block of job {}: {}", job_id, e);
        }

        self.broadcast(BlockEvent::JobBlocked {
            job_id,
            timestamp: Utc::now(),
        });
    }

    async fn job_unblocked(&self, job_id: JobId) {
        if self.persist
            && let Err(e) = FlagRepository::delete_job_flag(job_id).await
        {
            tracing::warn!("Failed to persist unblock of job {}: {}", job_id, e);
        }

        self.broadcast(BlockEvent::JobUnblocked {
            job_id,
            timestamp: Utc::now(),
        });
    }
}

fn log_missing(outcome: &ToggleOutcome) {
    if let Some(message) = outcome.validation_message() {
        tracing::info!("Toggle ignored: {}", message);
    }
}

/// Block actor that serializes toggle requests from external surfaces.
///
/// Admission checks never pass through here; they read the shared store
/// directly.
pub struct BlockActor;

impl Actor for BlockActor {
    type Msg = BlockMessage;
    type State = BlockActorState;
    type Arguments = BlockActorState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting block actor (persist: {})", args.persist);
        Ok(args)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            BlockMessage::BlockGroup {
                group_id,
                message,
                actor,
                reply,
            } => {
                let report = state.toggle.block_group(group_id, &message, &actor);
                log_missing(&report.outcome);

                if report.outcome.is_applied() {
                    state.group_blocked(group_id).await;
                }
                for job_id in &report.changed_jobs {
                    state.job_blocked(*job_id).await;
                }

                let _ = reply.send(report);
            }

            BlockMessage::UnblockGroup { group_id, reply } => {
                let report = state.toggle.unblock_group(group_id);
                log_missing(&report.outcome);

                if report.outcome.is_applied() {
                    state.group_unblocked(group_id).await;
                }
                for job_id in &report.changed_jobs {
                    state.job_unblocked(*job_id).await;
                }

                let _ = reply.send(report);
            }

            BlockMessage::BlockJob { job_id, reply } => {
                let outcome = state.toggle.block_job(job_id);
                log_missing(&outcome);

                if outcome.is_applied() {
                    state.job_blocked(job_id).await;
                }

                let _ = reply.send(outcome);
            }

            BlockMessage::UnblockJob { job_id, reply } => {
                let outcome = state.toggle.unblock_job(job_id);
                log_missing(&outcome);

                if outcome.is_applied() {
                    state.job_unblocked(job_id).await;
                }

                let _ = reply.send(outcome);
            }

            BlockMessage::Subscribe { sender } => {
                // Forward from our channel to the subscriber's
                if let Some(ref tx) = state.event_tx {
                    let mut rx = tx.subscribe();
                    tokio::spawn(async move {
                        while let Ok(event) = rx.recv().await {
                            if sender.send(event).is_err() {
                                break;
                            }
                        }
                    });
                }
            }

            BlockMessage::Shutdown => {
                tracing::info!("Shutting down block actor");
                myself.stop(None);
                return Ok(());
            }
        }

        Ok(())
    }
}

/// Start the block actor with the given state.
pub async fn start_block_actor(
    name: Option<String>,
    state: BlockActorState,
) -> Result<(ActorRef<BlockMessage>, tokio::task::JoinHandle<()>), ractor::SpawnErr> {
    Actor::spawn(name, BlockActor, state).await
}
