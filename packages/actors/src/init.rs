//! Startup for the block system.

use std::sync::Arc;

use block_core::{
    AdmissionCheckers, AdmissionGate, BlockEvent, FlagStore, JobDirectory, MemoryFlagStore,
};
use block_db::DbConfig;
use block_db::repositories::FlagRepository;
use tokio::sync::broadcast;

use crate::block_actor::{BlockActorState, start_block_actor};
use crate::client::BlockClient;
use crate::messages::{ActorError, ActorResult};
use crate::registry::global_registry;

/// Configuration for [`init_block_system`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemConfig {
    /// Database connection used when `persist` is set.
    pub db: DbConfig,
    /// Load flags at startup and write every change through.
    pub persist: bool,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
    /// Registered actor name; `None` spawns an anonymous actor.
    pub actor_name: Option<String>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            db: DbConfig::memory(),
            persist: false,
            event_capacity: 1024,
            actor_name: None,
        }
    }
}

impl SystemConfig {
    /// Read configuration from `BLOCK_*` environment variables, falling back
    /// to defaults for anything unset.
    pub fn from_env() -> ActorResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ActorResult<Self> {
        let mut config = Self::default();

        if let Some(endpoint) = lookup("BLOCK_DB_ENDPOINT") {
            config.db = config.db.with_endpoint(endpoint);
            config.persist = true;
        }
        if let Some(namespace) = lookup("BLOCK_DB_NAMESPACE") {
            config.db = config.db.with_namespace(namespace);
        }
        if let Some(database) = lookup("BLOCK_DB_DATABASE") {
            config.db = config.db.with_database(database);
        }
        match (lookup("BLOCK_DB_USERNAME"), lookup("BLOCK_DB_PASSWORD")) {
            (Some(username), Some(password)) => {
                config.db = config.db.with_credentials(username, password);
            }
            (None, None) => {}
            _ => {
                return Err(ActorError::Config(
                    "BLOCK_DB_USERNAME and BLOCK_DB_PASSWORD must be set together".into(),
                ));
            }
        }
        if let Some(persist) = lookup("BLOCK_PERSIST") {
            config.persist = match persist.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(ActorError::Config(format!(
                        "BLOCK_PERSIST must be a boolean, got '{}'",
                        other
                    )));
                }
            };
        }
        if let Some(capacity) = lookup("BLOCK_EVENT_CAPACITY") {
            config.event_capacity = capacity
                .trim()
                .parse()
                .ok()
                .filter(|c: &usize| *c > 0)
                .ok_or_else(|| {
                    ActorError::Config(format!(
                        "BLOCK_EVENT_CAPACITY must be a positive integer, got '{}'",
                        capacity
                    ))
                })?;
        }
        config.actor_name = lookup("BLOCK_ACTOR_NAME");

        Ok(config)
    }
}

/// Handles to a running block system.
pub struct BlockSystem {
    /// Flag store shared by the gate and the actor.
    pub store: Arc<MemoryFlagStore>,
    /// Gate for direct, synchronous admission checks.
    pub gate: Arc<AdmissionGate>,
    /// Checker list with the gate registered first.
    pub checkers: AdmissionCheckers,
    /// Toggle interface through the actor.
    pub client: BlockClient,
    events: broadcast::Sender<BlockEvent>,
    handle: tokio::task::JoinHandle<()>,
}

impl BlockSystem {
    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<BlockEvent> {
        self.events.subscribe()
    }

    /// Stop the actor and wait for it to exit.
    pub async fn shutdown(self) -> ActorResult<()> {
        self.client.shutdown()?;
        self.handle
            .await
            .map_err(|e| ActorError::Actor(format!("Block actor did not stop cleanly: {}", e)))
    }
}

/// Initialize the block system.
///
/// When persistence is enabled the database is connected and every stored
/// flag is loaded before the actor starts accepting toggles.
pub async fn init_block_system(
    config: SystemConfig,
    directory: Arc<dyn JobDirectory>,
) -> ActorResult<BlockSystem> {
    tracing::info!("Initializing block system...");

    let store = Arc::new(MemoryFlagStore::new());

    if config.persist {
        block_db::init(config.db.clone()).await?;
        let snapshot = FlagRepository::load_all().await?;
        tracing::info!(
            "Restored {} group flags and {} job flags",
            snapshot.groups.len(),
            snapshot.jobs.len()
        );
        snapshot.restore_into(store.as_ref());
    }

    let (events, _) = broadcast::channel(config.event_capacity.max(1));

    let shared: Arc<dyn FlagStore> = store.clone();
    let state = BlockActorState::new(shared.clone(), directory.clone())
        .with_event_tx(events.clone())
        .with_persistence(config.persist);
    let (actor, handle) = start_block_actor(config.actor_name.clone(), state).await?;

    global_registry().register_block_actor(actor.clone());

    let gate = Arc::new(AdmissionGate::new(shared, directory));
    let checkers = AdmissionCheckers::new().with(gate.clone());

    tracing::info!("Block system initialized");

    Ok(BlockSystem {
        store,
        gate,
        checkers,
        client: BlockClient::new(actor),
        events,
        handle,
    })
}
