//! Actor registry for discovering the block actor.

use std::sync::{PoisonError, RwLock};

use ractor::ActorRef;

use crate::messages::BlockMessage;

/// Global actor registry.
///
/// Lets toggle surfaces find the block actor without passing references
/// through the entire call stack.
pub struct ActorRegistry {
    block: RwLock<Option<ActorRef<BlockMessage>>>,
}

impl ActorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            block: RwLock::new(None),
        }
    }

    /// Register the block actor, replacing any earlier one.
    pub fn register_block_actor(&self, actor: ActorRef<BlockMessage>) {
        *self.block.write().unwrap_or_else(PoisonError::into_inner) = Some(actor);
    }

    /// Get the block actor.
    pub fn get_block_actor(&self) -> Option<ActorRef<BlockMessage>> {
        self.block
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forget the block actor.
    pub fn unregister_block_actor(&self) {
        *self.block.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Default for ActorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global registry instance.
static REGISTRY: std::sync::LazyLock<ActorRegistry> = std::sync::LazyLock::new(ActorRegistry::new);

/// Get the global actor registry.
pub fn global_registry() -> &'static ActorRegistry {
    &REGISTRY
}
