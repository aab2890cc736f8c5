//! Actor system for block toggles.
//!
//! This crate provides the Ractor-based front-end that external surfaces use
//! to block and unblock groups and jobs, plus startup wiring.
//!
//! # Architecture
//!
//! - `BlockActor` - Applies toggles one at a time, writes them through to the
//!   database and broadcasts `BlockEvent`s
//! - `BlockClient` - Request/reply wrapper around the actor
//! - `BlockSystem` - Store, gate, checker list and client created together
//!
//! # Usage
//!
//! ```ignore
//! use block_actors::{SystemConfig, init_block_system};
//!
//! let system = init_block_system(SystemConfig::from_env()?, catalog).await?;
//! system.client.block_group(group_id, "maintenance", "bob").await?;
//! assert!(system.checkers.evaluate(job_id).is_blocked());
//! ```

mod block_actor;
mod client;
mod init;
mod messages;
pub mod registry;

pub use block_actor::{BlockActor, BlockActorState, start_block_actor};
pub use client::BlockClient;
pub use init::{BlockSystem, SystemConfig, init_block_system};
pub use messages::{ActorError, ActorResult, BlockMessage};
pub use registry::{ActorRegistry, global_registry};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, concurrency};
