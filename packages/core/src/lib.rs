//! Core types and decision logic for blocking pipeline jobs.
//!
//! This crate contains everything the scheduler and the toggle surfaces share:
//! - Job and Group for the host's hierarchy, BlockFlag for an active block
//! - FlagStore and JobDirectory seams with in-memory implementations
//! - AdmissionGate and the ordered AdmissionCheckers list
//! - BlockToggle for block/unblock with group fan-out
//! - Branch build strategies and block events

mod branch;
mod decision;
mod directory;
mod events;
mod flag;
mod gate;
mod group;
mod job;
mod store;
mod toggle;

pub use branch::{
    BranchBuildStrategies, BranchBuildStrategy, BranchRevision, DisableBranchBuildStrategy,
};
pub use decision::{AdmissionDecision, BlockCause, BlockScope};
pub use directory::{Catalog, JobDirectory};
pub use events::BlockEvent;
pub use flag::BlockFlag;
pub use gate::{AdmissionChecker, AdmissionCheckers, AdmissionGate};
pub use group::{Group, GroupId};
pub use job::{Job, JobId};
pub use store::{FlagSnapshot, FlagStore, MemoryFlagStore};
pub use toggle::{BlockToggle, Missing, ToggleOutcome, ToggleReport};
