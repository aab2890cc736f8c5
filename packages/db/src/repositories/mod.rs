//! Repository implementations for database operations.

mod flag_repo;

pub use flag_repo::FlagRepository;
