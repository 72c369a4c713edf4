//! Repository layer: persisted collections over the key-value store.
//!
//! # Invariants
//! - Every write rewrites the full collection value under its key.
//! - In-memory state is only replaced after the write succeeded.

pub mod board_repo;
pub mod collection;
