//! Organizer domain model.
//!
//! # Responsibility
//! - Define the records persisted in each store collection.
//! - Keep JSON field names compatible with the browser build's export format.
//!
//! # Invariants
//! - Every record is identified by a `RecordId` drawn from the store sequence.
//! - Records are immutable after creation; only kanban tasks change bucket.

use chrono::{DateTime, Utc};

pub mod account;
pub mod kanban;
pub mod library;
pub mod social;

/// Store-allocated record identifier. Strictly increasing in creation order.
pub type RecordId = u64;

/// Creation/scheduling instant, serialized as RFC 3339.
pub type Timestamp = DateTime<Utc>;
