//! Core domain logic for the Metro organizer.
//! This crate is the single source of truth for stored data and session rules.

pub mod auth;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, init_logging_with, logging_status, LogConfig};
pub use model::account::{Account, Session};
pub use model::kanban::{Bucket, KanbanBoard, KanbanTask};
pub use model::library::{Book, Course, ResearchItem, ResearchKind};
pub use model::social::{AiMessage, Meeting, Peer};
pub use model::{RecordId, Timestamp};
pub use service::backup_service::{backup_file_name, BackupDocument};
pub use service::notification_service::NotificationSnapshot;
pub use service::organizer::{Organizer, OrganizerError, OrganizerResult};
pub use service::session_service::{AuthError, AuthResult, AuthState, PendingRegistration};
pub use service::stats_service::StatsSummary;
pub use store::{KvStore, SqliteKvStore, StoreError, StoreKey, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Opens (or creates) the organizer store at `path` and hydrates a controller.
pub fn open_organizer(
    path: impl AsRef<std::path::Path>,
) -> OrganizerResult<Organizer<SqliteKvStore>> {
    let conn = db::open_db(path).map_err(StoreError::from)?;
    Ok(Organizer::open(SqliteKvStore::new(conn))?)
}
