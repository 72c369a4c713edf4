//! Data backup export.
//!
//! # Invariants
//! - The document carries the seven data collections only; accounts and the
//!   current session are never included.
//! - There is no import path.

use crate::model::kanban::KanbanBoard;
use crate::model::library::{Book, Course, ResearchItem};
use crate::model::social::{AiMessage, Meeting, Peer};
use crate::model::Timestamp;
use crate::store::{load_or_default, KvStore, StoreKey, StoreResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub books: Vec<Book>,
    pub research: Vec<ResearchItem>,
    pub courses: Vec<Course>,
    pub kanban: KanbanBoard,
    pub peers: Vec<Peer>,
    pub meetings: Vec<Meeting>,
    pub ai_history: Vec<AiMessage>,
}

impl BackupDocument {
    /// Pretty-printed JSON, two-space indented.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Collects the backup document from persisted collections.
pub fn export_backup<S: KvStore + ?Sized>(store: &S) -> StoreResult<BackupDocument> {
    Ok(BackupDocument {
        books: load_or_default(store, StoreKey::Books)?,
        research: load_or_default(store, StoreKey::Research)?,
        courses: load_or_default(store, StoreKey::Courses)?,
        kanban: load_or_default(store, StoreKey::Kanban)?,
        peers: load_or_default(store, StoreKey::Peers)?,
        meetings: load_or_default(store, StoreKey::Meetings)?,
        ai_history: load_or_default(store, StoreKey::AiHistory)?,
    })
}

/// Download file name, e.g. `metro-lms-backup-1700000000000.json`.
pub fn backup_file_name(at: Timestamp) -> String {
    format!("metro-lms-backup-{}.json", at.timestamp_millis())
}
