//! Persistent key-value store (PKVS) contracts and typed helpers.
//!
//! # Responsibility
//! - Define the `get/set/delete/clear` contract every collection persists through.
//! - Name every application key in one place.
//! - Decode missing keys into documented defaults so callers only ever see
//!   "empty", never "missing".
//!
//! # Invariants
//! - Values are UTF-8 JSON documents.
//! - `clear` removes every application key, including the session and accounts.
//! - `next_id` never hands out the same id twice, even across `clear`.

use crate::db::DbError;
use crate::model::RecordId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite_kv;

pub use sqlite_kv::SqliteKvStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence error raised by store implementations and typed helpers.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Value could not be encoded to JSON before writing.
    Encode {
        key: String,
        source: serde_json::Error,
    },
    /// Persisted value is not valid JSON or does not match the expected shape.
    InvalidData {
        key: String,
        source: serde_json::Error,
    },
    /// Id allocator row is missing or out of range.
    IdSequence(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode { key, source } => write!(f, "failed to encode `{key}`: {source}"),
            Self::InvalidData { key, source } => {
                write!(f, "invalid persisted value for `{key}`: {source}")
            }
            Self::IdSequence(message) => write!(f, "id sequence unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode { source, .. } => Some(source),
            Self::InvalidData { source, .. } => Some(source),
            Self::IdSequence(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Every key the application owns in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Accounts,
    Books,
    Research,
    Courses,
    Kanban,
    Peers,
    Meetings,
    AiHistory,
    CurrentSession,
    DarkMode,
}

impl StoreKey {
    pub const ALL: [StoreKey; 10] = [
        StoreKey::Accounts,
        StoreKey::Books,
        StoreKey::Research,
        StoreKey::Courses,
        StoreKey::Kanban,
        StoreKey::Peers,
        StoreKey::Meetings,
        StoreKey::AiHistory,
        StoreKey::CurrentSession,
        StoreKey::DarkMode,
    ];

    /// Key string as written to storage.
    ///
    /// Matches the browser build's `localStorage` names so exported data
    /// lines up across both.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accounts => "lms_users",
            Self::Books => "lms_books",
            Self::Research => "lms_research",
            Self::Courses => "lms_courses",
            Self::Kanban => "lms_kanban",
            Self::Peers => "lms_peers",
            Self::Meetings => "lms_meetings",
            Self::AiHistory => "lms_ai_history",
            Self::CurrentSession => "lms_current_session",
            Self::DarkMode => "lms_dark_mode",
        }
    }
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw JSON key-value contract.
///
/// Implementations persist synchronously: when `set` returns `Ok`, a later
/// `get` (from this or a new handle on the same backing file) observes it.
pub trait KvStore {
    fn get(&self, key: &str) -> StoreResult<Option<Value>>;
    fn set(&self, key: &str, value: &Value) -> StoreResult<()>;
    fn delete(&self, key: &str) -> StoreResult<()>;
    /// Removes every application key. Irreversible.
    fn clear(&self) -> StoreResult<()>;
    /// Allocates the next record id. Strictly increasing for the store lifetime.
    fn next_id(&self) -> StoreResult<RecordId>;
}

/// Reads and decodes one key, falling back to `T::default()` when absent.
pub fn load_or_default<T, S>(store: &S, key: StoreKey) -> StoreResult<T>
where
    T: DeserializeOwned + Default,
    S: KvStore + ?Sized,
{
    Ok(load_optional(store, key)?.unwrap_or_default())
}

/// Reads and decodes one key, returning `None` when absent or JSON `null`.
pub fn load_optional<T, S>(store: &S, key: StoreKey) -> StoreResult<Option<T>>
where
    T: DeserializeOwned,
    S: KvStore + ?Sized,
{
    match store.get(key.as_str())? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| StoreError::InvalidData {
                key: key.as_str().to_string(),
                source,
            }),
    }
}

/// Encodes and writes one key, replacing any previous value.
pub fn save<T, S>(store: &S, key: StoreKey, value: &T) -> StoreResult<()>
where
    T: Serialize + ?Sized,
    S: KvStore + ?Sized,
{
    let encoded = serde_json::to_value(value).map_err(|source| StoreError::Encode {
        key: key.as_str().to_string(),
        source,
    })?;
    store.set(key.as_str(), &encoded)
}
