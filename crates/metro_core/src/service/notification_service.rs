//! Per-section badge counts for the dashboard tiles.
//!
//! # Invariants
//! - Every recompute reads each collection from the store, never from a
//!   controller's in-memory copy.
//! - `kanban` counts the todo bucket only.
//! - `stats` and `settings` are always zero.

use crate::model::kanban::KanbanBoard;
use crate::model::library::{Book, Course, ResearchItem};
use crate::model::social::{AiMessage, Meeting, Peer};
use crate::store::{load_or_default, KvStore, StoreKey, StoreResult};
use serde::{Deserialize, Serialize};

/// Read-only count snapshot for the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSnapshot {
    pub books: usize,
    pub research: usize,
    pub ai: usize,
    pub courses: usize,
    pub kanban: usize,
    pub p2p: usize,
    pub meetings: usize,
    pub stats: usize,
    pub settings: usize,
}

impl NotificationSnapshot {
    /// Sum of all badges.
    pub fn total(&self) -> usize {
        self.books
            + self.research
            + self.ai
            + self.courses
            + self.kanban
            + self.p2p
            + self.meetings
            + self.stats
            + self.settings
    }
}

/// Derives a fresh snapshot from persisted collections.
pub fn recompute<S: KvStore + ?Sized>(store: &S) -> StoreResult<NotificationSnapshot> {
    let board = load_or_default::<KanbanBoard, _>(store, StoreKey::Kanban)?;
    Ok(NotificationSnapshot {
        books: load_or_default::<Vec<Book>, _>(store, StoreKey::Books)?.len(),
        research: load_or_default::<Vec<ResearchItem>, _>(store, StoreKey::Research)?.len(),
        ai: load_or_default::<Vec<AiMessage>, _>(store, StoreKey::AiHistory)?.len(),
        courses: load_or_default::<Vec<Course>, _>(store, StoreKey::Courses)?.len(),
        kanban: board.todo.len(),
        p2p: load_or_default::<Vec<Peer>, _>(store, StoreKey::Peers)?.len(),
        meetings: load_or_default::<Vec<Meeting>, _>(store, StoreKey::Meetings)?.len(),
        stats: 0,
        settings: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::{recompute, NotificationSnapshot};
    use crate::db::open_db_in_memory;
    use crate::store::{KvStore, SqliteKvStore, StoreKey};
    use serde_json::json;

    #[test]
    fn empty_store_yields_zero_snapshot() {
        let store = SqliteKvStore::new(open_db_in_memory().expect("open db"));
        assert_eq!(
            recompute(&store).expect("recompute"),
            NotificationSnapshot::default()
        );
    }

    #[test]
    fn kanban_badge_counts_todo_bucket_only() {
        let store = SqliteKvStore::new(open_db_in_memory().expect("open db"));
        let task = |id: u64| json!({ "id": id, "text": "t", "createdAt": "2024-01-01T00:00:00Z" });
        store
            .set(
                StoreKey::Kanban.as_str(),
                &json!({ "todo": [task(1)], "inProgress": [task(2)], "done": [task(3), task(4)] }),
            )
            .expect("seed board");

        let snapshot = recompute(&store).expect("recompute");
        assert_eq!(snapshot.kanban, 1);
        assert_eq!(snapshot.total(), 1);
    }
}
