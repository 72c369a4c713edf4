//! Totals for the statistics screen.

use crate::model::account::Account;
use crate::model::kanban::KanbanBoard;
use crate::model::library::{Book, Course, ResearchItem};
use crate::model::social::{AiMessage, Meeting, Peer};
use crate::store::{load_or_default, KvStore, StoreKey, StoreResult};
use serde::{Deserialize, Serialize};

/// Collection sizes. Unlike the notification badges, `tasks` spans all
/// three buckets and `users` counts registered accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub books: usize,
    pub research: usize,
    pub courses: usize,
    pub ai_queries: usize,
    pub tasks: usize,
    pub peers: usize,
    pub meetings: usize,
    pub users: usize,
}

pub fn summarize<S: KvStore + ?Sized>(store: &S) -> StoreResult<StatsSummary> {
    Ok(StatsSummary {
        books: load_or_default::<Vec<Book>, _>(store, StoreKey::Books)?.len(),
        research: load_or_default::<Vec<ResearchItem>, _>(store, StoreKey::Research)?.len(),
        courses: load_or_default::<Vec<Course>, _>(store, StoreKey::Courses)?.len(),
        ai_queries: load_or_default::<Vec<AiMessage>, _>(store, StoreKey::AiHistory)?.len(),
        tasks: load_or_default::<KanbanBoard, _>(store, StoreKey::Kanban)?.total(),
        peers: load_or_default::<Vec<Peer>, _>(store, StoreKey::Peers)?.len(),
        meetings: load_or_default::<Vec<Meeting>, _>(store, StoreKey::Meetings)?.len(),
        users: load_or_default::<Vec<Account>, _>(store, StoreKey::Accounts)?.len(),
    })
}
