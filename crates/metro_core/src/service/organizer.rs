//! Application controller.
//!
//! # Responsibility
//! - Own every hydrated collection, the kanban board, the session state and
//!   the latest notification snapshot.
//! - Apply each mutation as: change in memory, persist the whole collection,
//!   recompute notifications.
//!
//! # Invariants
//! - One `Organizer` per store; `&mut self` on every mutation keeps a single
//!   writer. Callers sharing it across threads wrap it in a `Mutex`.
//! - Ids come from the store sequence, so creation order equals id order.
//! - Data operations do not require an active session.

use crate::model::account::Session;
use crate::model::kanban::{Bucket, KanbanBoard, KanbanTask};
use crate::model::library::{Book, Course, ResearchItem, ResearchKind};
use crate::model::social::{AiMessage, Meeting, Peer};
use crate::model::{RecordId, Timestamp};
use crate::repo::board_repo::BoardRepository;
use crate::repo::collection::Collection;
use crate::service::backup_service::{export_backup, BackupDocument};
use crate::service::notification_service::{recompute, NotificationSnapshot};
use crate::service::session_service::{
    AuthError, AuthResult, AuthState, PendingRegistration, SessionService,
};
use crate::service::stats_service::{summarize, StatsSummary};
use crate::store::{load_or_default, save, KvStore, StoreError, StoreKey, StoreResult};
use chrono::Utc;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type OrganizerResult<T> = Result<T, OrganizerError>;

#[derive(Debug)]
pub enum OrganizerError {
    Auth(AuthError),
    Store(StoreError),
    /// `clear_cache` called without explicit confirmation.
    ConfirmationRequired,
}

impl Display for OrganizerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::ConfirmationRequired => {
                write!(f, "clearing all data requires explicit confirmation")
            }
        }
    }
}

impl Error for OrganizerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Auth(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::ConfirmationRequired => None,
        }
    }
}

impl From<AuthError> for OrganizerError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<StoreError> for OrganizerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Single controller over the organizer's persisted state.
pub struct Organizer<S: KvStore> {
    store: S,
    session: SessionService,
    books: Collection<Book>,
    research: Collection<ResearchItem>,
    courses: Collection<Course>,
    peers: Collection<Peer>,
    meetings: Collection<Meeting>,
    ai_history: Collection<AiMessage>,
    board: BoardRepository,
    dark_mode: bool,
    notifications: NotificationSnapshot,
}

impl<S: KvStore> Organizer<S> {
    /// Hydrates every collection and the session from `store`.
    ///
    /// A persisted session resumes `Authenticated` without re-verification.
    pub fn open(store: S) -> StoreResult<Self> {
        let session = SessionService::hydrate(&store)?;
        let organizer = Self {
            books: Collection::load(&store, StoreKey::Books)?,
            research: Collection::load(&store, StoreKey::Research)?,
            courses: Collection::load(&store, StoreKey::Courses)?,
            peers: Collection::load(&store, StoreKey::Peers)?,
            meetings: Collection::load(&store, StoreKey::Meetings)?,
            ai_history: Collection::load(&store, StoreKey::AiHistory)?,
            board: BoardRepository::load(&store)?,
            dark_mode: load_or_default(&store, StoreKey::DarkMode)?,
            notifications: recompute(&store)?,
            session,
            store,
        };
        info!(
            "event=organizer_open module=organizer status=ok auth_state={} accounts={} books={} tasks={}",
            organizer.session.state().label(),
            organizer.session.accounts().len(),
            organizer.books.len(),
            organizer.board.board().total()
        );
        Ok(organizer)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Releases the underlying store.
    pub fn into_store(self) -> S {
        self.store
    }

    pub fn auth_state(&self) -> &AuthState {
        self.session.state()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn start_registration(&mut self) -> AuthResult<PendingRegistration> {
        self.session.start_registration()
    }

    pub fn cancel_registration(&mut self) {
        self.session.cancel_registration();
    }

    pub fn register(&mut self, access_code: &str, totp_code: &str) -> AuthResult<Session> {
        self.session.register(&self.store, access_code, totp_code)
    }

    pub fn login(&mut self, access_code: &str, totp_code: &str) -> AuthResult<Session> {
        self.session.login(&self.store, access_code, totp_code)
    }

    pub fn logout(&mut self) -> StoreResult<()> {
        self.session.logout(&self.store)
    }

    pub fn books(&self) -> &[Book] {
        self.books.items()
    }

    pub fn research(&self) -> &[ResearchItem] {
        self.research.items()
    }

    pub fn courses(&self) -> &[Course] {
        self.courses.items()
    }

    pub fn peers(&self) -> &[Peer] {
        self.peers.items()
    }

    pub fn meetings(&self) -> &[Meeting] {
        self.meetings.items()
    }

    pub fn ai_history(&self) -> &[AiMessage] {
        self.ai_history.items()
    }

    pub fn board(&self) -> &KanbanBoard {
        self.board.board()
    }

    pub fn add_book(&mut self, title: impl Into<String>, page_count: u32) -> StoreResult<Book> {
        let title = title.into();
        let book = append_record(&self.store, &mut self.books, |id, now| {
            Book::new(id, title, page_count, now)
        })?;
        self.refresh_notifications()?;
        Ok(book)
    }

    pub fn add_research(
        &mut self,
        title: impl Into<String>,
        kind: impl Into<ResearchKind>,
    ) -> StoreResult<ResearchItem> {
        let (title, kind) = (title.into(), kind.into());
        let item = append_record(&self.store, &mut self.research, |id, now| {
            ResearchItem::new(id, title, kind, now)
        })?;
        self.refresh_notifications()?;
        Ok(item)
    }

    pub fn add_course(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> StoreResult<Course> {
        let (title, description) = (title.into(), description.into());
        let course = append_record(&self.store, &mut self.courses, |id, now| {
            Course::new(id, title, description, now)
        })?;
        self.refresh_notifications()?;
        Ok(course)
    }

    pub fn add_peer(
        &mut self,
        display_name: impl Into<String>,
        status: impl Into<String>,
    ) -> StoreResult<Peer> {
        let (display_name, status) = (display_name.into(), status.into());
        let peer = append_record(&self.store, &mut self.peers, |id, now| {
            Peer::new(id, display_name, status, now)
        })?;
        self.refresh_notifications()?;
        Ok(peer)
    }

    /// Records a meeting room. `scheduled_at = None` means "now".
    pub fn schedule_meeting(
        &mut self,
        room: impl Into<String>,
        scheduled_at: Option<Timestamp>,
        participants: impl IntoIterator<Item = RecordId>,
    ) -> StoreResult<Meeting> {
        let room = room.into();
        let participants = participants.into_iter().collect();
        let meeting = append_record(&self.store, &mut self.meetings, |id, now| {
            Meeting::new(id, room, scheduled_at.unwrap_or(now), participants, now)
        })?;
        self.refresh_notifications()?;
        Ok(meeting)
    }

    /// Appends one assistant exchange. History has no delete.
    pub fn record_ai_exchange(
        &mut self,
        query: impl Into<String>,
        response: impl Into<String>,
    ) -> StoreResult<AiMessage> {
        let (query, response) = (query.into(), response.into());
        let message = append_record(&self.store, &mut self.ai_history, |id, now| {
            AiMessage::new(id, query, response, now)
        })?;
        self.refresh_notifications()?;
        Ok(message)
    }

    pub fn add_kanban_task(
        &mut self,
        bucket: Bucket,
        text: impl Into<String>,
    ) -> StoreResult<KanbanTask> {
        let task = KanbanTask::new(self.store.next_id()?, text, Utc::now());
        self.board.add_task(&self.store, bucket, task.clone())?;
        debug!(
            "event=task_add module=organizer status=ok task_id={} bucket={}",
            task.id, bucket
        );
        self.refresh_notifications()?;
        Ok(task)
    }

    /// Moves a task to the end of `to`. `Ok(false)` when it is not in `from`.
    pub fn move_task(&mut self, task_id: RecordId, from: Bucket, to: Bucket) -> StoreResult<bool> {
        let moved = self.board.move_task(&self.store, task_id, from, to)?;
        if !moved {
            debug!(
                "event=task_move module=organizer status=miss task_id={} from={}",
                task_id, from
            );
            return Ok(false);
        }
        self.refresh_notifications()?;
        Ok(true)
    }

    /// Removes a task. Absent ids are a silent no-op reported as `Ok(false)`.
    pub fn delete_task(&mut self, task_id: RecordId, bucket: Bucket) -> StoreResult<bool> {
        let removed = self.board.delete_task(&self.store, task_id, bucket)?;
        if removed {
            self.refresh_notifications()?;
        }
        Ok(removed)
    }

    /// Snapshot computed after the last mutation (or on open).
    pub fn notifications(&self) -> NotificationSnapshot {
        self.notifications
    }

    /// Re-reads the store and replaces the cached snapshot.
    pub fn refresh_notifications(&mut self) -> StoreResult<NotificationSnapshot> {
        self.notifications = recompute(&self.store)?;
        Ok(self.notifications)
    }

    pub fn stats(&self) -> StoreResult<StatsSummary> {
        summarize(&self.store)
    }

    pub fn export_backup(&self) -> StoreResult<BackupDocument> {
        export_backup(&self.store)
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn set_dark_mode(&mut self, enabled: bool) -> StoreResult<()> {
        save(&self.store, StoreKey::DarkMode, &enabled)?;
        self.dark_mode = enabled;
        Ok(())
    }

    /// Wipes every application key, including accounts and the session.
    ///
    /// Irreversible. Refuses to run unless `confirmed` is `true`.
    pub fn clear_cache(&mut self, confirmed: bool) -> OrganizerResult<()> {
        if !confirmed {
            warn!("event=cache_clear module=organizer status=error error_code=confirmation_required");
            return Err(OrganizerError::ConfirmationRequired);
        }

        self.store.clear()?;
        self.session.reset();
        self.books.reset();
        self.research.reset();
        self.courses.reset();
        self.peers.reset();
        self.meetings.reset();
        self.ai_history.reset();
        self.board.reset();
        self.dark_mode = false;
        self.refresh_notifications()?;
        info!("event=cache_clear module=organizer status=ok");
        Ok(())
    }
}

fn append_record<S, T>(
    store: &S,
    collection: &mut Collection<T>,
    build: impl FnOnce(RecordId, Timestamp) -> T,
) -> StoreResult<T>
where
    S: KvStore + ?Sized,
    T: Serialize + DeserializeOwned + Clone,
{
    let record = build(store.next_id()?, Utc::now());
    let stored = collection.append(store, record)?.clone();
    debug!(
        "event=record_add module=organizer status=ok key={} total={}",
        collection.key(),
        collection.len()
    );
    Ok(stored)
}
