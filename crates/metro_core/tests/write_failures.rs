use chrono::Utc;
use metro_core::db::open_db_in_memory;
use metro_core::repo::board_repo::BoardRepository;
use metro_core::repo::collection::Collection;
use metro_core::{
    AuthError, AuthState, Bucket, KanbanTask, KvStore, Organizer, RecordId, SqliteKvStore,
    StoreError, StoreKey, StoreResult,
};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;

/// Store whose writes to selected keys fail once their budget is used up.
struct FlakyStore {
    inner: SqliteKvStore,
    budgets: RefCell<HashMap<&'static str, usize>>,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: SqliteKvStore::new(open_db_in_memory().unwrap()),
            budgets: RefCell::new(HashMap::new()),
        }
    }

    fn fail_writes(&self, key: StoreKey) {
        self.fail_writes_after(key, 0);
    }

    fn fail_writes_after(&self, key: StoreKey, allowed: usize) {
        self.budgets.borrow_mut().insert(key.as_str(), allowed);
    }

    fn heal(&self) {
        self.budgets.borrow_mut().clear();
    }

    fn raw(&self, key: StoreKey) -> Option<Value> {
        self.inner.get(key.as_str()).unwrap()
    }
}

fn disk_full() -> StoreError {
    StoreError::from(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_FULL),
        Some("database or disk is full".to_string()),
    ))
}

impl KvStore for FlakyStore {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &Value) -> StoreResult<()> {
        {
            let mut budgets = self.budgets.borrow_mut();
            if let Some(remaining) = budgets.get_mut(key) {
                if *remaining == 0 {
                    return Err(disk_full());
                }
                *remaining -= 1;
            }
        }
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.inner.delete(key)
    }

    fn clear(&self) -> StoreResult<()> {
        self.inner.clear()
    }

    fn next_id(&self) -> StoreResult<RecordId> {
        self.inner.next_id()
    }
}

#[test]
fn failed_append_keeps_collection_and_store_unchanged() {
    let store = FlakyStore::new();
    let mut peers = Collection::<String>::empty(StoreKey::Peers);
    peers.append(&store, "ada".to_string()).unwrap();

    store.fail_writes(StoreKey::Peers);
    let err = peers.append(&store, "grace".to_string()).unwrap_err();

    assert!(matches!(err, StoreError::Db(_)));
    assert_eq!(peers.items().to_vec(), vec!["ada".to_string()]);
    assert_eq!(store.raw(StoreKey::Peers), Some(json!(["ada"])));
}

#[test]
fn failed_board_writes_keep_board_and_store_unchanged() {
    let store = FlakyStore::new();
    let mut board = BoardRepository::load(&store).unwrap();
    board
        .add_task(&store, Bucket::Todo, KanbanTask::new(1, "plan", Utc::now()))
        .unwrap();
    let persisted = store.raw(StoreKey::Kanban);

    store.fail_writes(StoreKey::Kanban);
    board
        .add_task(&store, Bucket::Todo, KanbanTask::new(2, "build", Utc::now()))
        .unwrap_err();
    board
        .move_task(&store, 1, Bucket::Todo, Bucket::Done)
        .unwrap_err();

    assert_eq!(board.board().bucket(Bucket::Todo).len(), 1);
    assert_eq!(board.board().bucket(Bucket::Todo)[0].id, 1);
    assert!(board.board().bucket(Bucket::Done).is_empty());
    assert_eq!(store.raw(StoreKey::Kanban), persisted);
}

#[test]
fn failed_add_keeps_organizer_counts() {
    let mut organizer = Organizer::open(FlakyStore::new()).unwrap();

    organizer.store().fail_writes(StoreKey::Books);
    organizer.add_book("Dune", 412).unwrap_err();

    assert!(organizer.books().is_empty());
    assert_eq!(organizer.notifications().books, 0);
    assert_eq!(organizer.store().raw(StoreKey::Books), None);
}

#[test]
fn failed_dark_mode_write_keeps_preference() {
    let mut organizer = Organizer::open(FlakyStore::new()).unwrap();

    organizer.store().fail_writes(StoreKey::DarkMode);
    organizer.set_dark_mode(true).unwrap_err();

    assert!(!organizer.dark_mode());
    assert_eq!(organizer.store().raw(StoreKey::DarkMode), None);
}

#[test]
fn failed_session_write_rolls_back_new_account() {
    let mut organizer = Organizer::open(FlakyStore::new()).unwrap();
    let pending = organizer.start_registration().unwrap();

    organizer.store().fail_writes(StoreKey::CurrentSession);
    let err = organizer.register("alice", "123456").unwrap_err();

    assert!(matches!(err, AuthError::Store(_)));
    match organizer.auth_state() {
        AuthState::Registering(current) => assert_eq!(current, &pending),
        other => panic!("expected registering, got {}", other.label()),
    }
    assert_eq!(organizer.stats().unwrap().users, 0);
    assert_eq!(organizer.store().raw(StoreKey::CurrentSession), None);

    organizer.store().heal();
    organizer.register("alice", "123456").unwrap();

    assert!(organizer.is_authenticated());
    assert_eq!(organizer.stats().unwrap().users, 1);
}

#[test]
fn failed_rollback_discards_pending_secret() {
    let mut organizer = Organizer::open(FlakyStore::new()).unwrap();
    organizer.start_registration().unwrap();

    organizer.store().fail_writes(StoreKey::CurrentSession);
    organizer.store().fail_writes_after(StoreKey::Accounts, 1);
    organizer.register("alice", "123456").unwrap_err();

    assert!(matches!(organizer.auth_state(), AuthState::Unauthenticated));
    let err = organizer.register("alice", "123456").unwrap_err();
    assert!(matches!(err, AuthError::RegistrationNotStarted));
}
