use metro_core::db::open_db_in_memory;
use metro_core::{
    Bucket, KvStore, NotificationSnapshot, Organizer, OrganizerError, ResearchKind,
    SqliteKvStore, StoreKey,
};
use serde_json::Value;
use std::collections::BTreeSet;

fn organizer() -> Organizer<SqliteKvStore> {
    Organizer::open(SqliteKvStore::new(open_db_in_memory().unwrap())).unwrap()
}

fn persisted(organizer: &Organizer<SqliteKvStore>, key: StoreKey) -> Value {
    organizer
        .store()
        .get(key.as_str())
        .unwrap()
        .unwrap_or(Value::Null)
}

fn task_ids(organizer: &Organizer<SqliteKvStore>, bucket: Bucket) -> Vec<u64> {
    organizer
        .board()
        .bucket(bucket)
        .iter()
        .map(|task| task.id)
        .collect()
}

#[test]
fn book_then_task_then_move_updates_badges() {
    let mut organizer = organizer();

    let book = organizer.add_book("Dune", 412).unwrap();
    assert_eq!(organizer.books().len(), 1);
    assert_eq!(book.page_count, 412);
    assert_eq!(organizer.notifications().books, 1);

    let task = organizer.add_kanban_task(Bucket::Todo, "Read ch.1").unwrap();
    assert_eq!(organizer.notifications().kanban, 1);

    assert!(organizer
        .move_task(task.id, Bucket::Todo, Bucket::InProgress)
        .unwrap());
    assert_eq!(organizer.notifications().kanban, 0);
    assert_eq!(task_ids(&organizer, Bucket::InProgress), vec![task.id]);
    assert!(organizer.board().todo.is_empty());
}

#[test]
fn adds_preserve_order_and_persist_every_item() {
    let mut organizer = organizer();
    let titles = ["a", "b", "c", "d", "e"];
    for title in titles {
        organizer.add_course(title, "desc").unwrap();
    }

    let stored = persisted(&organizer, StoreKey::Courses);
    let stored_titles: Vec<&str> = stored
        .as_array()
        .unwrap()
        .iter()
        .map(|course| course["title"].as_str().unwrap())
        .collect();
    assert_eq!(stored_titles, titles);

    let ids: Vec<u64> = organizer.courses().iter().map(|course| course.id).collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn ids_are_unique_across_collections() {
    let mut organizer = organizer();
    let book = organizer.add_book("one", 1).unwrap();
    let peer = organizer.add_peer("ada", "online").unwrap();
    let task = organizer.add_kanban_task(Bucket::Done, "x").unwrap();
    let message = organizer.record_ai_exchange("q", "r").unwrap();

    let ids: BTreeSet<u64> = [book.id, peer.id, task.id, message.id].into_iter().collect();
    assert_eq!(ids.len(), 4);
}

#[test]
fn new_records_start_with_documented_defaults() {
    let mut organizer = organizer();

    let course = organizer.add_course("Rust", "ownership").unwrap();
    assert!(course.modules.is_empty());
    assert_eq!(course.student_count, 0);

    let item = organizer.add_research("Attention", "paper").unwrap();
    assert_eq!(item.kind, ResearchKind::Paper);
    assert!(item.highlights.is_empty());

    let meeting = organizer.schedule_meeting("standup", None, [3, 1, 3]).unwrap();
    assert_eq!(meeting.scheduled_at, meeting.created_at);
    assert_eq!(meeting.participants.into_iter().collect::<Vec<_>>(), vec![1, 3]);
}

#[test]
fn moving_twice_always_lands_at_end_of_destination() {
    let mut organizer = organizer();
    let first = organizer.add_kanban_task(Bucket::Todo, "first").unwrap();
    let second = organizer.add_kanban_task(Bucket::Todo, "second").unwrap();
    let third = organizer.add_kanban_task(Bucket::Todo, "third").unwrap();

    assert!(organizer.move_task(first.id, Bucket::Todo, Bucket::Done).unwrap());
    assert!(organizer.move_task(first.id, Bucket::Done, Bucket::Todo).unwrap());
    assert_eq!(
        task_ids(&organizer, Bucket::Todo),
        vec![second.id, third.id, first.id]
    );

    assert!(organizer.move_task(first.id, Bucket::Todo, Bucket::Done).unwrap());
    assert!(organizer.move_task(first.id, Bucket::Done, Bucket::Todo).unwrap());
    assert_eq!(
        task_ids(&organizer, Bucket::Todo),
        vec![second.id, third.id, first.id]
    );
}

#[test]
fn move_of_task_not_in_source_bucket_reports_failure() {
    let mut organizer = organizer();
    let task = organizer.add_kanban_task(Bucket::InProgress, "x").unwrap();
    let before = persisted(&organizer, StoreKey::Kanban);

    assert!(!organizer.move_task(task.id, Bucket::Todo, Bucket::Done).unwrap());
    assert!(!organizer.move_task(9_999, Bucket::InProgress, Bucket::Done).unwrap());
    assert_eq!(persisted(&organizer, StoreKey::Kanban), before);
    assert_eq!(organizer.board().locate(task.id), Some(Bucket::InProgress));
}

#[test]
fn delete_task_is_silent_for_absent_id() {
    let mut organizer = organizer();
    let task = organizer.add_kanban_task(Bucket::Todo, "x").unwrap();

    assert!(!organizer.delete_task(task.id, Bucket::Done).unwrap());
    assert!(organizer.delete_task(task.id, Bucket::Todo).unwrap());
    assert!(!organizer.delete_task(task.id, Bucket::Todo).unwrap());
    assert_eq!(organizer.notifications().kanban, 0);
    assert_eq!(organizer.board().total(), 0);
}

#[test]
fn notifications_track_every_collection_and_are_idempotent() {
    let mut organizer = organizer();
    organizer.add_book("b", 10).unwrap();
    organizer.add_research("r", "video").unwrap();
    organizer.add_research("r2", "podcast").unwrap();
    organizer.add_course("c", "d").unwrap();
    organizer.add_peer("p", "online").unwrap();
    organizer.schedule_meeting("m", None, []).unwrap();
    organizer.record_ai_exchange("q", "a").unwrap();
    organizer.add_kanban_task(Bucket::Todo, "t1").unwrap();
    organizer.add_kanban_task(Bucket::Done, "t2").unwrap();

    let expected = NotificationSnapshot {
        books: 1,
        research: 2,
        ai: 1,
        courses: 1,
        kanban: 1,
        p2p: 1,
        meetings: 1,
        stats: 0,
        settings: 0,
    };
    assert_eq!(organizer.notifications(), expected);
    assert_eq!(organizer.refresh_notifications().unwrap(), expected);
    assert_eq!(organizer.refresh_notifications().unwrap(), expected);
}

#[test]
fn notifications_read_from_store_not_memory() {
    let mut organizer = organizer();
    organizer.add_book("b", 10).unwrap();

    organizer
        .store()
        .set(StoreKey::Books.as_str(), &serde_json::json!([]))
        .unwrap();

    assert_eq!(organizer.refresh_notifications().unwrap().books, 0);
    assert_eq!(organizer.books().len(), 1);
}

#[test]
fn stats_count_all_buckets_and_accounts() {
    let mut organizer = organizer();
    organizer.start_registration().unwrap();
    organizer.register("alice", "123456").unwrap();
    organizer.add_kanban_task(Bucket::Todo, "a").unwrap();
    organizer.add_kanban_task(Bucket::InProgress, "b").unwrap();
    organizer.add_kanban_task(Bucket::Done, "c").unwrap();

    let stats = organizer.stats().unwrap();
    assert_eq!(stats.tasks, 3);
    assert_eq!(stats.users, 1);
    assert_eq!(organizer.notifications().kanban, 1);
}

#[test]
fn backup_excludes_accounts_and_session() {
    let mut organizer = organizer();
    organizer.start_registration().unwrap();
    organizer.register("top-secret-code", "123456").unwrap();
    organizer.add_book("Dune", 412).unwrap();
    organizer.add_kanban_task(Bucket::Todo, "Read ch.1").unwrap();

    let document = organizer.export_backup().unwrap();
    let json = document.to_pretty_json().unwrap();

    assert_eq!(document.books.len(), 1);
    assert_eq!(document.kanban.todo.len(), 1);
    assert!(!json.contains("top-secret-code"));
    assert!(!json.contains("totpSecret"));
}

#[test]
fn dark_mode_defaults_off_and_persists() {
    let mut organizer = organizer();
    assert!(!organizer.dark_mode());

    organizer.set_dark_mode(true).unwrap();
    assert!(organizer.dark_mode());
    assert_eq!(persisted(&organizer, StoreKey::DarkMode), Value::Bool(true));
}

#[test]
fn clear_cache_requires_confirmation() {
    let mut organizer = organizer();
    organizer.add_book("Dune", 412).unwrap();

    let err = organizer.clear_cache(false).unwrap_err();
    assert!(matches!(err, OrganizerError::ConfirmationRequired));
    assert_eq!(organizer.books().len(), 1);
}

#[test]
fn clear_cache_wipes_everything_and_old_credentials_stop_working() {
    let mut organizer = organizer();
    organizer.start_registration().unwrap();
    organizer.register("alice", "123456").unwrap();
    organizer.add_book("Dune", 412).unwrap();
    organizer.add_kanban_task(Bucket::Todo, "x").unwrap();
    organizer.set_dark_mode(true).unwrap();

    organizer.clear_cache(true).unwrap();

    assert!(!organizer.is_authenticated());
    assert!(organizer.books().is_empty());
    assert_eq!(organizer.board().total(), 0);
    assert!(!organizer.dark_mode());
    assert_eq!(organizer.notifications(), NotificationSnapshot::default());
    for key in StoreKey::ALL {
        assert_eq!(organizer.store().get(key.as_str()).unwrap(), None, "{key}");
    }

    let err = organizer.login("alice", "123456").unwrap_err();
    assert!(matches!(err, metro_core::AuthError::AccountNotFound));
}
