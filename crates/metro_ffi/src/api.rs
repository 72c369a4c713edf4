//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Own the single process-wide organizer controller.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call holds the controller lock for its whole read-modify-write.
//! - Record ids cross the boundary as decimal strings.
//! - `clear_cache` only runs with `confirmed = true`.

use log::error;
use metro_core::{
    backup_file_name, core_version as core_version_inner, init_logging as init_logging_inner,
    open_organizer, ping as ping_inner, AuthState, Bucket, Organizer, RecordId, SqliteKvStore,
};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

const DB_FILE_NAME: &str = "metro_organizer.sqlite3";
const DB_PATH_ENV: &str = "METRO_DB_PATH";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static ORGANIZER: Mutex<Option<Organizer<SqliteKvStore>>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Id of the created or affected record, when there is one.
    pub record_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, record_id: Option<RecordId>) -> Self {
        Self {
            ok: true,
            record_id: record_id.map(|id| id.to_string()),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            record_id: None,
            message: message.into(),
        }
    }
}

/// Current authentication state for the login screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStatusResponse {
    /// `unauthenticated|registering|authenticated`, or `error`.
    pub state: String,
    /// Signed-in account id.
    pub account_id: Option<String>,
    pub message: String,
}

/// Enrollment material shown while registering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationResponse {
    pub ok: bool,
    /// Base32 secret for manual entry.
    pub secret: String,
    /// `otpauth://` URI to render as a scannable code.
    pub setup_uri: String,
    pub message: String,
}

/// Dashboard badge counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationsResponse {
    pub books: u32,
    pub research: u32,
    pub ai: u32,
    pub courses: u32,
    pub kanban: u32,
    pub p2p: u32,
    pub meetings: u32,
    pub stats: u32,
    pub settings: u32,
    pub message: String,
}

/// JSON payload envelope for list views and backups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonResponse {
    pub ok: bool,
    /// Suggested download name; set for backups only.
    pub file_name: Option<String>,
    pub json: String,
    pub message: String,
}

impl JsonResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            file_name: None,
            json: String::new(),
            message: message.into(),
        }
    }
}

/// Returns the current authentication state.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_status() -> AuthStatusResponse {
    let result = with_organizer(|organizer| {
        Ok(match organizer.auth_state() {
            AuthState::Authenticated(session) => (
                "authenticated",
                Some(session.account_id().to_string()),
            ),
            other => (other.label(), None),
        })
    });
    match result {
        Ok((state, account_id)) => AuthStatusResponse {
            state: state.to_string(),
            account_id,
            message: String::new(),
        },
        Err(err) => AuthStatusResponse {
            state: "error".to_string(),
            account_id: None,
            message: format!("auth_status failed: {err}"),
        },
    }
}

/// Starts enrollment and returns the secret plus setup URI.
///
/// Nothing is persisted until `auth_register` succeeds.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_start_registration() -> RegistrationResponse {
    match with_organizer(|organizer| organizer.start_registration().map_err(|err| err.to_string()))
    {
        Ok(pending) => RegistrationResponse {
            ok: true,
            secret: pending.secret().to_string(),
            setup_uri: pending.setup_uri().to_string(),
            message: "Scan the code with your authenticator app.".to_string(),
        },
        Err(err) => RegistrationResponse {
            ok: false,
            secret: String::new(),
            setup_uri: String::new(),
            message: format!("auth_start_registration failed: {err}"),
        },
    }
}

/// Abandons enrollment and returns to the login screen.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_cancel_registration() -> ActionResponse {
    match with_organizer(|organizer| {
        organizer.cancel_registration();
        Ok(())
    }) {
        Ok(()) => ActionResponse::success("Registration cancelled.", None),
        Err(err) => ActionResponse::failure(format!("auth_cancel_registration failed: {err}")),
    }
}

/// Completes enrollment and signs the new account in.
///
/// # FFI contract
/// - `ok=false` with message `invalid 2FA code` when the code is rejected;
///   registration stays pending so the caller can retry.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_register(access_code: String, totp_code: String) -> ActionResponse {
    match with_organizer(|organizer| {
        organizer
            .register(access_code.as_str(), totp_code.as_str())
            .map_err(|err| err.to_string())
    }) {
        Ok(session) => ActionResponse::success("Account created.", Some(session.account_id())),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Signs in with access code and one-time code.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_login(access_code: String, totp_code: String) -> ActionResponse {
    match with_organizer(|organizer| {
        organizer
            .login(access_code.as_str(), totp_code.as_str())
            .map_err(|err| err.to_string())
    }) {
        Ok(session) => ActionResponse::success("Signed in.", Some(session.account_id())),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Ends the current session. Stored data and accounts are kept.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_logout() -> ActionResponse {
    match with_organizer(|organizer| organizer.logout().map_err(|err| err.to_string())) {
        Ok(()) => ActionResponse::success("Signed out.", None),
        Err(err) => ActionResponse::failure(format!("auth_logout failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn add_book(title: String, page_count: u32) -> ActionResponse {
    created(
        "Book added.",
        "add_book",
        with_organizer(|organizer| {
            organizer
                .add_book(title.trim(), page_count)
                .map(|book| book.id)
                .map_err(|err| err.to_string())
        }),
    )
}

/// Adds a research item. `kind` is free text; `article|paper|book|video` are
/// recognized.
#[flutter_rust_bridge::frb(sync)]
pub fn add_research(title: String, kind: String) -> ActionResponse {
    created(
        "Research item added.",
        "add_research",
        with_organizer(|organizer| {
            organizer
                .add_research(title.trim(), kind.trim())
                .map(|item| item.id)
                .map_err(|err| err.to_string())
        }),
    )
}

#[flutter_rust_bridge::frb(sync)]
pub fn add_course(title: String, description: String) -> ActionResponse {
    created(
        "Course created.",
        "add_course",
        with_organizer(|organizer| {
            organizer
                .add_course(title.trim(), description)
                .map(|course| course.id)
                .map_err(|err| err.to_string())
        }),
    )
}

#[flutter_rust_bridge::frb(sync)]
pub fn add_peer(display_name: String, status: String) -> ActionResponse {
    created(
        "Peer added.",
        "add_peer",
        with_organizer(|organizer| {
            organizer
                .add_peer(display_name.trim(), status.trim())
                .map(|peer| peer.id)
                .map_err(|err| err.to_string())
        }),
    )
}

/// Records a meeting room.
///
/// - `scheduled_at_epoch_ms = None` schedules it for now.
/// - `participant_ids` are decimal record ids; any unparsable id fails the call.
#[flutter_rust_bridge::frb(sync)]
pub fn schedule_meeting(
    room: String,
    scheduled_at_epoch_ms: Option<i64>,
    participant_ids: Vec<String>,
) -> ActionResponse {
    let scheduled_at = match scheduled_at_epoch_ms {
        Some(millis) => match chrono_from_millis(millis) {
            Some(at) => Some(at),
            None => {
                return ActionResponse::failure(format!(
                    "schedule_meeting failed: invalid timestamp `{millis}`"
                ))
            }
        },
        None => None,
    };
    let participants = match participant_ids
        .iter()
        .map(|raw| parse_record_id(raw))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(ids) => ids,
        Err(err) => return ActionResponse::failure(format!("schedule_meeting failed: {err}")),
    };

    created(
        "Meeting scheduled.",
        "schedule_meeting",
        with_organizer(|organizer| {
            organizer
                .schedule_meeting(room.trim(), scheduled_at, participants)
                .map(|meeting| meeting.id)
                .map_err(|err| err.to_string())
        }),
    )
}

/// Appends one assistant query/response pair to history.
#[flutter_rust_bridge::frb(sync)]
pub fn record_ai_exchange(query: String, response: String) -> ActionResponse {
    created(
        "Exchange saved.",
        "record_ai_exchange",
        with_organizer(|organizer| {
            organizer
                .record_ai_exchange(query, response)
                .map(|message| message.id)
                .map_err(|err| err.to_string())
        }),
    )
}

/// Adds a task to the end of `bucket` (`todo|inProgress|done`).
#[flutter_rust_bridge::frb(sync)]
pub fn kanban_add_task(bucket: String, text: String) -> ActionResponse {
    let bucket = match parse_bucket(&bucket) {
        Ok(bucket) => bucket,
        Err(err) => return ActionResponse::failure(format!("kanban_add_task failed: {err}")),
    };
    created(
        "Task added.",
        "kanban_add_task",
        with_organizer(|organizer| {
            organizer
                .add_kanban_task(bucket, text.trim())
                .map(|task| task.id)
                .map_err(|err| err.to_string())
        }),
    )
}

/// Moves a task to the end of `to_bucket`.
///
/// `ok=false` with `Task not found.` when the task is not in `from_bucket`.
#[flutter_rust_bridge::frb(sync)]
pub fn kanban_move_task(task_id: String, from_bucket: String, to_bucket: String) -> ActionResponse {
    let parsed = parse_record_id(&task_id).and_then(|id| {
        Ok((id, parse_bucket(&from_bucket)?, parse_bucket(&to_bucket)?))
    });
    let (id, from, to) = match parsed {
        Ok(parsed) => parsed,
        Err(err) => return ActionResponse::failure(format!("kanban_move_task failed: {err}")),
    };
    match with_organizer(|organizer| {
        organizer
            .move_task(id, from, to)
            .map_err(|err| err.to_string())
    }) {
        Ok(true) => ActionResponse::success("Task moved.", Some(id)),
        Ok(false) => ActionResponse::failure("Task not found."),
        Err(err) => ActionResponse::failure(format!("kanban_move_task failed: {err}")),
    }
}

/// Deletes a task. Absent ids succeed silently.
#[flutter_rust_bridge::frb(sync)]
pub fn kanban_delete_task(task_id: String, bucket: String) -> ActionResponse {
    let parsed = parse_record_id(&task_id).and_then(|id| Ok((id, parse_bucket(&bucket)?)));
    let (id, bucket) = match parsed {
        Ok(parsed) => parsed,
        Err(err) => return ActionResponse::failure(format!("kanban_delete_task failed: {err}")),
    };
    match with_organizer(|organizer| {
        organizer
            .delete_task(id, bucket)
            .map_err(|err| err.to_string())
    }) {
        Ok(_) => ActionResponse::success("Task deleted.", Some(id)),
        Err(err) => ActionResponse::failure(format!("kanban_delete_task failed: {err}")),
    }
}

/// Returns badge counts computed after the last change.
#[flutter_rust_bridge::frb(sync)]
pub fn notifications() -> NotificationsResponse {
    match with_organizer(|organizer| Ok(organizer.notifications())) {
        Ok(snapshot) => NotificationsResponse {
            books: clamp_count(snapshot.books),
            research: clamp_count(snapshot.research),
            ai: clamp_count(snapshot.ai),
            courses: clamp_count(snapshot.courses),
            kanban: clamp_count(snapshot.kanban),
            p2p: clamp_count(snapshot.p2p),
            meetings: clamp_count(snapshot.meetings),
            stats: clamp_count(snapshot.stats),
            settings: clamp_count(snapshot.settings),
            message: String::new(),
        },
        Err(err) => NotificationsResponse {
            message: format!("notifications failed: {err}"),
            ..NotificationsResponse::default()
        },
    }
}

/// Returns one section's records as a JSON document.
///
/// Sections: `books|research|courses|kanban|peers|meetings|ai|stats`.
#[flutter_rust_bridge::frb(sync)]
pub fn section_json(section: String) -> JsonResponse {
    let section = section.trim().to_string();
    let result = with_organizer(|organizer| {
        let value = match section.as_str() {
            "books" => serde_json::to_value(organizer.books()),
            "research" => serde_json::to_value(organizer.research()),
            "courses" => serde_json::to_value(organizer.courses()),
            "kanban" => serde_json::to_value(organizer.board()),
            "peers" => serde_json::to_value(organizer.peers()),
            "meetings" => serde_json::to_value(organizer.meetings()),
            "ai" => serde_json::to_value(organizer.ai_history()),
            "stats" => {
                let stats = organizer.stats().map_err(|err| err.to_string())?;
                serde_json::to_value(stats)
            }
            other => return Err(format!("unknown section `{other}`")),
        };
        value
            .map(|value| value.to_string())
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(json) => JsonResponse {
            ok: true,
            file_name: None,
            json,
            message: String::new(),
        },
        Err(err) => JsonResponse::failure(format!("section_json failed: {err}")),
    }
}

/// Produces the backup document (no accounts, no session) and a file name.
#[flutter_rust_bridge::frb(sync)]
pub fn backup_export() -> JsonResponse {
    let result = with_organizer(|organizer| {
        let document = organizer.export_backup().map_err(|err| err.to_string())?;
        document.to_pretty_json().map_err(|err| err.to_string())
    });
    match result {
        Ok(json) => JsonResponse {
            ok: true,
            file_name: Some(backup_file_name(chrono::Utc::now())),
            json,
            message: "Backup ready.".to_string(),
        },
        Err(err) => JsonResponse::failure(format!("backup_export failed: {err}")),
    }
}

/// Stored display preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceResponse {
    pub ok: bool,
    /// Only meaningful when `ok` is true.
    pub enabled: bool,
    pub message: String,
}

#[flutter_rust_bridge::frb(sync)]
pub fn dark_mode() -> PreferenceResponse {
    match with_organizer(|organizer| Ok(organizer.dark_mode())) {
        Ok(enabled) => PreferenceResponse {
            ok: true,
            enabled,
            message: String::new(),
        },
        Err(err) => PreferenceResponse {
            ok: false,
            enabled: false,
            message: format!("dark_mode failed: {err}"),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn set_dark_mode(enabled: bool) -> ActionResponse {
    match with_organizer(|organizer| {
        organizer
            .set_dark_mode(enabled)
            .map_err(|err| err.to_string())
    }) {
        Ok(()) => ActionResponse::success("Preference saved.", None),
        Err(err) => ActionResponse::failure(format!("set_dark_mode failed: {err}")),
    }
}

/// Erases every stored record, account and the session.
///
/// # FFI contract
/// - The UI must ask the user first and pass `confirmed = true`.
/// - With `confirmed = false` nothing is touched and `ok=false` is returned.
#[flutter_rust_bridge::frb(sync)]
pub fn clear_cache(confirmed: bool) -> ActionResponse {
    match with_organizer(|organizer| {
        organizer
            .clear_cache(confirmed)
            .map_err(|err| err.to_string())
    }) {
        Ok(()) => ActionResponse::success("All data cleared.", None),
        Err(err) => ActionResponse::failure(format!("clear_cache failed: {err}")),
    }
}

fn created(
    message: &str,
    operation: &str,
    result: Result<RecordId, String>,
) -> ActionResponse {
    match result {
        Ok(id) => ActionResponse::success(message, Some(id)),
        Err(err) => ActionResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_organizer<T>(
    f: impl FnOnce(&mut Organizer<SqliteKvStore>) -> Result<T, String>,
) -> Result<T, String> {
    let mut guard = ORGANIZER
        .lock()
        .map_err(|_| "organizer lock poisoned".to_string())?;
    if guard.is_none() {
        let db_path = resolve_db_path();
        let organizer = open_organizer(&db_path).map_err(|err| {
            error!(
                "event=ffi_open module=ffi status=error error_code=organizer_open_failed error={}",
                err
            );
            format!("organizer open failed: {err}")
        })?;
        *guard = Some(organizer);
    }
    match guard.as_mut() {
        Some(organizer) => f(organizer),
        None => Err("organizer unavailable".to_string()),
    }
}

fn parse_record_id(raw: &str) -> Result<RecordId, String> {
    raw.trim()
        .parse::<RecordId>()
        .map_err(|_| format!("invalid record id `{raw}`"))
}

fn parse_bucket(raw: &str) -> Result<Bucket, String> {
    Bucket::parse(raw).ok_or_else(|| format!("unknown bucket `{raw}`"))
}

fn chrono_from_millis(millis: i64) -> Option<metro_core::Timestamp> {
    chrono::DateTime::from_timestamp_millis(millis)
}

fn clamp_count(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
