//! Command-line entry point for the Metro organizer store.
//!
//! # Responsibility
//! - Inspect a store file without the Flutter shell (`status`).
//! - Export backups and wipe data from scripts.
//!
//! # Invariants
//! - `clear` never runs without `--yes`.
//! - Output is plain `key=value` lines so it stays greppable.

use chrono::Utc;
use clap::{Parser, Subcommand};
use log::info;
use metro_core::{
    backup_file_name, core_version, default_log_level, init_logging_with, open_organizer,
    AuthState, LogConfig, Organizer, SqliteKvStore,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Metro organizer store tool
#[derive(Parser, Debug)]
#[command(name = "metro", version, about)]
struct Args {
    /// SQLite store file
    #[arg(long, env = "METRO_DB_PATH", default_value = "metro_organizer.sqlite3")]
    db: PathBuf,

    /// Log level (trace, debug, info, warn, error); needs --log-dir
    #[arg(long, env = "METRO_LOG_LEVEL")]
    log_level: Option<String>,

    /// Directory for rolling log files; logging stays off when unset
    #[arg(long, env = "METRO_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the core version
    Version,
    /// Print session state, badge counts and totals
    Status,
    /// Write a JSON backup of all data collections
    Backup {
        /// Output file; defaults to a timestamped name in the current directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Erase every record, account and the session
    Clear {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    match log_setup(args.log_dir.as_deref(), args.log_level.as_deref())? {
        LogSetup::On(config) => init_logging_with(config)?,
        LogSetup::LevelIgnored(level) => {
            eprintln!("warning: log level `{level}` ignored, logging is off without --log-dir");
        }
        LogSetup::Off => {}
    }

    match args.command {
        Command::Version => {
            println!("metro_core version={}", core_version());
            Ok(())
        }
        Command::Status => print_status(&open_organizer(&args.db)?),
        Command::Backup { out } => {
            let organizer = open_organizer(&args.db)?;
            let target = out.unwrap_or_else(|| PathBuf::from(backup_file_name(Utc::now())));
            write_backup(&organizer, &target)
        }
        Command::Clear { yes } => {
            if !yes {
                return Err("refusing to clear without --yes".into());
            }
            let mut organizer = open_organizer(&args.db)?;
            organizer.clear_cache(true)?;
            println!("cleared db={}", args.db.display());
            Ok(())
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum LogSetup {
    Off,
    /// A level was given but no directory to write to.
    LevelIgnored(String),
    On(LogConfig),
}

fn log_setup(log_dir: Option<&Path>, level: Option<&str>) -> Result<LogSetup, String> {
    match (log_dir, level) {
        (Some(log_dir), level) => {
            let level = level.unwrap_or(default_log_level());
            let config = LogConfig::new(level, &log_dir.to_string_lossy())?;
            Ok(LogSetup::On(config.with_echo_warnings(true)))
        }
        (None, Some(level)) => Ok(LogSetup::LevelIgnored(level.to_string())),
        (None, None) => Ok(LogSetup::Off),
    }
}

fn print_status(organizer: &Organizer<SqliteKvStore>) -> Result<(), Box<dyn Error>> {
    match organizer.auth_state() {
        AuthState::Authenticated(session) => {
            println!("auth=authenticated account_id={}", session.account_id())
        }
        other => println!("auth={}", other.label()),
    }

    let badges = organizer.notifications();
    println!(
        "badges books={} research={} ai={} courses={} kanban={} p2p={} meetings={}",
        badges.books,
        badges.research,
        badges.ai,
        badges.courses,
        badges.kanban,
        badges.p2p,
        badges.meetings
    );

    let stats = organizer.stats()?;
    println!(
        "totals users={} books={} research={} courses={} tasks={} peers={} meetings={} ai_queries={}",
        stats.users,
        stats.books,
        stats.research,
        stats.courses,
        stats.tasks,
        stats.peers,
        stats.meetings,
        stats.ai_queries
    );
    println!("dark_mode={}", organizer.dark_mode());
    Ok(())
}

fn write_backup(
    organizer: &Organizer<SqliteKvStore>,
    target: &Path,
) -> Result<(), Box<dyn Error>> {
    let json = organizer.export_backup()?.to_pretty_json()?;
    std::fs::write(target, json)?;
    info!("event=backup_write module=cli status=ok path={}", target.display());
    println!("backup={}", target.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{log_setup, Args, Command, LogSetup};
    use clap::Parser;
    use std::path::Path;

    #[test]
    fn level_without_dir_is_reported_not_dropped() {
        let setup = log_setup(None, Some("debug")).expect("setup");
        assert_eq!(setup, LogSetup::LevelIgnored("debug".to_string()));
        assert_eq!(log_setup(None, None).expect("setup"), LogSetup::Off);
    }

    #[test]
    fn dir_enables_logging_with_echo() {
        let setup = log_setup(Some(Path::new("/tmp/metro-cli-logs")), Some("WARN"))
            .expect("setup");
        match setup {
            LogSetup::On(config) => {
                assert_eq!(config.level, "warn");
                assert!(config.echo_warnings);
            }
            other => panic!("expected logging on, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_level_is_an_error() {
        assert!(log_setup(Some(Path::new("/tmp/metro-cli-logs")), Some("verbose")).is_err());
    }

    #[test]
    fn clear_defaults_to_unconfirmed() {
        let args = Args::try_parse_from(["metro", "--db", "x.sqlite3", "clear"]).expect("parse");
        assert!(matches!(args.command, Command::Clear { yes: false }));
    }
}
