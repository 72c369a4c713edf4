//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate collection and session changes into use-case level APIs.
//! - Keep FFI/CLI layers decoupled from storage details.

pub mod backup_service;
pub mod notification_service;
pub mod organizer;
pub mod session_service;
pub mod stats_service;
