//! Flutter-facing bridge for the Metro organizer core.

pub mod api;
