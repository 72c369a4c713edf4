//! Local credential primitives: enrollment secrets, setup URIs and the
//! one-time-code predicate.
//!
//! # See also
//! - `service::session_service` for the registration/login state machine.

pub mod totp;

pub use totp::{
    generate_secret, is_valid_secret, setup_uri, verify_code, DEFAULT_ACCOUNT_LABEL, ISSUER,
    SECRET_LEN,
};
