//! Enrollment secret generation and one-time-code checks.
//!
//! # Security
//! `verify_code` is a PLACEHOLDER, not TOTP. It accepts any six ASCII digits
//! and never looks at the secret, so the second factor provides no protection.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

/// Issuer shown by authenticator apps.
pub const ISSUER: &str = "MetroLMS";
/// Account label used in the setup URI.
pub const DEFAULT_ACCOUNT_LABEL: &str = "user@metrolms.local";
/// Secret length in base32 characters.
pub const SECRET_LEN: usize = 32;

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{6}$").expect("valid code regex"));
static SECRET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z2-7]{32}$").expect("valid secret regex"));

/// Generates a fresh enrollment secret, uniform per character over `A-Z2-7`.
pub fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    (0..SECRET_LEN)
        .map(|_| char::from(BASE32_ALPHABET[rng.gen_range(0..BASE32_ALPHABET.len())]))
        .collect()
}

/// Returns whether `secret` has the shape produced by `generate_secret`.
pub fn is_valid_secret(secret: &str) -> bool {
    SECRET_RE.is_match(secret)
}

/// Builds the `otpauth://` URI an authenticator app scans during enrollment.
pub fn setup_uri(issuer: &str, account_label: &str, secret: &str) -> String {
    format!("otpauth://totp/{issuer}:{account_label}?secret={secret}&issuer={issuer}")
}

/// Placeholder one-time-code predicate. See module docs: INSECURE.
///
/// Accepts exactly six ASCII digits. `_secret` is ignored.
pub fn verify_code(_secret: &str, code: &str) -> bool {
    CODE_RE.is_match(code)
}
