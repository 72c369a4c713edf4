//! Account and session records.
//!
//! # Invariants
//! - `totp_secret` is 32 characters from the base32 alphabet `A-Z2-7`.
//! - A `Session` owns a copy of the account taken at login time; it is never
//!   refreshed from the accounts collection.

use super::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

/// One registered local account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: RecordId,
    /// Secret typed at login. Not unique across accounts.
    #[serde(rename = "code")]
    pub access_code: String,
    pub totp_secret: String,
    pub created_at: Timestamp,
}

impl Account {
    pub fn new(
        id: RecordId,
        access_code: impl Into<String>,
        totp_secret: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            access_code: access_code.into(),
            totp_secret: totp_secret.into(),
            created_at,
        }
    }
}

// Keeps credentials out of logs and panic messages.
impl Debug for Account {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("access_code", &"<redacted>")
            .field("totp_secret", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Current authenticated session. Persisted as the bare account document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session {
    account: Account,
}

impl Session {
    pub fn new(account: Account) -> Self {
        Self { account }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn account_id(&self) -> RecordId {
        self.account.id
    }
}

#[cfg(test)]
mod tests {
    use super::{Account, Session};
    use chrono::Utc;

    #[test]
    fn debug_output_redacts_credentials() {
        let account = Account::new(7, "hunter2", "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567", Utc::now());
        let rendered = format!("{account:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("ABCDEFGH"));
        assert!(rendered.contains("id: 7"));
    }

    #[test]
    fn session_serializes_as_plain_account() {
        let account = Account::new(3, "alice", "A".repeat(32), Utc::now());
        let session = Session::new(account.clone());
        let session_json = serde_json::to_value(&session).expect("encode session");
        let account_json = serde_json::to_value(&account).expect("encode account");
        assert_eq!(session_json, account_json);
        assert_eq!(session_json["code"], "alice");
    }
}
