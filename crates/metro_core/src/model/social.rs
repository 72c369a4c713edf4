//! Peer, meeting and assistant-history records.
//!
//! These are bookkeeping entries only; no discovery, conferencing or model
//! calls happen in core.

use super::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A peer the user added by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    pub id: RecordId,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(default)]
    pub status: String,
    pub added_at: Timestamp,
}

impl Peer {
    pub fn new(
        id: RecordId,
        display_name: impl Into<String>,
        status: impl Into<String>,
        added_at: Timestamp,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            status: status.into(),
            added_at,
        }
    }
}

/// A meeting room entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: RecordId,
    #[serde(alias = "title")]
    pub room: String,
    #[serde(rename = "time")]
    pub scheduled_at: Timestamp,
    #[serde(default)]
    pub participants: BTreeSet<RecordId>,
    pub created_at: Timestamp,
}

impl Meeting {
    pub fn new(
        id: RecordId,
        room: impl Into<String>,
        scheduled_at: Timestamp,
        participants: BTreeSet<RecordId>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            room: room.into(),
            scheduled_at,
            participants,
            created_at,
        }
    }
}

/// One query/response pair from the assistant panel. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMessage {
    pub id: RecordId,
    pub query: String,
    pub response: String,
    pub timestamp: Timestamp,
}

impl AiMessage {
    pub fn new(
        id: RecordId,
        query: impl Into<String>,
        response: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            query: query.into(),
            response: response.into(),
            timestamp,
        }
    }
}
