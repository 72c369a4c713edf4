//! Reading-list records: books, research items and courses.

use super::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A book on the reading list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: RecordId,
    pub title: String,
    #[serde(rename = "pages")]
    pub page_count: u32,
    pub added_at: Timestamp,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Book {
    pub fn new(
        id: RecordId,
        title: impl Into<String>,
        page_count: u32,
        added_at: Timestamp,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            page_count,
            added_at,
            highlights: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// Research material classification.
///
/// Open set: unknown labels are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResearchKind {
    Article,
    Paper,
    Book,
    Video,
    Other(String),
}

impl ResearchKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Article => "article",
            Self::Paper => "paper",
            Self::Book => "book",
            Self::Video => "video",
            Self::Other(label) => label.as_str(),
        }
    }
}

impl From<String> for ResearchKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "article" => Self::Article,
            "paper" => Self::Paper,
            "book" => Self::Book,
            "video" => Self::Video,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ResearchKind {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ResearchKind> for String {
    fn from(value: ResearchKind) -> Self {
        match value {
            ResearchKind::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for ResearchKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One saved research source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchItem {
    pub id: RecordId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ResearchKind,
    pub added_at: Timestamp,
    #[serde(default)]
    pub highlights: Vec<String>,
}

impl ResearchItem {
    pub fn new(
        id: RecordId,
        title: impl Into<String>,
        kind: ResearchKind,
        added_at: Timestamp,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            kind,
            added_at,
            highlights: Vec::new(),
        }
    }
}

/// A self-authored course. Starts with no modules and no students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(rename = "students", default)]
    pub student_count: u32,
    pub created_at: Timestamp,
}

impl Course {
    pub fn new(
        id: RecordId,
        title: impl Into<String>,
        description: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            modules: Vec::new(),
            student_count: 0,
            created_at,
        }
    }
}
