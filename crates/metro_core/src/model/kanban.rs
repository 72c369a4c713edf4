//! Kanban board model.
//!
//! # Responsibility
//! - Represent the board as three fixed, ordered buckets.
//! - Provide in-memory add/move/remove primitives used by the board service.
//!
//! # Invariants
//! - A task id appears in at most one bucket.
//! - Moving a task always appends it to the end of the destination bucket.

use super::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One of the three board partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Bucket {
    Todo,
    InProgress,
    Done,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Todo, Bucket::InProgress, Bucket::Done];

    /// Wire name, matching the persisted board field names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "inProgress",
            Self::Done => "done",
        }
    }

    /// Parses a bucket name. Accepts the wire name and the snake_case form.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "todo" => Some(Self::Todo),
            "inProgress" | "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

impl Display for Bucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KanbanTask {
    pub id: RecordId,
    pub text: String,
    pub created_at: Timestamp,
}

impl KanbanTask {
    pub fn new(id: RecordId, text: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            id,
            text: text.into(),
            created_at,
        }
    }
}

/// Three-bucket board. Persisted as `{ "todo": [], "inProgress": [], "done": [] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KanbanBoard {
    pub todo: Vec<KanbanTask>,
    pub in_progress: Vec<KanbanTask>,
    pub done: Vec<KanbanTask>,
}

impl KanbanBoard {
    pub fn bucket(&self, bucket: Bucket) -> &[KanbanTask] {
        match bucket {
            Bucket::Todo => &self.todo,
            Bucket::InProgress => &self.in_progress,
            Bucket::Done => &self.done,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<KanbanTask> {
        match bucket {
            Bucket::Todo => &mut self.todo,
            Bucket::InProgress => &mut self.in_progress,
            Bucket::Done => &mut self.done,
        }
    }

    /// Appends a task to the end of `bucket`.
    pub fn push(&mut self, bucket: Bucket, task: KanbanTask) {
        self.bucket_mut(bucket).push(task);
    }

    /// Removes the task with `task_id` from `bucket`, if present.
    pub fn remove(&mut self, bucket: Bucket, task_id: RecordId) -> Option<KanbanTask> {
        let tasks = self.bucket_mut(bucket);
        let position = tasks.iter().position(|task| task.id == task_id)?;
        Some(tasks.remove(position))
    }

    /// Moves a task from `from` to the end of `to`.
    ///
    /// Returns `false` and leaves the board untouched when the task is not in
    /// `from`. Moving within one bucket sends the task to its end.
    pub fn move_task(&mut self, task_id: RecordId, from: Bucket, to: Bucket) -> bool {
        match self.remove(from, task_id) {
            Some(task) => {
                self.push(to, task);
                true
            }
            None => false,
        }
    }

    /// Returns the bucket currently holding `task_id`.
    pub fn locate(&self, task_id: RecordId) -> Option<Bucket> {
        Bucket::ALL
            .into_iter()
            .find(|bucket| self.bucket(*bucket).iter().any(|task| task.id == task_id))
    }

    /// Number of tasks across all buckets.
    pub fn total(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.done.len()
    }
}
