//! Persisted kanban board.
//!
//! # Invariants
//! - The board is written as one document under `lms_kanban`.
//! - Writes go to a working copy first; the live board is swapped in only
//!   after the store accepted it.
//! - Misses (unknown task id in the named bucket) never write.

use crate::model::kanban::{Bucket, KanbanBoard, KanbanTask};
use crate::model::RecordId;
use crate::store::{load_or_default, save, KvStore, StoreKey, StoreResult};

#[derive(Debug, Clone, Default)]
pub struct BoardRepository {
    board: KanbanBoard,
}

impl BoardRepository {
    /// Hydrates from storage; a missing key yields three empty buckets.
    pub fn load<S: KvStore + ?Sized>(store: &S) -> StoreResult<Self> {
        let board = load_or_default::<KanbanBoard, _>(store, StoreKey::Kanban)?;
        Ok(Self { board })
    }

    pub fn board(&self) -> &KanbanBoard {
        &self.board
    }

    pub fn add_task<S: KvStore + ?Sized>(
        &mut self,
        store: &S,
        bucket: Bucket,
        task: KanbanTask,
    ) -> StoreResult<()> {
        let mut next = self.board.clone();
        next.push(bucket, task);
        self.commit(store, next)
    }

    /// Returns `Ok(false)` when `task_id` is not in `from`.
    pub fn move_task<S: KvStore + ?Sized>(
        &mut self,
        store: &S,
        task_id: RecordId,
        from: Bucket,
        to: Bucket,
    ) -> StoreResult<bool> {
        let mut next = self.board.clone();
        if !next.move_task(task_id, from, to) {
            return Ok(false);
        }
        self.commit(store, next)?;
        Ok(true)
    }

    /// Returns `Ok(false)` when `task_id` is not in `bucket`.
    pub fn delete_task<S: KvStore + ?Sized>(
        &mut self,
        store: &S,
        task_id: RecordId,
        bucket: Bucket,
    ) -> StoreResult<bool> {
        let mut next = self.board.clone();
        if next.remove(bucket, task_id).is_none() {
            return Ok(false);
        }
        self.commit(store, next)?;
        Ok(true)
    }

    /// Drops in-memory tasks after the backing key was wiped elsewhere.
    pub fn reset(&mut self) {
        self.board = KanbanBoard::default();
    }

    fn commit<S: KvStore + ?Sized>(&mut self, store: &S, next: KanbanBoard) -> StoreResult<()> {
        save(store, StoreKey::Kanban, &next)?;
        self.board = next;
        Ok(())
    }
}
