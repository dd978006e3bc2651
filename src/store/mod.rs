//! Store seam for board state.
//!
//! The engine never holds queue state itself. Every operation opens a
//! transaction on a [`BoardStore`] and works through the [`BoardTx`] handle;
//! writes made inside the closure commit together when it returns `Ok` and
//! are discarded when it returns `Err`.

use crate::error::{BoardResult, StoreResult};
use crate::model::{
    Assignment, QueueEntry, Resource, ResourceId, WorkItem, WorkItemDraft, WorkItemId,
};

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    BoardSnapshot, load_board_from_json, read_snapshot_from_json, restore_board_from_json,
    save_board_to_json, validate_snapshot,
};
pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Reads and writes available inside one store transaction.
pub trait BoardTx {
    /// All resources, ascending by id.
    fn resources(&self) -> StoreResult<Vec<Resource>>;
    fn resource(&self, id: ResourceId) -> StoreResult<Option<Resource>>;
    fn insert_resource(&mut self, name: &str) -> StoreResult<Resource>;
    fn rename_resource(&mut self, id: ResourceId, name: &str) -> StoreResult<bool>;
    /// Deletes the resource row only; its queue must already be empty.
    fn remove_resource(&mut self, id: ResourceId) -> StoreResult<bool>;

    /// All work items, ascending by id.
    fn work_items(&self) -> StoreResult<Vec<WorkItem>>;
    fn work_item(&self, id: WorkItemId) -> StoreResult<Option<WorkItem>>;
    fn insert_work_item(&mut self, draft: WorkItemDraft) -> StoreResult<WorkItem>;
    fn update_work_item(&mut self, item: &WorkItem) -> StoreResult<bool>;
    /// Deletes the item together with its assignment.
    fn remove_work_item(&mut self, id: WorkItemId) -> StoreResult<bool>;

    fn assignments(&self) -> StoreResult<Vec<Assignment>>;
    fn assignment(&self, id: WorkItemId) -> StoreResult<Option<Assignment>>;
    /// Members of one queue (`None` = pool), ascending by key.
    fn queue(&self, resource: Option<ResourceId>) -> StoreResult<Vec<QueueEntry>>;
    fn set_assignment(&mut self, assignment: Assignment) -> StoreResult<()>;

    fn clear(&mut self) -> StoreResult<()>;
    /// Replaces everything with the snapshot, keeping its ids.
    fn restore(&mut self, snapshot: &BoardSnapshot) -> StoreResult<()>;
}

pub trait BoardStore: Send + Sync {
    /// Runs `f` atomically. Concurrent transactions on the same store are
    /// serialized, so the read-then-write halves of two moves never interleave.
    fn transaction<T, F>(&self, f: F) -> BoardResult<T>
    where
        F: FnOnce(&mut dyn BoardTx) -> BoardResult<T>;
}

/// Captures the full board state visible to a transaction.
pub fn snapshot(tx: &dyn BoardTx) -> StoreResult<BoardSnapshot> {
    Ok(BoardSnapshot {
        resources: tx.resources()?,
        work_items: tx.work_items()?,
        assignments: tx.assignments()?,
    })
}
