use std::collections::BTreeMap;

use parking_lot::Mutex;

use super::{BoardSnapshot, BoardStore, BoardTx};
use crate::error::{BoardResult, StoreResult};
use crate::model::{
    Assignment, QueueEntry, Resource, ResourceId, WorkItem, WorkItemDraft, WorkItemId,
};

#[derive(Debug, Clone, Default)]
pub(crate) struct BoardState {
    last_item_id: WorkItemId,
    last_resource_id: ResourceId,
    resources: BTreeMap<ResourceId, Resource>,
    items: BTreeMap<WorkItemId, WorkItem>,
    assignments: BTreeMap<WorkItemId, Assignment>,
}

impl BoardTx for BoardState {
    fn resources(&self) -> StoreResult<Vec<Resource>> {
        Ok(self.resources.values().cloned().collect())
    }

    fn resource(&self, id: ResourceId) -> StoreResult<Option<Resource>> {
        Ok(self.resources.get(&id).cloned())
    }

    fn insert_resource(&mut self, name: &str) -> StoreResult<Resource> {
        self.last_resource_id += 1;
        let resource = Resource {
            id: self.last_resource_id,
            name: name.to_string(),
        };
        self.resources.insert(resource.id, resource.clone());
        Ok(resource)
    }

    fn rename_resource(&mut self, id: ResourceId, name: &str) -> StoreResult<bool> {
        match self.resources.get_mut(&id) {
            Some(resource) => {
                resource.name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_resource(&mut self, id: ResourceId) -> StoreResult<bool> {
        Ok(self.resources.remove(&id).is_some())
    }

    fn work_items(&self) -> StoreResult<Vec<WorkItem>> {
        Ok(self.items.values().cloned().collect())
    }

    fn work_item(&self, id: WorkItemId) -> StoreResult<Option<WorkItem>> {
        Ok(self.items.get(&id).cloned())
    }

    fn insert_work_item(&mut self, draft: WorkItemDraft) -> StoreResult<WorkItem> {
        self.last_item_id += 1;
        let item = WorkItem::from_draft(self.last_item_id, draft);
        self.items.insert(item.id, item.clone());
        Ok(item)
    }

    fn update_work_item(&mut self, item: &WorkItem) -> StoreResult<bool> {
        match self.items.get_mut(&item.id) {
            Some(existing) => {
                *existing = item.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_work_item(&mut self, id: WorkItemId) -> StoreResult<bool> {
        self.assignments.remove(&id);
        Ok(self.items.remove(&id).is_some())
    }

    fn assignments(&self) -> StoreResult<Vec<Assignment>> {
        Ok(self.assignments.values().copied().collect())
    }

    fn assignment(&self, id: WorkItemId) -> StoreResult<Option<Assignment>> {
        Ok(self.assignments.get(&id).copied())
    }

    fn queue(&self, resource: Option<ResourceId>) -> StoreResult<Vec<QueueEntry>> {
        let mut entries: Vec<QueueEntry> = self
            .assignments
            .values()
            .filter(|a| a.resource_id == resource)
            .map(|a| QueueEntry {
                work_item_id: a.work_item_id,
                key: a.key,
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key).then(a.work_item_id.cmp(&b.work_item_id)));
        Ok(entries)
    }

    fn set_assignment(&mut self, assignment: Assignment) -> StoreResult<()> {
        self.assignments.insert(assignment.work_item_id, assignment);
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.resources.clear();
        self.items.clear();
        self.assignments.clear();
        Ok(())
    }

    fn restore(&mut self, snapshot: &BoardSnapshot) -> StoreResult<()> {
        self.clear()?;
        for resource in &snapshot.resources {
            self.last_resource_id = self.last_resource_id.max(resource.id);
            self.resources.insert(resource.id, resource.clone());
        }
        for item in &snapshot.work_items {
            self.last_item_id = self.last_item_id.max(item.id);
            self.items.insert(item.id, item.clone());
        }
        for assignment in &snapshot.assignments {
            self.assignments
                .insert(assignment.work_item_id, *assignment);
        }
        Ok(())
    }
}

/// In-process store. Transactions run against a private copy of the state
/// that replaces the shared one only when the closure succeeds.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<BoardState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: &BoardSnapshot) -> StoreResult<Self> {
        super::validate_snapshot(snapshot)?;
        let mut state = BoardState::default();
        state.restore(snapshot)?;
        Ok(Self {
            state: Mutex::new(state),
        })
    }
}

impl BoardStore for MemoryStore {
    fn transaction<T, F>(&self, f: F) -> BoardResult<T>
    where
        F: FnOnce(&mut dyn BoardTx) -> BoardResult<T>,
    {
        let mut guard = self.state.lock();
        let mut working = guard.clone();
        let out = f(&mut working)?;
        *guard = working;
        Ok(out)
    }
}
