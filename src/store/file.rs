use super::{BoardStore, BoardTx, MemoryStore};
use crate::dependencies::validate_dependencies;
use crate::error::{BoardError, BoardResult, StoreError, StoreResult};
use crate::model::{Assignment, Resource, ResourceId, WorkItem, WorkItemId};
use crate::position::{OrderingKey, is_strictly_increasing};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub work_items: Vec<WorkItem>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

/// Checks the structural invariants a stored board must satisfy: unique
/// ids, exactly one assignment per work item, assignments only to known
/// resources, unique keys within every queue, and acyclic dependency lists
/// that only name items in the snapshot.
pub fn validate_snapshot(snapshot: &BoardSnapshot) -> StoreResult<()> {
    let mut resource_ids = HashSet::new();
    for resource in &snapshot.resources {
        if !resource_ids.insert(resource.id) {
            return Err(StoreError::Corrupt(format!(
                "duplicate resource id {}",
                resource.id
            )));
        }
    }

    let mut item_ids = HashSet::new();
    for item in &snapshot.work_items {
        if !item_ids.insert(item.id) {
            return Err(StoreError::Corrupt(format!(
                "duplicate work item id {}",
                item.id
            )));
        }
        if item.duration_days == 0 {
            return Err(StoreError::Corrupt(format!(
                "work item {} has zero duration",
                item.id
            )));
        }
    }

    validate_dependencies(&snapshot.work_items, None, &[]).map_err(|err| match err {
        BoardError::Invalid(message) => StoreError::Corrupt(message),
        other => StoreError::Corrupt(other.to_string()),
    })?;

    let mut assigned: HashMap<WorkItemId, &Assignment> = HashMap::new();
    let mut queues: BTreeMap<Option<ResourceId>, Vec<OrderingKey>> = BTreeMap::new();
    for assignment in &snapshot.assignments {
        if !item_ids.contains(&assignment.work_item_id) {
            return Err(StoreError::Corrupt(format!(
                "assignment references unknown work item {}",
                assignment.work_item_id
            )));
        }
        if assigned.insert(assignment.work_item_id, assignment).is_some() {
            return Err(StoreError::Corrupt(format!(
                "work item {} has more than one assignment",
                assignment.work_item_id
            )));
        }
        if let Some(resource_id) = assignment.resource_id {
            if !resource_ids.contains(&resource_id) {
                return Err(StoreError::Corrupt(format!(
                    "work item {} is assigned to unknown resource {}",
                    assignment.work_item_id, resource_id
                )));
            }
        }
        if !assignment.key.value().is_finite() {
            return Err(StoreError::Corrupt(format!(
                "work item {} has a non-finite ordering key",
                assignment.work_item_id
            )));
        }
        queues
            .entry(assignment.resource_id)
            .or_default()
            .push(assignment.key);
    }

    if let Some(missing) = item_ids.iter().find(|id| !assigned.contains_key(id)) {
        return Err(StoreError::Corrupt(format!(
            "work item {missing} has no assignment"
        )));
    }

    for (resource, mut keys) in queues {
        keys.sort();
        if !is_strictly_increasing(keys.iter().copied()) {
            let queue = resource
                .map(|id| format!("resource {id}"))
                .unwrap_or_else(|| "the pool".to_string());
            return Err(StoreError::Corrupt(format!(
                "duplicate ordering keys in the queue of {queue}"
            )));
        }
    }
    Ok(())
}

pub fn save_board_to_json<S, P>(store: &S, path: P) -> BoardResult<()>
where
    S: BoardStore,
    P: AsRef<Path>,
{
    let snapshot = store.transaction(|tx| Ok(super::snapshot(&*tx)?))?;
    validate_snapshot(&snapshot)?;
    let file = File::create(path).map_err(StoreError::from)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn read_snapshot_from_json<P: AsRef<Path>>(path: P) -> StoreResult<BoardSnapshot> {
    let file = File::open(path)?;
    let snapshot: BoardSnapshot = serde_json::from_reader(file)?;
    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

pub fn load_board_from_json<P: AsRef<Path>>(path: P) -> StoreResult<MemoryStore> {
    let snapshot = read_snapshot_from_json(path)?;
    MemoryStore::from_snapshot(&snapshot)
}

/// Replaces the contents of any store with a JSON snapshot.
pub fn restore_board_from_json<S, P>(store: &S, path: P) -> BoardResult<()>
where
    S: BoardStore,
    P: AsRef<Path>,
{
    let snapshot = read_snapshot_from_json(path)?;
    store.transaction(|tx: &mut dyn BoardTx| Ok(tx.restore(&snapshot)?))
}
