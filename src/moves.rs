//! Relocating a work item within or between queues.

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult, StoreError};
use crate::model::{Assignment, QueueEntry, ResourceId, WorkItemId};
use crate::position::{KeySpace, OrderingKey};
use crate::store::BoardTx;

/// Where a work item should land.
///
/// `before` names the member the item must end up directly in front of,
/// `after` the member it must end up directly behind. With neither, the
/// item goes to the end of the target queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub work_item_id: WorkItemId,
    #[serde(default)]
    pub target: Option<ResourceId>,
    #[serde(default)]
    pub before: Option<WorkItemId>,
    #[serde(default)]
    pub after: Option<WorkItemId>,
}

impl MoveRequest {
    pub fn append(work_item_id: WorkItemId, target: Option<ResourceId>) -> Self {
        Self {
            work_item_id,
            target,
            before: None,
            after: None,
        }
    }

    pub fn before(work_item_id: WorkItemId, target: Option<ResourceId>, before: WorkItemId) -> Self {
        Self {
            before: Some(before),
            ..Self::append(work_item_id, target)
        }
    }

    pub fn after(work_item_id: WorkItemId, target: Option<ResourceId>, after: WorkItemId) -> Self {
        Self {
            after: Some(after),
            ..Self::append(work_item_id, target)
        }
    }
}

/// Insertion point within a queue that no longer contains the mover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Directly in front of the member at this index.
    Before(usize),
    /// Directly behind the member at this index.
    After(usize),
    Front,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotResolution {
    pub slot: Slot,
    /// A supplied neighbor was not in the queue and the slot fell back.
    pub degraded: bool,
}

/// Maps neighbor hints onto the live queue. `others` must already exclude
/// the item being moved. Unknown neighbors never fail the move: a stale
/// `before` alone falls back to the front, anything else to the end.
pub fn resolve_slot(
    others: &[QueueEntry],
    before: Option<WorkItemId>,
    after: Option<WorkItemId>,
) -> SlotResolution {
    let position = |id: WorkItemId| others.iter().position(|e| e.work_item_id == id);

    if let Some(idx) = before.and_then(position) {
        return SlotResolution {
            slot: Slot::Before(idx),
            degraded: false,
        };
    }
    if let Some(idx) = after.and_then(position) {
        return SlotResolution {
            slot: Slot::After(idx),
            degraded: before.is_some(),
        };
    }
    match (before, after) {
        (None, None) => SlotResolution {
            slot: Slot::End,
            degraded: false,
        },
        (Some(_), None) => SlotResolution {
            slot: Slot::Front,
            degraded: true,
        },
        _ => SlotResolution {
            slot: Slot::End,
            degraded: true,
        },
    }
}

/// Key for `slot`, or `None` when the neighbors are too close to split.
pub fn key_for_slot(keys: &KeySpace, others: &[QueueEntry], slot: Slot) -> Option<OrderingKey> {
    let key_at = |idx: usize| others.get(idx).map(|e| e.key);
    match slot {
        Slot::Before(idx) => {
            let low = idx.checked_sub(1).and_then(key_at);
            keys.between(low, key_at(idx))
        }
        Slot::After(idx) => keys.between(key_at(idx), key_at(idx + 1)),
        Slot::Front => keys.between(None, key_at(0)),
        Slot::End => keys.append(others.last().map(|e| e.key)),
    }
}

/// Whether the hint that wins resolution names the mover itself. Such a
/// move leaves the item where it is in `live`.
fn anchors_on_self(live: &[QueueEntry], request: &MoveRequest) -> bool {
    let id = request.work_item_id;
    let present = |n: WorkItemId| n != id && live.iter().any(|e| e.work_item_id == n);
    match request.before {
        Some(before) if before == id => true,
        Some(before) if present(before) => false,
        _ => request.after == Some(id),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementOutcome {
    pub assignment: Assignment,
    pub respaced: bool,
    pub degraded: bool,
}

/// Writes a new assignment for `request.work_item_id` inside `tx`.
///
/// The target queue is read, the slot resolved, and the key computed and
/// written within the same transaction. If the slot cannot be split the
/// other members of the target queue are re-keyed uniformly first.
pub(crate) fn place(
    tx: &mut dyn BoardTx,
    keys: &KeySpace,
    request: &MoveRequest,
) -> BoardResult<PlacementOutcome> {
    if tx.work_item(request.work_item_id)?.is_none() {
        return Err(BoardError::item_not_found(request.work_item_id));
    }
    if let Some(resource_id) = request.target {
        if tx.resource(resource_id)?.is_none() {
            return Err(BoardError::resource_not_found(resource_id));
        }
    }

    let live = tx.queue(request.target)?;
    if let Some(current) = live.iter().find(|e| e.work_item_id == request.work_item_id)
        && anchors_on_self(&live, request)
    {
        return Ok(PlacementOutcome {
            assignment: Assignment {
                work_item_id: request.work_item_id,
                resource_id: request.target,
                key: current.key,
            },
            respaced: false,
            degraded: false,
        });
    }

    let mut others: Vec<QueueEntry> = live
        .into_iter()
        .filter(|e| e.work_item_id != request.work_item_id)
        .collect();
    let resolution = resolve_slot(&others, request.before, request.after);

    let mut respaced = false;
    let key = match key_for_slot(keys, &others, resolution.slot) {
        Some(key) => key,
        None => {
            tracing::debug!(
                target_queue = ?request.target,
                members = others.len(),
                "ordering keys exhausted, re-spacing queue"
            );
            let fresh = keys.respaced(others.len());
            for (entry, key) in others.iter_mut().zip(fresh) {
                entry.key = key;
                tx.set_assignment(Assignment {
                    work_item_id: entry.work_item_id,
                    resource_id: request.target,
                    key,
                })?;
            }
            respaced = true;
            key_for_slot(keys, &others, resolution.slot).ok_or_else(|| {
                StoreError::Corrupt("ordering keys exhausted after re-spacing".to_string())
            })?
        }
    };

    if resolution.degraded {
        tracing::warn!(
            item = request.work_item_id,
            before = ?request.before,
            after = ?request.after,
            "neighbor hint not in target queue, falling back to {:?}",
            resolution.slot
        );
    }

    let assignment = Assignment {
        work_item_id: request.work_item_id,
        resource_id: request.target,
        key,
    };
    tx.set_assignment(assignment)?;
    Ok(PlacementOutcome {
        assignment,
        respaced,
        degraded: resolution.degraded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(ids_and_keys: &[(WorkItemId, f64)]) -> Vec<QueueEntry> {
        ids_and_keys
            .iter()
            .map(|&(work_item_id, key)| QueueEntry {
                work_item_id,
                key: OrderingKey::new(key),
            })
            .collect()
    }

    #[test]
    fn before_wins_over_after() {
        let others = queue(&[(1, 1.0), (2, 2.0), (3, 3.0)]);
        let res = resolve_slot(&others, Some(3), Some(1));
        assert_eq!(res.slot, Slot::Before(2));
        assert!(!res.degraded);
    }

    #[test]
    fn stale_neighbors_degrade() {
        let others = queue(&[(1, 1.0), (2, 2.0)]);
        assert_eq!(resolve_slot(&others, Some(9), None).slot, Slot::Front);
        assert_eq!(resolve_slot(&others, None, Some(9)).slot, Slot::End);
        assert_eq!(resolve_slot(&others, Some(9), Some(8)).slot, Slot::End);
        let res = resolve_slot(&others, Some(9), Some(1));
        assert_eq!(res.slot, Slot::After(0));
        assert!(res.degraded);
        assert!(!resolve_slot(&others, None, None).degraded);
    }

    #[test]
    fn self_hints_anchor_only_when_they_win() {
        let live = queue(&[(1, 1.0), (2, 2.0), (3, 3.0)]);
        assert!(anchors_on_self(&live, &MoveRequest::before(2, None, 2)));
        assert!(anchors_on_self(&live, &MoveRequest::after(2, None, 2)));
        let live_before_wins = MoveRequest {
            before: Some(1),
            ..MoveRequest::after(2, None, 2)
        };
        assert!(!anchors_on_self(&live, &live_before_wins));
        let stale_before = MoveRequest {
            before: Some(9),
            ..MoveRequest::after(2, None, 2)
        };
        assert!(anchors_on_self(&live, &stale_before));
        assert!(!anchors_on_self(&live, &MoveRequest::append(2, None)));
    }

    #[test]
    fn keys_land_between_neighbors() {
        let keys = KeySpace::default();
        let others = queue(&[(1, 1024.0), (2, 2048.0)]);
        let k = |v: f64| Some(OrderingKey::new(v));
        assert_eq!(key_for_slot(&keys, &others, Slot::Before(1)), k(1536.0));
        assert_eq!(key_for_slot(&keys, &others, Slot::Before(0)), k(1023.0));
        assert_eq!(key_for_slot(&keys, &others, Slot::After(1)), k(2049.0));
        assert_eq!(key_for_slot(&keys, &others, Slot::Front), k(1023.0));
        assert_eq!(key_for_slot(&keys, &others, Slot::End), k(3072.0));
        assert_eq!(key_for_slot(&keys, &[], Slot::End), k(1024.0));
    }
}
