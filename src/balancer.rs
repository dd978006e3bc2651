//! Greedy list scheduling of pooled work items onto resources.
//!
//! Items are taken in pool order and each one goes to the resource with the
//! smallest running total. Ties go to the resource that comes first in
//! iteration order. The result is deterministic and keeps backlog priority,
//! at the cost of not being the optimal makespan.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::error::{BoardError, BoardResult};
use crate::model::{ResourceId, WorkItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLoad {
    pub resource_id: ResourceId,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub work_item_id: WorkItemId,
    pub resource_id: ResourceId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePlan {
    pub placements: Vec<Placement>,
    /// Totals after every placement is applied, in input resource order.
    pub totals: Vec<ResourceLoad>,
}

/// Plans where each pooled item goes. `pool` is `(item, duration)` in pool
/// order. Fails with [`BoardError::EmptyTargetSet`] when there are no
/// resources, even if the pool is empty too.
pub fn plan_balance(loads: &[ResourceLoad], pool: &[(WorkItemId, u32)]) -> BoardResult<BalancePlan> {
    if loads.is_empty() {
        return Err(BoardError::EmptyTargetSet);
    }

    let mut totals = loads.to_vec();
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = totals
        .iter()
        .enumerate()
        .map(|(idx, load)| Reverse((load.total, idx)))
        .collect();

    let mut placements = Vec::with_capacity(pool.len());
    for &(work_item_id, duration) in pool {
        let Some(Reverse((total, idx))) = heap.pop() else {
            break;
        };
        let total = total + u64::from(duration);
        totals[idx].total = total;
        heap.push(Reverse((total, idx)));
        placements.push(Placement {
            work_item_id,
            resource_id: totals[idx].resource_id,
        });
    }

    Ok(BalancePlan { placements, totals })
}
