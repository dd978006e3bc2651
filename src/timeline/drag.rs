//! Turning a drop coordinate into neighbor hints for a move.
//!
//! The returned [`Insertion`] uses the same vocabulary as
//! [`MoveRequest`](crate::moves::MoveRequest): `before` is the member that
//! will follow the dropped item and `after` the member that will precede it.

use serde::{Deserialize, Serialize};

use super::layout::{QueueSpan, compute_row_layout};
use crate::model::WorkItemId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insertion {
    pub before: Option<WorkItemId>,
    pub after: Option<WorkItemId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropTarget {
    Insert(Insertion),
    /// Over the body of a block, away from its edges. Not a commit.
    Hover,
}

fn without_moving(queue: &[QueueSpan], moving: Option<WorkItemId>) -> Vec<QueueSpan> {
    queue
        .iter()
        .filter(|span| Some(span.work_item_id) != moving)
        .copied()
        .collect()
}

/// Neighbors around boundary `idx` of `ids`, where boundary 0 is in front
/// of the first member and boundary `ids.len()` is behind the last.
fn boundary(ids: &[WorkItemId], idx: usize) -> Insertion {
    Insertion {
        after: idx.checked_sub(1).and_then(|i| ids.get(i).copied()),
        before: ids.get(idx).copied(),
    }
}

/// Resolves a drop at axis coordinate `x` on a timeline row.
///
/// The row is laid out without the moving item, so its own block never
/// provides a boundary. A coordinate within `edge_margin` of a block edge
/// snaps to the boundary at that edge; left of the row start it is the
/// front, at or past the row end it is the back, and anywhere else is a
/// hover.
pub fn resolve_timeline_drop(
    queue: &[QueueSpan],
    moving: Option<WorkItemId>,
    x: f64,
    edge_margin: f64,
) -> DropTarget {
    let others = without_moving(queue, moving);
    let row = compute_row_layout(0, &others);
    let ids: Vec<WorkItemId> = others.iter().map(|span| span.work_item_id).collect();

    if ids.is_empty() || x <= 0.0 {
        return DropTarget::Insert(boundary(&ids, 0));
    }
    if x >= row.end as f64 {
        return DropTarget::Insert(boundary(&ids, ids.len()));
    }

    // Boundary i sits at the start of block i; the last one at the row end.
    let offsets = row
        .blocks
        .iter()
        .map(|b| b.start)
        .chain(std::iter::once(row.end));
    let nearest = offsets
        .enumerate()
        .map(|(idx, offset)| (idx, (x - offset as f64).abs()))
        .min_by(|a, b| a.1.total_cmp(&b.1));

    match nearest {
        Some((idx, distance)) if distance <= edge_margin => {
            DropTarget::Insert(boundary(&ids, idx))
        }
        _ => DropTarget::Hover,
    }
}

/// A drop on the row itself, not on any block, appends to the queue.
pub fn resolve_row_drop(queue: &[QueueSpan], moving: Option<WorkItemId>) -> Insertion {
    let ids: Vec<WorkItemId> = without_moving(queue, moving)
        .iter()
        .map(|span| span.work_item_id)
        .collect();
    boundary(&ids, ids.len())
}

/// Resolves a drop at `index` of a plain list. The index counts positions
/// in the list with the moving item already taken out; larger indices clamp
/// to the end.
pub fn resolve_list_drop(ids: &[WorkItemId], moving: Option<WorkItemId>, index: usize) -> Insertion {
    let others: Vec<WorkItemId> = ids
        .iter()
        .copied()
        .filter(|id| Some(*id) != moving)
        .collect();
    boundary(&others, index.min(others.len()))
}
