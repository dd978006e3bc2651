use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::balancer::{self, Placement, ResourceLoad};
use crate::config::BoardConfig;
use crate::dependencies::{self, DependencyConflict};
use crate::error::{BoardError, BoardResult, StoreError};
use crate::model::{
    Assignment, QueuedItem, Resource, ResourceId, ThemeSummary, WorkItem, WorkItemDraft,
    WorkItemId,
};
use crate::moves::{self, MoveRequest};
use crate::store::{self, BoardSnapshot, BoardStore, BoardTx};
use crate::timeline::{self, BoardLayout, DropTarget, QueueSpan};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub assigned: Vec<Placement>,
    /// Planned items that had already left the pool when their turn came.
    pub skipped: Vec<WorkItemId>,
    /// Per-resource totals: the load seen at planning time plus the
    /// placements this run actually applied.
    pub totals: Vec<ResourceLoad>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineView {
    pub start: NaiveDate,
    pub skip_weekends: bool,
    pub axis: Vec<NaiveDate>,
    pub week_starts: Vec<usize>,
    pub today: Option<f64>,
    pub layout: BoardLayout,
}

/// The planning board: queues of work items per resource plus the pool.
///
/// All state lives in the store `S`; each public mutation is one store
/// transaction except [`Board::auto_assign_all`], which commits every
/// placement separately.
pub struct Board<S: BoardStore> {
    store: S,
    config: BoardConfig,
}

fn queue_spans(tx: &dyn BoardTx, resource: Option<ResourceId>) -> BoardResult<Vec<QueueSpan>> {
    let mut spans = Vec::new();
    for entry in tx.queue(resource)? {
        let item = tx.work_item(entry.work_item_id)?.ok_or_else(|| {
            StoreError::Corrupt(format!(
                "assignment for missing work item {}",
                entry.work_item_id
            ))
        })?;
        spans.push(QueueSpan::new(item.id, item.duration_days));
    }
    Ok(spans)
}

fn ensure_resource(tx: &dyn BoardTx, resource: Option<ResourceId>) -> BoardResult<()> {
    if let Some(id) = resource {
        if tx.resource(id)?.is_none() {
            return Err(BoardError::resource_not_found(id));
        }
    }
    Ok(())
}

fn resource_name(name: &str) -> BoardResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BoardError::invalid("resource name must not be empty"));
    }
    Ok(name.to_string())
}

impl<S: BoardStore> Board<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, BoardConfig::default())
    }

    pub fn with_config(store: S, config: BoardConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn create_work_item(&self, draft: WorkItemDraft) -> BoardResult<WorkItem> {
        let draft = draft.normalized()?;
        let keys = self.config.keys;
        let (item, assignment) = self.store.transaction(|tx| {
            let item = tx.insert_work_item(draft)?;
            dependencies::validate_dependencies(
                &tx.work_items()?,
                Some(item.id),
                &item.dependencies,
            )?;
            let outcome = moves::place(tx, &keys, &MoveRequest::append(item.id, None))?;
            Ok((item, outcome.assignment))
        })?;
        tracing::info!(
            item = item.id,
            name = %item.name,
            duration = item.duration_days,
            key = %assignment.key,
            "work item created in pool"
        );
        Ok(item)
    }

    pub fn update_work_item(&self, id: WorkItemId, draft: WorkItemDraft) -> BoardResult<WorkItem> {
        let draft = draft.normalized()?;
        let item = self.store.transaction(|tx| {
            if tx.work_item(id)?.is_none() {
                return Err(BoardError::item_not_found(id));
            }
            dependencies::validate_dependencies(&tx.work_items()?, Some(id), &draft.dependencies)?;
            let item = WorkItem::from_draft(id, draft);
            tx.update_work_item(&item)?;
            Ok(item)
        })?;
        tracing::info!(item = id, "work item updated");
        Ok(item)
    }

    /// Removes the item and its assignment, and drops it from every other
    /// item's dependency list.
    pub fn delete_work_item(&self, id: WorkItemId) -> BoardResult<()> {
        self.store.transaction(|tx| {
            if !tx.remove_work_item(id)? {
                return Err(BoardError::item_not_found(id));
            }
            for mut item in tx.work_items()? {
                if item.dependencies.contains(&id) {
                    item.dependencies.retain(|dep| *dep != id);
                    tx.update_work_item(&item)?;
                }
            }
            Ok(())
        })?;
        tracing::info!(item = id, "work item deleted");
        Ok(())
    }

    pub fn work_item(&self, id: WorkItemId) -> BoardResult<WorkItem> {
        self.store
            .transaction(|tx| tx.work_item(id)?.ok_or_else(|| BoardError::item_not_found(id)))
    }

    pub fn work_items(&self) -> BoardResult<Vec<WorkItem>> {
        self.store.transaction(|tx| Ok(tx.work_items()?))
    }

    pub fn assignment(&self, id: WorkItemId) -> BoardResult<Assignment> {
        self.store
            .transaction(|tx| tx.assignment(id)?.ok_or_else(|| BoardError::item_not_found(id)))
    }

    pub fn create_resource(&self, name: &str) -> BoardResult<Resource> {
        let name = resource_name(name)?;
        let resource = self.store.transaction(|tx| Ok(tx.insert_resource(&name)?))?;
        tracing::info!(resource = resource.id, name = %resource.name, "resource created");
        Ok(resource)
    }

    pub fn rename_resource(&self, id: ResourceId, name: &str) -> BoardResult<Resource> {
        let name = resource_name(name)?;
        self.store.transaction(|tx| {
            if !tx.rename_resource(id, &name)? {
                return Err(BoardError::resource_not_found(id));
            }
            Ok(Resource { id, name })
        })
    }

    /// Deletes a resource after moving its queue, in order, to the end of
    /// the pool. Returns how many items were returned to the pool.
    pub fn delete_resource(&self, id: ResourceId) -> BoardResult<usize> {
        let keys = self.config.keys;
        let migrated = self.store.transaction(|tx| {
            ensure_resource(tx, Some(id))?;
            let queue = tx.queue(Some(id))?;
            for entry in &queue {
                moves::place(tx, &keys, &MoveRequest::append(entry.work_item_id, None))?;
            }
            tx.remove_resource(id)?;
            Ok(queue.len())
        })?;
        tracing::info!(resource = id, migrated, "resource deleted, queue returned to pool");
        Ok(migrated)
    }

    pub fn resources(&self) -> BoardResult<Vec<Resource>> {
        self.store.transaction(|tx| Ok(tx.resources()?))
    }

    pub fn resource(&self, id: ResourceId) -> BoardResult<Resource> {
        self.store.transaction(|tx| {
            tx.resource(id)?
                .ok_or_else(|| BoardError::resource_not_found(id))
        })
    }

    /// Members of a queue in order. `None` is the pool.
    pub fn queue(&self, resource: Option<ResourceId>) -> BoardResult<Vec<QueuedItem>> {
        self.store.transaction(|tx| {
            ensure_resource(tx, resource)?;
            let mut items = Vec::new();
            for entry in tx.queue(resource)? {
                let item = tx.work_item(entry.work_item_id)?.ok_or_else(|| {
                    StoreError::Corrupt(format!(
                        "assignment for missing work item {}",
                        entry.work_item_id
                    ))
                })?;
                items.push(QueuedItem {
                    key: entry.key,
                    item,
                });
            }
            Ok(items)
        })
    }

    pub fn pool(&self) -> BoardResult<Vec<QueuedItem>> {
        self.queue(None)
    }

    /// Ids of a queue's members in order.
    pub fn queue_ids(&self, resource: Option<ResourceId>) -> BoardResult<Vec<WorkItemId>> {
        self.store.transaction(|tx| {
            ensure_resource(tx, resource)?;
            Ok(tx
                .queue(resource)?
                .into_iter()
                .map(|e| e.work_item_id)
                .collect())
        })
    }

    pub fn move_item(&self, request: MoveRequest) -> BoardResult<Assignment> {
        let keys = self.config.keys;
        let outcome = self
            .store
            .transaction(|tx| moves::place(tx, &keys, &request))?;
        tracing::info!(
            item = request.work_item_id,
            queue = ?request.target,
            key = %outcome.assignment.key,
            respaced = outcome.respaced,
            "work item moved"
        );
        Ok(outcome.assignment)
    }

    /// Sends an item to the end of the pool.
    pub fn remove_to_pool(&self, id: WorkItemId) -> BoardResult<Assignment> {
        self.move_item(MoveRequest::append(id, None))
    }

    /// Assigns every pooled item to the least loaded resource, in pool
    /// order. Each placement commits on its own, so a failure part way
    /// leaves earlier placements in place and a rerun picks up the rest.
    pub fn auto_assign_all(&self) -> BoardResult<BalanceSummary> {
        let (loads, pool) = self.store.transaction(|tx| {
            let mut loads = Vec::new();
            for resource in tx.resources()? {
                let total = queue_spans(tx, Some(resource.id))?
                    .iter()
                    .map(|span| u64::from(span.duration_days))
                    .sum();
                loads.push(ResourceLoad {
                    resource_id: resource.id,
                    total,
                });
            }
            let pool: Vec<(WorkItemId, u32)> = queue_spans(tx, None)?
                .into_iter()
                .map(|span| (span.work_item_id, span.duration_days))
                .collect();
            Ok((loads, pool))
        })?;

        let plan = balancer::plan_balance(&loads, &pool)?;
        let keys = self.config.keys;
        let durations: BTreeMap<WorkItemId, u32> = pool.iter().copied().collect();
        let mut summary = BalanceSummary {
            totals: loads.clone(),
            ..BalanceSummary::default()
        };
        tracing::debug!(
            placements = plan.placements.len(),
            planned_totals = ?plan.totals,
            "balance planned"
        );
        for placement in plan.placements {
            let applied = self.store.transaction(|tx| {
                match tx.assignment(placement.work_item_id)? {
                    Some(current) if current.resource_id.is_none() => {
                        let request =
                            MoveRequest::append(placement.work_item_id, Some(placement.resource_id));
                        moves::place(tx, &keys, &request)?;
                        Ok(true)
                    }
                    _ => Ok(false),
                }
            })?;
            if applied {
                tracing::debug!(
                    item = placement.work_item_id,
                    resource = placement.resource_id,
                    "auto-assigned"
                );
                if let Some(load) = summary
                    .totals
                    .iter_mut()
                    .find(|load| load.resource_id == placement.resource_id)
                {
                    load.total += durations
                        .get(&placement.work_item_id)
                        .copied()
                        .map_or(0, u64::from);
                }
                summary.assigned.push(placement);
            } else {
                summary.skipped.push(placement.work_item_id);
            }
        }
        tracing::info!(
            assigned = summary.assigned.len(),
            skipped = summary.skipped.len(),
            resources = loads.len(),
            "auto-assign complete"
        );
        Ok(summary)
    }

    /// Total duration and item count per non-blank theme, largest first.
    pub fn theme_summary(&self) -> BoardResult<Vec<ThemeSummary>> {
        let items = self.work_items()?;
        let mut by_theme: BTreeMap<String, ThemeSummary> = BTreeMap::new();
        for item in items {
            let Some(theme) = item.theme.as_deref().map(str::trim).filter(|t| !t.is_empty())
            else {
                continue;
            };
            let entry = by_theme
                .entry(theme.to_string())
                .or_insert_with(|| ThemeSummary {
                    theme: theme.to_string(),
                    total_duration: 0,
                    count: 0,
                });
            entry.total_duration += u64::from(item.duration_days);
            entry.count += 1;
        }
        let mut summary: Vec<ThemeSummary> = by_theme.into_values().collect();
        summary.sort_by(|a, b| {
            b.total_duration
                .cmp(&a.total_duration)
                .then_with(|| a.theme.cmp(&b.theme))
        });
        Ok(summary)
    }

    /// Row layout of every resource queue, read in one transaction.
    pub fn board_layout(&self) -> BoardResult<BoardLayout> {
        let queues = self.store.transaction(|tx| {
            let mut queues = Vec::new();
            for resource in tx.resources()? {
                queues.push((resource.id, queue_spans(tx, Some(resource.id))?));
            }
            Ok(queues)
        })?;
        Ok(timeline::compute_board_layout(&queues, &self.config.timeline))
    }

    /// Axis and layout for rendering, starting at `start`. `skip_weekends`
    /// falls back to the configured default.
    pub fn timeline(
        &self,
        start: NaiveDate,
        skip_weekends: Option<bool>,
        today: NaiveDate,
    ) -> BoardResult<TimelineView> {
        let skip_weekends = skip_weekends.unwrap_or(self.config.timeline.skip_weekends);
        let layout = self.board_layout()?;
        let calendar = self.config.axis_calendar(skip_weekends)?;
        let axis = timeline::compute_axis_with_calendar(start, layout.horizon, &calendar);
        Ok(TimelineView {
            start,
            skip_weekends,
            week_starts: timeline::week_starts(&axis),
            today: timeline::today_marker(&axis, today),
            axis,
            layout,
        })
    }

    /// Resolves a drop at axis coordinate `x` over `resource`'s row against
    /// the live queue, using the configured edge margin.
    pub fn resolve_timeline_drop(
        &self,
        resource: Option<ResourceId>,
        moving: Option<WorkItemId>,
        x: f64,
    ) -> BoardResult<DropTarget> {
        let queue = self.store.transaction(|tx| {
            ensure_resource(tx, resource)?;
            queue_spans(tx, resource)
        })?;
        Ok(timeline::resolve_timeline_drop(
            &queue,
            moving,
            x,
            self.config.timeline.edge_margin,
        ))
    }

    pub fn dependency_conflicts(&self) -> BoardResult<Vec<DependencyConflict>> {
        let layout = self.board_layout()?;
        let items = self.work_items()?;
        Ok(dependencies::dependency_conflicts(&layout, &items))
    }

    pub fn snapshot(&self) -> BoardResult<BoardSnapshot> {
        self.store.transaction(|tx| Ok(store::snapshot(&*tx)?))
    }

    /// Replaces the whole board with a validated snapshot.
    pub fn restore(&self, snapshot: &BoardSnapshot) -> BoardResult<()> {
        store::validate_snapshot(snapshot).map_err(|err| BoardError::invalid(err.to_string()))?;
        self.store.transaction(|tx| Ok(tx.restore(snapshot)?))?;
        tracing::info!(
            items = snapshot.work_items.len(),
            resources = snapshot.resources.len(),
            "board restored"
        );
        Ok(())
    }

    /// Checks the stored board against its structural invariants.
    pub fn verify(&self) -> BoardResult<()> {
        let snapshot = self.snapshot()?;
        Ok(store::validate_snapshot(&snapshot)?)
    }

    /// Removes every work item, assignment, and resource.
    pub fn clear(&self) -> BoardResult<()> {
        self.store.transaction(|tx| Ok(tx.clear()?))?;
        tracing::info!("board cleared");
        Ok(())
    }
}
