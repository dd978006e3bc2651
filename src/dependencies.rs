use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{BoardError, BoardResult};
use crate::model::{ResourceId, WorkItem, WorkItemId};
use crate::timeline::BoardLayout;

/// Dependency edges between work items, dependency -> dependent.
pub struct DependencyGraph {
    pub graph: DiGraph<WorkItemId, ()>,
    pub id_to_index: HashMap<WorkItemId, NodeIndex>,
}

impl DependencyGraph {
    /// Builds the graph from `items`, replacing the dependency list of
    /// `candidate` (which may not exist yet) with `candidate_deps`.
    pub fn build(
        items: &[WorkItem],
        candidate: Option<WorkItemId>,
        candidate_deps: &[WorkItemId],
    ) -> BoardResult<Self> {
        let mut graph: DiGraph<WorkItemId, ()> = DiGraph::new();
        let mut id_to_index: HashMap<WorkItemId, NodeIndex> = HashMap::new();

        for item in items {
            id_to_index.insert(item.id, graph.add_node(item.id));
        }
        if let Some(id) = candidate {
            id_to_index
                .entry(id)
                .or_insert_with(|| graph.add_node(id));
        }

        let edges = items
            .iter()
            .filter(|item| Some(item.id) != candidate)
            .map(|item| (item.id, item.dependencies.as_slice()))
            .chain(candidate.map(|id| (id, candidate_deps)));
        for (dependent, deps) in edges {
            for dep in deps {
                if *dep == dependent {
                    return Err(BoardError::invalid(format!(
                        "work item {dependent} cannot depend on itself"
                    )));
                }
                let (Some(&from), Some(&to)) = (id_to_index.get(dep), id_to_index.get(&dependent))
                else {
                    return Err(BoardError::invalid(format!(
                        "work item {dependent} depends on unknown work item {dep}"
                    )));
                };
                graph.add_edge(from, to, ());
            }
        }

        Ok(Self { graph, id_to_index })
    }

    pub fn ensure_acyclic(&self) -> BoardResult<()> {
        toposort(&self.graph, None).map(|_| ()).map_err(|cycle| {
            BoardError::invalid(format!(
                "dependencies form a cycle through work item {}",
                self.graph[cycle.node_id()]
            ))
        })
    }
}

/// Rejects dependency lists that name unknown items, the item itself, or
/// close a cycle.
pub fn validate_dependencies(
    items: &[WorkItem],
    candidate: Option<WorkItemId>,
    candidate_deps: &[WorkItemId],
) -> BoardResult<()> {
    DependencyGraph::build(items, candidate, candidate_deps)?.ensure_acyclic()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyConflict {
    pub work_item_id: WorkItemId,
    pub resource_id: ResourceId,
    pub dependency_id: WorkItemId,
    pub dependency_resource_id: ResourceId,
    /// Columns by which the item starts before its dependency ends.
    pub overlap: u64,
}

/// Scheduled items that start before one of their scheduled dependencies
/// has finished. Pooled items have no position and are ignored.
pub fn dependency_conflicts(layout: &BoardLayout, items: &[WorkItem]) -> Vec<DependencyConflict> {
    let placed: HashMap<WorkItemId, (ResourceId, u64, u64)> = layout
        .rows
        .iter()
        .flat_map(|row| {
            row.blocks
                .iter()
                .map(move |b| (b.work_item_id, (row.resource_id, b.start, b.end)))
        })
        .collect();

    let mut conflicts = Vec::new();
    for item in items {
        let Some(&(resource_id, start, _)) = placed.get(&item.id) else {
            continue;
        };
        for dep in &item.dependencies {
            if let Some(&(dependency_resource_id, _, dep_end)) = placed.get(dep) {
                if start < dep_end {
                    conflicts.push(DependencyConflict {
                        work_item_id: item.id,
                        resource_id,
                        dependency_id: *dep,
                        dependency_resource_id,
                        overlap: dep_end - start,
                    });
                }
            }
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WorkItemDraft;

    fn item(id: WorkItemId, deps: Vec<WorkItemId>) -> WorkItem {
        WorkItem::from_draft(id, WorkItemDraft::new(format!("item {id}"), 1).with_dependencies(deps))
    }

    #[test]
    fn cycles_are_rejected() {
        let items = vec![item(1, vec![]), item(2, vec![1])];
        assert!(validate_dependencies(&items, Some(1), &[2]).is_err());
        assert!(validate_dependencies(&items, Some(3), &[1, 2]).is_ok());
    }

    #[test]
    fn unknown_and_self_dependencies_are_rejected() {
        let items = vec![item(1, vec![])];
        assert!(validate_dependencies(&items, Some(1), &[1]).is_err());
        assert!(validate_dependencies(&items, None, &[]).is_ok());
        assert!(validate_dependencies(&items, Some(2), &[42]).is_err());
    }
}
