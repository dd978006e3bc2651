use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BoardError, BoardResult};
use crate::position::OrderingKey;

pub type WorkItemId = i64;
pub type ResourceId = i64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "HIGH" => Ok(Priority::High),
            "MEDIUM" => Ok(Priority::Medium),
            "LOW" => Ok(Priority::Low),
            _ => Err(()),
        }
    }
}

/// A schedulable unit of work. Durations are whole day-units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub name: String,
    pub duration_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<WorkItemId>,
    /// External tracker link (issue URL or similar).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl WorkItem {
    pub fn from_draft(id: WorkItemId, draft: WorkItemDraft) -> Self {
        Self {
            id,
            name: draft.name,
            duration_days: draft.duration_days,
            theme: draft.theme,
            priority: draft.priority,
            due_date: draft.due_date,
            dependencies: draft.dependencies,
            link: draft.link,
        }
    }

    pub fn to_draft(&self) -> WorkItemDraft {
        WorkItemDraft {
            name: self.name.clone(),
            duration_days: self.duration_days,
            theme: self.theme.clone(),
            priority: self.priority,
            due_date: self.due_date,
            dependencies: self.dependencies.clone(),
            link: self.link.clone(),
        }
    }
}

/// Creation and update payload for a work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemDraft {
    pub name: String,
    pub duration_days: u32,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub dependencies: Vec<WorkItemId>,
    #[serde(default)]
    pub link: Option<String>,
}

impl WorkItemDraft {
    pub fn new(name: impl Into<String>, duration_days: u32) -> Self {
        Self {
            name: name.into(),
            duration_days,
            theme: None,
            priority: Priority::default(),
            due_date: None,
            dependencies: Vec::new(),
            link: None,
        }
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<WorkItemId>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Trims text fields, drops blank optionals and duplicate dependencies,
    /// and rejects drafts that cannot become a valid work item.
    pub fn normalized(mut self) -> BoardResult<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(BoardError::invalid("work item name must not be empty"));
        }
        if self.duration_days == 0 {
            return Err(BoardError::invalid(format!(
                "work item '{}' must have a duration of at least one day",
                self.name
            )));
        }
        self.theme = blank_to_none(self.theme);
        self.link = blank_to_none(self.link);
        let mut seen = std::collections::HashSet::new();
        self.dependencies.retain(|dep| seen.insert(*dep));
        Ok(self)
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A member of staff (or any capacity) that owns one queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
}

/// Places a work item in a queue. `resource_id == None` is the pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub work_item_id: WorkItemId,
    pub resource_id: Option<ResourceId>,
    pub key: OrderingKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub work_item_id: WorkItemId,
    pub key: OrderingKey,
}

/// A queue member joined with its work item, in key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedItem {
    pub key: OrderingKey,
    pub item: WorkItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeSummary {
    pub theme: String,
    pub total_duration: u64,
    pub count: usize,
}
