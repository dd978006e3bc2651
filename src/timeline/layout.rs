use chrono::NaiveDate;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{TimelineConfig, axis};
use crate::model::{ResourceId, WorkItemId};

/// One queue member as the projector sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSpan {
    pub work_item_id: WorkItemId,
    pub duration_days: u32,
}

impl QueueSpan {
    pub fn new(work_item_id: WorkItemId, duration_days: u32) -> Self {
        Self {
            work_item_id,
            duration_days,
        }
    }
}

/// Half-open `[start, end)` range of axis columns occupied by an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub work_item_id: WorkItemId,
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLayout {
    pub resource_id: ResourceId,
    pub blocks: Vec<Block>,
    /// Offset just past the last block; where an appended item would start.
    pub end: u64,
}

/// Packs a queue, already in key order, back to back from offset 0.
pub fn compute_row_layout(resource_id: ResourceId, queue: &[QueueSpan]) -> RowLayout {
    let mut cursor = 0u64;
    let blocks = queue
        .iter()
        .map(|span| {
            let start = cursor;
            cursor += u64::from(span.duration_days);
            Block {
                work_item_id: span.work_item_id,
                start,
                end: cursor,
            }
        })
        .collect();
    RowLayout {
        resource_id,
        blocks,
        end: cursor,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLayout {
    pub rows: Vec<RowLayout>,
    pub horizon: usize,
}

/// Lays out every resource row and derives the horizon from the longest.
pub fn compute_board_layout(
    queues: &[(ResourceId, Vec<QueueSpan>)],
    config: &TimelineConfig,
) -> BoardLayout {
    let rows: Vec<RowLayout> = queues
        .par_iter()
        .map(|(resource_id, queue)| compute_row_layout(*resource_id, queue))
        .collect();
    let horizon = axis::horizon(rows.iter().map(|r| r.end), config);
    BoardLayout { rows, horizon }
}

impl BoardLayout {
    pub fn row(&self, resource_id: ResourceId) -> Option<&RowLayout> {
        self.rows.iter().find(|r| r.resource_id == resource_id)
    }

    /// Flattens the layout into one row per block. Dates come from `axis`;
    /// the end date is the last column the block occupies. Offsets past the
    /// end of the axis produce null dates.
    pub fn to_dataframe(&self, axis: &[NaiveDate]) -> PolarsResult<DataFrame> {
        let mut resource_ids = Vec::new();
        let mut item_ids = Vec::new();
        let mut starts = Vec::new();
        let mut ends = Vec::new();
        let mut start_dates = Vec::new();
        let mut end_dates = Vec::new();

        for row in &self.rows {
            for block in &row.blocks {
                resource_ids.push(row.resource_id);
                item_ids.push(block.work_item_id);
                starts.push(block.start as i64);
                ends.push(block.end as i64);
                start_dates.push(date_at(axis, block.start).map(date_to_i32));
                end_dates.push(
                    block
                        .end
                        .checked_sub(1)
                        .and_then(|last| date_at(axis, last))
                        .map(date_to_i32),
                );
            }
        }

        let columns = vec![
            Series::new("resource_id".into(), resource_ids).into_column(),
            Series::new("work_item_id".into(), item_ids).into_column(),
            Series::new("start".into(), starts).into_column(),
            Series::new("end".into(), ends).into_column(),
            Series::new("start_date".into(), start_dates)
                .cast(&DataType::Date)?
                .into_column(),
            Series::new("end_date".into(), end_dates)
                .cast(&DataType::Date)?
                .into_column(),
        ];
        DataFrame::new(columns)
    }
}

fn date_at(axis: &[NaiveDate], offset: u64) -> Option<NaiveDate> {
    usize::try_from(offset)
        .ok()
        .and_then(|idx| axis.get(idx).copied())
}

fn date_to_i32(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::default();
    (date - epoch).num_days() as i32
}
