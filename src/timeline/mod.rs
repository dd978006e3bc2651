//! Pure projections of queues onto a calendar timeline.
//!
//! Nothing here touches a store; callers pass plain queue data in and get
//! plain data back, so every function is safe to call from any thread.

use serde::{Deserialize, Serialize};

pub mod axis;
pub mod drag;
pub mod layout;

pub use axis::{
    AXIS_ITERATION_CAP, compute_axis, compute_axis_with_calendar, horizon, today_marker,
    week_starts,
};
pub use drag::{DropTarget, Insertion, resolve_list_drop, resolve_row_drop, resolve_timeline_drop};
pub use layout::{Block, BoardLayout, QueueSpan, RowLayout, compute_board_layout, compute_row_layout};

pub const DEFAULT_HORIZON_FLOOR: usize = 30;
pub const DEFAULT_HORIZON_BUFFER: usize = 5;
pub const DEFAULT_EDGE_MARGIN: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub horizon_floor: usize,
    pub horizon_buffer: usize,
    /// Distance from a block edge, in axis units, that still counts as
    /// hovering that edge during a drag.
    pub edge_margin: f64,
    pub skip_weekends: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            horizon_floor: DEFAULT_HORIZON_FLOOR,
            horizon_buffer: DEFAULT_HORIZON_BUFFER,
            edge_margin: DEFAULT_EDGE_MARGIN,
            skip_weekends: true,
        }
    }
}
