pub mod balancer;
pub mod board;
pub mod calendar;
pub mod config;
pub mod dependencies;
pub mod error;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod logging;
pub mod model;
pub mod moves;
pub mod position;
pub mod store;
pub mod timeline;

pub use balancer::{BalancePlan, Placement, ResourceLoad, plan_balance};
pub use board::{BalanceSummary, Board, TimelineView};
pub use calendar::{WorkCalendar, WorkCalendarConfig};
pub use config::BoardConfig;
pub use dependencies::{DependencyConflict, validate_dependencies};
pub use error::{BoardError, BoardResult, RecordKind, StoreError, StoreResult};
pub use model::{
    Assignment, Priority, QueueEntry, QueuedItem, Resource, ResourceId, ThemeSummary, WorkItem,
    WorkItemDraft, WorkItemId,
};
pub use moves::MoveRequest;
pub use position::{KeySpace, OrderingKey};
#[cfg(feature = "sqlite")]
pub use store::SqliteStore;
pub use store::{
    BoardSnapshot, BoardStore, BoardTx, MemoryStore, load_board_from_json,
    restore_board_from_json, save_board_to_json,
};
pub use timeline::{
    BoardLayout, DropTarget, Insertion, QueueSpan, TimelineConfig, compute_axis,
    compute_board_layout,
};
