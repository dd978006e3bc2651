use std::fmt;
use std::io;

use thiserror::Error;

/// What kind of record an id failed to resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    WorkItem,
    Resource,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::WorkItem => write!(f, "work item"),
            RecordKind::Resource => write!(f, "resource"),
        }
    }
}

/// Failures raised by a store backend. Always surfaced so callers can retry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt board data: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: i64 },

    #[error("no resources available to assign pooled work items")]
    EmptyTargetSet,

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BoardError {
    pub fn item_not_found(id: i64) -> Self {
        BoardError::NotFound {
            kind: RecordKind::WorkItem,
            id,
        }
    }

    pub fn resource_not_found(id: i64) -> Self {
        BoardError::NotFound {
            kind: RecordKind::Resource,
            id,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        BoardError::Invalid(message.into())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for BoardError {
    fn from(value: rusqlite::Error) -> Self {
        BoardError::Store(StoreError::Sqlite(value))
    }
}

impl From<serde_json::Error> for BoardError {
    fn from(value: serde_json::Error) -> Self {
        BoardError::Store(StoreError::Serialization(value))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type BoardResult<T> = Result<T, BoardError>;
