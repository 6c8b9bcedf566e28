//! Scheduler and store error types.
//!
//! `StoreError` is defined here rather than in `drillplan-store` so the
//! scheduler can classify transient failures without string matching.

use std::time::Duration;

use thiserror::Error;

use crate::model::ItemId;

/// Errors raised by a progress store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A store round-trip exceeded the configured timeout.
    #[error("progress store timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The store could not acquire its lock.
    #[error("progress store busy: {0}")]
    Busy(String),

    /// Reading or writing the backing file failed.
    #[error("progress store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing data could not be (de)serialized.
    #[error("progress store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing data is readable but inconsistent.
    #[error("progress store is corrupt: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Returns `true` if retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Timeout(_) | StoreError::Busy(_))
    }
}

/// Errors surfaced by the scheduler's logical operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The request was malformed (e.g. a day outside the curriculum).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The item is not part of the curriculum.
    #[error("item not found: {0}")]
    NotFound(ItemId),

    /// The progress store failed or timed out.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

impl SchedulerError {
    /// Returns `true` if the caller may retry the request unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            SchedulerError::StoreUnavailable(e) => e.is_transient(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
