//! Item state classification.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{ItemId, ProgressRecord};
use crate::traits::ProgressStore;

/// Current status of one item, derived from its progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    /// No completion on record (a note alone does not count).
    Untouched,
    Completed { correct: bool },
    /// Excluded from scheduling; wins over any completion state.
    Deferred,
}

impl ItemStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, ItemStatus::Completed { .. })
    }

    /// `Some(correct)` for completed items.
    pub fn correct(&self) -> Option<bool> {
        match self {
            ItemStatus::Completed { correct } => Some(*correct),
            _ => None,
        }
    }
}

/// Classify an item from its (optional) record.
pub fn classify(record: Option<&ProgressRecord>) -> ItemStatus {
    match record {
        None => ItemStatus::Untouched,
        Some(r) if r.is_deferred() => ItemStatus::Deferred,
        Some(r) => match r.completion {
            Some(c) => ItemStatus::Completed { correct: c.correct },
            None => ItemStatus::Untouched,
        },
    }
}

/// Look up and classify a single item.
pub async fn classify_item(
    store: &dyn ProgressStore,
    id: ItemId,
) -> Result<ItemStatus, StoreError> {
    let record = store.get(id).await?;
    Ok(classify(record.as_ref()))
}
