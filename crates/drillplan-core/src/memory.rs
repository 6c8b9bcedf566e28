//! In-memory progress store.
//!
//! Used by tests and by `store = "memory"` configurations; nothing survives
//! the process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreError;
use crate::model::{Completion, ItemId, ProgressRecord};
use crate::statistics::StatsSummary;
use crate::traits::{ProgressStore, RecordUpdate};

#[derive(Default)]
struct State {
    records: HashMap<ItemId, ProgressRecord>,
    start_date: Option<NaiveDate>,
    summary: Option<StatsSummary>,
}

/// A progress store held entirely in memory.
///
/// A single mutex guards all state, so updates to the same item are
/// serialized.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    /// Number of successful `update` calls.
    write_count: AtomicU32,
    /// Artificial delay before every operation.
    latency: Option<Duration>,
    /// When set, `save_summary` fails with this message.
    fail_summary: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-set the curriculum start date.
    pub fn with_start_date(self, date: NaiveDate) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.start_date = Some(date);
        }
        self
    }

    /// Delay every operation by `latency` (for timeout tests).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make summary writes fail (for best-effort refresh tests).
    pub fn with_failing_summary(mut self, message: &str) -> Self {
        self.fail_summary = Some(message.to_string());
        self
    }

    /// Insert or replace a record directly, bypassing the scheduler.
    pub fn insert(&self, record: ProgressRecord) {
        if let Ok(mut state) = self.state.lock() {
            state.records.insert(record.item_id, record);
        }
    }

    /// A record completed on `date` with the given correctness.
    pub fn completed(id: ItemId, date: NaiveDate, correct: bool) -> ProgressRecord {
        ProgressRecord {
            completion: Some(Completion {
                date,
                correct,
                elapsed_secs: None,
            }),
            ..ProgressRecord::new(id)
        }
    }

    /// Number of successful updates so far.
    pub fn write_count(&self) -> u32 {
        self.write_count.load(Ordering::Relaxed)
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Busy("memory store lock poisoned".into()))
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, id: ItemId) -> Result<Option<ProgressRecord>, StoreError> {
        self.delay().await;
        Ok(self.lock()?.records.get(&id).cloned())
    }

    async fn all(&self) -> Result<Vec<ProgressRecord>, StoreError> {
        self.delay().await;
        let mut records: Vec<ProgressRecord> = self.lock()?.records.values().cloned().collect();
        records.sort_by_key(|r| r.item_id);
        Ok(records)
    }

    async fn update(
        &self,
        id: ItemId,
        update: RecordUpdate,
    ) -> Result<Option<ProgressRecord>, StoreError> {
        self.delay().await;
        let mut state = self.lock()?;
        let current = state.records.remove(&id);
        let next = update(current);
        if let Some(record) = &next {
            state.records.insert(id, record.clone());
        }
        self.write_count.fetch_add(1, Ordering::Relaxed);
        Ok(next)
    }

    async fn start_date(&self) -> Result<Option<NaiveDate>, StoreError> {
        self.delay().await;
        Ok(self.lock()?.start_date)
    }

    async fn set_start_date(&self, date: NaiveDate) -> Result<(), StoreError> {
        self.delay().await;
        self.lock()?.start_date = Some(date);
        Ok(())
    }

    async fn summary(&self) -> Result<Option<StatsSummary>, StoreError> {
        self.delay().await;
        Ok(self.lock()?.summary.clone())
    }

    async fn save_summary(&self, summary: &StatsSummary) -> Result<(), StoreError> {
        self.delay().await;
        if let Some(message) = &self.fail_summary {
            return Err(StoreError::Busy(message.clone()));
        }
        self.lock()?.summary = Some(summary.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_inserts_and_deletes() {
        let store = MemoryStore::new();
        let id = ItemId(1);

        let created = store
            .update(id, Box::new(move |_| Some(ProgressRecord::new(id))))
            .await
            .unwrap();
        assert!(created.is_some());
        assert!(store.get(id).await.unwrap().is_some());

        let deleted = store.update(id, Box::new(|_| None)).await.unwrap();
        assert!(deleted.is_none());
        assert!(store.get(id).await.unwrap().is_none());
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn start_date_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.start_date().await.unwrap(), None);
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        store.set_start_date(date).await.unwrap();
        assert_eq!(store.start_date().await.unwrap(), Some(date));
    }
}
