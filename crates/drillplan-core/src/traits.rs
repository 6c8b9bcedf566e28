//! Core trait definitions for progress stores and date sources.
//!
//! `ProgressStore` is implemented by [`crate::memory::MemoryStore`] and by the
//! JSON-file store in `drillplan-store`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::error::StoreError;
use crate::model::{ItemId, ProgressRecord};
use crate::statistics::StatsSummary;

// ---------------------------------------------------------------------------
// Progress store trait
// ---------------------------------------------------------------------------

/// Read-modify-write step for one record: receives the current record (if
/// any) and returns the record to store, or `None` to delete it.
pub type RecordUpdate = Box<dyn FnOnce(Option<ProgressRecord>) -> Option<ProgressRecord> + Send>;

/// Durable per-item progress storage.
///
/// Implementations must run each [`ProgressStore::update`] atomically with
/// respect to other writes to the same item.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Human-readable store name (e.g. "json").
    fn name(&self) -> &str;

    /// Fetch the record for one item.
    async fn get(&self, id: ItemId) -> Result<Option<ProgressRecord>, StoreError>;

    /// Fetch every stored record.
    async fn all(&self) -> Result<Vec<ProgressRecord>, StoreError>;

    /// Apply `update` to the record for `id` and persist the result.
    ///
    /// Returns the record as stored afterwards (`None` if deleted or absent).
    async fn update(
        &self,
        id: ItemId,
        update: RecordUpdate,
    ) -> Result<Option<ProgressRecord>, StoreError>;

    /// The persisted curriculum start date, if one has been set.
    async fn start_date(&self) -> Result<Option<NaiveDate>, StoreError>;

    async fn set_start_date(&self, date: NaiveDate) -> Result<(), StoreError>;

    /// The last statistics summary written by the aggregator.
    async fn summary(&self) -> Result<Option<StatsSummary>, StoreError>;

    async fn save_summary(&self, summary: &StatsSummary) -> Result<(), StoreError>;

    /// Fetch records for several items, keyed by id. Missing ids are absent.
    async fn get_many(
        &self,
        ids: &[ItemId],
    ) -> Result<HashMap<ItemId, ProgressRecord>, StoreError> {
        let mut found = HashMap::with_capacity(ids.len());
        for record in self.all().await? {
            if ids.contains(&record.item_id) {
                found.insert(record.item_id, record);
            }
        }
        Ok(found)
    }

    /// Records whose latest completion is exactly `date`.
    async fn completed_on(&self, date: NaiveDate) -> Result<Vec<ProgressRecord>, StoreError> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|r| r.completed_date() == Some(date))
            .collect())
    }

    /// Records completed strictly before `date`, optionally only wrong ones.
    async fn completed_before(
        &self,
        date: NaiveDate,
        wrong_only: bool,
    ) -> Result<Vec<ProgressRecord>, StoreError> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|r| match r.completion {
                Some(c) => c.date < date && (!wrong_only || !c.correct),
                None => false,
            })
            .collect())
    }

    /// Records currently deferred.
    async fn deferred(&self) -> Result<Vec<ProgressRecord>, StoreError> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|r| r.is_deferred())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Store round-trip timeout
// ---------------------------------------------------------------------------

/// Wraps a store so every round-trip is bounded by `timeout`.
///
/// Expiry surfaces as [`StoreError::Timeout`].
pub struct TimedStore {
    inner: Arc<dyn ProgressStore>,
    timeout: Duration,
}

impl TimedStore {
    pub fn new(inner: Arc<dyn ProgressStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        T: Send,
        F: std::future::Future<Output = Result<T, StoreError>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("{} store round-trip exceeded {:?}", self.inner.name(), self.timeout);
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl ProgressStore for TimedStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get(&self, id: ItemId) -> Result<Option<ProgressRecord>, StoreError> {
        self.bounded(self.inner.get(id)).await
    }

    async fn all(&self) -> Result<Vec<ProgressRecord>, StoreError> {
        self.bounded(self.inner.all()).await
    }

    async fn update(
        &self,
        id: ItemId,
        update: RecordUpdate,
    ) -> Result<Option<ProgressRecord>, StoreError> {
        self.bounded(self.inner.update(id, update)).await
    }

    async fn start_date(&self) -> Result<Option<NaiveDate>, StoreError> {
        self.bounded(self.inner.start_date()).await
    }

    async fn set_start_date(&self, date: NaiveDate) -> Result<(), StoreError> {
        self.bounded(self.inner.set_start_date(date)).await
    }

    async fn summary(&self) -> Result<Option<StatsSummary>, StoreError> {
        self.bounded(self.inner.summary()).await
    }

    async fn save_summary(&self, summary: &StatsSummary) -> Result<(), StoreError> {
        self.bounded(self.inner.save_summary(summary)).await
    }

    async fn get_many(
        &self,
        ids: &[ItemId],
    ) -> Result<HashMap<ItemId, ProgressRecord>, StoreError> {
        self.bounded(self.inner.get_many(ids)).await
    }

    async fn completed_on(&self, date: NaiveDate) -> Result<Vec<ProgressRecord>, StoreError> {
        self.bounded(self.inner.completed_on(date)).await
    }

    async fn completed_before(
        &self,
        date: NaiveDate,
        wrong_only: bool,
    ) -> Result<Vec<ProgressRecord>, StoreError> {
        self.bounded(self.inner.completed_before(date, wrong_only))
            .await
    }

    async fn deferred(&self) -> Result<Vec<ProgressRecord>, StoreError> {
        self.bounded(self.inner.deferred()).await
    }
}

// ---------------------------------------------------------------------------
// Clock trait
// ---------------------------------------------------------------------------

/// Source of the current date, injectable for tests.
pub trait Clock: Send + Sync {
    /// The learner's current calendar date.
    fn today(&self) -> NaiveDate;

    /// The current instant, used for summary timestamps.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall clock in the local time zone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to a settable date.
pub struct FixedClock {
    date: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Mutex::new(date),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        *self.date.lock().unwrap_or_else(|e| e.into_inner()) = date;
    }

    /// Move the clock forward by `days`.
    pub fn advance_days(&self, days: i64) {
        let mut date = self.date.lock().unwrap_or_else(|e| e.into_inner());
        *date += chrono::Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.date.lock().unwrap_or_else(|e| e.into_inner())
    }
}
