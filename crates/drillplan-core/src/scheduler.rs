//! The scheduler facade.
//!
//! [`Scheduler`] owns the curriculum, the progress store and the clock, and
//! exposes the logical operations the outer layer calls: day views, progress
//! updates, deferral, notes, review lists and statistics.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::assembler::{DayAssembler, DayView};
use crate::classifier::{classify, ItemStatus};
use crate::curriculum::Curriculum;
use crate::error::{Result, SchedulerError};
use crate::model::{Item, ItemId, ProgressRecord};
use crate::mutator::{transition, ProgressAction};
use crate::review::{ReviewCandidate, ReviewPolicy, ReviewRequest, ReviewSelector};
use crate::statistics::{compute_statistics, summarize, StatsSnapshot};
use crate::traits::{Clock, ProgressStore, TimedStore};

/// Configuration for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Review spacing and caps.
    pub review: ReviewPolicy,
    /// Bound on each progress store round-trip.
    pub store_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            review: ReviewPolicy::default(),
            store_timeout: Duration::from_secs(10),
        }
    }
}

/// Where the learner is in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentDay {
    pub current_day: u32,
    pub start_date: NaiveDate,
    pub today: NaiveDate,
    /// Whole days since the start date; negative if it lies in the future.
    pub days_passed: i64,
}

/// A deferred item with its completion state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeferredEntry {
    pub item: Item,
    pub deferred_since: NaiveDate,
    pub completed: bool,
    pub is_correct: Option<bool>,
}

/// Day assembly and spaced-repetition scheduler.
pub struct Scheduler {
    curriculum: Arc<Curriculum>,
    store: Arc<dyn ProgressStore>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a scheduler. Every store call is bounded by
    /// `config.store_timeout`.
    pub fn new(
        curriculum: Arc<Curriculum>,
        store: Arc<dyn ProgressStore>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        let store: Arc<dyn ProgressStore> = Arc::new(TimedStore::new(store, config.store_timeout));
        Self {
            curriculum,
            store,
            clock,
            config,
        }
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // -- Start date and current day -------------------------------------------

    /// The persisted start date, initialized to today on first access.
    pub async fn start_date(&self) -> Result<NaiveDate> {
        if let Some(date) = self.store.start_date().await? {
            return Ok(date);
        }
        let today = self.clock.today();
        self.store.set_start_date(today).await?;
        tracing::info!("start date initialized to {today}");
        Ok(today)
    }

    /// Overwrite the start date.
    pub async fn set_start_date(&self, date: NaiveDate) -> Result<()> {
        self.store.set_start_date(date).await?;
        tracing::info!("start date set to {date}");
        Ok(())
    }

    /// Map today's date onto the curriculum.
    pub async fn current_day(&self) -> Result<CurrentDay> {
        let start_date = self.start_date().await?;
        let today = self.clock.today();
        let days_passed = (today - start_date).num_days();
        let last_day = i64::from(self.curriculum.day_count().max(1));
        let current_day = (days_passed + 1).clamp(1, last_day) as u32;
        Ok(CurrentDay {
            current_day,
            start_date,
            today,
            days_passed,
        })
    }

    // -- Day view ------------------------------------------------------------

    /// Compose the view for `day`.
    pub async fn day_view(&self, day: u32) -> Result<DayView> {
        if !self.curriculum.contains_day(day) {
            return Err(SchedulerError::InvalidInput(format!(
                "day must be between 1 and {}, got {day}",
                self.curriculum.day_count()
            )));
        }
        let start_date = self.start_date().await?;
        DayAssembler::new(&self.curriculum, &self.config.review)
            .assemble(self.store.as_ref(), day, start_date, self.clock.today())
            .await
    }

    // -- Mutations -----------------------------------------------------------

    /// Record a completion, or undo when `correct` is `None`.
    pub async fn apply_progress(
        &self,
        id: ItemId,
        correct: Option<bool>,
        elapsed_secs: Option<u32>,
        note: Option<String>,
    ) -> Result<Option<ProgressRecord>> {
        let action = match correct {
            Some(correct) => ProgressAction::Complete {
                correct,
                elapsed_secs,
                note,
            },
            None => ProgressAction::Undo,
        };
        self.apply(id, action).await
    }

    /// Apply one action to one item as a single store update.
    ///
    /// Returns the stored record afterwards. Completion-changing actions are
    /// followed by a best-effort statistics refresh.
    pub async fn apply(&self, id: ItemId, action: ProgressAction) -> Result<Option<ProgressRecord>> {
        self.require_item(id)?;
        let today = self.clock.today();
        let name = action.name();
        let refresh = action.changes_completion();

        let record = self
            .store
            .update(id, Box::new(move |current| transition(current, id, action, today)))
            .await?;
        tracing::info!("{name} applied to item {id}");

        if refresh {
            self.refresh_statistics().await;
        }
        Ok(record)
    }

    /// Defer or undefer an item.
    pub async fn set_deferred(&self, id: ItemId, deferred: bool) -> Result<Option<ProgressRecord>> {
        let action = if deferred {
            ProgressAction::Defer
        } else {
            ProgressAction::Undefer
        };
        self.apply(id, action).await
    }

    /// The stored note for an item; empty when none.
    pub async fn note(&self, id: ItemId) -> Result<String> {
        self.require_item(id)?;
        Ok(self
            .store
            .get(id)
            .await?
            .map(|r| r.note)
            .unwrap_or_default())
    }

    pub async fn set_note(&self, id: ItemId, note: impl Into<String>) -> Result<Option<ProgressRecord>> {
        self.apply(id, ProgressAction::Annotate { note: note.into() })
            .await
    }

    pub async fn status(&self, id: ItemId) -> Result<ItemStatus> {
        self.require_item(id)?;
        let record = self.store.get(id).await?;
        Ok(classify(record.as_ref()))
    }

    // -- Queries -------------------------------------------------------------

    /// Deferred items, most recently deferred first.
    pub async fn deferred_list(&self) -> Result<Vec<DeferredEntry>> {
        let mut entries: Vec<DeferredEntry> = self
            .store
            .deferred()
            .await?
            .into_iter()
            .filter_map(|record| {
                let item = self.curriculum.item(record.item_id)?;
                Some(DeferredEntry {
                    item: item.clone(),
                    deferred_since: record.deferred_since?,
                    completed: record.completion.is_some(),
                    is_correct: record.correct(),
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            b.deferred_since
                .cmp(&a.deferred_since)
                .then(a.item.day.cmp(&b.item.day))
                .then(a.item.id.cmp(&b.item.id))
        });
        Ok(entries)
    }

    /// Review candidates for today's real date.
    pub async fn review_list(&self) -> Result<Vec<ReviewCandidate>> {
        let today = self.clock.today();
        let policy = &self.config.review;
        let request = ReviewRequest {
            target: today,
            today,
            limit: policy.list_limit,
            fallback_limit: policy.list_limit,
        };
        Ok(ReviewSelector::new(&self.curriculum, policy)
            .select(self.store.as_ref(), request, &Default::default())
            .await?)
    }

    /// Recompute statistics from all records.
    pub async fn statistics(&self) -> Result<StatsSnapshot> {
        let records = self.store.all().await?;
        Ok(compute_statistics(
            &self.curriculum,
            &records,
            self.clock.today(),
        ))
    }

    /// Recompute and persist the global counters. Failures are logged only.
    pub async fn refresh_statistics(&self) {
        let result = async {
            let records = self.store.all().await?;
            let summary = summarize(&records, self.clock.now());
            self.store.save_summary(&summary).await
        }
        .await;
        if let Err(e) = result {
            tracing::warn!("statistics refresh failed: {e}");
        }
    }

    fn require_item(&self, id: ItemId) -> Result<()> {
        if self.curriculum.item(id).is_none() {
            return Err(SchedulerError::NotFound(id));
        }
        Ok(())
    }
}
