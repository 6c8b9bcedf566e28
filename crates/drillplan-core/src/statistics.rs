//! Progress statistics.
//!
//! Everything here is recomputed from the full set of progress records on
//! each call; no incremental counters are kept.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::curriculum::Curriculum;
use crate::model::{Difficulty, ProgressRecord};

/// Window, in days, for counting distinct study dates.
pub const STREAK_WINDOW_DAYS: u64 = 30;

/// Full statistics returned by `GetStatistics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Items in the curriculum.
    pub total_items: usize,
    /// Items with a recorded completion.
    pub total_completed: usize,
    pub total_correct: usize,
    pub total_wrong: usize,
    /// Completed items per category.
    pub by_category: BTreeMap<String, usize>,
    /// Completed items per difficulty.
    pub by_difficulty: BTreeMap<Difficulty, usize>,
    /// Distinct completion dates within the last 30 days.
    pub streak_days: usize,
    pub last_study_date: Option<NaiveDate>,
}

impl StatsSnapshot {
    /// Share of curriculum items completed, in `[0, 1]`.
    pub fn completion_rate(&self) -> f64 {
        if self.total_items == 0 {
            0.0
        } else {
            self.total_completed as f64 / self.total_items as f64
        }
    }

    /// Share of completed items answered correctly, in `[0, 1]`.
    pub fn accuracy(&self) -> f64 {
        if self.total_completed == 0 {
            0.0
        } else {
            self.total_correct as f64 / self.total_completed as f64
        }
    }
}

/// Global counters persisted after each completion-changing mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_completed: usize,
    pub total_correct: usize,
    pub total_wrong: usize,
    pub last_study_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

struct Counters {
    completed: usize,
    correct: usize,
    wrong: usize,
    last_study_date: Option<NaiveDate>,
}

fn count(records: &[ProgressRecord]) -> Counters {
    let completions: Vec<_> = records.iter().filter_map(|r| r.completion).collect();
    Counters {
        completed: completions.len(),
        correct: completions.iter().filter(|c| c.correct).count(),
        wrong: completions.iter().filter(|c| !c.correct).count(),
        last_study_date: completions.iter().map(|c| c.date).max(),
    }
}

/// Compute the global counters from all records.
pub fn summarize(records: &[ProgressRecord], now: DateTime<Utc>) -> StatsSummary {
    let counters = count(records);
    StatsSummary {
        total_completed: counters.completed,
        total_correct: counters.correct,
        total_wrong: counters.wrong,
        last_study_date: counters.last_study_date,
        updated_at: now,
    }
}

/// Compute the full statistics snapshot.
///
/// Category and difficulty breakdowns only count records whose item is in
/// the curriculum.
pub fn compute_statistics(
    curriculum: &Curriculum,
    records: &[ProgressRecord],
    today: NaiveDate,
) -> StatsSnapshot {
    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_difficulty: BTreeMap<Difficulty, usize> = BTreeMap::new();

    for record in records.iter().filter(|r| r.completion.is_some()) {
        if let Some(item) = curriculum.item(record.item_id) {
            *by_category.entry(item.category.clone()).or_default() += 1;
            *by_difficulty.entry(item.difficulty).or_default() += 1;
        }
    }

    let window_start = today
        .checked_sub_days(Days::new(STREAK_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MIN);
    let study_dates: BTreeSet<NaiveDate> = records
        .iter()
        .filter_map(|r| r.completed_date())
        .filter(|d| *d >= window_start)
        .collect();

    let counters = count(records);

    StatsSnapshot {
        total_items: curriculum.item_count(),
        total_completed: counters.completed,
        total_correct: counters.correct,
        total_wrong: counters.wrong,
        by_category,
        by_difficulty,
        streak_days: study_dates.len(),
        last_study_date: counters.last_study_date,
    }
}
