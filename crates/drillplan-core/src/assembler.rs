//! Day view assembly.
//!
//! A [`DayView`] is recomputed from the curriculum and the progress store on
//! every request and never cached.

use std::collections::{HashMap, HashSet};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::classifier::{classify, ItemStatus};
use crate::curriculum::Curriculum;
use crate::error::{Result, SchedulerError};
use crate::model::{Item, ItemId, ProgressRecord, Slot};
use crate::review::{ReviewPolicy, ReviewRequest, ReviewSelector};
use crate::traits::ProgressStore;

/// One item as shown in a day view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    #[serde(flatten)]
    pub item: Item,
    /// For review entries: whether it was reinforced on today's date.
    pub completed: bool,
    pub is_correct: Option<bool>,
    pub from_previous_day: bool,
    pub for_review: bool,
    pub review_interval: Option<u32>,
    pub note: String,
}

impl DayEntry {
    fn new(item: &Item, record: Option<&ProgressRecord>) -> Self {
        let status = classify(record);
        Self {
            item: item.clone(),
            completed: status.is_completed(),
            is_correct: status.correct(),
            from_previous_day: false,
            for_review: false,
            review_interval: None,
            note: record.map(|r| r.note.clone()).unwrap_or_default(),
        }
    }
}

/// Counts shown alongside a day view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    /// Entries across all slots.
    pub total: usize,
    /// Completed items scheduled on this day.
    pub completed: usize,
    /// Of those, answered wrong.
    pub wrong: usize,
    pub carried_over: usize,
    pub review: usize,
    /// This day's items hidden because they are deferred.
    pub deferred: usize,
}

/// The composed plan for one curriculum day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayView {
    pub day: u32,
    pub study_date: NaiveDate,
    pub description: String,
    pub focus: String,
    pub morning: Vec<DayEntry>,
    pub afternoon: Vec<DayEntry>,
    pub evening: Vec<DayEntry>,
    pub summary: DaySummary,
}

impl DayView {
    pub fn slot(&self, slot: Slot) -> &[DayEntry] {
        match slot {
            Slot::Morning => &self.morning,
            Slot::Afternoon => &self.afternoon,
            Slot::Evening => &self.evening,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Vec<DayEntry> {
        match slot {
            Slot::Morning => &mut self.morning,
            Slot::Afternoon => &mut self.afternoon,
            Slot::Evening => &mut self.evening,
        }
    }

    /// All entries, morning first.
    pub fn entries(&self) -> impl Iterator<Item = &DayEntry> {
        Slot::ALL.into_iter().flat_map(|slot| self.slot(slot).iter())
    }
}

/// Composes day views from the curriculum, carry-over and review selection.
pub struct DayAssembler<'a> {
    curriculum: &'a Curriculum,
    policy: &'a ReviewPolicy,
}

impl<'a> DayAssembler<'a> {
    pub fn new(curriculum: &'a Curriculum, policy: &'a ReviewPolicy) -> Self {
        Self { curriculum, policy }
    }

    /// Calendar date on which `day` is studied.
    pub fn study_date(start_date: NaiveDate, day: u32) -> Result<NaiveDate> {
        start_date
            .checked_add_days(Days::new(u64::from(day.saturating_sub(1))))
            .ok_or_else(|| {
                SchedulerError::InvalidInput(format!("day {day} is past the end of the calendar"))
            })
    }

    /// Build the view for `day`. Rejects days outside the curriculum before
    /// touching the store.
    pub async fn assemble(
        &self,
        store: &dyn ProgressStore,
        day: u32,
        start_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<DayView> {
        if !self.curriculum.contains_day(day) {
            return Err(SchedulerError::InvalidInput(format!(
                "day must be between 1 and {}, got {day}",
                self.curriculum.day_count()
            )));
        }
        let study_date = Self::study_date(start_date, day)?;

        let todays = self.curriculum.items_for_day(day);
        let previous = if day > 1 {
            self.curriculum.items_for_day(day - 1)
        } else {
            Vec::new()
        };
        let today_ids: Vec<ItemId> = todays.iter().map(|i| i.id).collect();
        let previous_ids: Vec<ItemId> = previous.iter().map(|i| i.id).collect();

        let (today_records, previous_records) = futures::try_join!(
            store.get_many(&today_ids),
            store.get_many(&previous_ids)
        )?;

        let plan = self.curriculum.day(day);
        let mut view = DayView {
            day,
            study_date,
            description: plan.map(|p| p.description.clone()).unwrap_or_default(),
            focus: plan.map(|p| p.focus.clone()).unwrap_or_default(),
            morning: Vec::new(),
            afternoon: Vec::new(),
            evening: Vec::new(),
            summary: DaySummary::default(),
        };
        let mut shown: HashSet<ItemId> = HashSet::new();

        for item in carried_over(&previous, &previous_records) {
            let mut entry = DayEntry::new(item, previous_records.get(&item.id));
            entry.from_previous_day = true;
            shown.insert(item.id);
            view.morning.push(entry);
        }
        view.summary.carried_over = view.morning.len();

        for item in &todays {
            let record = today_records.get(&item.id);
            let status = classify(record);
            if status == ItemStatus::Deferred {
                view.summary.deferred += 1;
                continue;
            }
            if let Some(correct) = status.correct() {
                view.summary.completed += 1;
                if !correct {
                    view.summary.wrong += 1;
                }
            }
            shown.insert(item.id);
            view.slot_mut(item.slot).push(DayEntry::new(item, record));
        }

        let request = ReviewRequest {
            target: study_date,
            today,
            limit: self.policy.max_items,
            fallback_limit: self.policy.fallback_limit,
        };
        let reviews = ReviewSelector::new(self.curriculum, self.policy)
            .select(store, request, &shown)
            .await?;
        view.summary.review = reviews.len();
        for candidate in reviews {
            view.evening.push(DayEntry {
                completed: candidate.reviewed_today,
                is_correct: candidate.record.correct(),
                from_previous_day: false,
                for_review: true,
                review_interval: candidate.interval,
                note: candidate.record.note,
                item: candidate.item,
            });
        }

        view.summary.total = view.entries().count();
        tracing::debug!(
            "assembled day {day} ({study_date}): {} entries, {} carried over, {} review",
            view.summary.total,
            view.summary.carried_over,
            view.summary.review
        );
        Ok(view)
    }
}

/// Previous-day items that are neither completed nor deferred.
fn carried_over<'c>(
    previous: &[&'c Item],
    records: &HashMap<ItemId, ProgressRecord>,
) -> Vec<&'c Item> {
    previous
        .iter()
        .copied()
        .filter(|item| classify(records.get(&item.id)) == ItemStatus::Untouched)
        .collect()
}
