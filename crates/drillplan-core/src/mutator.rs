//! Progress mutations.
//!
//! Each learner action is a pure transition from the current record (if
//! any) to the next one. The scheduler hands the transition to
//! [`crate::traits::ProgressStore::update`] so it runs as one
//! read-modify-write.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Completion, ItemId, ProgressRecord};

/// A single learner action on one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ProgressAction {
    /// Mark the item done, right or wrong.
    Complete {
        correct: bool,
        #[serde(default)]
        elapsed_secs: Option<u32>,
        /// Replaces the stored note when present.
        #[serde(default)]
        note: Option<String>,
    },
    /// Remove the record entirely.
    Undo,
    Defer,
    Undefer,
    /// Replace the free-text note.
    Annotate { note: String },
}

impl ProgressAction {
    /// Whether the action can change completion counters.
    pub fn changes_completion(&self) -> bool {
        matches!(self, ProgressAction::Complete { .. } | ProgressAction::Undo)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProgressAction::Complete { .. } => "complete",
            ProgressAction::Undo => "undo",
            ProgressAction::Defer => "defer",
            ProgressAction::Undefer => "undefer",
            ProgressAction::Annotate { .. } => "annotate",
        }
    }
}

/// Apply `action`, taken on `today`, to the current record of `id`.
///
/// Returns the record to store, or `None` if the item has no record
/// afterwards.
pub fn transition(
    current: Option<ProgressRecord>,
    id: ItemId,
    action: ProgressAction,
    today: NaiveDate,
) -> Option<ProgressRecord> {
    match action {
        ProgressAction::Undo => None,

        ProgressAction::Complete {
            correct,
            elapsed_secs,
            note,
        } => {
            let mut record = current.unwrap_or_else(|| ProgressRecord::new(id));

            let is_review = record
                .completed_date()
                .is_some_and(|previous| previous < today);
            if is_review {
                record.review_count += 1;
                record.last_review = Some(today);
                tracing::info!("item {id} reviewed ({} reviews)", record.review_count);
            }

            // A stored date later than today only happens if the clock went
            // backwards; keep it so the review count stays monotonic.
            let date = match record.completed_date() {
                Some(previous) if previous > today => previous,
                _ => today,
            };
            let elapsed_secs = elapsed_secs.or(record.completion.and_then(|c| c.elapsed_secs));
            record.completion = Some(Completion {
                date,
                correct,
                elapsed_secs,
            });
            if let Some(note) = note {
                record.note = note;
            }
            record.deferred_since = None;
            Some(record)
        }

        ProgressAction::Defer => {
            let mut record = current.unwrap_or_else(|| ProgressRecord::new(id));
            record.deferred_since = Some(today);
            Some(record)
        }

        ProgressAction::Undefer => current.map(|mut record| {
            record.deferred_since = None;
            record
        }),

        ProgressAction::Annotate { note } => {
            let mut record = current.unwrap_or_else(|| ProgressRecord::new(id));
            record.note = note;
            Some(record)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn complete(correct: bool) -> ProgressAction {
        ProgressAction::Complete {
            correct,
            elapsed_secs: None,
            note: None,
        }
    }

    const ID: ItemId = ItemId(42);

    #[test]
    fn first_completion_creates_record() {
        let record = transition(None, ID, complete(false), d("2025-05-01")).unwrap();
        assert_eq!(record.completed_date(), Some(d("2025-05-01")));
        assert_eq!(record.correct(), Some(false));
        assert_eq!(record.review_count, 0);
        assert_eq!(record.last_review, None);
    }

    #[test]
    fn same_day_completion_is_a_correction() {
        let today = d("2025-05-01");
        let first = transition(None, ID, complete(false), today);
        let second = transition(first, ID, complete(true), today).unwrap();
        assert_eq!(second.review_count, 0);
        assert_eq!(second.correct(), Some(true));

        let third = transition(Some(second.clone()), ID, complete(true), today).unwrap();
        assert_eq!(third, second);
    }

    #[test]
    fn later_completion_is_a_review() {
        let first = transition(None, ID, complete(false), d("2025-05-01"));
        let review = transition(first, ID, complete(true), d("2025-05-04")).unwrap();
        assert_eq!(review.review_count, 1);
        assert_eq!(review.last_review, Some(d("2025-05-04")));
        assert_eq!(review.completed_date(), Some(d("2025-05-04")));
        assert_eq!(review.correct(), Some(true));

        // Correcting the review on the same day keeps the review date.
        let fixed = transition(Some(review), ID, complete(false), d("2025-05-04")).unwrap();
        assert_eq!(fixed.review_count, 1);
        assert_eq!(fixed.last_review, Some(d("2025-05-04")));
    }

    #[test]
    fn earlier_clock_never_counts_as_review() {
        let first = transition(None, ID, complete(true), d("2025-05-04"));
        let back = transition(first, ID, complete(false), d("2025-05-01")).unwrap();
        assert_eq!(back.review_count, 0);
        assert_eq!(back.completed_date(), Some(d("2025-05-04")));
    }

    #[test]
    fn completion_clears_deferral_and_keeps_note() {
        let mut record = ProgressRecord::new(ID);
        record.deferred_since = Some(d("2025-04-30"));
        record.note = "use a monotonic stack".into();

        let done = transition(Some(record), ID, complete(true), d("2025-05-01")).unwrap();
        assert!(!done.is_deferred());
        assert_eq!(done.note, "use a monotonic stack");
        assert_eq!(done.review_count, 0);
    }

    #[test]
    fn completion_with_note_and_elapsed() {
        let action = ProgressAction::Complete {
            correct: true,
            elapsed_secs: Some(900),
            note: Some("sorted first".into()),
        };
        let record = transition(None, ID, action, d("2025-05-01")).unwrap();
        assert_eq!(record.note, "sorted first");
        assert_eq!(record.completion.unwrap().elapsed_secs, Some(900));

        let again = transition(Some(record), ID, complete(true), d("2025-05-01")).unwrap();
        assert_eq!(again.completion.unwrap().elapsed_secs, Some(900));
    }

    #[test]
    fn undo_removes_everything() {
        let record = transition(None, ID, complete(true), d("2025-05-01"));
        assert!(transition(record, ID, ProgressAction::Undo, d("2025-05-02")).is_none());
        assert!(transition(None, ID, ProgressAction::Undo, d("2025-05-02")).is_none());
    }

    #[test]
    fn defer_keeps_completion_fields() {
        let done = transition(None, ID, complete(false), d("2025-05-01"));
        let deferred = transition(done, ID, ProgressAction::Defer, d("2025-05-02")).unwrap();
        assert_eq!(deferred.deferred_since, Some(d("2025-05-02")));
        assert_eq!(deferred.correct(), Some(false));

        let bare = transition(None, ID, ProgressAction::Defer, d("2025-05-02")).unwrap();
        assert!(bare.completion.is_none());
        assert!(bare.is_deferred());
    }

    #[test]
    fn repeated_defer_moves_the_date() {
        let first = transition(None, ID, ProgressAction::Defer, d("2025-05-01"));
        let again = transition(first, ID, ProgressAction::Defer, d("2025-05-09")).unwrap();
        assert_eq!(again.deferred_since, Some(d("2025-05-09")));
    }

    #[test]
    fn undefer_without_record_is_noop() {
        assert!(transition(None, ID, ProgressAction::Undefer, d("2025-05-02")).is_none());

        let mut record = ProgressRecord::new(ID);
        record.deferred_since = Some(d("2025-05-01"));
        let undeferred = transition(Some(record), ID, ProgressAction::Undefer, d("2025-05-02"));
        assert_eq!(undeferred, Some(ProgressRecord::new(ID)));
    }

    #[test]
    fn annotate_touches_only_the_note() {
        let done = transition(None, ID, complete(true), d("2025-05-01")).unwrap();
        let noted = transition(
            Some(done.clone()),
            ID,
            ProgressAction::Annotate {
                note: "two pointers".into(),
            },
            d("2025-05-03"),
        )
        .unwrap();
        assert_eq!(noted.note, "two pointers");
        assert_eq!(noted.completion, done.completion);
        assert_eq!(noted.review_count, done.review_count);
    }

    #[test]
    fn only_complete_and_undo_change_completion() {
        assert!(complete(true).changes_completion());
        assert!(ProgressAction::Undo.changes_completion());
        assert!(!ProgressAction::Defer.changes_completion());
        assert!(!ProgressAction::Annotate { note: String::new() }.changes_completion());
    }
}
