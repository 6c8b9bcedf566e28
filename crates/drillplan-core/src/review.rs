//! Forgetting-curve review selection.
//!
//! Candidates come from the first non-empty tier:
//!
//! 1. items completed exactly `interval` days before the target date, for each
//!    configured interval in order (wrong first, then least reviewed);
//! 2. items answered wrong before the target date, most recent first;
//! 3. any item completed before the target date, most recent first.
//!
//! Every tier only looks at completions strictly before the target date and
//! never returns deferred items.

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::curriculum::Curriculum;
use crate::error::StoreError;
use crate::model::{Item, ItemId, ProgressRecord};
use crate::traits::ProgressStore;

/// Scheduling constants for review selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewPolicy {
    /// Spacing points in days, checked in order.
    pub intervals: Vec<u32>,
    /// Review items shown in a day view.
    pub max_items: usize,
    /// Cap on each fallback tier in a day view.
    pub fallback_limit: usize,
    /// Length of the standalone review list.
    pub list_limit: usize,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            intervals: vec![1, 3, 7, 14],
            max_items: 3,
            fallback_limit: 3,
            list_limit: 10,
        }
    }
}

/// Which tier produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewTier {
    ExactInterval,
    RecentMistakes,
    RecentCompletions,
}

/// An item selected for review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewCandidate {
    pub item: Item,
    pub record: ProgressRecord,
    pub tier: ReviewTier,
    /// The matched spacing interval; only set for exact-interval hits.
    pub interval: Option<u32>,
    /// Whether the item was reviewed (or first completed) on today's date.
    pub reviewed_today: bool,
}

/// Parameters of one selection.
#[derive(Debug, Clone, Copy)]
pub struct ReviewRequest {
    /// Study date the review is for.
    pub target: NaiveDate,
    /// Real calendar date, for `reviewed_today`.
    pub today: NaiveDate,
    /// Maximum candidates returned.
    pub limit: usize,
    /// Maximum candidates taken from a fallback tier.
    pub fallback_limit: usize,
}

/// Selects review candidates from the progress store.
pub struct ReviewSelector<'a> {
    curriculum: &'a Curriculum,
    policy: &'a ReviewPolicy,
}

impl<'a> ReviewSelector<'a> {
    pub fn new(curriculum: &'a Curriculum, policy: &'a ReviewPolicy) -> Self {
        Self { curriculum, policy }
    }

    /// Run the tier cascade. Items in `exclude` are never returned.
    pub async fn select(
        &self,
        store: &dyn ProgressStore,
        request: ReviewRequest,
        exclude: &HashSet<ItemId>,
    ) -> Result<Vec<ReviewCandidate>, StoreError> {
        let mut candidates = self.exact_interval(store, &request, exclude).await?;

        if candidates.is_empty() {
            candidates = self.recent(store, &request, exclude, true).await?;
        }
        if candidates.is_empty() {
            candidates = self.recent(store, &request, exclude, false).await?;
        }

        let mut seen = HashSet::new();
        candidates.retain(|c| seen.insert(c.item.id));
        candidates.truncate(request.limit);

        if let Some(first) = candidates.first() {
            tracing::debug!(
                "selected {} review item(s) for {} from {:?}",
                candidates.len(),
                request.target,
                first.tier
            );
        }
        Ok(candidates)
    }

    async fn exact_interval(
        &self,
        store: &dyn ProgressStore,
        request: &ReviewRequest,
        exclude: &HashSet<ItemId>,
    ) -> Result<Vec<ReviewCandidate>, StoreError> {
        let mut candidates = Vec::new();
        for &interval in &self.policy.intervals {
            let Some(date) = request.target.checked_sub_days(Days::new(u64::from(interval)))
            else {
                continue;
            };
            let mut records = self.eligible(store.completed_on(date).await?, exclude);
            records.sort_by_key(|r| (r.correct(), r.review_count, r.item_id));
            candidates.extend(records.into_iter().filter_map(|r| {
                self.candidate(r, ReviewTier::ExactInterval, Some(interval), request.today)
            }));
        }
        Ok(candidates)
    }

    async fn recent(
        &self,
        store: &dyn ProgressStore,
        request: &ReviewRequest,
        exclude: &HashSet<ItemId>,
        wrong_only: bool,
    ) -> Result<Vec<ReviewCandidate>, StoreError> {
        let tier = if wrong_only {
            ReviewTier::RecentMistakes
        } else {
            ReviewTier::RecentCompletions
        };
        let mut records = self.eligible(
            store.completed_before(request.target, wrong_only).await?,
            exclude,
        );
        records.sort_by_key(|r| (Reverse(r.completed_date()), r.review_count, r.item_id));
        Ok(records
            .into_iter()
            .filter_map(|r| self.candidate(r, tier, None, request.today))
            .take(request.fallback_limit)
            .collect())
    }

    fn eligible(
        &self,
        records: Vec<ProgressRecord>,
        exclude: &HashSet<ItemId>,
    ) -> Vec<ProgressRecord> {
        records
            .into_iter()
            .filter(|r| !r.is_deferred() && !exclude.contains(&r.item_id))
            .collect()
    }

    fn candidate(
        &self,
        record: ProgressRecord,
        tier: ReviewTier,
        interval: Option<u32>,
        today: NaiveDate,
    ) -> Option<ReviewCandidate> {
        let Some(item) = self.curriculum.item(record.item_id) else {
            tracing::debug!("record for unknown item {} ignored", record.item_id);
            return None;
        };
        let reviewed_today = match record.last_review {
            Some(date) => date == today,
            None => record.completed_date() == Some(today),
        };
        Some(ReviewCandidate {
            item: item.clone(),
            record,
            tier,
            interval,
            reviewed_today,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::parse_curriculum_str;
    use crate::memory::MemoryStore;
    use std::path::PathBuf;

    const PLAN: &str = r#"
[curriculum]
name = "Review Plan"

[[days]]
day = 1
focus = "Arrays"
morning = [
    { id = 1, title = "Two Sum", difficulty = "easy" },
    { id = 2, title = "Add Two Numbers" },
    { id = 3, title = "Longest Substring" },
]
afternoon = [
    { id = 4, title = "Median of Two Sorted Arrays", difficulty = "hard" },
    { id = 5, title = "Longest Palindromic Substring" },
    { id = 6, title = "Zigzag Conversion" },
]
"#;

    fn curriculum() -> Curriculum {
        parse_curriculum_str(PLAN, &PathBuf::from("plan.toml")).unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn request(target: &str) -> ReviewRequest {
        ReviewRequest {
            target: d(target),
            today: d(target),
            limit: 3,
            fallback_limit: 3,
        }
    }

    fn ids(candidates: &[ReviewCandidate]) -> Vec<u32> {
        candidates.iter().map(|c| c.item.id.0).collect()
    }

    async fn select(store: &MemoryStore, req: ReviewRequest) -> Vec<ReviewCandidate> {
        let c = curriculum();
        let policy = ReviewPolicy::default();
        ReviewSelector::new(&c, &policy)
            .select(store, req, &HashSet::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn exact_interval_hit_carries_interval() {
        let store = MemoryStore::new();
        store.insert(MemoryStore::completed(ItemId(1), d("2025-03-07"), false));

        let picked = select(&store, request("2025-03-10")).await;
        assert_eq!(ids(&picked), vec![1]);
        assert_eq!(picked[0].interval, Some(3));
        assert_eq!(picked[0].tier, ReviewTier::ExactInterval);
    }

    #[tokio::test]
    async fn exact_interval_orders_wrong_then_least_reviewed() {
        let store = MemoryStore::new();
        let mut reviewed = MemoryStore::completed(ItemId(1), d("2025-03-09"), false);
        reviewed.review_count = 2;
        store.insert(reviewed);
        store.insert(MemoryStore::completed(ItemId(2), d("2025-03-09"), true));
        store.insert(MemoryStore::completed(ItemId(3), d("2025-03-09"), false));

        let picked = select(&store, request("2025-03-10")).await;
        assert_eq!(ids(&picked), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn shorter_intervals_come_first_and_cap_applies() {
        let store = MemoryStore::new();
        store.insert(MemoryStore::completed(ItemId(1), d("2025-02-24"), false)); // 14 days
        store.insert(MemoryStore::completed(ItemId(2), d("2025-03-03"), true)); // 7 days
        store.insert(MemoryStore::completed(ItemId(3), d("2025-03-07"), true)); // 3 days
        store.insert(MemoryStore::completed(ItemId(4), d("2025-03-09"), true)); // 1 day

        let picked = select(&store, request("2025-03-10")).await;
        assert_eq!(ids(&picked), vec![4, 3, 2]);
        let intervals: Vec<Option<u32>> = picked.iter().map(|c| c.interval).collect();
        assert_eq!(intervals, vec![Some(1), Some(3), Some(7)]);
    }

    #[tokio::test]
    async fn exact_tier_suppresses_mistake_fallback() {
        let store = MemoryStore::new();
        store.insert(MemoryStore::completed(ItemId(1), d("2025-03-09"), true));
        store.insert(MemoryStore::completed(ItemId(2), d("2025-03-05"), false));

        let picked = select(&store, request("2025-03-10")).await;
        assert_eq!(ids(&picked), vec![1]);
    }

    #[tokio::test]
    async fn mistakes_fallback_is_most_recent_first() {
        let store = MemoryStore::new();
        for (id, day) in [(1, "2025-03-02"), (2, "2025-03-05"), (3, "2025-03-04"), (4, "2025-03-01")] {
            store.insert(MemoryStore::completed(ItemId(id), d(day), false));
        }
        store.insert(MemoryStore::completed(ItemId(5), d("2025-03-08"), true));

        let picked = select(&store, request("2025-03-10")).await;
        assert_eq!(ids(&picked), vec![2, 3, 1]);
        assert!(picked.iter().all(|c| c.tier == ReviewTier::RecentMistakes));
        assert!(picked.iter().all(|c| c.interval.is_none()));
    }

    #[tokio::test]
    async fn completions_fallback_when_nothing_wrong() {
        let store = MemoryStore::new();
        store.insert(MemoryStore::completed(ItemId(5), d("2025-03-08"), true));
        store.insert(MemoryStore::completed(ItemId(6), d("2025-03-05"), true));

        let picked = select(&store, request("2025-03-10")).await;
        assert_eq!(ids(&picked), vec![5, 6]);
        assert_eq!(picked[0].tier, ReviewTier::RecentCompletions);
    }

    #[tokio::test]
    async fn completions_on_or_after_target_are_ignored() {
        let store = MemoryStore::new();
        store.insert(MemoryStore::completed(ItemId(1), d("2025-03-10"), false));
        store.insert(MemoryStore::completed(ItemId(2), d("2025-03-12"), true));

        let picked = select(&store, request("2025-03-10")).await;
        assert!(picked.is_empty());
    }

    #[tokio::test]
    async fn deferred_items_are_never_selected() {
        let store = MemoryStore::new();
        let mut deferred = MemoryStore::completed(ItemId(1), d("2025-03-09"), false);
        deferred.deferred_since = Some(d("2025-03-09"));
        store.insert(deferred);

        let picked = select(&store, request("2025-03-10")).await;
        assert!(picked.is_empty());
    }

    #[tokio::test]
    async fn excluded_items_leave_room_for_others() {
        let store = MemoryStore::new();
        store.insert(MemoryStore::completed(ItemId(1), d("2025-03-09"), false));
        store.insert(MemoryStore::completed(ItemId(2), d("2025-03-09"), true));

        let c = curriculum();
        let policy = ReviewPolicy::default();
        let exclude = HashSet::from([ItemId(1)]);
        let picked = ReviewSelector::new(&c, &policy)
            .select(&store, request("2025-03-10"), &exclude)
            .await
            .unwrap();
        assert_eq!(ids(&picked), vec![2]);
    }

    #[tokio::test]
    async fn reviewed_today_uses_last_review_then_completion() {
        let store = MemoryStore::new();
        let mut reviewed = MemoryStore::completed(ItemId(1), d("2025-03-09"), true);
        reviewed.last_review = Some(d("2025-03-12"));
        store.insert(reviewed);
        store.insert(MemoryStore::completed(ItemId(2), d("2025-03-09"), true));

        let mut req = request("2025-03-10");
        req.today = d("2025-03-12");
        let picked = select(&store, req).await;
        let flags: Vec<(u32, bool)> = picked.iter().map(|c| (c.item.id.0, c.reviewed_today)).collect();
        assert_eq!(flags, vec![(1, true), (2, false)]);

        req.today = d("2025-03-09");
        let picked = select(&store, req).await;
        assert!(!picked[0].reviewed_today);
        assert!(picked[1].reviewed_today);
    }

    #[tokio::test]
    async fn custom_intervals_are_respected() {
        let store = MemoryStore::new();
        store.insert(MemoryStore::completed(ItemId(1), d("2025-03-08"), true));

        let c = curriculum();
        let policy = ReviewPolicy {
            intervals: vec![2],
            ..ReviewPolicy::default()
        };
        let picked = ReviewSelector::new(&c, &policy)
            .select(&store, request("2025-03-10"), &HashSet::new())
            .await
            .unwrap();
        assert_eq!(picked[0].interval, Some(2));
    }

    #[tokio::test]
    async fn unknown_items_are_skipped() {
        let store = MemoryStore::new();
        store.insert(MemoryStore::completed(ItemId(999), d("2025-03-09"), false));
        let picked = select(&store, request("2025-03-10")).await;
        assert!(picked.is_empty());
    }
}
