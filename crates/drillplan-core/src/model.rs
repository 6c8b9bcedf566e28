//! Core data model types for drillplan.
//!
//! Items are the immutable curriculum entries; progress records are the
//! mutable per-item attempt history the scheduler reads and writes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a curriculum item (the problem number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .trim_start_matches('#')
            .parse::<u32>()
            .map(ItemId)
            .map_err(|_| format!("invalid item id: {s}"))
    }
}

/// Problem difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Time-slot of a curriculum day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Morning,
    Afternoon,
    Evening,
}

impl Slot {
    /// All slots in display order.
    pub const ALL: [Slot; 3] = [Slot::Morning, Slot::Afternoon, Slot::Evening];
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Morning => write!(f, "morning"),
            Slot::Afternoon => write!(f, "afternoon"),
            Slot::Evening => write!(f, "evening"),
        }
    }
}

impl FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morning" | "am" => Ok(Slot::Morning),
            "afternoon" | "pm" => Ok(Slot::Afternoon),
            "evening" | "night" => Ok(Slot::Evening),
            other => Err(format!("unknown slot: {other}")),
        }
    }
}

/// A single curriculum item. Created once when the curriculum is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier.
    pub id: ItemId,
    /// Human-readable title.
    pub title: String,
    /// Problem difficulty.
    pub difficulty: Difficulty,
    /// Topic category (e.g. "Two Pointers").
    pub category: String,
    /// Curriculum day the item is scheduled on.
    pub day: u32,
    /// Time-slot within that day.
    pub slot: Slot,
}

/// A recorded completion of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Date of the most recent completion.
    pub date: NaiveDate,
    /// Whether the learner got it right.
    pub correct: bool,
    /// Time spent in seconds, if reported.
    #[serde(default)]
    pub elapsed_secs: Option<u32>,
}

/// Attempt history for one item the learner has acted on.
///
/// Items without a record are untouched. A record is created by the first
/// complete, defer or note action and removed only by undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub item_id: ItemId,
    #[serde(default)]
    pub completion: Option<Completion>,
    #[serde(default)]
    pub note: String,
    /// Re-attempts on a later date than the stored completion.
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub last_review: Option<NaiveDate>,
    /// Set while the item is deferred; the date it was deferred on.
    #[serde(default)]
    pub deferred_since: Option<NaiveDate>,
}

impl ProgressRecord {
    /// A bare record with no completion, note or deferral.
    pub fn new(item_id: ItemId) -> Self {
        Self {
            item_id,
            completion: None,
            note: String::new(),
            review_count: 0,
            last_review: None,
            deferred_since: None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred_since.is_some()
    }

    pub fn completed_date(&self) -> Option<NaiveDate> {
        self.completion.map(|c| c.date)
    }

    /// Correctness of the latest completion; `None` if never completed.
    pub fn correct(&self) -> Option<bool> {
        self.completion.map(|c| c.correct)
    }
}
