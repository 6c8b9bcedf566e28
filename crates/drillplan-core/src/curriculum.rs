//! Curriculum table loading and validation.
//!
//! The curriculum maps each day number to its items, grouped by time-slot.
//! It is loaded once from TOML and never mutated afterwards.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Difficulty, Item, ItemId, Slot};

/// Intermediate TOML structure for parsing curriculum files.
#[derive(Debug, Deserialize)]
struct TomlCurriculumFile {
    curriculum: TomlCurriculumHeader,
    #[serde(default)]
    days: Vec<TomlDay>,
}

#[derive(Debug, Deserialize)]
struct TomlCurriculumHeader {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlDay {
    day: u32,
    #[serde(default)]
    description: String,
    #[serde(default)]
    focus: String,
    #[serde(default)]
    morning: Vec<TomlItem>,
    #[serde(default)]
    afternoon: Vec<TomlItem>,
    #[serde(default)]
    evening: Vec<TomlItem>,
}

#[derive(Debug, Deserialize)]
struct TomlItem {
    id: u32,
    title: String,
    #[serde(default = "default_difficulty")]
    difficulty: String,
    #[serde(default)]
    category: Option<String>,
}

fn default_difficulty() -> String {
    "medium".to_string()
}

/// One day of the plan.
#[derive(Debug, Clone)]
pub struct DayPlan {
    pub day: u32,
    pub description: String,
    pub focus: String,
    /// Items placed on this day, morning first, in listing order.
    pub items: Vec<ItemId>,
}

/// A later placement of an item that already belongs to an earlier day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatedPlacement {
    pub id: ItemId,
    /// Day the item keeps.
    pub kept_day: u32,
    /// Day whose listing was skipped.
    pub skipped_day: u32,
}

/// The immutable curriculum table.
#[derive(Debug, Clone)]
pub struct Curriculum {
    pub name: String,
    pub description: String,
    days: BTreeMap<u32, DayPlan>,
    items: HashMap<ItemId, Item>,
    repeats: Vec<RepeatedPlacement>,
}

impl Curriculum {
    /// Number of days in the plan (the highest day number listed).
    pub fn day_count(&self) -> u32 {
        self.days.keys().next_back().copied().unwrap_or(0)
    }

    /// Whether `day` is a valid day number for this plan.
    pub fn contains_day(&self, day: u32) -> bool {
        (1..=self.day_count()).contains(&day)
    }

    pub fn day(&self, day: u32) -> Option<&DayPlan> {
        self.days.get(&day)
    }

    pub fn days(&self) -> impl Iterator<Item = &DayPlan> {
        self.days.values()
    }

    /// Items of `day` in slot order; empty for unknown days.
    pub fn items_for_day(&self, day: u32) -> Vec<&Item> {
        self.days
            .get(&day)
            .map(|plan| plan.items.iter().filter_map(|id| self.items.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Placements skipped because the item already appeared on an earlier day.
    pub fn repeats(&self) -> &[RepeatedPlacement] {
        &self.repeats
    }
}

/// Parse a curriculum TOML file.
pub fn parse_curriculum(path: &Path) -> Result<Curriculum> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read curriculum file: {}", path.display()))?;

    parse_curriculum_str(&content, path)
}

/// Parse a curriculum from a TOML string (useful for testing).
pub fn parse_curriculum_str(content: &str, source_path: &Path) -> Result<Curriculum> {
    let parsed: TomlCurriculumFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let mut toml_days = parsed.days;
    toml_days.sort_by_key(|d| d.day);

    let mut days = BTreeMap::new();
    let mut items: HashMap<ItemId, Item> = HashMap::new();
    let mut repeats = Vec::new();

    for toml_day in toml_days {
        anyhow::ensure!(toml_day.day >= 1, "day numbers start at 1");
        anyhow::ensure!(
            !days.contains_key(&toml_day.day),
            "day {} is listed more than once",
            toml_day.day
        );

        let fallback_category = if toml_day.focus.is_empty() {
            "Other".to_string()
        } else {
            toml_day.focus.clone()
        };

        let mut placed = Vec::new();
        let slots = [
            (Slot::Morning, toml_day.morning),
            (Slot::Afternoon, toml_day.afternoon),
            (Slot::Evening, toml_day.evening),
        ];
        for (slot, entries) in slots {
            for entry in entries {
                let id = ItemId(entry.id);
                if let Some(existing) = items.get(&id) {
                    tracing::debug!(
                        "item {id} already placed on day {}, skipping day {}",
                        existing.day,
                        toml_day.day
                    );
                    repeats.push(RepeatedPlacement {
                        id,
                        kept_day: existing.day,
                        skipped_day: toml_day.day,
                    });
                    continue;
                }

                let difficulty: Difficulty = entry
                    .difficulty
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!("item {id}: {e}"))?;

                items.insert(
                    id,
                    Item {
                        id,
                        title: entry.title,
                        difficulty,
                        category: entry
                            .category
                            .unwrap_or_else(|| fallback_category.clone()),
                        day: toml_day.day,
                        slot,
                    },
                );
                placed.push(id);
            }
        }

        days.insert(
            toml_day.day,
            DayPlan {
                day: toml_day.day,
                description: toml_day.description,
                focus: toml_day.focus,
                items: placed,
            },
        );
    }

    Ok(Curriculum {
        name: parsed.curriculum.name,
        description: parsed.curriculum.description,
        days,
        items,
        repeats,
    })
}

/// A warning from curriculum validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The day number (if applicable).
    pub day: Option<u32>,
    /// Warning message.
    pub message: String,
}

/// Validate a curriculum for common issues.
pub fn validate_curriculum(curriculum: &Curriculum) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if curriculum.day_count() == 0 {
        warnings.push(ValidationWarning {
            day: None,
            message: "curriculum has no days".into(),
        });
        return warnings;
    }

    // Gaps in the day sequence
    for day in 1..=curriculum.day_count() {
        if curriculum.day(day).is_none() {
            warnings.push(ValidationWarning {
                day: Some(day),
                message: format!("day {day} is missing"),
            });
        }
    }

    for plan in curriculum.days() {
        if plan.items.is_empty() {
            warnings.push(ValidationWarning {
                day: Some(plan.day),
                message: "no items of its own (only carry-over and review)".into(),
            });
        }
    }

    let mut reported = HashSet::new();
    for repeat in curriculum.repeats() {
        if reported.insert((repeat.id, repeat.skipped_day)) {
            warnings.push(ValidationWarning {
                day: Some(repeat.skipped_day),
                message: format!(
                    "item {} is already scheduled on day {} and is skipped here",
                    repeat.id, repeat.kept_day
                ),
            });
        }
    }

    let mut blank: Vec<&Item> = curriculum
        .items()
        .filter(|i| i.title.trim().is_empty())
        .collect();
    blank.sort_by_key(|i| i.id);
    for item in blank {
        warnings.push(ValidationWarning {
            day: Some(item.day),
            message: format!("item {} has an empty title", item.id),
        });
    }

    warnings
}
