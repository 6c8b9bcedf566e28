//! The `drillplan validate` command.

use std::path::PathBuf;

use anyhow::Result;

use drillplan_core::curriculum::{parse_curriculum, validate_curriculum};

use super::Context;

pub fn execute(ctx: &Context, curriculum_path: Option<PathBuf>) -> Result<()> {
    let path = match curriculum_path {
        Some(path) => path,
        None => ctx.load_config()?.curriculum,
    };
    let curriculum = parse_curriculum(&path)?;

    println!(
        "Curriculum: {} ({} days, {} items)",
        curriculum.name,
        curriculum.day_count(),
        curriculum.item_count()
    );

    let warnings = validate_curriculum(&curriculum);
    for w in &warnings {
        let prefix = w
            .day
            .map(|day| format!("  [day {day}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Curriculum valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
