//! The `drillplan stats` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use super::{print_json, Context};

pub async fn execute(ctx: &Context) -> Result<()> {
    let scheduler = ctx.scheduler().await?;
    let stats = scheduler.statistics().await?;

    if ctx.json {
        return print_json(&stats);
    }

    let mut totals = Table::new();
    totals.set_header(vec!["Items", "Completed", "Correct", "Wrong", "Accuracy", "Study days (30d)"]);
    totals.add_row(vec![
        Cell::new(stats.total_items),
        Cell::new(format!(
            "{} ({:.1}%)",
            stats.total_completed,
            stats.completion_rate() * 100.0
        )),
        Cell::new(stats.total_correct),
        Cell::new(stats.total_wrong),
        Cell::new(format!("{:.1}%", stats.accuracy() * 100.0)),
        Cell::new(stats.streak_days),
    ]);
    println!("{totals}");

    if !stats.by_difficulty.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Difficulty", "Completed"]);
        for (difficulty, count) in &stats.by_difficulty {
            table.add_row(vec![Cell::new(difficulty), Cell::new(count)]);
        }
        println!("\n{table}");
    }

    if !stats.by_category.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Category", "Completed"]);
        for (category, count) in &stats.by_category {
            table.add_row(vec![Cell::new(category), Cell::new(count)]);
        }
        println!("\n{table}");
    }

    if let Some(date) = stats.last_study_date {
        println!("\nLast studied on {date}");
    }
    Ok(())
}
