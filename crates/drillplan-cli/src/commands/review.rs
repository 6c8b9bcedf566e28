//! The `drillplan review` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use super::{print_json, Context};

pub async fn execute(ctx: &Context) -> Result<()> {
    let scheduler = ctx.scheduler().await?;
    let candidates = scheduler.review_list().await?;

    if ctx.json {
        return print_json(&candidates);
    }
    if candidates.is_empty() {
        println!("Nothing to review yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID",
        "Title",
        "Last done",
        "Result",
        "Reviews",
        "Interval",
        "Today",
    ]);
    for c in &candidates {
        let last_done = c
            .record
            .completed_date()
            .map(|d| d.to_string())
            .unwrap_or_default();
        let result = match c.record.correct() {
            Some(true) => "correct",
            Some(false) => "wrong",
            None => "-",
        };
        let interval = c
            .interval
            .map(|days| format!("{days}d"))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(c.item.id),
            Cell::new(&c.item.title),
            Cell::new(last_done),
            Cell::new(result),
            Cell::new(c.record.review_count),
            Cell::new(interval),
            Cell::new(if c.reviewed_today { "yes" } else { "" }),
        ]);
    }
    println!("{table}");
    Ok(())
}
