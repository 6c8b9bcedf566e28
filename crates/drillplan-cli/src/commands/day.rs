//! The `drillplan day` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use drillplan_core::assembler::{DayEntry, DayView};
use drillplan_core::model::Slot;

use super::{print_json, result_label, Context};

pub async fn execute(ctx: &Context, day: Option<u32>) -> Result<()> {
    let scheduler = ctx.scheduler().await?;
    let day = match day {
        Some(day) => day,
        None => scheduler.current_day().await?.current_day,
    };
    let view = scheduler.day_view(day).await?;

    if ctx.json {
        return print_json(&view);
    }
    print_view(&view);
    Ok(())
}

fn print_view(view: &DayView) {
    let mut heading = format!("Day {} ({})", view.day, view.study_date);
    if !view.focus.is_empty() {
        heading.push_str(&format!(": {}", view.focus));
    }
    println!("{heading}");
    if !view.description.is_empty() {
        println!("{}", view.description);
    }

    for slot in Slot::ALL {
        let entries = view.slot(slot);
        if entries.is_empty() {
            continue;
        }
        println!("\n{}", capitalize(&slot.to_string()));
        println!("{}", slot_table(entries));
    }

    let s = &view.summary;
    println!(
        "\n{} item(s): {} done, {} wrong, {} carried over, {} for review, {} deferred",
        s.total, s.completed, s.wrong, s.carried_over, s.review, s.deferred
    );
}

fn slot_table(entries: &[DayEntry]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Difficulty", "Category", "Status", "Note"]);

    for entry in entries {
        let mut title = entry.item.title.clone();
        if entry.from_previous_day {
            title.push_str(" (carried over)");
        }
        if entry.for_review {
            match entry.review_interval {
                Some(days) => title.push_str(&format!(" (review, {days}d)")),
                None => title.push_str(" (review)"),
            }
        }
        table.add_row(vec![
            Cell::new(entry.item.id),
            Cell::new(title),
            Cell::new(entry.item.difficulty),
            Cell::new(&entry.item.category),
            Cell::new(result_label(entry.completed, entry.is_correct)),
            Cell::new(&entry.note),
        ]);
    }
    table
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
