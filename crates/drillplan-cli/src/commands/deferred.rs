//! The `drillplan deferred` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use super::{print_json, result_label, Context};

pub async fn execute(ctx: &Context) -> Result<()> {
    let scheduler = ctx.scheduler().await?;
    let entries = scheduler.deferred_list().await?;

    if ctx.json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No deferred items.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Day", "Deferred since", "Status"]);
    for entry in &entries {
        table.add_row(vec![
            Cell::new(entry.item.id),
            Cell::new(&entry.item.title),
            Cell::new(entry.item.day),
            Cell::new(entry.deferred_since),
            Cell::new(result_label(entry.completed, entry.is_correct)),
        ]);
    }
    println!("{table}");
    Ok(())
}
