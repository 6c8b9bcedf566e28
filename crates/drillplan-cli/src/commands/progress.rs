//! Commands that change progress: `done`, `undo`, `defer`, `undefer`, `note`.

use anyhow::Result;
use serde_json::json;

use drillplan_core::model::ItemId;
use drillplan_core::Scheduler;

use super::{print_json, Context};

fn title(scheduler: &Scheduler, id: ItemId) -> String {
    scheduler
        .curriculum()
        .item(id)
        .map(|item| item.title.clone())
        .unwrap_or_default()
}

pub async fn done(
    ctx: &Context,
    id: ItemId,
    correct: bool,
    elapsed: Option<u32>,
    note: Option<String>,
) -> Result<()> {
    let scheduler = ctx.scheduler().await?;
    let record = scheduler
        .apply_progress(id, Some(correct), elapsed, note)
        .await?;

    if ctx.json {
        return print_json(&record);
    }
    let verdict = if correct { "correct" } else { "wrong" };
    print!("Marked #{id} {} as {verdict}", title(&scheduler, id));
    match record.map(|r| r.review_count) {
        Some(n) if n > 0 => println!(" (review {n})"),
        _ => println!(),
    }
    Ok(())
}

pub async fn undo(ctx: &Context, id: ItemId) -> Result<()> {
    let scheduler = ctx.scheduler().await?;
    scheduler.apply_progress(id, None, None, None).await?;

    if ctx.json {
        return print_json(&json!({ "item_id": id, "status": "untouched" }));
    }
    println!("Cleared all progress on #{id} {}", title(&scheduler, id));
    Ok(())
}

pub async fn set_deferred(ctx: &Context, id: ItemId, deferred: bool) -> Result<()> {
    let scheduler = ctx.scheduler().await?;
    let record = scheduler.set_deferred(id, deferred).await?;

    if ctx.json {
        return print_json(&record);
    }
    let action = if deferred { "Deferred" } else { "Restored" };
    println!("{action} #{id} {}", title(&scheduler, id));
    Ok(())
}

pub async fn note(ctx: &Context, id: ItemId, text: Option<String>) -> Result<()> {
    let scheduler = ctx.scheduler().await?;

    let note = match text {
        Some(text) => {
            scheduler.set_note(id, text.clone()).await?;
            text
        }
        None => scheduler.note(id).await?,
    };

    if ctx.json {
        return print_json(&json!({ "item_id": id, "note": note }));
    }
    if note.is_empty() {
        println!("No note for #{id} {}", title(&scheduler, id));
    } else {
        println!("{note}");
    }
    Ok(())
}
