//! The `drillplan status` command.

use anyhow::Result;
use serde::Serialize;

use drillplan_core::scheduler::CurrentDay;
use drillplan_core::statistics::StatsSnapshot;

use super::{print_json, Context};

#[derive(Serialize)]
struct Status {
    #[serde(flatten)]
    current: CurrentDay,
    total_days: u32,
    stats: StatsSnapshot,
}

pub async fn execute(ctx: &Context) -> Result<()> {
    let scheduler = ctx.scheduler().await?;
    let current = scheduler.current_day().await?;
    let stats = scheduler.statistics().await?;
    let total_days = scheduler.curriculum().day_count();

    if ctx.json {
        return print_json(&Status {
            current,
            total_days,
            stats,
        });
    }

    println!(
        "{}: day {} of {} (started {}, today {})",
        scheduler.curriculum().name,
        current.current_day,
        total_days,
        current.start_date,
        current.today
    );
    println!(
        "Completed {}/{} items ({:.1}%), {} wrong, studied on {} of the last 30 days",
        stats.total_completed,
        stats.total_items,
        stats.completion_rate() * 100.0,
        stats.total_wrong,
        stats.streak_days
    );
    Ok(())
}
