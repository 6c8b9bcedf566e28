//! The `drillplan start-date` command.

use anyhow::Result;
use chrono::NaiveDate;
use serde_json::json;

use super::{print_json, Context};

pub async fn execute(ctx: &Context, date: Option<NaiveDate>) -> Result<()> {
    let scheduler = ctx.scheduler().await?;
    if let Some(date) = date {
        scheduler.set_start_date(date).await?;
    }
    let current = scheduler.current_day().await?;

    if ctx.json {
        return print_json(&json!({
            "start_date": current.start_date,
            "current_day": current.current_day,
        }));
    }
    println!(
        "Start date: {} (today is day {})",
        current.start_date, current.current_day
    );
    Ok(())
}
