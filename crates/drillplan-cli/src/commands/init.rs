//! The `drillplan init` command.

use std::path::Path;

use anyhow::Result;

use drillplan_store::config::CONFIG_FILE;
use drillplan_store::DrillplanConfig;

const THIRTY_DAY_PLAN: &str = include_str!("../../../../curricula/thirty-day.toml");

pub fn execute() -> Result<()> {
    let config = DrillplanConfig::default();

    if Path::new(CONFIG_FILE).exists() {
        println!("{CONFIG_FILE} already exists, skipping.");
    } else {
        let body = format!("# drillplan configuration\n\n{}", config.to_toml()?);
        std::fs::write(CONFIG_FILE, body)?;
        println!("Created {CONFIG_FILE}");
    }

    let plan_path = &config.curriculum;
    if plan_path.exists() {
        println!("{} already exists, skipping.", plan_path.display());
    } else {
        if let Some(parent) = plan_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(plan_path, THIRTY_DAY_PLAN)?;
        println!("Created {}", plan_path.display());
    }

    println!("\nNext steps:");
    println!("  1. Run: drillplan validate");
    println!("  2. Run: drillplan day");
    println!("  3. Run: drillplan done <ID> (add --wrong if you missed it)");

    Ok(())
}
