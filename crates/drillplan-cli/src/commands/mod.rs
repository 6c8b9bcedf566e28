pub mod day;
pub mod deferred;
pub mod init;
pub mod progress;
pub mod review;
pub mod start_date;
pub mod stats;
pub mod status;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use serde::Serialize;

use drillplan_core::curriculum::{parse_curriculum, Curriculum};
use drillplan_core::traits::{Clock, FixedClock, SystemClock};
use drillplan_core::Scheduler;
use drillplan_store::{create_store, load_config_from, DrillplanConfig};

/// Global options shared by every subcommand.
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub json: bool,
    pub today: Option<NaiveDate>,
}

impl Context {
    pub fn load_config(&self) -> Result<DrillplanConfig> {
        load_config_from(self.config_path.as_deref())
    }

    fn clock(&self) -> Arc<dyn Clock> {
        match self.today {
            Some(date) => Arc::new(FixedClock::new(date)),
            None => Arc::new(SystemClock),
        }
    }

    /// Load config and curriculum, open the store and build a scheduler.
    pub async fn scheduler(&self) -> Result<Scheduler> {
        let config = self.load_config()?;
        let curriculum = load_curriculum(&config)?;
        let store = create_store(&config).await?;
        tracing::debug!(
            "using {} store with curriculum '{}'",
            store.name(),
            curriculum.name
        );
        Ok(Scheduler::new(
            Arc::new(curriculum),
            store,
            self.clock(),
            config.scheduler_config(),
        ))
    }
}

pub fn load_curriculum(config: &DrillplanConfig) -> Result<Curriculum> {
    parse_curriculum(&config.curriculum)
        .context("cannot load curriculum (run `drillplan init` or set DRILLPLAN_CURRICULUM)")
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Short status label for tables.
pub fn result_label(completed: bool, correct: Option<bool>) -> &'static str {
    match (completed, correct) {
        (true, Some(false)) => "wrong",
        (true, _) => "done",
        (false, _) => "-",
    }
}
