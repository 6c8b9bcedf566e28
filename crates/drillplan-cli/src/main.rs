//! drillplan CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use drillplan_core::model::ItemId;
use drillplan_core::SchedulerError;

mod commands;

#[derive(Parser)]
#[command(
    name = "drillplan",
    version,
    about = "30-day coding practice planner with spaced review"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true, hide = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and the bundled 30-day curriculum
    Init,

    /// Check a curriculum file for gaps and duplicates
    Validate {
        /// Curriculum file (defaults to the configured one)
        #[arg(long)]
        curriculum: Option<PathBuf>,
    },

    /// Show the current day and overall progress
    Status,

    /// Show the plan for a day (defaults to the current day)
    Day {
        /// Curriculum day number
        day: Option<u32>,
    },

    /// Mark an item as done
    Done {
        /// Item id
        id: ItemId,

        /// Record the attempt as wrong
        #[arg(long)]
        wrong: bool,

        /// Time spent, in seconds
        #[arg(long)]
        elapsed: Option<u32>,

        /// Replace the item's note
        #[arg(long)]
        note: Option<String>,
    },

    /// Forget all progress on an item
    Undo {
        /// Item id
        id: ItemId,
    },

    /// Take an item out of the daily plan
    Defer {
        /// Item id
        id: ItemId,
    },

    /// Put a deferred item back into the plan
    Undefer {
        /// Item id
        id: ItemId,
    },

    /// Show or replace an item's note
    Note {
        /// Item id
        id: ItemId,

        /// New note text; omit to print the current note
        text: Option<String>,
    },

    /// List deferred items
    Deferred,

    /// List items due for review today
    Review,

    /// Show progress statistics
    Stats,

    /// Show or set the date day 1 began
    StartDate {
        /// New start date (YYYY-MM-DD)
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("drillplan=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = commands::Context {
        config_path: cli.config,
        json: cli.json,
        today: cli.today,
    };

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { curriculum } => commands::validate::execute(&ctx, curriculum),
        Commands::Status => commands::status::execute(&ctx).await,
        Commands::Day { day } => commands::day::execute(&ctx, day).await,
        Commands::Done {
            id,
            wrong,
            elapsed,
            note,
        } => commands::progress::done(&ctx, id, !wrong, elapsed, note).await,
        Commands::Undo { id } => commands::progress::undo(&ctx, id).await,
        Commands::Defer { id } => commands::progress::set_deferred(&ctx, id, true).await,
        Commands::Undefer { id } => commands::progress::set_deferred(&ctx, id, false).await,
        Commands::Note { id, text } => commands::progress::note(&ctx, id, text).await,
        Commands::Deferred => commands::deferred::execute(&ctx).await,
        Commands::Review => commands::review::execute(&ctx).await,
        Commands::Stats => commands::stats::execute(&ctx).await,
        Commands::StartDate { date } => commands::start_date::execute(&ctx, date).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        if e.downcast_ref::<SchedulerError>()
            .is_some_and(SchedulerError::is_retryable)
        {
            eprintln!("The progress store is busy; try again.");
        }
        process::exit(1);
    }
}
