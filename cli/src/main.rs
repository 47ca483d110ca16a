mod commands;
mod config;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    Tracker, cmd_dashboard, cmd_export, cmd_goal_clear, cmd_goal_set, cmd_goal_show, cmd_import,
    cmd_meal_delete, cmd_meal_list, cmd_meal_log, cmd_meal_show, cmd_stats, cmd_tip,
    cmd_weight_delete, cmd_weight_export, cmd_weight_history, cmd_weight_import, cmd_weight_log,
    cmd_weight_show, parse_timestamp,
};
use crate::config::Config;
use heft_core::clock::FixedClock;
use heft_core::db::Database;

const LOG_ENV: &str = "HEFT_LOG";

#[derive(Parser)]
#[command(
    name = "heft",
    version,
    about = "A simple weight and meal tracker CLI",
    long_about = "Track body weight and meal photos, see progress toward a goal weight, \
                  and get a tip based on recent trends."
)]
struct Cli {
    /// Pin "now" to an RFC 3339 timestamp or YYYY-MM-DD (for scripting)
    #[arg(long, global = true, value_name = "TIMESTAMP")]
    now: Option<String>,
    /// Weekly loss rate in lbs used for goal projections (overrides config)
    #[arg(long, global = true, value_name = "LBS")]
    weekly_rate: Option<f64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track body weight
    Weight {
        #[command(subcommand)]
        command: WeightCommands,
    },
    /// Log meal photos with calorie estimates
    Meal {
        #[command(subcommand)]
        command: MealCommands,
    },
    /// Manage the goal weight
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// Show progress statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a tip based on recent weight trends
    Tip {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show progress, goal projection and a tip together
    Dashboard {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export all data as a JSON snapshot
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output a JSON summary when writing to a file
        #[arg(long)]
        json: bool,
    },
    /// Import a JSON snapshot produced by `heft export`
    Import {
        /// Path to the snapshot file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WeightCommands {
    /// Log a weight entry in lbs
    Log {
        /// Weight in lbs
        value: f64,
        /// Date (YYYY-MM-DD, RFC 3339, or today/yesterday/tomorrow; default: now)
        #[arg(long)]
        date: Option<String>,
        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show weight history, newest first
    History {
        /// Maximum number of entries to show (default: all)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single weight entry by ID
    Show {
        /// Weight entry ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a weight entry by ID
    Delete {
        /// Weight entry ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import weights from a CSV file (Date,Weight[,Notes][,Source])
    Import {
        /// Path to the CSV file
        file: PathBuf,
        /// Preview import without making changes
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export weight history as CSV
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MealCommands {
    /// Log a meal photo
    Log {
        /// Photo path or URL
        photo: String,
        /// Known calorie count (skips the estimate)
        #[arg(short, long)]
        calories: Option<u32>,
        /// Date (YYYY-MM-DD, RFC 3339, or today/yesterday/tomorrow; default: now)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List meals, newest first
    List {
        /// Maximum number of meals to show (default: all)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single meal by ID
    Show {
        /// Meal ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a meal by ID
    Delete {
        /// Meal ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Set the goal weight in lbs (replaces any existing goal)
    Set {
        /// Target weight in lbs
        target: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the goal with progress and projected date
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear the goal
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?.with_weekly_rate(cli.weekly_rate)?;
    let now = match cli.now.as_deref() {
        Some(s) => parse_timestamp(s)?,
        None => Utc::now(),
    };
    let db = Database::open(&config.db_path)?;
    let svc: Tracker = Tracker::with_parts(db, FixedClock(now)).with_policy(config.policy);

    match cli.command {
        Commands::Weight { command } => match command {
            WeightCommands::Log {
                value,
                date,
                notes,
                json,
            } => cmd_weight_log(&svc, value, date.as_deref(), notes, json),
            WeightCommands::History { limit, json } => cmd_weight_history(&svc, limit, json),
            WeightCommands::Show { id, json } => cmd_weight_show(&svc, id, json),
            WeightCommands::Delete { id, json } => cmd_weight_delete(&svc, id, json),
            WeightCommands::Import {
                file,
                dry_run,
                json,
            } => cmd_weight_import(&svc, &file, dry_run, json),
            WeightCommands::Export { output, json } => {
                cmd_weight_export(&svc, output.as_deref(), json)
            }
        },
        Commands::Meal { command } => match command {
            MealCommands::Log {
                photo,
                calories,
                date,
                json,
            } => cmd_meal_log(&svc, &photo, calories, date.as_deref(), json),
            MealCommands::List { limit, json } => cmd_meal_list(&svc, limit, json),
            MealCommands::Show { id, json } => cmd_meal_show(&svc, id, json),
            MealCommands::Delete { id, json } => cmd_meal_delete(&svc, id, json),
        },
        Commands::Goal { command } => match command {
            GoalCommands::Set { target, json } => cmd_goal_set(&svc, target, json),
            GoalCommands::Show { json } => cmd_goal_show(&svc, json),
            GoalCommands::Clear { json } => cmd_goal_clear(&svc, json),
        },
        Commands::Stats { json } => cmd_stats(&svc, json),
        Commands::Tip { json } => cmd_tip(&svc, config.tip_fallback().as_mut(), json),
        Commands::Dashboard { json } => cmd_dashboard(&svc, config.tip_fallback().as_mut(), json),
        Commands::Export { output, json } => cmd_export(&svc, output.as_deref(), json),
        Commands::Import { file, json } => cmd_import(&svc, &file, json),
    }
}
