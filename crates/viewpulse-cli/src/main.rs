mod actions;
mod format;
mod report;
mod watch;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use viewpulse_engine::RangeKey;

#[derive(Debug, Parser)]
#[command(name = "viewpulse-cli")]
#[command(about = "Live view counter, milestone tracker and snapshot reports")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Follow the counters live until interrupted
    Watch {
        /// Range used for the latest-change deltas
        #[arg(long, default_value = "1d")]
        range: RangeKey,
    },
    /// Dismiss the current milestone notification
    Dismiss {
        /// Dismiss this target instead of the one currently shown
        #[arg(long)]
        target: Option<i64>,
    },
    /// Show active milestones with progress and ETA
    Milestones,
    /// Show the hourly snapshot table
    Buckets {
        #[arg(long, default_value = "1d")]
        range: RangeKey,
    },
    /// Show every 100K threshold already reached
    History,
    /// Write snapshots of a range to a CSV file
    Export {
        /// One of 1h, 24h, 7d
        #[arg(long, default_value = "24h")]
        range: RangeKey,
        /// Output path; defaults to monitoring-<range>-<date>.csv
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show embed click counts for a range
    Clicks {
        #[arg(long, conflicts_with_all = ["from", "to"])]
        range: Option<RangeKey>,
        /// Start of a custom range (RFC 3339)
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// End of a custom range (RFC 3339)
        #[arg(long)]
        to: Option<DateTime<Utc>>,
    },
    /// Move embed `source` to the position of embed `target`
    Reorder { source: Uuid, target: Uuid },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("no command given; run `viewpulse-cli --help` for usage");
        return Ok(());
    };

    let config = viewpulse_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool = viewpulse_db::connect_from_config(&config).await?;

    match command {
        Commands::Watch { range } => watch::run_watch(pool, &config, range).await,
        Commands::Dismiss { target } => actions::run_dismiss(pool, &config, target).await,
        Commands::Milestones => report::run_milestones(&pool, &config).await,
        Commands::Buckets { range } => report::run_buckets(&pool, range).await,
        Commands::History => report::run_history(&pool, &config).await,
        Commands::Export { range, out } => actions::run_export(&pool, range, out).await,
        Commands::Clicks { range, from, to } => {
            report::run_clicks(&pool, report::click_selection(range, from, to)).await
        }
        Commands::Reorder { source, target } => actions::run_reorder(pool, source, target).await,
    }
}
