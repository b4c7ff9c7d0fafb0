//! Read-only report commands.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use viewpulse_core::{AppConfig, ClickEvent, Embed, Milestone, Snapshot};
use viewpulse_db::{ClickEventStore, EmbedStore, MilestoneStore, SnapshotStore};
use viewpulse_engine::bucket::{format_delta, hourly};
use viewpulse_engine::clicks::SeriesResolution;
use viewpulse_engine::crossing::current_views;
use viewpulse_engine::{
    analyze, bucket_table, estimate_rate, milestone_progress, threshold_ledger, CanonicalStore,
    ClickEventSource, Metric, MilestoneSource, MilestoneStatus, RangeKey, RangeSelection,
    SnapshotSource, LEDGER_STEP, TABLE_ROWS,
};

use crate::format::{group_digits, optional_count, timestamp};

async fn load_monitor_inputs(
    pool: &PgPool,
    limit: i64,
) -> anyhow::Result<(Vec<Snapshot>, Vec<Milestone>)> {
    let snapshots = SnapshotStore::new(pool.clone());
    let milestones = MilestoneStore::new(pool.clone());
    let inputs = tokio::try_join!(snapshots.list_recent(limit), milestones.list_active())?;
    Ok(inputs)
}

/// Explicit dates win over a preset; with neither, the last seven days.
pub(crate) fn click_selection(
    range: Option<RangeKey>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> RangeSelection {
    if from.is_some() || to.is_some() {
        RangeSelection::Custom {
            since: from,
            until: to,
        }
    } else {
        RangeSelection::Relative(range.unwrap_or(RangeKey::Days7))
    }
}

/// Print active milestones with progress and ETA.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_milestones(pool: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let (snapshots, milestones) = load_monitor_inputs(pool, config.snapshot_limit).await?;
    if milestones.is_empty() {
        println!("no active milestones");
        return Ok(());
    }

    let current = current_views(&snapshots, &milestones);
    let rate = estimate_rate(&snapshots, Metric::Views);
    println!("current views: {} ({rate:.2}/s)", group_digits(current));
    println!();
    println!("{:<28}{:>14}{:>10}  STATUS", "MILESTONE", "TARGET", "PROGRESS");

    for row in milestone_progress(&milestones, &snapshots, current, rate) {
        let status = match row.status {
            MilestoneStatus::Achieved {
                reached_at: Some(at),
            } => format!("reached {}", timestamp(at)),
            MilestoneStatus::Achieved { reached_at: None } => "reached".to_string(),
            MilestoneStatus::Pending { remaining, eta } => {
                format!("{} to go, ETA {eta}", group_digits(remaining))
            }
        };
        println!(
            "{:<28}{:>14}{:>9.1}%  {status}",
            row.milestone.title,
            group_digits(row.milestone.target_count),
            row.percent
        );
    }

    Ok(())
}

/// Print the newest hourly buckets of `range`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_buckets(pool: &PgPool, range: RangeKey) -> anyhow::Result<()> {
    let window = RangeSelection::from(range).resolve(Utc::now());
    let snapshots = SnapshotStore::new(pool.clone())
        .list_since(window.since)
        .await?;

    let rows = bucket_table(&snapshots, &window, hourly(), TABLE_ROWS);
    if rows.is_empty() {
        println!("no snapshots in the last {}", range.label());
        return Ok(());
    }

    println!(
        "{:<22}{:>14}{:>10}{:>12}{:>9}{:>10}{:>9}",
        "HOUR", "VIEWS", "+/-", "LIKES", "+/-", "COMMENTS", "+/-"
    );
    for row in &rows {
        println!(
            "{:<22}{:>14}{:>10}{:>12}{:>9}{:>10}{:>9}",
            timestamp(row.bucket_start),
            optional_count(row.snapshot.views),
            format_delta(row.views_delta),
            optional_count(row.snapshot.likes),
            format_delta(row.likes_delta),
            optional_count(row.snapshot.comments),
            format_delta(row.comments_delta),
        );
    }

    Ok(())
}

/// Print every round threshold reached so far.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_history(pool: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let snapshots = SnapshotStore::new(pool.clone())
        .list_recent(config.snapshot_limit)
        .await?;
    let ledger = threshold_ledger(&snapshots, LEDGER_STEP);
    if ledger.is_empty() {
        println!("no thresholds reached yet");
        return Ok(());
    }

    println!("{:>14}  {:<22}{:>14}  ETA", "THRESHOLD", "REACHED", "VIEWS");
    for row in &ledger {
        println!(
            "{:>14}  {:<22}{:>14}  {}",
            group_digits(row.target),
            timestamp(row.reached_at),
            group_digits(row.reached_views),
            row.eta_text
        );
    }

    Ok(())
}

/// Print click totals, the ranking and the time series for a range.
///
/// # Errors
///
/// Returns an error if the range spans more than 30 days or the database
/// query fails.
pub(crate) async fn run_clicks(pool: &PgPool, selection: RangeSelection) -> anyhow::Result<()> {
    let window = selection.resolve_bounded(Utc::now())?;
    let embeds = EmbedStore::new(pool.clone());
    let clicks = ClickEventStore::new(pool.clone());
    let (items, events): (Vec<Embed>, Vec<ClickEvent>) =
        tokio::try_join!(embeds.reload(), clicks.list_since(window.since))?;
    let items: Vec<Embed> = items.into_iter().filter(|e| e.is_active).collect();

    let analytics = analyze(&items, &events, window);
    let resolution = match analytics.resolution {
        SeriesResolution::Hourly => "hourly",
        SeriesResolution::Daily => "daily",
    };
    println!(
        "{} clicks between {} and {}",
        analytics.total_clicks,
        timestamp(analytics.window.since),
        timestamp(analytics.window.until)
    );
    println!();
    println!("{:<6}{:<40}CLICKS", "RANK", "EMBED");
    for (rank, item) in analytics.ranked.iter().enumerate() {
        println!("{:<6}{:<40}{}", rank + 1, item.title, item.clicks);
    }

    println!();
    println!("{resolution} series");
    for bucket in &analytics.series {
        println!("{:<12}{}", bucket.label, bucket.clicks);
    }

    Ok(())
}
