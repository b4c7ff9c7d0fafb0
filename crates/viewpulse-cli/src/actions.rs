//! Commands that change state: dismissal, export files and embed order.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use viewpulse_core::AppConfig;
use viewpulse_db::{EmbedStore, MilestoneStore, SnapshotStore};
use viewpulse_engine::export::export_file_name;
use viewpulse_engine::monitor::ApplyOutcome;
use viewpulse_engine::{
    to_csv, CommitOutcome, ExportRow, FileKeyValueStore, Monitor, MonitorSettings, OptimisticList,
    RangeKey, Reorder,
};

use crate::format::group_digits;

/// Persist a dismissal for `target`, or for the notification currently due.
///
/// # Errors
///
/// Returns an error if the monitor data cannot be loaded or the dismissal
/// file cannot be written.
pub(crate) async fn run_dismiss(
    pool: PgPool,
    config: &AppConfig,
    target: Option<i64>,
) -> anyhow::Result<()> {
    let kv = Arc::new(FileKeyValueStore::new(config.dismissal_path.clone()));
    let mut monitor = Monitor::new(MonitorSettings::from_config(config), kv);

    if let Some(target) = target {
        monitor.dismiss_target(target)?;
        println!("dismissed notifications for {}", group_digits(target));
        return Ok(());
    }

    let now = Utc::now();
    let outcome = monitor
        .poll_once(
            &SnapshotStore::new(pool.clone()),
            &MilestoneStore::new(pool),
            now,
        )
        .await;
    if outcome == ApplyOutcome::Failed {
        anyhow::bail!(
            "could not load monitor data: {}",
            monitor.last_error().unwrap_or("unknown error")
        );
    }

    match monitor.dismiss_current(now)? {
        Some(target) => println!("dismissed notification for {}", group_digits(target)),
        None => println!("no milestone notification to dismiss"),
    }
    Ok(())
}

/// Write the snapshots of `range` to a CSV file.
///
/// # Errors
///
/// Returns an error for ranges not offered for export, a failed query, or an
/// unwritable output path.
pub(crate) async fn run_export(
    pool: &PgPool,
    range: RangeKey,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    if !RangeKey::EXPORT.contains(&range) {
        anyhow::bail!("range '{range}' cannot be exported; expected one of 1h, 24h, 7d");
    }

    let now = Utc::now();
    let rows: Vec<ExportRow> = viewpulse_db::list_snapshots_since(pool, now - range.duration())
        .await?
        .into_iter()
        .map(ExportRow::from)
        .collect();

    let path = out.unwrap_or_else(|| PathBuf::from(export_file_name(range, now)));
    tokio::fs::write(&path, to_csv(&rows))
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Move embed `source` to `target`'s position and print the new order.
///
/// # Errors
///
/// Returns an error if the embeds cannot be loaded or the new order could
/// not be saved.
pub(crate) async fn run_reorder(pool: PgPool, source: Uuid, target: Uuid) -> anyhow::Result<()> {
    let mut list = OptimisticList::new(EmbedStore::new(pool));
    list.load().await?;

    match list.execute(&Reorder { source, target }).await? {
        CommitOutcome::Applied => println!("moved {source}"),
        CommitOutcome::Unchanged => println!("nothing to move; ids are identical or unknown"),
        CommitOutcome::Reverted(err) => {
            anyhow::bail!("new order was not saved ({err}); order reloaded from the database")
        }
    }

    for embed in list.items() {
        println!("{:>4}  {}  {}", embed.sort_order, embed.id, embed.title);
    }
    Ok(())
}
