//! `watch`: live terminal monitor driven by the engine's scheduler.

use std::io::Write;
use std::sync::Arc;

use sqlx::PgPool;
use viewpulse_core::AppConfig;
use viewpulse_db::{MilestoneStore, SnapshotStore};
use viewpulse_engine::monitor::ApplyOutcome;
use viewpulse_engine::{
    Driver, FileKeyValueStore, Monitor, MonitorObserver, MonitorSettings, MonitorView, RangeKey,
    Scheduler, SystemClock,
};

use crate::format::{notification_line, status_line};

/// Redraws the status line in place and prints each new notification once.
#[derive(Debug, Default)]
struct TerminalObserver {
    announced: Option<i64>,
    last_line: String,
}

impl MonitorObserver for TerminalObserver {
    fn on_view(&mut self, view: &MonitorView) {
        if let Some(crossing) = &view.notification {
            if self.announced != Some(crossing.target) {
                self.announced = Some(crossing.target);
                println!();
                println!("{}", notification_line(crossing, &view.watch_url));
                println!("run `viewpulse-cli dismiss` to stop showing it");
            }
        }

        let line = status_line(view);
        if line == self.last_line {
            return;
        }
        let width = self.last_line.chars().count();
        print!("\r{line:<width$}");
        if let Err(e) = std::io::stdout().flush() {
            tracing::debug!(error = %e, "stdout flush failed");
        }
        self.last_line = line;
    }

    fn on_poll(&mut self, outcome: ApplyOutcome) {
        tracing::debug!(?outcome, "poll handled");
    }
}

/// Run the live monitor until ctrl-c.
///
/// Poll failures are shown on the status line and retried on the next poll.
#[allow(clippy::unnecessary_wraps)]
pub(crate) async fn run_watch(
    pool: PgPool,
    config: &AppConfig,
    range: RangeKey,
) -> anyhow::Result<()> {
    let kv = Arc::new(FileKeyValueStore::new(config.dismissal_path.clone()));
    let mut monitor = Monitor::new(MonitorSettings::from_config(config), kv);
    monitor.set_range(range.into());

    let driver = Driver::new(
        monitor,
        Arc::new(SnapshotStore::new(pool.clone())),
        Arc::new(MilestoneStore::new(pool)),
        SystemClock,
        Scheduler::from_config(config),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                if shutdown_tx.send(true).is_err() {
                    tracing::debug!("monitor already stopped");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        }
    });

    let mut observer = TerminalObserver::default();
    let monitor = driver.run(&mut observer, shutdown_rx).await;

    println!();
    if let Some(err) = monitor.last_error() {
        println!("last poll failed: {err}");
    }
    println!(
        "stopped after {} snapshots, {} dismissed notifications",
        monitor.snapshots().len(),
        monitor.dismissed().len()
    );
    Ok(())
}
