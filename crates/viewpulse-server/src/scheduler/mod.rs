//! Background job scheduler.
//!
//! Runs the milestone watch: on every cron tick the latest snapshots are
//! checked for a freshly crossed milestone, and each crossing is logged once.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use viewpulse_core::AppConfig;
use viewpulse_engine::crossing::{crossing_window, pending_notification};
use viewpulse_engine::{detect_recent_crossing, Crossing, DismissalState};

use crate::api::load_monitor_inputs;

/// Builds and starts the background job scheduler.
///
/// The returned handle must be kept alive for the lifetime of the process;
/// dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_milestone_watch_job(&scheduler, pool, &config).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_milestone_watch_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: &AppConfig,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);
    let limit = config.snapshot_limit;
    let announced = Arc::new(Mutex::new(DismissalState::default()));

    let job = Job::new_async(config.milestone_watch_cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let announced = Arc::clone(&announced);

        Box::pin(async move {
            run_milestone_watch(&pool, limit, &announced).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %config.milestone_watch_cron, "scheduler: milestone watch registered");
    Ok(())
}

async fn run_milestone_watch(pool: &PgPool, limit: i64, announced: &Mutex<DismissalState>) {
    let (snapshots, milestones) = match load_monitor_inputs(pool, limit).await {
        Ok(inputs) => inputs,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to load snapshots and milestones");
            return;
        }
    };

    let crossing = detect_recent_crossing(&snapshots, &milestones, Utc::now(), crossing_window());
    let mut announced = announced.lock().await;
    match take_new_crossing(crossing, &mut announced) {
        Some(c) => tracing::info!(
            milestone = %c.title,
            target = c.target,
            reached_at = %c.reached_at,
            reached_views = c.reached_views,
            "scheduler: milestone crossed"
        ),
        None => tracing::debug!("scheduler: no new milestone crossing"),
    }
}

/// The crossing to log, if its target has not been logged before.
fn take_new_crossing(crossing: Option<Crossing>, announced: &mut DismissalState) -> Option<Crossing> {
    let crossing = pending_notification(crossing, announced)?;
    announced.insert(crossing.target);
    Some(crossing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn crossing(target: i64) -> Crossing {
        Crossing {
            milestone_id: Uuid::new_v4(),
            title: format!("{target} views"),
            target,
            reached_at: Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap(),
            reached_views: target + 5,
        }
    }

    #[test]
    fn each_target_is_announced_once() {
        let mut announced = DismissalState::default();

        assert!(take_new_crossing(Some(crossing(100)), &mut announced).is_some());
        assert!(take_new_crossing(Some(crossing(100)), &mut announced).is_none());
        assert!(take_new_crossing(Some(crossing(200)), &mut announced).is_some());
        assert_eq!(announced.len(), 2);
    }

    #[test]
    fn nothing_to_announce_without_crossing() {
        let mut announced = DismissalState::default();
        assert!(take_new_crossing(None, &mut announced).is_none());
        assert!(announced.is_empty());
    }
}
