//! Live monitor state: the latest poll results plus everything derived from
//! them for display.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use viewpulse_core::{AppConfig, Milestone, Snapshot};

use crate::bucket::{latest_change, LatestChange};
use crate::chart::{build_chart, ChartConfig, ChartModel};
use crate::crossing::{
    crossing_window, current_views, detect_recent_crossing, next_milestone, pending_notification,
    progress_percent, Crossing,
};
use crate::dismissal::{DismissalState, KeyValueStore};
use crate::error::{KvError, SourceError};
use crate::eta::{project_eta, Eta};
use crate::live::LiveCounter;
use crate::range::{RangeKey, RangeSelection, RangeWindow};
use crate::rate::{estimate_rate, instantaneous_rate, Metric};
use crate::source::{MilestoneSource, SnapshotSource};

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub snapshot_limit: i64,
    pub chart: ChartConfig,
    pub crossing_window: Duration,
    pub range: RangeSelection,
    pub watch_url: String,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            snapshot_limit: 6_000,
            chart: ChartConfig::default(),
            crossing_window: crossing_window(),
            range: RangeSelection::Relative(RangeKey::Day1),
            watch_url: viewpulse_core::DEFAULT_WATCH_URL.to_string(),
        }
    }
}

impl MonitorSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            snapshot_limit: config.snapshot_limit,
            watch_url: config.watch_now_url(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextMilestone {
    pub milestone: Milestone,
    pub badge: String,
    pub remaining: i64,
    pub percent: f64,
    pub eta: Eta,
    pub eta_text: String,
}

/// Everything the dashboard shows at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorView {
    pub generated_at: DateTime<Utc>,
    pub range: RangeWindow,
    pub current_views: i64,
    pub display_views: i64,
    pub likes: Option<i64>,
    pub comments: Option<i64>,
    pub last_captured_at: Option<DateTime<Utc>>,
    pub latest_change: Option<LatestChange>,
    pub rate_per_second: f64,
    pub next_milestone: Option<NextMilestone>,
    pub notification: Option<Crossing>,
    pub chart: Option<ChartModel>,
    pub last_error: Option<String>,
    pub watch_url: String,
}

/// Derive the full view from raw inputs. `live` overrides the display
/// counter; without it the display equals the current views.
#[must_use]
pub fn summarize(
    snapshots: &[Snapshot],
    milestones: &[Milestone],
    dismissed: &DismissalState,
    settings: &MonitorSettings,
    live: Option<&LiveCounter>,
    now: DateTime<Utc>,
) -> MonitorView {
    let latest = snapshots.last();
    let current = current_views(snapshots, milestones);
    let rate = estimate_rate(snapshots, Metric::Views);
    let range = settings.range.resolve(now);

    let next = next_milestone(milestones, current).map(|m| {
        let remaining = m.target_count - current;
        let eta = project_eta(remaining, rate);
        NextMilestone {
            badge: m.badge(),
            percent: progress_percent(current, m.target_count),
            eta_text: eta.to_string(),
            milestone: m.clone(),
            remaining,
            eta,
        }
    });

    let crossing = detect_recent_crossing(snapshots, milestones, now, settings.crossing_window);

    MonitorView {
        generated_at: now,
        range,
        current_views: current,
        display_views: live.map_or(current, |counter| counter.value_at(now)),
        likes: latest.and_then(|s| s.likes),
        comments: latest.and_then(|s| s.comments),
        last_captured_at: latest.map(|s| s.captured_at),
        latest_change: latest_change(snapshots, &range),
        rate_per_second: rate,
        next_milestone: next,
        notification: pending_notification(crossing, dismissed),
        chart: build_chart(snapshots, now, &settings.chart),
        last_error: None,
        watch_url: settings.watch_url.clone(),
    }
}

/// Identifies one poll; later polls carry larger tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PollTicket(u64);

impl PollTicket {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Raw results of one poll. Each half may fail independently.
#[derive(Debug)]
pub struct PollBatch {
    pub snapshots: Result<Vec<Snapshot>, SourceError>,
    pub milestones: Result<Vec<Milestone>, SourceError>,
}

/// Fetch snapshots and milestones concurrently.
pub async fn fetch_batch<S, M>(snapshots: &S, milestones: &M, limit: i64) -> PollBatch
where
    S: SnapshotSource + Sync,
    M: MilestoneSource + Sync,
{
    let (snapshots, milestones) =
        tokio::join!(snapshots.list_recent(limit), milestones.list_active());
    PollBatch {
        snapshots,
        milestones,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// One half failed; the other was applied.
    Partial,
    Failed,
    /// A newer poll had already been applied.
    Stale,
}

pub struct Monitor {
    settings: MonitorSettings,
    kv: Arc<dyn KeyValueStore>,
    dismissed: DismissalState,
    snapshots: Vec<Snapshot>,
    milestones: Vec<Milestone>,
    issued: u64,
    applied: Option<PollTicket>,
    last_error: Option<String>,
    live: Option<LiveCounter>,
}

impl Monitor {
    /// Create a monitor, reading dismissal state from `kv` once.
    pub fn new(settings: MonitorSettings, kv: Arc<dyn KeyValueStore>) -> Self {
        let dismissed = DismissalState::read_from(kv.as_ref());
        tracing::debug!(dismissed = dismissed.len(), "loaded dismissal state");
        Self {
            settings,
            kv,
            dismissed,
            snapshots: Vec::new(),
            milestones: Vec::new(),
            issued: 0,
            applied: None,
            last_error: None,
            live: None,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn set_range(&mut self, range: RangeSelection) {
        self.settings.range = range;
    }

    #[must_use]
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    #[must_use]
    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    #[must_use]
    pub fn dismissed(&self) -> &DismissalState {
        &self.dismissed
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Reserve a ticket for a poll about to start.
    pub fn begin_poll(&mut self) -> PollTicket {
        self.issued += 1;
        PollTicket(self.issued)
    }

    /// Apply a finished poll unless a newer one has already landed.
    ///
    /// Failures are recorded in `last_error` and leave the previous data in
    /// place.
    pub fn apply_poll(&mut self, ticket: PollTicket, batch: PollBatch, now: DateTime<Utc>) -> ApplyOutcome {
        if self.applied.is_some_and(|applied| applied >= ticket) {
            tracing::debug!(ticket = ticket.value(), "discarding stale poll response");
            return ApplyOutcome::Stale;
        }
        self.applied = Some(ticket);

        let mut errors = Vec::new();
        let mut applied_any = false;

        match batch.snapshots {
            Ok(snapshots) => {
                self.snapshots = snapshots;
                applied_any = true;
            }
            Err(e) => {
                tracing::warn!(error = %e, ticket = ticket.value(), "snapshot poll failed");
                errors.push(format!("snapshots: {e}"));
            }
        }

        match batch.milestones {
            Ok(milestones) => {
                self.milestones = milestones;
                applied_any = true;
            }
            Err(e) => {
                tracing::warn!(error = %e, ticket = ticket.value(), "milestone poll failed");
                errors.push(format!("milestones: {e}"));
            }
        }

        self.retarget_live(now);

        if errors.is_empty() {
            self.last_error = None;
            ApplyOutcome::Applied
        } else {
            self.last_error = Some(errors.join("; "));
            if applied_any {
                ApplyOutcome::Partial
            } else {
                ApplyOutcome::Failed
            }
        }
    }

    fn retarget_live(&mut self, now: DateTime<Utc>) {
        let base = current_views(&self.snapshots, &self.milestones);
        let rate = instantaneous_rate(&self.snapshots, Metric::Views);
        match self.live.as_mut() {
            Some(counter) => {
                counter.retarget(base, rate, now);
            }
            None => self.live = Some(LiveCounter::new(base, rate, now)),
        }
    }

    /// Fetch and apply one poll in place.
    pub async fn poll_once<S, M>(&mut self, snapshots: &S, milestones: &M, now: DateTime<Utc>) -> ApplyOutcome
    where
        S: SnapshotSource + Sync,
        M: MilestoneSource + Sync,
    {
        let ticket = self.begin_poll();
        let batch = fetch_batch(snapshots, milestones, self.settings.snapshot_limit).await;
        self.apply_poll(ticket, batch, now)
    }

    #[must_use]
    pub fn view(&self, now: DateTime<Utc>) -> MonitorView {
        let mut view = summarize(
            &self.snapshots,
            &self.milestones,
            &self.dismissed,
            &self.settings,
            self.live.as_ref(),
            now,
        );
        view.last_error.clone_from(&self.last_error);
        view
    }

    /// Dismiss the notification currently shown, if any, and persist.
    ///
    /// Returns the dismissed target.
    ///
    /// # Errors
    ///
    /// Returns [`KvError`] if the state cannot be written; the in-memory state
    /// keeps the dismissal either way.
    pub fn dismiss_current(&mut self, now: DateTime<Utc>) -> Result<Option<i64>, KvError> {
        let crossing = detect_recent_crossing(
            &self.snapshots,
            &self.milestones,
            now,
            self.settings.crossing_window,
        );
        let Some(shown) = pending_notification(crossing, &self.dismissed) else {
            return Ok(None);
        };
        self.dismiss_target(shown.target)?;
        Ok(Some(shown.target))
    }

    /// Add `target` to the dismissal set and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`KvError`] if the state cannot be written.
    pub fn dismiss_target(&mut self, target: i64) -> Result<(), KvError> {
        if self.dismissed.insert(target) {
            tracing::info!(target, "dismissed milestone notification");
        }
        self.dismissed.write_to(self.kv.as_ref())
    }
}
