//! Milestone progress and recent-crossing detection.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;
use viewpulse_core::{Milestone, Snapshot};

use crate::dismissal::DismissalState;
use crate::eta::{project_eta, Eta};

/// How far back a crossing still counts as "just happened".
#[must_use]
pub fn crossing_window() -> Duration {
    Duration::hours(1)
}

/// A milestone target passed between two consecutive snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crossing {
    pub milestone_id: Uuid,
    pub title: String,
    pub target: i64,
    pub reached_at: DateTime<Utc>,
    pub reached_views: i64,
}

/// Highest active target crossed by a pair whose later snapshot is at or
/// after `now - window`.
///
/// A pair `(prev, curr)` crosses `target` when
/// `prev.views < target <= curr.views`. Among equal targets the first
/// crossing found is kept.
#[must_use]
pub fn detect_recent_crossing(
    snapshots: &[Snapshot],
    milestones: &[Milestone],
    now: DateTime<Utc>,
    window: Duration,
) -> Option<Crossing> {
    let cutoff = now - window;
    let mut best: Option<Crossing> = None;

    for pair in snapshots.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.captured_at < cutoff {
            continue;
        }
        let (before, after) = (prev.views_or_zero(), curr.views_or_zero());

        for milestone in milestones.iter().filter(|m| m.is_active) {
            let target = milestone.target_count;
            if !(before < target && target <= after) {
                continue;
            }
            if best.as_ref().is_some_and(|b| b.target >= target) {
                continue;
            }
            best = Some(Crossing {
                milestone_id: milestone.id,
                title: milestone.title.clone(),
                target,
                reached_at: curr.captured_at,
                reached_views: after,
            });
        }
    }

    best
}

/// The crossing to announce, unless its target was already dismissed.
#[must_use]
pub fn pending_notification(
    crossing: Option<Crossing>,
    dismissed: &DismissalState,
) -> Option<Crossing> {
    crossing.filter(|c| !dismissed.contains(c.target))
}

/// Highest `current_count` across active milestones.
#[must_use]
pub fn fallback_views(milestones: &[Milestone]) -> Option<i64> {
    milestones
        .iter()
        .filter(|m| m.is_active)
        .map(|m| m.current_count)
        .max()
}

/// Latest snapshot views, else the milestone fallback, else `0`.
#[must_use]
pub fn current_views(snapshots: &[Snapshot], milestones: &[Milestone]) -> i64 {
    snapshots
        .last()
        .map(Snapshot::views_or_zero)
        .or_else(|| fallback_views(milestones))
        .unwrap_or(0)
}

/// First active milestone, in the given order, still above `current`.
#[must_use]
pub fn next_milestone(milestones: &[Milestone], current: i64) -> Option<&Milestone> {
    milestones
        .iter()
        .find(|m| m.is_active && m.target_count > current)
}

/// `current / max(1, target)` as a percentage clamped to `[0, 100]`.
#[must_use]
pub fn progress_percent(current: i64, target: i64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let ratio = current as f64 / target.max(1) as f64;
    (ratio * 100.0).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MilestoneStatus {
    /// `reached_at` is `None` while no snapshot at or above the target is known.
    Achieved { reached_at: Option<DateTime<Utc>> },
    Pending { remaining: i64, eta: Eta },
}

/// One row of the milestone progress list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilestoneProgress {
    pub milestone: Milestone,
    pub badge: String,
    pub percent: f64,
    #[serde(flatten)]
    pub status: MilestoneStatus,
}

/// Progress rows for every active milestone, in input order.
#[must_use]
pub fn milestone_progress(
    milestones: &[Milestone],
    snapshots: &[Snapshot],
    current: i64,
    rate_per_second: f64,
) -> Vec<MilestoneProgress> {
    milestones
        .iter()
        .filter(|m| m.is_active)
        .map(|m| {
            let percent = progress_percent(current, m.target_count);
            let remaining = m.target_count - current;
            let status = if percent >= 100.0 || remaining <= 0 {
                MilestoneStatus::Achieved {
                    reached_at: crate::ledger::achieved_at(snapshots, m.target_count),
                }
            } else {
                MilestoneStatus::Pending {
                    remaining,
                    eta: project_eta(remaining, rate_per_second),
                }
            };
            MilestoneProgress {
                badge: m.badge(),
                milestone: m.clone(),
                percent,
                status,
            }
        })
        .collect()
}
