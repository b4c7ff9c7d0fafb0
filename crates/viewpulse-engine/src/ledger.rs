//! Historical record of when round-number thresholds were passed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use viewpulse_core::Snapshot;

use crate::eta::{project_eta, Eta};
use crate::rate::{estimate_rate, Metric};

/// Spacing of ledger thresholds.
pub const LEDGER_STEP: i64 = 100_000;

/// Capture time of the first snapshot with `views >= target`.
#[must_use]
pub fn achieved_at(snapshots: &[Snapshot], target: i64) -> Option<DateTime<Utc>> {
    snapshots
        .iter()
        .find(|s| s.views_or_zero() >= target)
        .map(|s| s.captured_at)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerRow {
    pub target: i64,
    pub reached_at: DateTime<Utc>,
    pub reached_views: i64,
    /// Projection made from history before the crossing; `None` when the
    /// previous sample had already reached the target.
    pub eta: Option<Eta>,
    pub eta_text: String,
}

fn eta_text(eta: Option<Eta>) -> String {
    match eta {
        None => "Reached".to_string(),
        Some(eta) => format!("ETA: {eta}"),
    }
}

/// One row per multiple of `step` up to the highest observed views, newest
/// threshold first.
///
/// A threshold's crossing is the first index where the previous sample (or
/// `0` before the first) is below it and the current one is at or above it.
/// The ETA column is what the rate estimator would have projected from the
/// samples strictly before that crossing.
#[must_use]
pub fn threshold_ledger(snapshots: &[Snapshot], step: i64) -> Vec<LedgerRow> {
    let step = step.max(1);
    let max_views = snapshots.iter().map(Snapshot::views_or_zero).max().unwrap_or(0);
    if max_views < step {
        return Vec::new();
    }

    let mut rows: Vec<LedgerRow> = (1..=max_views / step)
        .map(|n| n * step)
        .filter_map(|target| {
            let index = snapshots.iter().enumerate().position(|(i, row)| {
                let prev = if i > 0 { snapshots[i - 1].views_or_zero() } else { 0 };
                prev < target && row.views_or_zero() >= target
            })?;

            let reached = &snapshots[index];
            let before = &snapshots[..index];
            let baseline = before.last().unwrap_or(reached).views_or_zero();
            let remaining = (target - baseline).max(0);
            let eta = (remaining > 0)
                .then(|| project_eta(remaining, estimate_rate(before, Metric::Views)));

            Some(LedgerRow {
                target,
                reached_at: reached.captured_at,
                reached_views: reached.views_or_zero(),
                eta_text: eta_text(eta),
                eta,
            })
        })
        .collect();

    rows.sort_by(|a, b| b.target.cmp(&a.target));
    rows
}
