//! Trailing-window selection and projection of samples onto chart space.

use chrono::{DateTime, Duration, Utc};
use viewpulse_core::Snapshot;

/// A raw `(time, value)` sample before projection onto chart coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPoint {
    pub t: DateTime<Utc>,
    pub v: i64,
}

/// Snapshots captured at or after `now - span`, unbucketed.
#[must_use]
pub fn window_snapshots<'a>(
    snapshots: &'a [Snapshot],
    now: DateTime<Utc>,
    span: Duration,
) -> Vec<&'a Snapshot> {
    let start = now - span;
    snapshots
        .iter()
        .filter(|s| s.captured_at >= start)
        .collect()
}

/// Views samples for the sliding window, with a synthetic tail at `now`.
///
/// When the newest sample is older than `now`, a point carrying its value is
/// appended at `now` so the line always reaches the right edge.
#[must_use]
pub fn window_points(snapshots: &[&Snapshot], now: DateTime<Utc>) -> Vec<RawPoint> {
    let mut points: Vec<RawPoint> = snapshots
        .iter()
        .map(|s| RawPoint {
            t: s.captured_at,
            v: s.views_or_zero(),
        })
        .collect();

    if let Some(last) = points.last().copied() {
        if last.t < now {
            points.push(RawPoint { t: now, v: last.v });
        }
    }

    points
}

/// Horizontal position in `[0, 100]` of `at` within the window ending at `now`.
#[must_use]
pub fn x_position(at: DateTime<Utc>, now: DateTime<Utc>, span: Duration) -> f64 {
    let span_ms = span.num_milliseconds().max(1);
    let offset_ms = (at - (now - span)).num_milliseconds();
    #[allow(clippy::cast_precision_loss)]
    let ratio = offset_ms as f64 / span_ms as f64;
    (ratio * 100.0).clamp(0.0, 100.0)
}
