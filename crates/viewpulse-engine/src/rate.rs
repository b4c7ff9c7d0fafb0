//! Growth-rate estimation over an ascending snapshot history.
//!
//! The estimator prefers the instantaneous rate between the two newest
//! samples. When that rate is zero or negative (snapshot jitter, a late
//! correction) it falls back to the most recent strictly positive delta so a
//! real upward trend still yields an ETA.

use serde::{Deserialize, Serialize};
use viewpulse_core::Snapshot;

/// Which counter of a [`Snapshot`] to measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Views,
    Likes,
    Comments,
}

impl Metric {
    /// Counter value with `None` read as `0`.
    #[must_use]
    pub fn value(self, snapshot: &Snapshot) -> i64 {
        match self {
            Metric::Views => snapshot.views_or_zero(),
            Metric::Likes => snapshot.likes_or_zero(),
            Metric::Comments => snapshot.comments_or_zero(),
        }
    }
}

/// Seconds between two snapshots, never less than `1.0`.
#[must_use]
pub fn elapsed_seconds(earlier: &Snapshot, later: &Snapshot) -> f64 {
    let millis = (later.captured_at - earlier.captured_at).num_milliseconds();
    #[allow(clippy::cast_precision_loss)]
    let seconds = millis as f64 / 1000.0;
    seconds.max(1.0)
}

fn pair_rate(earlier: &Snapshot, later: &Snapshot, metric: Metric) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let delta = (metric.value(later) - metric.value(earlier)) as f64;
    delta / elapsed_seconds(earlier, later)
}

/// Rate between the two newest snapshots, clamped to `>= 0`.
///
/// Returns `0.0` when fewer than two snapshots are available.
#[must_use]
pub fn instantaneous_rate(snapshots: &[Snapshot], metric: Metric) -> f64 {
    match snapshots {
        [.., previous, latest] => pair_rate(previous, latest, metric).max(0.0),
        _ => 0.0,
    }
}

/// Rate of the most recent consecutive pair whose delta is strictly positive.
#[must_use]
pub fn last_positive_rate(snapshots: &[Snapshot], metric: Metric) -> f64 {
    snapshots
        .windows(2)
        .rev()
        .find(|pair| metric.value(&pair[1]) > metric.value(&pair[0]))
        .map_or(0.0, |pair| pair_rate(&pair[0], &pair[1], metric))
}

/// Effective growth rate in units per second.
#[must_use]
pub fn estimate_rate(snapshots: &[Snapshot], metric: Metric) -> f64 {
    let live = instantaneous_rate(snapshots, metric);
    if live > 0.0 {
        return live;
    }
    last_positive_rate(snapshots, metric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(points: &[(i64, i64)]) -> Vec<Snapshot> {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        points
            .iter()
            .map(|&(secs, views)| Snapshot::new(base + Duration::seconds(secs), views))
            .collect()
    }

    #[test]
    fn fewer_than_two_snapshots_is_zero() {
        assert_eq!(estimate_rate(&[], Metric::Views), 0.0);
        assert_eq!(estimate_rate(&series(&[(0, 100)]), Metric::Views), 0.0);
    }

    #[test]
    fn equal_timestamps_clamp_denominator_to_one_second() {
        let snaps = series(&[(10, 100), (10, 130)]);
        assert_eq!(elapsed_seconds(&snaps[0], &snaps[1]), 1.0);
        assert_eq!(estimate_rate(&snaps, Metric::Views), 30.0);
    }

    #[test]
    fn sub_second_gap_is_clamped() {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let a = Snapshot::new(base, 0);
        let b = Snapshot::new(base + Duration::milliseconds(250), 10);
        assert_eq!(elapsed_seconds(&a, &b), 1.0);
    }

    #[test]
    fn drop_without_history_is_zero() {
        let snaps = series(&[(0, 100), (60, 90)]);
        assert_eq!(instantaneous_rate(&snaps, Metric::Views), 0.0);
        assert_eq!(estimate_rate(&snaps, Metric::Views), 0.0);
    }

    #[test]
    fn flat_tail_falls_back_to_last_positive_pair() {
        let snaps = series(&[(0, 100), (10, 150), (20, 150)]);
        assert_eq!(instantaneous_rate(&snaps, Metric::Views), 0.0);
        assert_eq!(estimate_rate(&snaps, Metric::Views), 5.0);
    }

    #[test]
    fn fallback_picks_most_recent_positive_pair() {
        let snaps = series(&[(0, 0), (10, 1_000), (20, 1_020), (30, 1_010), (40, 1_010)]);
        assert_eq!(estimate_rate(&snaps, Metric::Views), 2.0);
    }

    #[test]
    fn positive_instantaneous_rate_wins() {
        let snaps = series(&[(0, 0), (10, 1_000), (30, 1_100)]);
        assert_eq!(estimate_rate(&snaps, Metric::Views), 5.0);
    }

    #[test]
    fn metric_selector_reads_the_requested_counter() {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let snaps = vec![
            Snapshot {
                captured_at: base,
                views: Some(10),
                likes: Some(1),
                comments: None,
            },
            Snapshot {
                captured_at: base + Duration::seconds(2),
                views: Some(10),
                likes: Some(5),
                comments: Some(4),
            },
        ];
        assert_eq!(estimate_rate(&snaps, Metric::Views), 0.0);
        assert_eq!(estimate_rate(&snaps, Metric::Likes), 2.0);
        assert_eq!(estimate_rate(&snaps, Metric::Comments), 2.0);
    }
}
