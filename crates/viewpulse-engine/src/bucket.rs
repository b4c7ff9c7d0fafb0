//! Fixed-width time bucketing of snapshots for tabular views.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use viewpulse_core::Snapshot;

use crate::range::RangeWindow;

/// Rows shown in the hourly table.
pub const TABLE_ROWS: usize = 24;

/// Default bucket width: one hour.
#[must_use]
pub fn hourly() -> Duration {
    Duration::hours(1)
}

fn width_millis(width: Duration) -> i64 {
    width.num_milliseconds().max(1)
}

/// Index of the bucket containing `at`; `floor(at / width)`.
#[must_use]
pub fn bucket_index(at: DateTime<Utc>, width: Duration) -> i64 {
    at.timestamp_millis().div_euclid(width_millis(width))
}

/// Start of the bucket containing `at`.
#[must_use]
pub fn bucket_start(at: DateTime<Utc>, width: Duration) -> DateTime<Utc> {
    let width_ms = width_millis(width);
    let start_ms = bucket_index(at, width) * width_ms;
    DateTime::from_timestamp_millis(start_ms).unwrap_or(at)
}

/// Snapshots whose `captured_at` lies inside `window`, in input order.
#[must_use]
pub fn within<'a>(snapshots: &'a [Snapshot], window: &RangeWindow) -> Vec<&'a Snapshot> {
    snapshots
        .iter()
        .filter(|s| window.contains(s.captured_at))
        .collect()
}

/// Latest snapshot per non-empty bucket, ascending by bucket.
///
/// Within a bucket the snapshot with the greatest `captured_at` wins; for
/// identical timestamps the first one seen is kept.
#[must_use]
pub fn bucket_latest(snapshots: &[Snapshot], window: &RangeWindow, width: Duration) -> Vec<Snapshot> {
    let mut grouped: BTreeMap<i64, &Snapshot> = BTreeMap::new();

    for snapshot in within(snapshots, window) {
        let key = bucket_index(snapshot.captured_at, width);
        grouped
            .entry(key)
            .and_modify(|current| {
                if snapshot.captured_at > current.captured_at {
                    *current = snapshot;
                }
            })
            .or_insert(snapshot);
    }

    grouped.into_values().cloned().collect()
}

/// One displayed bucket with deltas against the next-older displayed bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketRow {
    pub bucket_start: DateTime<Utc>,
    pub snapshot: Snapshot,
    pub views_delta: i64,
    pub likes_delta: i64,
    pub comments_delta: i64,
}

/// The `max_rows` most recent buckets, newest first.
///
/// The oldest displayed row has no older neighbour, so its deltas are taken
/// against zero.
#[must_use]
pub fn bucket_table(
    snapshots: &[Snapshot],
    window: &RangeWindow,
    width: Duration,
    max_rows: usize,
) -> Vec<BucketRow> {
    let newest_first: Vec<Snapshot> = bucket_latest(snapshots, window, width)
        .into_iter()
        .rev()
        .take(max_rows)
        .collect();

    newest_first
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let older = newest_first.get(index + 1);
            BucketRow {
                bucket_start: bucket_start(row.captured_at, width),
                snapshot: row.clone(),
                views_delta: row.views_or_zero() - older.map_or(0, Snapshot::views_or_zero),
                likes_delta: row.likes_or_zero() - older.map_or(0, Snapshot::likes_or_zero),
                comments_delta: row.comments_or_zero()
                    - older.map_or(0, Snapshot::comments_or_zero),
            }
        })
        .collect()
}

/// Change between the two newest snapshots of a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatestChange {
    pub snapshot: Snapshot,
    pub views_delta: i64,
    pub likes_delta: i64,
    pub comments_delta: i64,
}

/// Latest snapshot in `window` and its change from the one before it.
#[must_use]
pub fn latest_change(snapshots: &[Snapshot], window: &RangeWindow) -> Option<LatestChange> {
    let in_range = within(snapshots, window);
    let (&latest, rest) = in_range.split_last()?;
    let previous = rest.last().copied();

    Some(LatestChange {
        snapshot: latest.clone(),
        views_delta: latest.views_or_zero() - previous.map_or(0, Snapshot::views_or_zero),
        likes_delta: latest.likes_or_zero() - previous.map_or(0, Snapshot::likes_or_zero),
        comments_delta: latest.comments_or_zero()
            - previous.map_or(0, Snapshot::comments_or_zero),
    })
}

/// Direction of a delta, used for row styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaClass {
    Up,
    Down,
    Flat,
}

impl DeltaClass {
    #[must_use]
    pub fn of(delta: i64) -> Self {
        match delta.signum() {
            1 => DeltaClass::Up,
            -1 => DeltaClass::Down,
            _ => DeltaClass::Flat,
        }
    }
}

/// Signed delta text: `+1200`, `-35`, or `0`.
#[must_use]
pub fn format_delta(delta: i64) -> String {
    match DeltaClass::of(delta) {
        DeltaClass::Up => format!("+{delta}"),
        DeltaClass::Down => format!("-{}", delta.unsigned_abs()),
        DeltaClass::Flat => "0".to_string(),
    }
}
