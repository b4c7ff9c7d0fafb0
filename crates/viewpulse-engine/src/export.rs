//! CSV export of raw monitoring snapshots.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use viewpulse_core::Snapshot;

use crate::range::RangeKey;

pub const CSV_HEADER: [&str; 5] = ["captured_at", "views", "likes", "comments", "views_per_hour"];

/// A stored snapshot row as exported, including the store-computed hourly
/// rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub captured_at: DateTime<Utc>,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub comments: Option<i64>,
    pub views_per_hour: Option<i64>,
}

impl From<Snapshot> for ExportRow {
    fn from(s: Snapshot) -> Self {
        Self {
            captured_at: s.captured_at,
            views: s.views,
            likes: s.likes,
            comments: s.comments,
            views_per_hour: None,
        }
    }
}

fn cell(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Render rows as CSV with a header line; missing values are empty cells.
///
/// Lines are joined by `\n` with no trailing newline.
#[must_use]
pub fn to_csv(rows: &[ExportRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(CSV_HEADER.join(","));
    for row in rows {
        lines.push(
            [
                row.captured_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                cell(row.views),
                cell(row.likes),
                cell(row.comments),
                cell(row.views_per_hour),
            ]
            .join(","),
        );
    }
    lines.join("\n")
}

/// `monitoring-<range>-<YYYY-MM-DD>.csv`, with the one-day range spelled `24h`.
#[must_use]
pub fn export_file_name(range: RangeKey, today: DateTime<Utc>) -> String {
    let key = match range {
        RangeKey::Day1 => "24h",
        other => other.as_str(),
    };
    format!("monitoring-{key}-{}.csv", today.format("%Y-%m-%d"))
}
