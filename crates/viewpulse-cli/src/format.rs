//! Plain-text rendering shared by the commands.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use viewpulse_engine::bucket::format_delta;
use viewpulse_engine::{Crossing, MonitorView};

/// `1234567` renders as `1,234,567`.
pub(crate) fn group_digits(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub(crate) fn optional_count(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), group_digits)
}

pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Single-line live status for the `watch` command.
pub(crate) fn status_line(view: &MonitorView) -> String {
    let mut views = format!("views {}", group_digits(view.display_views));
    if let Some(change) = &view.latest_change {
        let _ = write!(views, " ({})", format_delta(change.views_delta));
    }

    let mut parts = vec![
        views,
        format!("likes {}", optional_count(view.likes)),
        format!("comments {}", optional_count(view.comments)),
        format!("{:.2}/s", view.rate_per_second),
    ];
    if let Some(next) = &view.next_milestone {
        parts.push(format!("next {} in {}", next.badge, next.eta_text));
    }
    if view.last_error.is_some() {
        parts.push("last poll failed".to_string());
    }
    parts.join(" | ")
}

pub(crate) fn notification_line(crossing: &Crossing, watch_url: &str) -> String {
    format!(
        "milestone reached: {} ({} views at {}) {watch_url}",
        crossing.title,
        group_digits(crossing.reached_views),
        timestamp(crossing.reached_at),
    )
}
