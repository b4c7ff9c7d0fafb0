//! Reporting ranges and their resolution to concrete time windows.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Width used when a custom range is missing its start.
const CUSTOM_FALLBACK_SPAN_DAYS: i64 = 7;

/// Longest window a custom range may cover; matches the widest preset.
pub const MAX_SPAN_DAYS: i64 = 30;

/// Longest window any report may cover.
#[must_use]
pub fn max_span() -> Duration {
    Duration::days(MAX_SPAN_DAYS)
}

/// A preset "last N" reporting range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeKey {
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "6h")]
    Hours6,
    #[serde(rename = "12h")]
    Hours12,
    #[serde(rename = "1d", alias = "24h")]
    Day1,
    #[serde(rename = "3d")]
    Days3,
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "30d")]
    Days30,
}

impl RangeKey {
    /// Ranges offered on the public dashboard.
    pub const PUBLIC: [RangeKey; 6] = [
        RangeKey::Hours6,
        RangeKey::Hours12,
        RangeKey::Day1,
        RangeKey::Days3,
        RangeKey::Days7,
        RangeKey::Days30,
    ];

    /// Ranges offered for CSV export.
    pub const EXPORT: [RangeKey; 3] = [RangeKey::Hour1, RangeKey::Day1, RangeKey::Days7];

    #[must_use]
    pub fn duration(self) -> Duration {
        match self {
            RangeKey::Hour1 => Duration::hours(1),
            RangeKey::Hours6 => Duration::hours(6),
            RangeKey::Hours12 => Duration::hours(12),
            RangeKey::Day1 => Duration::days(1),
            RangeKey::Days3 => Duration::days(3),
            RangeKey::Days7 => Duration::days(7),
            RangeKey::Days30 => Duration::days(30),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            RangeKey::Hour1 => "Last 1 hour",
            RangeKey::Hours6 => "Last 6 hours",
            RangeKey::Hours12 => "Last 12 hours",
            RangeKey::Day1 => "Last 1 day",
            RangeKey::Days3 => "Last 3 days",
            RangeKey::Days7 => "Last 7 days",
            RangeKey::Days30 => "Last 30 days",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RangeKey::Hour1 => "1h",
            RangeKey::Hours6 => "6h",
            RangeKey::Hours12 => "12h",
            RangeKey::Day1 => "1d",
            RangeKey::Days3 => "3d",
            RangeKey::Days7 => "7d",
            RangeKey::Days30 => "30d",
        }
    }
}

impl fmt::Display for RangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown range '{0}'; expected one of 1h, 6h, 12h, 1d, 24h, 3d, 7d, 30d")]
pub struct UnknownRange(pub String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("custom range covers {hours} hours; at most {} days are allowed", MAX_SPAN_DAYS)]
pub struct RangeTooWide {
    pub hours: i64,
}

impl FromStr for RangeKey {
    type Err = UnknownRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1h" => Ok(RangeKey::Hour1),
            "6h" => Ok(RangeKey::Hours6),
            "12h" => Ok(RangeKey::Hours12),
            "1d" | "24h" => Ok(RangeKey::Day1),
            "3d" => Ok(RangeKey::Days3),
            "7d" => Ok(RangeKey::Days7),
            "30d" => Ok(RangeKey::Days30),
            other => Err(UnknownRange(other.to_string())),
        }
    }
}

/// A concrete `[since, until]` interval. `since <= until` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl RangeWindow {
    #[must_use]
    pub fn new(a: DateTime<Utc>, b: DateTime<Utc>) -> Self {
        if a <= b {
            Self { since: a, until: b }
        } else {
            Self { since: b, until: a }
        }
    }

    /// Inclusive on both ends.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.since && at <= self.until
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.until - self.since
    }

    /// Keeps `until` and pulls `since` forward so the span is at most `max`.
    #[must_use]
    pub fn clamp_span(self, max: Duration) -> Self {
        if self.duration() <= max {
            return self;
        }
        Self {
            since: self.until - max,
            until: self.until,
        }
    }
}

/// What the user picked: a preset relative range or explicit dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSelection {
    Relative(RangeKey),
    Custom {
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    },
}

impl RangeSelection {
    /// Resolve against the current time.
    ///
    /// A custom range missing its start uses the seven days before `now`; a
    /// missing end uses `now`. Inverted bounds are swapped.
    #[must_use]
    pub fn resolve(&self, now: DateTime<Utc>) -> RangeWindow {
        match *self {
            RangeSelection::Relative(key) => RangeWindow {
                since: now - key.duration(),
                until: now,
            },
            RangeSelection::Custom { since, until } => {
                let since =
                    since.unwrap_or_else(|| now - Duration::days(CUSTOM_FALLBACK_SPAN_DAYS));
                let until = until.unwrap_or(now);
                RangeWindow::new(since, until)
            }
        }
    }
}

impl RangeSelection {
    /// [`resolve`](Self::resolve), rejecting windows wider than [`max_span`].
    ///
    /// # Errors
    ///
    /// Returns [`RangeTooWide`] when explicit dates span more than
    /// [`MAX_SPAN_DAYS`] days.
    pub fn resolve_bounded(&self, now: DateTime<Utc>) -> Result<RangeWindow, RangeTooWide> {
        let window = self.resolve(now);
        if window.duration() > max_span() {
            return Err(RangeTooWide {
                hours: window.duration().num_hours(),
            });
        }
        Ok(window)
    }
}

impl From<RangeKey> for RangeSelection {
    fn from(key: RangeKey) -> Self {
        RangeSelection::Relative(key)
    }
}
