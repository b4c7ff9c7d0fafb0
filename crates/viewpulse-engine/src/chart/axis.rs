//! Value and time axes for the rolling chart.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::window::x_position;

/// Auto-scaled vertical axis in metric units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValueAxis {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YTick {
    pub y: f64,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XTick {
    pub x: f64,
    pub at: DateTime<Utc>,
    pub label: String,
}

fn floor_to(value: i64, step: i64) -> i64 {
    value.div_euclid(step) * step
}

fn ceil_to(value: i64, step: i64) -> i64 {
    -(-value).div_euclid(step) * step
}

impl ValueAxis {
    /// Fit `[raw_min, raw_max]` onto an axis of `intervals` steps.
    ///
    /// The lower bound is `raw_min` floored to `step`. If `raw_max` does not
    /// fit, the upper bound becomes `raw_max` ceiled to `step` and the lower
    /// bound is re-derived from it. The lower bound never goes below zero.
    #[must_use]
    pub fn auto_scale(raw_min: i64, raw_max: i64, step: i64, intervals: i64) -> Self {
        let step = step.max(1);
        let span = step * intervals.max(1);

        let mut min = floor_to(raw_min, step);
        let mut max = min + span;

        if raw_max > max {
            max = ceil_to(raw_max, step);
            min = max - span;
        }

        if min < 0 {
            min = 0;
            max = span;
        }

        Self { min, max }
    }

    /// Distance between the bounds, never less than one.
    #[must_use]
    pub fn range(&self) -> i64 {
        (self.max - self.min).max(1)
    }

    /// Vertical position in `[0, 100]` space, `0` at the top.
    #[must_use]
    pub fn y_for(&self, value: i64) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let ratio = (value - self.min) as f64 / self.range() as f64;
        100.0 - ratio * 100.0
    }

    /// `count` evenly spaced ticks from the top of the axis to the bottom.
    #[must_use]
    pub fn ticks(&self, count: usize) -> Vec<YTick> {
        let divisions = count.saturating_sub(1).max(1);
        #[allow(clippy::cast_precision_loss)]
        let range = self.range() as f64;
        #[allow(clippy::cast_precision_loss)]
        let top = self.max as f64;

        (0..count)
            .map(|index| {
                #[allow(clippy::cast_precision_loss)]
                let ratio = index as f64 / divisions as f64;
                #[allow(clippy::cast_possible_truncation)]
                let value = (top - range * ratio).round() as i64;
                YTick {
                    y: ratio * 100.0,
                    value,
                }
            })
            .collect()
    }
}

/// Wall-clock aligned ticks every `interval` from `now - span` to `now`.
///
/// Falls back to the two window endpoints when no aligned tick fits.
#[must_use]
pub fn time_ticks(now: DateTime<Utc>, span: Duration, interval: Duration) -> Vec<XTick> {
    let start = now - span;
    let interval_ms = interval.num_milliseconds().max(1);
    let first_ms = ceil_to(start.timestamp_millis(), interval_ms);
    let end_ms = now.timestamp_millis();

    let mut times: Vec<DateTime<Utc>> = (0..)
        .map(|n: i64| first_ms + n * interval_ms)
        .take_while(|&ms| ms <= end_ms)
        .filter_map(DateTime::from_timestamp_millis)
        .collect();

    if times.is_empty() {
        times = vec![start, now];
    }

    times
        .into_iter()
        .map(|at| XTick {
            x: x_position(at, now, span),
            at,
            label: at.format("%-I:%M %p").to_string(),
        })
        .collect()
}
