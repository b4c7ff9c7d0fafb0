//! Rolling views chart over a fixed trailing window.

pub mod axis;
pub mod curve;
pub mod window;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use viewpulse_core::Snapshot;

pub use axis::{time_ticks, ValueAxis, XTick, YTick};
pub use curve::{catmull_rom, CubicSegment, CurvePath, PlotPoint};
pub use window::{window_points, window_snapshots, x_position, RawPoint};

/// Vertical coordinate of the chart's bottom edge.
pub const BASELINE_Y: f64 = 100.0;

/// Minimum in-window snapshots for a chart to be drawn.
pub const MIN_CHART_SNAPSHOTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartConfig {
    pub window: Duration,
    pub tick_interval: Duration,
    pub value_step: i64,
    pub intervals: i64,
    pub y_tick_count: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            window: Duration::hours(2),
            tick_interval: Duration::minutes(5),
            value_step: 75_000,
            intervals: 4,
            y_tick_count: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
    pub t: DateTime<Utc>,
    pub v: i64,
}

/// Everything needed to draw the chart; rebuilt on every tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartModel {
    pub points: Vec<ChartPoint>,
    pub line_path: String,
    pub area_path: String,
    pub x_ticks: Vec<XTick>,
    pub y_ticks: Vec<YTick>,
    pub axis: ValueAxis,
    pub trend: Trend,
}

/// Build the chart for the window ending at `now`.
///
/// Returns `None` when fewer than [`MIN_CHART_SNAPSHOTS`] snapshots fall in the
/// window.
#[must_use]
pub fn build_chart(
    snapshots: &[Snapshot],
    now: DateTime<Utc>,
    config: &ChartConfig,
) -> Option<ChartModel> {
    let in_window = window_snapshots(snapshots, now, config.window);
    if in_window.len() < MIN_CHART_SNAPSHOTS {
        return None;
    }

    let raw = window_points(&in_window, now);
    let raw_min = raw.iter().map(|p| p.v).min()?;
    let raw_max = raw.iter().map(|p| p.v).max()?;
    let axis = ValueAxis::auto_scale(raw_min, raw_max, config.value_step, config.intervals);

    let points: Vec<ChartPoint> = raw
        .iter()
        .map(|p| ChartPoint {
            x: x_position(p.t, now, config.window),
            y: axis.y_for(p.v),
            t: p.t,
            v: p.v,
        })
        .collect();

    let plot: Vec<PlotPoint> = points.iter().map(|p| PlotPoint::new(p.x, p.y)).collect();
    let curve = catmull_rom(&plot);

    let first = raw.first()?.v;
    let last = raw.last()?.v;
    let trend = if last >= first { Trend::Up } else { Trend::Down };

    Some(ChartModel {
        line_path: curve.to_svg(),
        area_path: curve.area_svg(BASELINE_Y),
        x_ticks: time_ticks(now, config.window, config.tick_interval),
        y_ticks: axis.ticks(config.y_tick_count),
        points,
        axis,
        trend,
    })
}
