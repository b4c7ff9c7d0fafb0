//! Click analytics over a reporting range.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;
use viewpulse_core::{ClickEvent, Embed};

use crate::range::{max_span, RangeWindow};

/// Ranges up to this long are charted hourly; longer ones daily.
#[must_use]
pub fn hourly_series_limit() -> Duration {
    Duration::hours(48)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesResolution {
    Hourly,
    Daily,
}

impl SeriesResolution {
    #[must_use]
    pub fn for_window(window: &RangeWindow) -> Self {
        if window.duration() <= hourly_series_limit() {
            SeriesResolution::Hourly
        } else {
            SeriesResolution::Daily
        }
    }

    #[must_use]
    pub fn width(self) -> Duration {
        match self {
            SeriesResolution::Hourly => Duration::hours(1),
            SeriesResolution::Daily => Duration::days(1),
        }
    }

    fn label(self, at: DateTime<Utc>) -> String {
        match self {
            SeriesResolution::Hourly => at.format("%-I:%M %p").to_string(),
            SeriesResolution::Daily => at.format("%b %-d").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemClicks {
    pub id: Uuid,
    pub title: String,
    pub sort_order: i32,
    pub clicks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesBucket {
    pub start: DateTime<Utc>,
    pub label: String,
    pub clicks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickAnalytics {
    pub window: RangeWindow,
    pub total_clicks: u64,
    /// Every item, ranked by clicks descending then `sort_order`.
    pub ranked: Vec<ItemClicks>,
    pub resolution: SeriesResolution,
    pub series: Vec<SeriesBucket>,
}

/// Events whose `clicked_at` falls inside `window`.
#[must_use]
pub fn events_in_window<'a>(events: &'a [ClickEvent], window: &RangeWindow) -> Vec<&'a ClickEvent> {
    events
        .iter()
        .filter(|e| window.contains(e.clicked_at))
        .collect()
}

/// Per-item click counts, with every item present even at zero.
#[must_use]
pub fn per_item_counts(items: &[Embed], events: &[&ClickEvent]) -> HashMap<Uuid, u64> {
    let mut counts: HashMap<Uuid, u64> = items.iter().map(|item| (item.id, 0)).collect();
    for event in events {
        *counts.entry(event.item_id).or_insert(0) += 1;
    }
    counts
}

/// Items ordered by click count descending; ties keep display order.
#[must_use]
pub fn rank_items(items: &[Embed], counts: &HashMap<Uuid, u64>) -> Vec<ItemClicks> {
    let mut ranked: Vec<ItemClicks> = items
        .iter()
        .map(|item| ItemClicks {
            id: item.id,
            title: item.title.clone(),
            sort_order: item.sort_order,
            clicks: counts.get(&item.id).copied().unwrap_or(0),
        })
        .collect();
    ranked.sort_by(|a, b| b.clicks.cmp(&a.clicks).then(a.sort_order.cmp(&b.sort_order)));
    ranked
}

fn floor_millis(at: DateTime<Utc>, width_ms: i64) -> i64 {
    at.timestamp_millis().div_euclid(width_ms) * width_ms
}

/// Zero-filled click buckets from the bucket containing `since` through the
/// one containing `until`.
#[must_use]
pub fn click_series(
    events: &[&ClickEvent],
    window: &RangeWindow,
    resolution: SeriesResolution,
) -> Vec<SeriesBucket> {
    let width_ms = resolution.width().num_milliseconds();
    let start = floor_millis(window.since, width_ms);
    let end = floor_millis(window.until, width_ms);

    let mut buckets: BTreeMap<i64, u64> = BTreeMap::new();
    let mut key = start;
    while key <= end {
        buckets.insert(key, 0);
        key += width_ms;
    }

    for event in events {
        if let Some(count) = buckets.get_mut(&floor_millis(event.clicked_at, width_ms)) {
            *count += 1;
        }
    }

    buckets
        .into_iter()
        .filter_map(|(ms, clicks)| {
            let start = DateTime::from_timestamp_millis(ms)?;
            Some(SeriesBucket {
                label: resolution.label(start),
                start,
                clicks,
            })
        })
        .collect()
}

/// Full analytics for `items` over `window`.
///
/// Windows longer than [`max_span`] are cut back to their most recent part
/// so the pre-filled series stays bounded.
#[must_use]
pub fn analyze(items: &[Embed], events: &[ClickEvent], window: RangeWindow) -> ClickAnalytics {
    let window = window.clamp_span(max_span());
    let in_range = events_in_window(events, &window);
    let counts = per_item_counts(items, &in_range);
    let resolution = SeriesResolution::for_window(&window);

    ClickAnalytics {
        total_clicks: in_range.len() as u64,
        ranked: rank_items(items, &counts),
        series: click_series(&in_range, &window, resolution),
        resolution,
        window,
    }
}
