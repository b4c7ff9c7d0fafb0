use chrono::{DateTime, Utc};
use serde::Serialize;

/// Display counter that extrapolates from the last known value between polls.
///
/// The counter restarts whenever its base value or rate changes; in between,
/// `value_at` grows linearly from the base at the given rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LiveCounter {
    base: i64,
    rate_per_second: f64,
    started_at: DateTime<Utc>,
}

impl LiveCounter {
    #[must_use]
    pub fn new(base: i64, rate_per_second: f64, started_at: DateTime<Utc>) -> Self {
        Self {
            base,
            rate_per_second: rate_per_second.max(0.0),
            started_at,
        }
    }

    /// Point the counter at a new base and rate.
    ///
    /// Returns `true` if the counter restarted.
    #[allow(clippy::float_cmp)]
    pub fn retarget(&mut self, base: i64, rate_per_second: f64, now: DateTime<Utc>) -> bool {
        let rate_per_second = rate_per_second.max(0.0);
        if self.base == base && self.rate_per_second == rate_per_second {
            return false;
        }
        *self = Self::new(base, rate_per_second, now);
        true
    }

    #[must_use]
    pub fn base(&self) -> i64 {
        self.base
    }

    #[must_use]
    pub fn rate_per_second(&self) -> f64 {
        self.rate_per_second
    }

    /// `round(base + elapsed_seconds * rate)`; never below the base.
    #[must_use]
    pub fn value_at(&self, now: DateTime<Utc>) -> i64 {
        let elapsed_ms = (now - self.started_at).num_milliseconds().max(0);
        #[allow(clippy::cast_precision_loss)]
        let grown = elapsed_ms as f64 / 1000.0 * self.rate_per_second;
        #[allow(clippy::cast_possible_truncation)]
        let extra = grown.round() as i64;
        self.base.saturating_add(extra)
    }
}
