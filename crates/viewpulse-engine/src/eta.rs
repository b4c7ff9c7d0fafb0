//! Time-to-target projection and its compact display form.

use std::fmt;

use serde::Serialize;

/// Projected time until a target is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Eta {
    /// No positive growth rate is known yet.
    WaitingUpdate,
    /// Whole seconds until the target, rounded up.
    In { seconds: u64 },
}

impl Eta {
    #[must_use]
    pub fn seconds(self) -> Option<u64> {
        match self {
            Eta::WaitingUpdate => None,
            Eta::In { seconds } => Some(seconds),
        }
    }
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = match self {
            Eta::WaitingUpdate => return write!(f, "waiting update"),
            Eta::In { seconds } => *seconds,
        };

        #[allow(clippy::cast_precision_loss)]
        let as_float = seconds as f64;
        if seconds < 60 {
            write!(f, "{seconds}s")
        } else if seconds < 3_600 {
            write!(f, "{}m", seconds.div_ceil(60))
        } else if seconds < 86_400 {
            write!(f, "{}h", one_decimal(as_float / 3_600.0))
        } else {
            write!(f, "{}d", one_decimal(as_float / 86_400.0))
        }
    }
}

/// One fractional digit, with exact halves rounded up.
///
/// `{:.1}` already rounds the exact binary value correctly and only differs on
/// true ties, where it picks the even digit. A non-negative `x` sits exactly
/// halfway between two tenths iff `4x` is an odd integer.
#[allow(clippy::float_cmp)]
fn one_decimal(x: f64) -> String {
    let quarters = x * 4.0;
    if quarters.fract() == 0.0 && quarters.rem_euclid(2.0) == 1.0 {
        return format!("{:.1}", (quarters * 2.5).ceil() / 10.0);
    }
    format!("{x:.1}")
}

/// Project how long `remaining` units take at `rate_per_second`.
///
/// Callers report `remaining <= 0` as already reached instead of asking for an
/// ETA.
#[must_use]
pub fn project_eta(remaining: i64, rate_per_second: f64) -> Eta {
    if rate_per_second.is_nan() || rate_per_second <= 0.0 {
        return Eta::WaitingUpdate;
    }

    #[allow(clippy::cast_precision_loss)]
    let raw = (remaining.max(0) as f64 / rate_per_second).ceil();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let seconds = if raw.is_finite() { raw as u64 } else { u64::MAX };
    Eta::In { seconds }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_hour_at_one_per_second() {
        assert_eq!(project_eta(3_600, 1.0).to_string(), "1.0h");
    }

    #[test]
    fn thirty_remaining_at_two_per_second() {
        assert_eq!(project_eta(30, 2.0).to_string(), "15s");
    }

    #[test]
    fn zero_rate_is_waiting_update() {
        assert_eq!(project_eta(100, 0.0), Eta::WaitingUpdate);
        assert_eq!(project_eta(100, 0.0).to_string(), "waiting update");
        assert_eq!(project_eta(100, -3.0), Eta::WaitingUpdate);
    }

    #[test]
    fn minutes_round_up() {
        assert_eq!(project_eta(61, 1.0).to_string(), "2m");
        assert_eq!(project_eta(120, 1.0).to_string(), "2m");
    }

    #[test]
    fn seconds_round_up() {
        assert_eq!(project_eta(10, 3.0), Eta::In { seconds: 4 });
    }

    #[test]
    fn days_use_one_decimal() {
        assert_eq!(project_eta(86_400 * 3 / 2, 1.0).to_string(), "1.5d");
    }

    #[test]
    fn hours_boundary() {
        assert_eq!(project_eta(3_599, 1.0).to_string(), "60m");
        assert_eq!(project_eta(86_399, 1.0).to_string(), "24.0h");
    }

    #[test]
    fn exact_halves_round_up() {
        assert_eq!(project_eta(4_500, 1.0).to_string(), "1.3h");
        assert_eq!(project_eta(8_100, 1.0).to_string(), "2.3h");
        assert_eq!(project_eta(108_000, 1.0).to_string(), "1.3d");
        assert_eq!(project_eta(216_000, 1.0).to_string(), "2.5d");
    }

    #[test]
    fn near_halves_follow_the_binary_value() {
        // 4140 / 3600 is stored just below 1.15.
        assert_eq!(project_eta(4_140, 1.0).to_string(), "1.1h");
        assert_eq!(project_eta(6_300, 1.0).to_string(), "1.8h");
        assert_eq!(one_decimal(0.25), "0.3");
        assert_eq!(one_decimal(0.75), "0.8");
        assert_eq!(one_decimal(1.5), "1.5");
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_string(&Eta::In { seconds: 5 }).expect("serialize");
        assert_eq!(json, r#"{"kind":"in","seconds":5}"#);
    }
}
