use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named numeric target on the `views` counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: Uuid,
    pub title: String,
    pub target_count: i64,
    /// Manually maintained count, only used when no snapshot is available.
    pub current_count: i64,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Milestone {
    /// Short badge label, e.g. `"2M"` or `"750K"`.
    #[must_use]
    pub fn badge(&self) -> String {
        if self.target_count >= 1_000_000 {
            let millions = self.target_count / 1_000_000;
            let rest = self.target_count % 1_000_000;
            if rest == 0 {
                format!("{millions}M")
            } else {
                #[allow(clippy::cast_precision_loss)]
                let value = self.target_count as f64 / 1_000_000.0;
                format!("{value}M")
            }
        } else {
            format!("{}K", self.target_count / 1_000)
        }
    }
}

/// Fields accepted when creating a milestone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMilestone {
    pub title: String,
    pub target_count: i64,
    pub current_count: i64,
    pub sort_order: i32,
    pub is_active: bool,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MilestoneUpdate {
    pub title: Option<String>,
    pub target_count: Option<i64>,
    pub current_count: Option<i64>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl MilestoneUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.target_count.is_none()
            && self.current_count.is_none()
            && self.sort_order.is_none()
            && self.is_active.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milestone(target_count: i64) -> Milestone {
        Milestone {
            id: Uuid::new_v4(),
            title: "Goal".to_string(),
            target_count,
            current_count: 0,
            sort_order: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn badge_formats_thousands() {
        assert_eq!(milestone(750_000).badge(), "750K");
        assert_eq!(milestone(1_500).badge(), "1K");
    }

    #[test]
    fn badge_formats_millions() {
        assert_eq!(milestone(2_000_000).badge(), "2M");
        assert_eq!(milestone(2_500_000).badge(), "2.5M");
    }

    #[test]
    fn default_update_is_empty() {
        assert!(MilestoneUpdate::default().is_empty());
        let update = MilestoneUpdate {
            is_active: Some(false),
            ..MilestoneUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
