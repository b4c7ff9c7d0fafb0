use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped observation of the tracked video's counters.
///
/// Counters are nullable because the upstream producer sometimes records a
/// partial read. Arithmetic and display treat a missing counter as `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub captured_at: DateTime<Utc>,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub comments: Option<i64>,
}

impl Snapshot {
    #[must_use]
    pub fn new(captured_at: DateTime<Utc>, views: i64) -> Self {
        Self {
            captured_at,
            views: Some(views),
            likes: None,
            comments: None,
        }
    }

    #[must_use]
    pub fn views_or_zero(&self) -> i64 {
        self.views.unwrap_or(0)
    }

    #[must_use]
    pub fn likes_or_zero(&self) -> i64 {
        self.likes.unwrap_or(0)
    }

    #[must_use]
    pub fn comments_or_zero(&self) -> i64 {
        self.comments.unwrap_or(0)
    }
}
