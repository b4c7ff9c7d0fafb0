use std::net::SocketAddr;
use std::path::PathBuf;

/// Watch link used when neither `VIEWPULSE_WATCH_URL` nor `VIEWPULSE_VIDEO_ID`
/// is configured.
pub const DEFAULT_WATCH_URL: &str = "https://www.youtube.com/watch?v=0t6GNcINKeU";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub tick_interval_ms: u64,
    pub snapshot_limit: i64,
    pub dismissal_path: PathBuf,
    pub watch_url: Option<String>,
    pub video_id: Option<String>,
    pub milestone_watch_cron: String,
    /// Bearer tokens accepted on mutating API routes.
    pub api_keys: Vec<String>,
}

impl AppConfig {
    /// Canonical watch link for the tracked video.
    ///
    /// An explicit URL wins over one built from the video id; blank values
    /// are treated as unset.
    #[must_use]
    pub fn watch_now_url(&self) -> String {
        let explicit = self.watch_url.as_deref().map(str::trim).unwrap_or("");
        if !explicit.is_empty() {
            return explicit.to_string();
        }

        let video_id = self.video_id.as_deref().map(str::trim).unwrap_or("");
        if video_id.is_empty() {
            DEFAULT_WATCH_URL.to_string()
        } else {
            format!("https://www.youtube.com/watch?v={video_id}")
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("tick_interval_ms", &self.tick_interval_ms)
            .field("snapshot_limit", &self.snapshot_limit)
            .field("dismissal_path", &self.dismissal_path)
            .field("watch_url", &self.watch_url)
            .field("video_id", &self.video_id)
            .field("milestone_watch_cron", &self.milestone_watch_cron)
            .field("api_keys", &format_args!("[{} redacted]", self.api_keys.len()))
            .finish()
    }
}
