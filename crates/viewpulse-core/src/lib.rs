pub mod app_config;
pub mod config;
pub mod embeds;
pub mod milestones;
pub mod snapshots;

pub use app_config::{AppConfig, Environment, DEFAULT_WATCH_URL};
pub use config::{load_app_config, load_app_config_from_env};
pub use embeds::{ClickEvent, Embed};
pub use milestones::{Milestone, MilestoneUpdate, NewMilestone};
pub use snapshots::Snapshot;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
