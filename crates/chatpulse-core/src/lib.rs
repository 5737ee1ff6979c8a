//! Shared configuration for the chatpulse workspace.

mod app_config;
mod config;

use thiserror::Error;

pub use app_config::{AppConfig, ClassifierKind, Environment};
pub use config::{load_app_config, load_app_config_from_env};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
