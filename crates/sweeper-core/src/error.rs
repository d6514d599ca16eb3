use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Repo index not found: {}", .0.display())]
    IndexNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
