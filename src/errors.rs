//! Unified application error type.
//! All modules (db, core, cli, platform) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Storage
    // ---------------------------
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Storage unavailable: database not found at {0} (run `clientclock init`)")]
    StorageUnavailable(String),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Validation
    // ---------------------------
    #[error(
        "Invalid client name: '{0}' (expected lowercase letters and digits separated by single hyphens, e.g. 'acme' or 'acme-corp')"
    )]
    InvalidClient(String),

    #[error("Client workspace not found: '{0}' (create it before starting a session)")]
    WorkspaceMissing(String),

    #[error("Invalid session id: {0}")]
    InvalidSession(i64),

    // ---------------------------
    // Process control
    // ---------------------------
    #[error("Failed to spawn tracking daemon: {0}")]
    DaemonSpawn(String),

    #[error("Tracking daemon error: {0}")]
    Daemon(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration format error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
