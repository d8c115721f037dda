//! Shared error types for the services crate.

use std::time::Duration;

use thiserror::Error;

use storage::StorageError;
use storage::sqlite::SqliteInitError;
use tutor_core::model::ProgressError;

/// Errors emitted by agent clients.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AgentError {
    #[error("agent service is not configured")]
    Disabled,
    #[error("agent request timed out after {0:?}")]
    Timeout(Duration),
    #[error("agent request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("agent transport error: {0}")]
    Transport(String),
}

/// Errors emitted by document-store clients.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocumentError {
    #[error("document store is not configured")]
    Disabled,
    #[error("document store rejected the request: {0}")]
    Rejected(String),
    #[error("document store request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("failed to read upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors emitted by `ProgressTracker`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid agent base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid timeout seconds: {0}")]
    InvalidTimeout(String),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
