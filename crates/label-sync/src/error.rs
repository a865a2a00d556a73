//! Error types for label synchronization.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::sync::Pass;
use crate::tracker::RepoRef;

/// Errors returned by an issue tracker.
///
/// The reconciliation passes do not distinguish between these: any of them
/// aborts the current pass.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit exhausted
    #[error("Rate limit exceeded, reset in {reset_in:?}")]
    RateLimited { reset_in: Duration },

    /// Response body could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Request URL could not be built
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl From<url::ParseError> for TrackerError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

/// Errors raised while loading or validating the label taxonomy.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid color '{0}': expected six hex digits")]
    InvalidColor(String),

    #[error("Invalid repository '{0}': expected owner/name")]
    InvalidRepository(String),

    #[error("Label '{0}' is specified more than once")]
    DuplicateLabel(String),

    #[error("Label '{0}' is both specified and deprecated")]
    DeprecatedLabelInSpec(String),

    #[error("Deprecated label '{from}' is replaced by '{to}', which is not a specified label")]
    UnknownReplacement { from: String, to: String },

    #[error("Lifecycle label '{0}' is not a specified label")]
    UnknownLifecycleLabel(String),

    #[error("Lifecycle label '{0}' appears more than once")]
    DuplicateLifecycleLabel(String),

    #[error("Label '{0}' contains a comma and cannot be used as an issue filter")]
    CommaInFilterLabel(String),

    #[error("No repositories configured")]
    NoRepositories,
}

/// Error returned by the sync driver: the failing pass and repository.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{pass} pass failed for {repository}: {source}")]
    Pass {
        repository: RepoRef,
        pass: Pass,
        #[source]
        source: TrackerError,
    },
}
