//! Issue tracker trait and common types.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, Serializer};

use crate::config::Color;
use crate::error::{ConfigError, TrackerError};

/// A repository, identified as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl FromStr for RepoRef {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(ConfigError::InvalidRepository(s.to_string())),
        }
    }
}

impl Serialize for RepoRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A label as it exists on the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    /// Hex color as reported by the tracker.
    pub color: String,
}

/// An issue and the names of its labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub labels: Vec<String>,
}

/// Issue state filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
    All,
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Which issues to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFilter {
    /// Only issues carrying this label.
    pub label: String,
    pub state: IssueState,
}

impl IssueFilter {
    /// Open issues carrying `label`.
    #[must_use]
    pub fn open_with_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: IssueState::Open,
        }
    }
}

/// Operations the reconciliation passes need from an issue tracker.
///
/// Implementations own authentication, pagination and rate limiting. Every
/// listing is complete and fetched fresh on each call.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// List every label of a repository.
    async fn list_labels(&self, repo: &RepoRef) -> Result<Vec<Label>, TrackerError>;

    /// Create a label.
    async fn create_label(
        &self,
        repo: &RepoRef,
        name: &str,
        color: &Color,
    ) -> Result<(), TrackerError>;

    /// Update the label currently named `old_name`, setting its name and color.
    async fn update_label(
        &self,
        repo: &RepoRef,
        old_name: &str,
        name: &str,
        color: &Color,
    ) -> Result<(), TrackerError>;

    /// Delete a label. Deleting a label that does not exist succeeds.
    async fn delete_label(&self, repo: &RepoRef, name: &str) -> Result<(), TrackerError>;

    /// List the issues matching `filter`.
    async fn list_issues(
        &self,
        repo: &RepoRef,
        filter: &IssueFilter,
    ) -> Result<Vec<Issue>, TrackerError>;

    /// Replace the full label set of an issue.
    async fn edit_issue_labels(
        &self,
        repo: &RepoRef,
        number: u64,
        labels: &[String],
    ) -> Result<(), TrackerError>;
}
