//! Dry-run decorator: reads go to the wrapped tracker, writes are only logged.

use async_trait::async_trait;
use tracing::info;

use crate::config::Color;
use crate::error::TrackerError;
use crate::tracker::{Issue, IssueFilter, IssueTracker, Label, RepoRef};

/// Wraps a tracker so that no write reaches it.
///
/// Since writes are not applied, later reads still see the old state. The
/// lifecycle collapse may therefore report the same issue more than once.
pub struct DryRun<T> {
    inner: T,
}

impl<T: IssueTracker> DryRun<T> {
    #[must_use]
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: IssueTracker> IssueTracker for DryRun<T> {
    async fn list_labels(&self, repo: &RepoRef) -> Result<Vec<Label>, TrackerError> {
        self.inner.list_labels(repo).await
    }

    async fn create_label(
        &self,
        repo: &RepoRef,
        name: &str,
        color: &Color,
    ) -> Result<(), TrackerError> {
        info!(dry_run = true, repository = %repo, label = %name, color = %color, "Would create label");
        Ok(())
    }

    async fn update_label(
        &self,
        repo: &RepoRef,
        old_name: &str,
        name: &str,
        color: &Color,
    ) -> Result<(), TrackerError> {
        info!(
            dry_run = true,
            repository = %repo,
            label = %old_name,
            new_name = %name,
            color = %color,
            "Would update label"
        );
        Ok(())
    }

    async fn delete_label(&self, repo: &RepoRef, name: &str) -> Result<(), TrackerError> {
        info!(dry_run = true, repository = %repo, label = %name, "Would delete label");
        Ok(())
    }

    async fn list_issues(
        &self,
        repo: &RepoRef,
        filter: &IssueFilter,
    ) -> Result<Vec<Issue>, TrackerError> {
        self.inner.list_issues(repo, filter).await
    }

    async fn edit_issue_labels(
        &self,
        repo: &RepoRef,
        number: u64,
        labels: &[String],
    ) -> Result<(), TrackerError> {
        info!(
            dry_run = true,
            repository = %repo,
            issue = number,
            labels = ?labels,
            "Would set issue labels"
        );
        Ok(())
    }
}
