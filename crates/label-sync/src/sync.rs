//! Sync driver: runs the reconciliation passes over each repository.
//!
//! Repositories are processed one at a time in configuration order. For each
//! one the selected passes run in fixed order (provision, migrate, prune).
//! The first error stops the run: no further passes and no further
//! repositories. Writes already made stay in place; every pass is idempotent
//! so a re-run picks up where the failed one stopped.

use std::fmt;
use std::ops::AddAssign;

use serde::Serialize;
use tracing::info;

use crate::config::Taxonomy;
use crate::error::{SyncError, TrackerError};
use crate::tracker::{IssueTracker, RepoRef};
use crate::{migrate, provision, prune};

/// A reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Pass {
    /// Create missing labels and fix colors
    Provision,
    /// Move issues off deprecated labels and collapse lifecycle labels
    Migrate,
    /// Delete obsolete labels
    Prune,
}

impl Pass {
    /// Every pass, in execution order.
    pub const ALL: [Self; 3] = [Self::Provision, Self::Migrate, Self::Prune];

    async fn run(
        self,
        tracker: &dyn IssueTracker,
        taxonomy: &Taxonomy,
        repo: &RepoRef,
    ) -> Result<SyncReport, TrackerError> {
        match self {
            Self::Provision => provision::reconcile_labels(tracker, taxonomy, repo).await,
            Self::Migrate => migrate::migrate_issues(tracker, taxonomy, repo).await,
            Self::Prune => prune::prune_labels(tracker, taxonomy, repo).await,
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provision => write!(f, "provision"),
            Self::Migrate => write!(f, "migrate"),
            Self::Prune => write!(f, "prune"),
        }
    }
}

/// Counts of the writes made by one or more passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Labels created
    pub created: usize,
    /// Labels recolored or renamed
    pub updated: usize,
    /// Issues moved off a deprecated label
    pub migrated: usize,
    /// Issues reduced to one lifecycle label
    pub collapsed: usize,
    /// Labels deleted
    pub deleted: usize,
}

impl SyncReport {
    /// Total number of writes.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.created + self.updated + self.migrated + self.collapsed + self.deleted
    }
}

impl AddAssign for SyncReport {
    fn add_assign(&mut self, rhs: Self) {
        self.created += rhs.created;
        self.updated += rhs.updated;
        self.migrated += rhs.migrated;
        self.collapsed += rhs.collapsed;
        self.deleted += rhs.deleted;
    }
}

/// Result of syncing one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoReport {
    pub repository: RepoRef,
    #[serde(flatten)]
    pub report: SyncReport,
}

/// Runs the selected passes against a tracker.
pub struct SyncRunner {
    tracker: Box<dyn IssueTracker>,
    taxonomy: Taxonomy,
    passes: Vec<Pass>,
}

impl SyncRunner {
    /// A runner executing every pass.
    #[must_use]
    pub fn new(tracker: impl IssueTracker + 'static, taxonomy: Taxonomy) -> Self {
        Self {
            tracker: Box::new(tracker),
            taxonomy,
            passes: Pass::ALL.to_vec(),
        }
    }

    /// Restrict the run to `passes`. They still execute in fixed order; an
    /// empty selection keeps every pass.
    #[must_use]
    pub fn with_passes(mut self, passes: &[Pass]) -> Self {
        if !passes.is_empty() {
            self.passes = Pass::ALL
                .into_iter()
                .filter(|p| passes.contains(p))
                .collect();
        }
        self
    }

    #[must_use]
    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    #[must_use]
    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Sync one repository.
    ///
    /// # Errors
    /// Returns `SyncError::Pass` naming the first pass that failed.
    pub async fn sync_repository(&self, repo: &RepoRef) -> Result<SyncReport, SyncError> {
        let mut total = SyncReport::default();

        for &pass in &self.passes {
            info!(repository = %repo, pass = %pass, "Starting pass");
            let report = pass
                .run(self.tracker.as_ref(), &self.taxonomy, repo)
                .await
                .map_err(|source| SyncError::Pass {
                    repository: repo.clone(),
                    pass,
                    source,
                })?;
            total += report;
        }

        Ok(total)
    }

    /// Sync every repository in order, stopping at the first failure.
    ///
    /// # Errors
    /// Returns the error of the first failing repository; repositories after
    /// it are not touched.
    pub async fn run(&self, repositories: &[RepoRef]) -> Result<Vec<RepoReport>, SyncError> {
        let mut reports = Vec::with_capacity(repositories.len());

        for repo in repositories {
            let report = self.sync_repository(repo).await?;
            info!(
                repository = %repo,
                created = report.created,
                updated = report.updated,
                migrated = report.migrated,
                collapsed = report.collapsed,
                deleted = report.deleted,
                "Repository synced"
            );
            reports.push(RepoReport {
                repository: repo.clone(),
                report,
            });
        }

        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_accumulates() {
        let mut total = SyncReport {
            created: 2,
            ..SyncReport::default()
        };
        total += SyncReport {
            created: 1,
            deleted: 3,
            ..SyncReport::default()
        };
        assert_eq!(total.created, 3);
        assert_eq!(total.deleted, 3);
        assert_eq!(total.writes(), 6);
    }

    #[test]
    fn test_pass_display_and_order() {
        assert_eq!(Pass::Provision.to_string(), "provision");
        assert_eq!(
            Pass::ALL,
            [Pass::Provision, Pass::Migrate, Pass::Prune]
        );
    }
}
