//! # Issue Migrator
//!
//! Moves open issues off deprecated labels and onto their replacements, then
//! collapses issues carrying several lifecycle-stage labels down to one.
//!
//! Both sub-phases fetch issues fresh for every label they look at and edit
//! issues one at a time. The first failed fetch or edit stops the pass.

use std::fmt;

use tracing::{debug, info};

use crate::config::{same_label, Taxonomy};
use crate::error::TrackerError;
use crate::sync::SyncReport;
use crate::tracker::{IssueFilter, IssueTracker, RepoRef};

/// Why an issue was edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditReason {
    /// A deprecated label was swapped for its replacement.
    Migration,
    /// Extra lifecycle-stage labels were removed.
    Collapse,
}

impl fmt::Display for EditReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Migration => write!(f, "migration"),
            Self::Collapse => write!(f, "collapse"),
        }
    }
}

/// Labels of an issue after replacing `old` with `new`.
///
/// Existing order is kept and `new` is appended only if missing. Returns
/// `None` when the issue does not carry `old` or nothing would change.
#[must_use]
pub fn migrated_labels(current: &[String], old: &str, new: &str) -> Option<Vec<String>> {
    if !current.iter().any(|l| same_label(l, old)) {
        return None;
    }

    let mut labels: Vec<String> = current
        .iter()
        .filter(|l| !same_label(l, old))
        .cloned()
        .collect();
    if !labels.iter().any(|l| same_label(l, new)) {
        labels.push(new.to_string());
    }

    (labels != current).then_some(labels)
}

/// Labels of an issue after dropping every lifecycle label except `stage`.
///
/// Returns `None` when the issue does not carry `stage` or there is nothing
/// to drop.
#[must_use]
pub fn collapsed_labels(current: &[String], stage: &str, taxonomy: &Taxonomy) -> Option<Vec<String>> {
    if !current.iter().any(|l| same_label(l, stage)) {
        return None;
    }

    let (kept, dropped): (Vec<String>, Vec<String>) = current
        .iter()
        .cloned()
        .partition(|l| same_label(l, stage) || !taxonomy.is_lifecycle(l));

    (!dropped.is_empty()).then_some(kept)
}

/// Swap deprecated labels for their replacements on every open issue.
///
/// Deprecations without a replacement are skipped; those labels simply
/// disappear when the pruner deletes them.
///
/// # Errors
/// Returns the first tracker error.
pub async fn migrate_deprecated(
    tracker: &dyn IssueTracker,
    taxonomy: &Taxonomy,
    repo: &RepoRef,
) -> Result<usize, TrackerError> {
    let mut edited = 0;

    for (old, new) in taxonomy.replacements() {
        let issues = tracker
            .list_issues(repo, &IssueFilter::open_with_label(old))
            .await?;
        debug!(repository = %repo, label = %old, count = issues.len(), "Issues to migrate");

        for issue in issues {
            let Some(labels) = migrated_labels(&issue.labels, old, new) else {
                continue;
            };
            tracker.edit_issue_labels(repo, issue.number, &labels).await?;
            info!(
                repository = %repo,
                issue = issue.number,
                reason = %EditReason::Migration,
                from = %old,
                to = %new,
                "Edited issue labels"
            );
            edited += 1;
        }
    }

    Ok(edited)
}

/// Reduce every open issue to a single lifecycle-stage label.
///
/// Stages are visited from last to first in canonical order, so when an issue
/// carries several the one latest in the order is kept. Each edit drops all
/// other stage labels at once, so an issue is edited at most once per run.
///
/// # Errors
/// Returns the first tracker error.
pub async fn collapse_lifecycle(
    tracker: &dyn IssueTracker,
    taxonomy: &Taxonomy,
    repo: &RepoRef,
) -> Result<usize, TrackerError> {
    let mut edited = 0;

    for stage in taxonomy.lifecycle().iter().rev() {
        let issues = tracker
            .list_issues(repo, &IssueFilter::open_with_label(stage.as_str()))
            .await?;

        for issue in issues {
            let Some(labels) = collapsed_labels(&issue.labels, stage, taxonomy) else {
                continue;
            };
            tracker.edit_issue_labels(repo, issue.number, &labels).await?;
            info!(
                repository = %repo,
                issue = issue.number,
                reason = %EditReason::Collapse,
                stage = %stage,
                "Edited issue labels"
            );
            edited += 1;
        }
    }

    Ok(edited)
}

/// Run the deprecated-label migration, then the lifecycle collapse.
///
/// # Errors
/// Returns the first tracker error; a failed migration skips the collapse.
pub async fn migrate_issues(
    tracker: &dyn IssueTracker,
    taxonomy: &Taxonomy,
    repo: &RepoRef,
) -> Result<SyncReport, TrackerError> {
    let migrated = migrate_deprecated(tracker, taxonomy, repo).await?;
    let collapsed = collapse_lifecycle(tracker, taxonomy, repo).await?;

    Ok(SyncReport {
        migrated,
        collapsed,
        ..SyncReport::default()
    })
}
