//! # Label Provisioner
//!
//! Makes sure every label of the taxonomy exists on a repository with
//! its specified color. Labels outside the taxonomy are left alone;
//! removing them is the pruner's job.

use tracing::info;

use crate::config::{same_label, Color, Taxonomy};
use crate::error::TrackerError;
use crate::sync::SyncReport;
use crate::tracker::{IssueTracker, Label, RepoRef};

/// One write needed to converge a repository's labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelChange<'a> {
    /// The label does not exist yet.
    Create { name: &'a str, color: &'a Color },
    /// The label exists as `current` but its color or spelling differs.
    Update {
        current: String,
        name: &'a str,
        color: &'a Color,
    },
}

/// Compute the writes that bring `remote` in line with the taxonomy, in
/// taxonomy order.
#[must_use]
pub fn plan_label_changes<'a>(taxonomy: &'a Taxonomy, remote: &[Label]) -> Vec<LabelChange<'a>> {
    taxonomy
        .labels()
        .iter()
        .filter_map(|spec| {
            let existing = remote
                .iter()
                .find(|label| label.name == spec.name)
                .or_else(|| {
                    remote
                        .iter()
                        .find(|label| same_label(&label.name, &spec.name))
                });

            match existing {
                None => Some(LabelChange::Create {
                    name: &spec.name,
                    color: &spec.color,
                }),
                Some(label) if label.name != spec.name || !spec.color.matches(&label.color) => {
                    Some(LabelChange::Update {
                        current: label.name.clone(),
                        name: &spec.name,
                        color: &spec.color,
                    })
                }
                Some(_) => None,
            }
        })
        .collect()
}

/// Create missing labels and fix label colors on `repo`.
///
/// Writes are issued one at a time; the first failure stops the pass and
/// leaves already applied writes in place.
///
/// # Errors
/// Returns the first tracker error.
pub async fn reconcile_labels(
    tracker: &dyn IssueTracker,
    taxonomy: &Taxonomy,
    repo: &RepoRef,
) -> Result<SyncReport, TrackerError> {
    let remote = tracker.list_labels(repo).await?;
    let mut report = SyncReport::default();

    for change in plan_label_changes(taxonomy, &remote) {
        match change {
            LabelChange::Create { name, color } => {
                tracker.create_label(repo, name, color).await?;
                info!(repository = %repo, label = %name, color = %color, "Created label");
                report.created += 1;
            }
            LabelChange::Update {
                current,
                name,
                color,
            } => {
                tracker.update_label(repo, &current, name, color).await?;
                info!(
                    repository = %repo,
                    label = %name,
                    previous = %current,
                    color = %color,
                    "Updated label"
                );
                report.updated += 1;
            }
        }
    }

    Ok(report)
}
