//! # Label Pruner
//!
//! Deletes labels that fell out of the taxonomy. A label is obsolete when it
//! is not specified and either carries a reserved prefix or is listed as
//! deprecated.

use tracing::info;

use crate::config::{has_prefix, Taxonomy};
use crate::error::TrackerError;
use crate::sync::SyncReport;
use crate::tracker::{IssueTracker, Label, RepoRef};

/// Whether a label should be deleted. Specified labels never are.
#[must_use]
pub fn is_obsolete(taxonomy: &Taxonomy, name: &str) -> bool {
    if taxonomy.is_specified(name) {
        return false;
    }

    taxonomy.prefixes().iter().any(|prefix| has_prefix(name, prefix))
        || taxonomy.is_deprecated(name)
}

/// Names of the obsolete labels among `remote`, in the tracker's order.
#[must_use]
pub fn plan_pruning<'a>(taxonomy: &Taxonomy, remote: &'a [Label]) -> Vec<&'a str> {
    remote
        .iter()
        .map(|label| label.name.as_str())
        .filter(|name| is_obsolete(taxonomy, name))
        .collect()
}

/// Delete every obsolete label of `repo`, one at a time.
///
/// # Errors
/// Returns the first tracker error; later deletions do not run.
pub async fn prune_labels(
    tracker: &dyn IssueTracker,
    taxonomy: &Taxonomy,
    repo: &RepoRef,
) -> Result<SyncReport, TrackerError> {
    let remote = tracker.list_labels(repo).await?;
    let mut report = SyncReport::default();

    for name in plan_pruning(taxonomy, &remote) {
        tracker.delete_label(repo, name).await?;
        info!(repository = %repo, label = %name, "Deleted label");
        report.deleted += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Deprecation, LabelSpec, Prefixes};

    fn taxonomy() -> Taxonomy {
        Taxonomy::new(
            vec![
                LabelSpec::new("waffle:active", "0e8a16").unwrap(),
                LabelSpec::new("v0.canonical", "ededed").unwrap(),
                LabelSpec::new("security", "ee0701").unwrap(),
            ],
            vec![
                Deprecation::replaced("waffle:now", "waffle:active"),
                Deprecation::removed("P1"),
            ],
            vec!["waffle:active".to_string()],
            Prefixes {
                lifecycle: Some("waffle:".to_string()),
                legacy_version: Some("v0.".to_string()),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_obsolete_rules() {
        let taxonomy = taxonomy();

        assert!(is_obsolete(&taxonomy, "waffle:in progress"));
        assert!(is_obsolete(&taxonomy, "v0.old-status"));
        assert!(is_obsolete(&taxonomy, "P1"));
        assert!(is_obsolete(&taxonomy, "p1"));
        assert!(is_obsolete(&taxonomy, "waffle:now"));

        assert!(!is_obsolete(&taxonomy, "waffle:active"));
        assert!(!is_obsolete(&taxonomy, "v0.canonical"));
        assert!(!is_obsolete(&taxonomy, "Security"));
        assert!(!is_obsolete(&taxonomy, "enhancement"));
    }

    #[test]
    fn test_plan_pruning_keeps_remote_order() {
        let taxonomy = taxonomy();
        let remote: Vec<Label> = ["P1", "bug", "waffle:active", "waffle:ready", "v0.x"]
            .iter()
            .map(|name| Label {
                name: (*name).to_string(),
                color: "ededed".to_string(),
            })
            .collect();

        assert_eq!(
            plan_pruning(&taxonomy, &remote),
            vec!["P1", "waffle:ready", "v0.x"]
        );
    }

    #[test]
    fn test_no_prefixes_means_only_deprecations() {
        let taxonomy = Taxonomy::new(
            vec![],
            vec![Deprecation::removed("P1")],
            vec![],
            Prefixes::default(),
        )
        .unwrap();

        assert!(is_obsolete(&taxonomy, "P1"));
        assert!(!is_obsolete(&taxonomy, "waffle:anything"));
    }
}
