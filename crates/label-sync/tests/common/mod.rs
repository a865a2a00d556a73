//! In-memory issue tracker shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use label_sync::{
    Color, Config, Issue, IssueFilter, IssueState, IssueTracker, Label, RepoRef, Taxonomy,
    TrackerError,
};

/// Taxonomy used by most tests.
pub const TAXONOMY: &str = r#"
labels:
  - { name: "waffle:backlog", color: "ededed" }
  - { name: "waffle:next", color: "c5def5" }
  - { name: "waffle:active", color: "0e8a16" }
  - { name: "waffle:review", color: "5319e7" }
  - { name: "waffle:blocked", color: "b60205" }
  - { name: "security", color: "ee0701" }
  - { name: "severity:minor", color: "fbca04" }
deprecated:
  - { from: "waffle:now", to: "waffle:active" }
  - { from: "minor", to: "severity:minor" }
  - { from: "P1" }
lifecycle:
  - "waffle:backlog"
  - "waffle:next"
  - "waffle:active"
  - "waffle:review"
  - "waffle:blocked"
prefixes:
  lifecycle: "waffle:"
  legacy_version: "v0."
"#;

pub fn taxonomy() -> Taxonomy {
    Config::from_yaml(TAXONOMY).unwrap().taxonomy
}

pub fn repo(name: &str) -> RepoRef {
    name.parse().unwrap()
}

pub fn names(labels: &[&str]) -> Vec<String> {
    labels.iter().map(ToString::to_string).collect()
}

/// A call received by the fake tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListLabels { repo: String },
    CreateLabel { repo: String, name: String, color: String },
    UpdateLabel { repo: String, old_name: String, name: String, color: String },
    DeleteLabel { repo: String, name: String },
    ListIssues { repo: String, label: String },
    EditIssue { repo: String, number: u64, labels: Vec<String> },
}

impl Call {
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::ListLabels { .. } | Self::ListIssues { .. })
    }
}

#[derive(Debug, Clone)]
struct FakeIssue {
    labels: Vec<String>,
    open: bool,
}

#[derive(Debug, Default)]
struct RepoState {
    labels: Vec<Label>,
    issues: BTreeMap<u64, FakeIssue>,
}

type FailWhen = Arc<dyn Fn(&Call) -> bool + Send + Sync>;

#[derive(Default)]
struct State {
    repos: HashMap<String, RepoState>,
    calls: Vec<Call>,
    fail_when: Option<FailWhen>,
    loose_filter: bool,
}

/// Tracker keeping repositories in memory and recording every call.
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect the other.
#[derive(Clone, Default)]
pub struct FakeTracker {
    state: Arc<Mutex<State>>,
}

fn same(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn api_error(status: u16, message: &str) -> TrackerError {
    TrackerError::Api {
        status,
        message: message.to_string(),
    }
}

impl FakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(self, repo: &str, name: &str, color: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .repos
            .entry(repo.to_string())
            .or_default()
            .labels
            .push(Label {
                name: name.to_string(),
                color: color.to_string(),
            });
        self
    }

    pub fn with_issue(self, repo: &str, number: u64, labels: &[&str]) -> Self {
        self.insert_issue(repo, number, labels, true)
    }

    /// Make `list_issues` ignore the label filter, so it also returns issues
    /// that do not carry the queried label.
    pub fn with_loose_filter(self) -> Self {
        self.state.lock().unwrap().loose_filter = true;
        self
    }

    pub fn with_closed_issue(self, repo: &str, number: u64, labels: &[&str]) -> Self {
        self.insert_issue(repo, number, labels, false)
    }

    fn insert_issue(self, repo: &str, number: u64, labels: &[&str], open: bool) -> Self {
        self.state
            .lock()
            .unwrap()
            .repos
            .entry(repo.to_string())
            .or_default()
            .issues
            .insert(
                number,
                FakeIssue {
                    labels: names(labels),
                    open,
                },
            );
        self
    }

    /// Make every call matching `predicate` fail with a 500.
    pub fn fail_when(self, predicate: impl Fn(&Call) -> bool + Send + Sync + 'static) -> Self {
        self.state.lock().unwrap().fail_when = Some(Arc::new(predicate));
        self
    }

    pub fn labels(&self, repo: &str) -> Vec<Label> {
        self.state
            .lock()
            .unwrap()
            .repos
            .get(repo)
            .map(|r| r.labels.clone())
            .unwrap_or_default()
    }

    pub fn label_names(&self, repo: &str) -> Vec<String> {
        self.labels(repo).into_iter().map(|l| l.name).collect()
    }

    pub fn issue_labels(&self, repo: &str, number: u64) -> Vec<String> {
        self.state.lock().unwrap().repos[repo].issues[&number]
            .labels
            .clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_write).collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Record a call, failing it if a failure predicate matches.
    fn record(&self, call: Call) -> Result<(), TrackerError> {
        let mut state = self.state.lock().unwrap();
        let fail = state.fail_when.as_ref().is_some_and(|f| f(&call));
        state.calls.push(call);
        if fail {
            Err(api_error(500, "injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn list_labels(&self, repo: &RepoRef) -> Result<Vec<Label>, TrackerError> {
        self.record(Call::ListLabels {
            repo: repo.to_string(),
        })?;
        Ok(self.labels(&repo.to_string()))
    }

    async fn create_label(
        &self,
        repo: &RepoRef,
        name: &str,
        color: &Color,
    ) -> Result<(), TrackerError> {
        self.record(Call::CreateLabel {
            repo: repo.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        })?;

        let mut state = self.state.lock().unwrap();
        let labels = &mut state.repos.entry(repo.to_string()).or_default().labels;
        if labels.iter().any(|l| same(&l.name, name)) {
            return Err(api_error(422, "Validation Failed"));
        }
        labels.push(Label {
            name: name.to_string(),
            color: color.to_string(),
        });
        Ok(())
    }

    async fn update_label(
        &self,
        repo: &RepoRef,
        old_name: &str,
        name: &str,
        color: &Color,
    ) -> Result<(), TrackerError> {
        self.record(Call::UpdateLabel {
            repo: repo.to_string(),
            old_name: old_name.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        })?;

        let mut state = self.state.lock().unwrap();
        let label = state
            .repos
            .entry(repo.to_string())
            .or_default()
            .labels
            .iter_mut()
            .find(|l| same(&l.name, old_name))
            .ok_or_else(|| api_error(404, "Not Found"))?;
        label.name = name.to_string();
        label.color = color.to_string();
        Ok(())
    }

    async fn delete_label(&self, repo: &RepoRef, name: &str) -> Result<(), TrackerError> {
        self.record(Call::DeleteLabel {
            repo: repo.to_string(),
            name: name.to_string(),
        })?;

        let mut state = self.state.lock().unwrap();
        let repo_state = state.repos.entry(repo.to_string()).or_default();
        repo_state.labels.retain(|l| !same(&l.name, name));
        for issue in repo_state.issues.values_mut() {
            issue.labels.retain(|l| !same(l, name));
        }
        Ok(())
    }

    async fn list_issues(
        &self,
        repo: &RepoRef,
        filter: &IssueFilter,
    ) -> Result<Vec<Issue>, TrackerError> {
        self.record(Call::ListIssues {
            repo: repo.to_string(),
            label: filter.label.clone(),
        })?;

        let state = self.state.lock().unwrap();
        let Some(repo_state) = state.repos.get(&repo.to_string()) else {
            return Ok(vec![]);
        };

        Ok(repo_state
            .issues
            .iter()
            .filter(|(_, issue)| match filter.state {
                IssueState::Open => issue.open,
                IssueState::Closed => !issue.open,
                IssueState::All => true,
            })
            .filter(|(_, issue)| {
                state.loose_filter || issue.labels.iter().any(|l| same(l, &filter.label))
            })
            .map(|(number, issue)| Issue {
                number: *number,
                labels: issue.labels.clone(),
            })
            .collect())
    }

    async fn edit_issue_labels(
        &self,
        repo: &RepoRef,
        number: u64,
        labels: &[String],
    ) -> Result<(), TrackerError> {
        self.record(Call::EditIssue {
            repo: repo.to_string(),
            number,
            labels: labels.to_vec(),
        })?;

        let mut state = self.state.lock().unwrap();
        let issue = state
            .repos
            .entry(repo.to_string())
            .or_default()
            .issues
            .get_mut(&number)
            .ok_or_else(|| api_error(404, "Not Found"))?;
        issue.labels = labels.to_vec();
        Ok(())
    }
}
