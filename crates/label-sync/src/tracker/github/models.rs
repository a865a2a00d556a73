//! GitHub REST API request and response types.

use serde::{Deserialize, Serialize};

use crate::tracker::{Issue, Label};

/// Label as returned by `GET /repos/{owner}/{repo}/labels`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubLabel {
    pub name: String,
    /// Color hex string without `#` prefix
    pub color: String,
}

impl From<GitHubLabel> for Label {
    fn from(label: GitHubLabel) -> Self {
        Self {
            name: label.name,
            color: label.color,
        }
    }
}

/// Label reference embedded in an issue.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubLabelRef {
    pub name: String,
}

/// Issue as returned by `GET /repos/{owner}/{repo}/issues`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubIssue {
    pub number: u64,
    #[serde(default)]
    pub labels: Vec<GitHubLabelRef>,
}

impl From<GitHubIssue> for Issue {
    fn from(issue: GitHubIssue) -> Self {
        Self {
            number: issue.number,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

/// Body of `POST /repos/{owner}/{repo}/labels`.
#[derive(Debug, Serialize)]
pub struct CreateLabelRequest<'a> {
    pub name: &'a str,
    pub color: &'a str,
}

/// Body of `PATCH /repos/{owner}/{repo}/labels/{name}`.
#[derive(Debug, Serialize)]
pub struct UpdateLabelRequest<'a> {
    pub new_name: &'a str,
    pub color: &'a str,
}

/// Body of `PUT /repos/{owner}/{repo}/issues/{number}/labels`.
#[derive(Debug, Serialize)]
pub struct SetLabelsRequest<'a> {
    pub labels: &'a [String],
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
pub struct GitHubError {
    pub message: String,
}
