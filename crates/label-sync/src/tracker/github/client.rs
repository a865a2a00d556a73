//! GitHub REST API client implementation.
//!
//! API Documentation: <https://docs.github.com/en/rest/issues/labels>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::models::{
    CreateLabelRequest, GitHubError, GitHubIssue, GitHubLabel, SetLabelsRequest,
    UpdateLabelRequest,
};
use crate::config::Color;
use crate::error::TrackerError;
use crate::tracker::{Issue, IssueFilter, IssueTracker, Label, RepoRef};

/// Base URL for the public GitHub API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Page size for list endpoints (GitHub's maximum).
const PER_PAGE: usize = 100;

/// REST API version header value.
const API_VERSION: &str = "2022-11-28";

/// Wait assumed when a rate-limited response carries no reset hint.
const FALLBACK_RESET_SECS: u64 = 60;

/// GitHub issue tracker.
#[derive(Clone)]
pub struct GitHubTracker {
    /// HTTP client.
    client: Client,
    /// API root, e.g. `https://api.github.com`.
    base_url: Url,
    /// Personal access or app token.
    token: Option<String>,
}

impl GitHubTracker {
    /// Create a new GitHub tracker.
    ///
    /// # Arguments
    /// * `token` - API token; without one only public reads succeed
    /// * `base_url` - API root, [`DEFAULT_API_URL`] for github.com
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the HTTP client cannot be created.
    pub fn new(token: Option<String>, base_url: &str) -> Result<Self, TrackerError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(TrackerError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .user_agent(concat!("label-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Build `{base}/repos/{owner}/{name}/{segments...}`, percent-encoding
    /// every segment.
    fn repo_url(&self, repo: &RepoRef, segments: &[&str]) -> Result<Url, TrackerError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| TrackerError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["repos", repo.owner.as_str(), repo.name.as_str()])
            .extend(segments);
        Ok(url)
    }

    /// Start an authenticated request.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(method = %method, url = %url, "GitHub request");

        let request = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);

        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request, turning an exhausted rate limit into an error.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, TrackerError> {
        let response = request.send().await?;

        if let Some(remaining) = header_value::<i64>(response.headers(), "x-ratelimit-remaining") {
            debug!(remaining, "GitHub rate limit");
        }

        if let Some(reset_in) = rate_limit_reset(response.status(), response.headers()) {
            warn!(reset_in = ?reset_in, "GitHub rate limit exhausted");
            return Err(TrackerError::RateLimited { reset_in });
        }

        Ok(response)
    }

    /// Send a request that must succeed, discarding the body.
    async fn execute_ok(&self, request: RequestBuilder) -> Result<(), TrackerError> {
        let response = self.execute(request).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }

    /// Fetch every page of a list endpoint.
    async fn get_all<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, TrackerError> {
        let mut items = Vec::new();
        let mut page: u32 = 1;

        loop {
            let mut page_url = url.clone();
            page_url
                .query_pairs_mut()
                .extend_pairs(query)
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let response = self.execute(self.request(Method::GET, page_url)).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(api_error(response).await);
            }

            let text = response.text().await?;
            let batch: Vec<T> = serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, "Failed to parse GitHub response");
                TrackerError::Serialization(e)
            })?;

            let last_page = batch.len() < PER_PAGE;
            items.extend(batch);
            if last_page {
                break;
            }
            page += 1;
        }

        Ok(items)
    }
}

#[async_trait]
impl IssueTracker for GitHubTracker {
    async fn list_labels(&self, repo: &RepoRef) -> Result<Vec<Label>, TrackerError> {
        let url = self.repo_url(repo, &["labels"])?;
        let labels: Vec<GitHubLabel> = self.get_all(url, &[]).await?;
        debug!(repository = %repo, count = labels.len(), "Fetched labels");
        Ok(labels.into_iter().map(Label::from).collect())
    }

    async fn create_label(
        &self,
        repo: &RepoRef,
        name: &str,
        color: &Color,
    ) -> Result<(), TrackerError> {
        let url = self.repo_url(repo, &["labels"])?;
        let body = CreateLabelRequest {
            name,
            color: color.as_str(),
        };
        self.execute_ok(self.request(Method::POST, url).json(&body))
            .await
    }

    async fn update_label(
        &self,
        repo: &RepoRef,
        old_name: &str,
        name: &str,
        color: &Color,
    ) -> Result<(), TrackerError> {
        let url = self.repo_url(repo, &["labels", old_name])?;
        let body = UpdateLabelRequest {
            new_name: name,
            color: color.as_str(),
        };
        self.execute_ok(self.request(Method::PATCH, url).json(&body))
            .await
    }

    async fn delete_label(&self, repo: &RepoRef, name: &str) -> Result<(), TrackerError> {
        let url = self.repo_url(repo, &["labels", name])?;
        let response = self.execute(self.request(Method::DELETE, url)).await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == StatusCode::NOT_FOUND {
            debug!(repository = %repo, label = %name, "Label already deleted");
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }

    async fn list_issues(
        &self,
        repo: &RepoRef,
        filter: &IssueFilter,
    ) -> Result<Vec<Issue>, TrackerError> {
        let url = self.repo_url(repo, &["issues"])?;
        let state = filter.state.to_string();
        let query = [("labels", filter.label.as_str()), ("state", state.as_str())];

        let issues: Vec<GitHubIssue> = self.get_all(url, &query).await?;
        debug!(
            repository = %repo,
            label = %filter.label,
            count = issues.len(),
            "Fetched issues"
        );
        Ok(issues.into_iter().map(Issue::from).collect())
    }

    async fn edit_issue_labels(
        &self,
        repo: &RepoRef,
        number: u64,
        labels: &[String],
    ) -> Result<(), TrackerError> {
        let number = number.to_string();
        let url = self.repo_url(repo, &["issues", number.as_str(), "labels"])?;
        let body = SetLabelsRequest { labels };
        self.execute_ok(self.request(Method::PUT, url).json(&body))
            .await
    }
}

/// Parse a numeric response header.
fn header_value<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<T>().ok())
}

/// Time until the rate limit resets, if this response was rate limited.
///
/// GitHub answers 403 or 429 with `x-ratelimit-remaining: 0` for the primary
/// limit and with `retry-after` for secondary limits.
fn rate_limit_reset(status: StatusCode, headers: &HeaderMap) -> Option<Duration> {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    if let Some(secs) = header_value::<u64>(headers, header::RETRY_AFTER.as_str()) {
        return Some(Duration::from_secs(secs));
    }

    if header_value::<i64>(headers, "x-ratelimit-remaining") != Some(0) {
        return None;
    }

    let secs = header_value::<i64>(headers, "x-ratelimit-reset").map_or(
        FALLBACK_RESET_SECS,
        |reset| {
            let now = chrono::Utc::now().timestamp();
            #[allow(clippy::cast_sign_loss)]
            let until_reset = (reset - now).max(0) as u64;
            until_reset
        },
    );
    Some(Duration::from_secs(secs))
}

/// Build an API error from a failed response, preferring GitHub's message.
async fn api_error(response: Response) -> TrackerError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GitHubError>(&text)
        .map(|e| e.message)
        .unwrap_or(text);
    TrackerError::Api { status, message }
}
