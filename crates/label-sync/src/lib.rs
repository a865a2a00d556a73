//! Label taxonomy synchronization for GitHub repositories.
//!
//! Three idempotent reconciliation passes converge each repository to a
//! configured label taxonomy:
//!
//! - [`provision`]: create missing labels and fix their colors
//! - [`migrate`]: move issues off deprecated labels and keep a single
//!   lifecycle-stage label per issue
//! - [`prune`]: delete labels that are no longer part of the taxonomy
//!
//! The passes talk to the tracker through the [`IssueTracker`] trait;
//! [`GitHubTracker`] implements it over the GitHub REST API and [`DryRun`]
//! wraps any tracker to suppress writes.
//!
//! # Example
//!
//! ```no_run
//! use label_sync::{Config, GitHubTracker, SyncRunner};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::bundled()?.with_repositories(vec!["acme/widgets".parse()?]);
//! let tracker = GitHubTracker::new(std::env::var("GITHUB_TOKEN").ok(), label_sync::DEFAULT_API_URL)?;
//!
//! let runner = SyncRunner::new(tracker, config.taxonomy);
//! for repo in runner.run(&config.repositories).await? {
//!     println!("{}: {} writes", repo.repository, repo.report.writes());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod migrate;
pub mod provision;
pub mod prune;
pub mod sync;
pub mod tracker;

pub use config::{Color, Config, Deprecation, LabelSpec, Prefixes, Taxonomy};
pub use error::{ConfigError, SyncError, TrackerError};
pub use sync::{Pass, RepoReport, SyncReport, SyncRunner};
pub use tracker::github::DEFAULT_API_URL;
pub use tracker::{DryRun, GitHubTracker, Issue, IssueFilter, IssueState, IssueTracker, Label, RepoRef};
