//! Issue tracker abstractions.

mod dry_run;
pub mod github;
mod traits;

pub use dry_run::DryRun;
pub use github::GitHubTracker;
pub use traits::{Issue, IssueFilter, IssueState, IssueTracker, Label, RepoRef};
