//! GitHub issue tracker.
//!
//! Implements the [`IssueTracker`](crate::tracker::IssueTracker) trait over the
//! GitHub REST API. Lists are paged to completion; an exhausted rate limit is
//! reported as [`TrackerError::RateLimited`](crate::error::TrackerError) and
//! never waited out.

mod client;
mod models;

pub use client::{GitHubTracker, DEFAULT_API_URL};
