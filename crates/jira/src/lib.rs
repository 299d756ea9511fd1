//! Jira issue lookup.
//!
//! [`IssueTracker`] is the seam the bridge depends on; [`JiraClient`] talks
//! to the Jira REST API (v2) with either a session cookie or basic auth.

pub mod client;
pub mod error;
pub mod tracker;

pub use {
    client::JiraClient,
    error::{Error, Result},
    tracker::{Issue, IssueResult, IssueTracker},
};
