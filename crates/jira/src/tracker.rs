use async_trait::async_trait;

use crate::Result;

/// The fields of an issue the bot relays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub key: String,
    pub summary: String,
}

/// Outcome of a lookup that reached the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueResult {
    Found(Issue),
    NotFound,
}

/// Issue lookup seam used by the dispatcher.
///
/// `Err` means the tracker could not answer (network, auth, server error);
/// an unknown key is `Ok(IssueResult::NotFound)`.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn lookup(&self, key: &str) -> Result<IssueResult>;
}
