//! Event-driven bridge between a chat transport and an issue tracker.
//!
//! The [`EventDispatcher`] pulls ordered event batches from a
//! [`jirabot_channels::Transport`], keeps the room membership ledger in step
//! with invites and kicks, and answers `show` commands with issue summaries
//! looked up through a [`jirabot_jira::IssueTracker`].

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod reply;
pub mod retry;

pub use {
    command::{Command, CommandParser},
    dispatcher::{DispatcherState, EventDispatcher},
    error::{Error, Result},
    reply::ReplyFormatter,
    retry::RetryPolicy,
};
