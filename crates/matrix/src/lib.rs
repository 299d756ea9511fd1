//! Matrix transport for jirabot.
//!
//! Implements [`jirabot_channels::Transport`] on top of the Matrix
//! client-server API: password login, long-poll `/sync`, join and send.
//! Encryption is out of scope; the bot only works in unencrypted rooms.

pub mod client;
pub mod error;
pub mod outbound;
pub mod sync;

pub use {
    client::MatrixClient,
    error::{Error, Result},
};
