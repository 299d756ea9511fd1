//! Identifier types shared across all jirabot crates.

pub mod types;

pub use types::{RoomId, UserId};
