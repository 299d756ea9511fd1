//! Durable ledger of the rooms the bot has joined.
//!
//! The ledger is a plain text file with one room ID per line. Additions are
//! appended, removals rewrite the file through a temporary sibling and an
//! atomic rename, so a crash never leaves a half-written ledger behind.

pub mod error;
pub mod store;

pub use {
    error::{Error, Result},
    store::MembershipStore,
};
