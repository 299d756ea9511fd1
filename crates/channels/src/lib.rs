//! Chat transport abstraction.
//!
//! A transport (Matrix today) delivers ordered batches of [`TransportEvent`]s
//! and accepts join and send requests. The bridge engine only ever talks to
//! the [`Transport`] trait.

pub mod error;
pub mod event;
pub mod transport;

pub use {
    error::{Error, Result},
    event::{MembershipEvent, MessageEvent, OutboundMessage, TransportEvent},
    transport::Transport,
};
