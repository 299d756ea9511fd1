use {async_trait::async_trait, jirabot_common::{RoomId, UserId}};

use crate::{
    Result,
    event::{OutboundMessage, TransportEvent},
};

/// Core transport trait. Each chat network implements this.
///
/// Implementations are constructed (and logged in) once at startup and then
/// shared with the dispatcher; they keep whatever cursor they need to resume
/// event retrieval internally.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The bot's own user ID on this transport.
    fn user_id(&self) -> &UserId;

    /// Wait for the next batch of events.
    ///
    /// Returns `Ok(None)` once the connection is closed for good; the batch
    /// itself is in delivery order and may be empty.
    async fn next_batch(&self) -> Result<Option<Vec<TransportEvent>>>;

    /// Join a room by ID or alias and return the room ID the server
    /// resolved it to.
    async fn join_room(&self, room: &RoomId) -> Result<RoomId>;

    /// Send a message to a room.
    async fn send_message(&self, room: &RoomId, message: &OutboundMessage) -> Result<()>;
}
