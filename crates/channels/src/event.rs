use jirabot_common::{RoomId, UserId};

/// One classified event delivered by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Membership(MembershipEvent),
    Message(MessageEvent),
}

impl TransportEvent {
    /// Room the event belongs to.
    pub fn room(&self) -> &RoomId {
        match self {
            Self::Membership(event) => event.room(),
            Self::Message(event) => &event.room,
        }
    }
}

/// A change of room membership. `actor` is the member whose state changed,
/// so the bot only reacts when it is its own user ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipEvent {
    Invited { room: RoomId, actor: UserId },
    Kicked { room: RoomId, actor: UserId },
}

impl MembershipEvent {
    pub fn room(&self) -> &RoomId {
        match self {
            Self::Invited { room, .. } | Self::Kicked { room, .. } => room,
        }
    }

    pub fn actor(&self) -> &UserId {
        match self {
            Self::Invited { actor, .. } | Self::Kicked { actor, .. } => actor,
        }
    }
}

/// An inbound text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub room: RoomId,
    pub sender: UserId,
    pub body: String,
}

/// A message to send: always a plain body, optionally an HTML rendering of
/// the same content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub plain_body: String,
    pub html_body: Option<String>,
}

impl OutboundMessage {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            plain_body: body.into(),
            html_body: None,
        }
    }

    pub fn rich(plain: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            plain_body: plain.into(),
            html_body: Some(html.into()),
        }
    }
}

impl From<MembershipEvent> for TransportEvent {
    fn from(event: MembershipEvent) -> Self {
        Self::Membership(event)
    }
}

impl From<MessageEvent> for TransportEvent {
    fn from(event: MessageEvent) -> Self {
        Self::Message(event)
    }
}
