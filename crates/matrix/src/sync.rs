//! `/sync` response wire types and their classification into transport
//! events.

use std::collections::BTreeMap;

use {
    jirabot_channels::{MembershipEvent, MessageEvent, TransportEvent},
    jirabot_common::{RoomId, UserId},
    serde::Deserialize,
    serde_json::Value,
    tracing::debug,
};

#[derive(Debug, Default, Deserialize)]
pub struct SyncResponse {
    pub next_batch: String,
    #[serde(default)]
    pub rooms: Rooms,
}

/// Room sections keyed by room ID. `BTreeMap` gives a stable visiting order.
#[derive(Debug, Default, Deserialize)]
pub struct Rooms {
    #[serde(default)]
    pub join: BTreeMap<String, JoinedRoom>,
    #[serde(default)]
    pub invite: BTreeMap<String, InvitedRoom>,
    #[serde(default)]
    pub leave: BTreeMap<String, LeftRoom>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinedRoom {
    #[serde(default)]
    pub timeline: Timeline,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvitedRoom {
    #[serde(default)]
    pub invite_state: Timeline,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeftRoom {
    #[serde(default)]
    pub timeline: Timeline,
}

#[derive(Debug, Default, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub state_key: Option<String>,
    #[serde(default)]
    pub content: Value,
}

impl RawEvent {
    fn membership(&self) -> Option<&str> {
        if self.event_type != "m.room.member" {
            return None;
        }
        self.content.get("membership").and_then(Value::as_str)
    }

    fn is_member_event_for(&self, user_id: &UserId, membership: &[&str]) -> bool {
        self.state_key.as_deref() == Some(user_id.as_str())
            && self.membership().is_some_and(|m| membership.contains(&m))
    }

    /// Text body of an `m.room.message`, skipping notices from other bots.
    fn message_body(&self) -> Option<&str> {
        if self.event_type != "m.room.message" {
            return None;
        }
        let msgtype = self.content.get("msgtype").and_then(Value::as_str);
        if msgtype == Some("m.notice") {
            return None;
        }
        self.content.get("body").and_then(Value::as_str)
    }
}

/// Turn one sync response into transport events.
///
/// Order: joined rooms' messages, then departures, then invitations. A room
/// the bot was kicked from and re-invited to within one batch therefore ends
/// up invited, which is what the server reports as current state.
pub fn classify(
    response: &SyncResponse,
    own_user_id: &UserId,
    include_messages: bool,
) -> Vec<TransportEvent> {
    let mut events = Vec::new();

    if include_messages {
        for (room_id, room) in &response.rooms.join {
            for raw in &room.timeline.events {
                if let Some(body) = raw.message_body() {
                    events.push(TransportEvent::Message(MessageEvent {
                        room: RoomId::from(room_id.as_str()),
                        sender: UserId::from(raw.sender.as_str()),
                        body: body.to_string(),
                    }));
                }
            }
        }
    }

    for (room_id, room) in &response.rooms.leave {
        let removed_by = room
            .timeline
            .events
            .iter()
            .rev()
            .find(|raw| raw.is_member_event_for(own_user_id, &["leave", "ban"]))
            .map(|raw| raw.sender.as_str());
        debug!(room = %room_id, ?removed_by, "left room");
        events.push(TransportEvent::Membership(MembershipEvent::Kicked {
            room: RoomId::from(room_id.as_str()),
            actor: own_user_id.clone(),
        }));
    }

    for (room_id, room) in &response.rooms.invite {
        let invite = room
            .invite_state
            .events
            .iter()
            .find(|raw| raw.is_member_event_for(own_user_id, &["invite"]));
        let Some(invite) = invite else {
            debug!(room = %room_id, "invite section without a member event for us");
            continue;
        };
        debug!(room = %room_id, inviter = %invite.sender, "invited to room");
        events.push(TransportEvent::Membership(MembershipEvent::Invited {
            room: RoomId::from(room_id.as_str()),
            actor: own_user_id.clone(),
        }));
    }

    events
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    const BOT: &str = "@jirabot:example.org";

    fn bot() -> UserId {
        UserId::from(BOT)
    }

    fn parse(value: Value) -> SyncResponse {
        serde_json::from_value(value).unwrap()
    }

    fn text(sender: &str, body: &str) -> Value {
        json!({
            "type": "m.room.message",
            "sender": sender,
            "event_id": "$x",
            "content": { "msgtype": "m.text", "body": body }
        })
    }

    fn member(state_key: &str, sender: &str, membership: &str) -> Value {
        json!({
            "type": "m.room.member",
            "sender": sender,
            "state_key": state_key,
            "content": { "membership": membership }
        })
    }

    #[test]
    fn empty_response_has_no_events() {
        let response = parse(json!({ "next_batch": "s1" }));
        assert!(classify(&response, &bot(), true).is_empty());
        assert_eq!(response.next_batch, "s1");
    }

    #[test]
    fn timeline_messages_keep_their_order() {
        let response = parse(json!({
            "next_batch": "s2",
            "rooms": { "join": { "!a:example.org": { "timeline": { "events": [
                text("@alice:example.org", "first"),
                member("@bob:example.org", "@bob:example.org", "join"),
                text("@bob:example.org", "second"),
            ]}}}}
        }));

        let events = classify(&response, &bot(), true);
        assert_eq!(
            events,
            vec![
                TransportEvent::Message(MessageEvent {
                    room: "!a:example.org".into(),
                    sender: "@alice:example.org".into(),
                    body: "first".into(),
                }),
                TransportEvent::Message(MessageEvent {
                    room: "!a:example.org".into(),
                    sender: "@bob:example.org".into(),
                    body: "second".into(),
                }),
            ]
        );
    }

    #[test]
    fn notices_and_non_text_events_are_skipped() {
        let response = parse(json!({
            "next_batch": "s3",
            "rooms": { "join": { "!a:example.org": { "timeline": { "events": [
                { "type": "m.room.message", "sender": "@other-bot:example.org",
                  "content": { "msgtype": "m.notice", "body": "!jira show A-1" } },
                { "type": "m.reaction", "sender": "@alice:example.org", "content": {} },
                { "type": "m.room.message", "sender": "@alice:example.org",
                  "content": { "msgtype": "m.image", "url": "mxc://x" } },
            ]}}}}
        }));
        assert!(classify(&response, &bot(), true).is_empty());
    }

    #[test]
    fn invite_for_bot_becomes_invited() {
        let response = parse(json!({
            "next_batch": "s4",
            "rooms": { "invite": { "!abc:example.org": { "invite_state": { "events": [
                member(BOT, "@alice:example.org", "invite"),
            ]}}}}
        }));
        assert_eq!(
            classify(&response, &bot(), true),
            vec![TransportEvent::Membership(MembershipEvent::Invited {
                room: "!abc:example.org".into(),
                actor: bot(),
            })]
        );
    }

    #[test]
    fn invite_state_without_our_member_event_is_ignored() {
        let response = parse(json!({
            "next_batch": "s5",
            "rooms": { "invite": { "!abc:example.org": { "invite_state": { "events": [
                member("@someone:example.org", "@alice:example.org", "invite"),
            ]}}}}
        }));
        assert!(classify(&response, &bot(), true).is_empty());
    }

    #[test]
    fn left_room_becomes_kicked() {
        let response = parse(json!({
            "next_batch": "s6",
            "rooms": { "leave": { "!gone:example.org": { "timeline": { "events": [
                member(BOT, "@admin:example.org", "leave"),
            ]}}}}
        }));
        assert_eq!(
            classify(&response, &bot(), true),
            vec![TransportEvent::Membership(MembershipEvent::Kicked {
                room: "!gone:example.org".into(),
                actor: bot(),
            })]
        );
    }

    #[test]
    fn leave_is_ordered_before_invite() {
        let response = parse(json!({
            "next_batch": "s7",
            "rooms": {
                "invite": { "!r:example.org": { "invite_state": { "events": [
                    member(BOT, "@admin:example.org", "invite"),
                ]}}},
                "leave": { "!r:example.org": {} }
            }
        }));
        let events = classify(&response, &bot(), true);
        assert!(matches!(
            events.as_slice(),
            [
                TransportEvent::Membership(MembershipEvent::Kicked { .. }),
                TransportEvent::Membership(MembershipEvent::Invited { .. }),
            ]
        ));
    }

    #[test]
    fn messages_can_be_dropped_while_membership_is_kept() {
        let response = parse(json!({
            "next_batch": "s8",
            "rooms": {
                "join": { "!a:example.org": { "timeline": { "events": [
                    text("@alice:example.org", "!jira show OLD-1"),
                ]}}},
                "invite": { "!b:example.org": { "invite_state": { "events": [
                    member(BOT, "@alice:example.org", "invite"),
                ]}}}
            }
        }));
        let events = classify(&response, &bot(), false);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], TransportEvent::Membership(_)));
    }
}
