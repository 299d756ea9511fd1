use {jirabot_channels::OutboundMessage, serde::Serialize};

/// `msgtype` used for everything the bot sends. `m.notice` marks the message
/// as automated, and other bots must not answer it.
pub const BOT_MSGTYPE: &str = "m.notice";

const HTML_FORMAT: &str = "org.matrix.custom.html";

/// `m.room.message` content as sent to the homeserver.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MessageContent<'a> {
    pub msgtype: &'static str,
    pub body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_body: Option<&'a str>,
}

impl<'a> From<&'a OutboundMessage> for MessageContent<'a> {
    fn from(message: &'a OutboundMessage) -> Self {
        Self {
            msgtype: BOT_MSGTYPE,
            body: &message.plain_body,
            format: message.html_body.as_ref().map(|_| HTML_FORMAT),
            formatted_body: message.html_body.as_deref(),
        }
    }
}
