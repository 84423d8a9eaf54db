//! Inbound webhook events.
//!
//! A webhook request body is an envelope `{"destination": ..., "events": [...]}`.
//! Each event is tagged by its `type` field; message events are further
//! tagged by `message.type`. Kinds this crate does not model deserialize to
//! [`Event::Unknown`] or [`MessageContent::Unsupported`] so a new platform
//! event never fails a whole batch.
//!
//! ```rust
//! use line_webhook_rs::event::{parse_events, Event, MessageContent};
//!
//! let body = br#"{
//!     "destination": "U0123",
//!     "events": [{
//!         "type": "message",
//!         "replyToken": "nHuyWiB7yP5Zw52FIkcQobQuGDXCTA",
//!         "timestamp": 1462629479859,
//!         "source": {"type": "user", "userId": "U4af4980629"},
//!         "message": {"type": "text", "id": "325708", "text": "menu"}
//!     }]
//! }"#;
//!
//! let events = parse_events(body).unwrap();
//! match &events[0] {
//!     Event::Message(event) => {
//!         assert!(matches!(&event.message, MessageContent::Text(t) if t.text == "menu"));
//!     }
//!     _ => unreachable!(),
//! }
//! ```

use std::collections::HashMap;

use serde::Deserialize;
use tracing::warn;

use crate::error::{ParseError, WebhookError};

/// The webhook request envelope.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct WebhookPayload {
    /// User ID of the bot that should receive the events.
    pub destination: Option<String>,

    /// Decoded events in delivery order. Empty for the console's
    /// verification ping.
    pub events: Vec<Event>,

    /// Entries of the `events` array that could not be decoded. They are
    /// logged and dropped; their siblings are kept.
    pub malformed: usize,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    destination: Option<String>,
    events: Vec<serde_json::Value>,
}

/// Parses a raw webhook body into its envelope.
///
/// Only a body that is not JSON or lacks the `events` array fails. Each
/// event is decoded on its own, so one unreadable entry never costs the
/// rest of the batch.
pub fn parse_payload(body: &[u8]) -> Result<WebhookPayload, WebhookError> {
    let envelope: Envelope = serde_json::from_slice(body).map_err(|err| {
        WebhookError::MalformedPayload(ParseError {
            source: Some(err.into()),
            body: String::from_utf8_lossy(body).into_owned(),
        })
    })?;

    let mut events = Vec::with_capacity(envelope.events.len());
    let mut malformed = 0;
    for (index, raw) in envelope.events.into_iter().enumerate() {
        match serde_json::from_value::<Event>(raw) {
            Ok(event) => events.push(event),
            Err(error) => {
                warn!(index, %error, "skipping undecodable webhook event");
                malformed += 1;
            }
        }
    }

    Ok(WebhookPayload {
        destination: envelope.destination,
        events,
        malformed,
    })
}

/// Parses a raw webhook body into its events.
///
/// Fails with [`WebhookError::MalformedPayload`] when the body is not JSON or
/// has no `events` array. Individual events that cannot be decoded are
/// skipped.
pub fn parse_events(body: &[u8]) -> Result<Vec<Event>, WebhookError> {
    parse_payload(body).map(|payload| payload.events)
}

/// LINE webhook event.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
#[non_exhaustive]
pub enum Event {
    /// A user sent a message.
    Message(MessageEvent),

    /// A user pressed a button carrying postback data.
    Postback(PostbackEvent),

    /// Any event kind not modelled here (follow, unfollow, join, ...).
    #[serde(other)]
    Unknown,
}

impl Event {
    /// Short name of the event kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Message(event) => event.message.kind(),
            Event::Postback(_) => "postback",
            Event::Unknown => "unknown",
        }
    }

    /// The context shared by replyable events.
    pub fn context(&self) -> Option<&EventContext> {
        match self {
            Event::Message(event) => Some(&event.context),
            Event::Postback(event) => Some(&event.context),
            Event::Unknown => None,
        }
    }

    /// The single-use reply token, if this event carries one.
    pub fn reply_token(&self) -> Option<&str> {
        self.context().and_then(|ctx| ctx.reply_token.as_deref())
    }
}

/// Metadata carried by every replyable event.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct EventContext {
    /// Token for replying to this event. Single-use and short-lived; the
    /// platform rejects reuse. Absent for events received in standby mode.
    #[serde(default)]
    pub reply_token: Option<String>,

    /// Who sent the event.
    #[serde(default)]
    pub source: Option<Source>,

    /// When the event occurred, in milliseconds since the unix epoch.
    #[serde(default)]
    pub timestamp: i64,

    #[serde(default)]
    pub mode: Option<ChannelMode>,

    /// Unique id of this webhook event, stable across redeliveries.
    #[serde(default)]
    pub webhook_event_id: Option<String>,

    #[serde(default)]
    pub delivery_context: Option<DeliveryContext>,
}

impl EventContext {
    /// Builds a context for a reply token with no other metadata.
    pub fn new(reply_token: impl Into<String>) -> Self {
        Self {
            reply_token: Some(reply_token.into()),
            source: None,
            timestamp: 0,
            mode: None,
            webhook_event_id: None,
            delivery_context: None,
        }
    }

    /// Whether the platform flagged this event as a redelivery.
    pub fn is_redelivery(&self) -> bool {
        self.delivery_context
            .as_ref()
            .is_some_and(|ctx| ctx.is_redelivery)
    }
}

/// Channel state when the event was sent.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ChannelMode {
    Active,
    Standby,
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct DeliveryContext {
    #[serde(default)]
    pub is_redelivery: bool,
}

/// Origin of an event.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
#[non_exhaustive]
pub enum Source {
    User {
        user_id: String,
    },
    Group {
        group_id: String,
        user_id: Option<String>,
    },
    Room {
        room_id: String,
        user_id: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl Source {
    /// The sending user, when the platform disclosed it.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Source::User { user_id } => Some(user_id),
            Source::Group { user_id, .. } | Source::Room { user_id, .. } => user_id.as_deref(),
            Source::Unknown => None,
        }
    }
}

/// A message received from a user.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct MessageEvent {
    #[serde(flatten)]
    pub context: EventContext,

    pub message: MessageContent,
}

/// Message content, tagged by `type`.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
#[non_exhaustive]
pub enum MessageContent {
    Text(TextContent),
    Sticker(StickerContent),
    Image(ImageContent),

    /// Video, audio, file, location... not handled by this bot.
    #[serde(other)]
    Unsupported,
}

impl MessageContent {
    fn kind(&self) -> &'static str {
        match self {
            MessageContent::Text(_) => "message/text",
            MessageContent::Sticker(_) => "message/sticker",
            MessageContent::Image(_) => "message/image",
            MessageContent::Unsupported => "message/unsupported",
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct TextContent {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub quote_token: Option<String>,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct StickerContent {
    pub id: String,
    pub package_id: String,
    pub sticker_id: String,
}

/// An image message. The binary itself is fetched separately through the
/// content API; only the reference arrives in the webhook.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ImageContent {
    pub id: String,
    #[serde(default)]
    pub content_provider: Option<ContentProvider>,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ContentProvider {
    /// `line` when the binary is hosted by LINE, `external` otherwise.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub original_content_url: Option<String>,
    #[serde(default)]
    pub preview_image_url: Option<String>,
}

/// A button press carrying application-defined data.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct PostbackEvent {
    #[serde(flatten)]
    pub context: EventContext,

    pub postback: Postback,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct Postback {
    /// The opaque string set when the button was authored.
    pub data: String,

    /// Picker results (`date`, `time`, `datetime`...), when present.
    #[serde(default)]
    pub params: HashMap<String, String>,
}
