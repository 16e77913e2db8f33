use crate::{
    ApprovalEventContent, DummyContent, ForwardedRoomKeyContent, MessageContent, RoomKeyContent,
    RoomKeyRequestContent,
};
use serde_json::Value;
use std::collections::HashMap;

/// Event type of [`RoomKeyContent`].
pub const ROOM_KEY_EVENT_TYPE: &str = "m.room_key";
/// Event type of [`RoomKeyRequestContent`].
pub const ROOM_KEY_REQUEST_EVENT_TYPE: &str = "m.room_key_request";
/// Event type of [`ForwardedRoomKeyContent`].
pub const FORWARDED_ROOM_KEY_EVENT_TYPE: &str = "m.forwarded_room_key";
/// Event type of [`DummyContent`].
pub const DUMMY_EVENT_TYPE: &str = "m.dummy";
/// Event type of [`MessageContent`].
pub const ROOM_MESSAGE_EVENT_TYPE: &str = "m.room.message";
/// Event type of [`ApprovalEventContent`].
pub const APPROVAL_EVENT_TYPE: &str = "m.approval";

/// Parsed inner content of a decrypted Olm payload, keyed by its declared type.
#[derive(Clone, Debug, PartialEq)]
pub enum EventContent {
    /// `m.room_key`
    RoomKey(RoomKeyContent),
    /// `m.room_key_request`
    RoomKeyRequest(RoomKeyRequestContent),
    /// `m.forwarded_room_key`
    ForwardedRoomKey(ForwardedRoomKeyContent),
    /// `m.dummy`
    Dummy(DummyContent),
    /// `m.room.message`
    RoomMessage(MessageContent),
    /// Approval decision.
    Approval(ApprovalEventContent),
    /// A type this registry does not know, kept as raw JSON.
    Unknown(Value),
}

impl EventContent {
    /// Whether the content was kept raw because its type is unknown.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

/// Parses raw content of one event type.
pub type ContentParser = fn(Value) -> Result<EventContent, serde_json::Error>;

/// Maps event type strings to content parsers.
///
/// Types without a parser are not an error: their content is returned as
/// [`EventContent::Unknown`] so newer event types still reach the caller.
#[derive(Clone, Debug)]
pub struct ContentRegistry {
    parsers: HashMap<String, ContentParser>,
}

impl ContentRegistry {
    /// Creates a registry with no known types.
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Registers (or replaces) the parser for `event_type`.
    pub fn register(&mut self, event_type: impl Into<String>, parser: ContentParser) {
        self.parsers.insert(event_type.into(), parser);
    }

    /// Whether `event_type` has a parser.
    pub fn is_registered(&self, event_type: &str) -> bool {
        self.parsers.contains_key(event_type)
    }

    /// Parses `content` as `event_type`.
    ///
    /// Fails only when the type is registered and the content doesn't fit it.
    pub fn parse(&self, event_type: &str, content: Value) -> Result<EventContent, serde_json::Error> {
        match self.parsers.get(event_type) {
            Some(parser) => parser(content),
            None => Ok(EventContent::Unknown(content)),
        }
    }
}

impl Default for ContentRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(ROOM_KEY_EVENT_TYPE, |v| {
            serde_json::from_value(v).map(EventContent::RoomKey)
        });
        registry.register(ROOM_KEY_REQUEST_EVENT_TYPE, |v| {
            serde_json::from_value(v).map(EventContent::RoomKeyRequest)
        });
        registry.register(FORWARDED_ROOM_KEY_EVENT_TYPE, |v| {
            serde_json::from_value(v).map(EventContent::ForwardedRoomKey)
        });
        registry.register(DUMMY_EVENT_TYPE, |v| {
            serde_json::from_value(v).map(EventContent::Dummy)
        });
        registry.register(ROOM_MESSAGE_EVENT_TYPE, |v| {
            serde_json::from_value(v).map(EventContent::RoomMessage)
        });
        registry.register(APPROVAL_EVENT_TYPE, |v| {
            serde_json::from_value(v).map(EventContent::Approval)
        });
        registry
    }
}
