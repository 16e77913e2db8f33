mod content;
pub use content::*;
mod olm_event;
pub use olm_event::*;
mod to_device;
pub use to_device::*;

use crate::{DecryptError, IdentityKey, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Algorithm tag of Olm-encrypted (device to device) events.
pub const OLM_V1_ALGORITHM: &str = "m.olm.v1.curve25519-aes-sha2";

/// Algorithm tag of Megolm-encrypted (group) events.
pub const MEGOLM_V1_ALGORITHM: &str = "m.megolm.v1.aes-sha2";

/// Event type of encrypted events.
pub const ENCRYPTED_EVENT_TYPE: &str = "m.room.encrypted";

/// An event as delivered by the transport.
///
/// `sender` is authenticated by the homeserver and is what the decrypted
/// payload's claimed sender is checked against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// User that sent the event.
    pub sender: UserId,
    /// Declared outer event type, usually [`ENCRYPTED_EVENT_TYPE`].
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event id, absent for to-device events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Raw event content.
    pub content: Value,
}

impl Event {
    /// Creates an encrypted to-device event from `sender`.
    pub fn encrypted(
        sender: impl Into<UserId>,
        content: &EncryptedEventContent,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            sender: sender.into(),
            event_type: ENCRYPTED_EVENT_TYPE.to_owned(),
            event_id: None,
            content: serde_json::to_value(content)?,
        })
    }
}

/// Content of an encrypted event.
///
/// Only the algorithm tag is common to every algorithm; read it with
/// [`EncryptedEventContent::algorithm_of`] before parsing the rest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncryptedEventContent {
    /// Encryption algorithm tag.
    pub algorithm: String,
    /// Sender's Curve25519 identity key.
    #[serde(alias = "senderKey")]
    pub sender_key: IdentityKey,
    /// Ciphertext, shaped by the algorithm.
    #[serde(alias = "ciphertexts")]
    pub ciphertext: Ciphertext,
}

#[derive(Deserialize)]
struct AlgorithmTag {
    algorithm: String,
}

impl EncryptedEventContent {
    /// Creates Olm content carrying one ciphertext per recipient identity key.
    pub fn olm(
        sender_key: impl Into<IdentityKey>,
        ciphertexts: BTreeMap<IdentityKey, OlmCiphertext>,
    ) -> Self {
        Self {
            algorithm: OLM_V1_ALGORITHM.to_owned(),
            sender_key: sender_key.into(),
            ciphertext: Ciphertext::Olm(
                ciphertexts
                    .into_iter()
                    .map(|(key, ciphertext)| (key, ciphertext.into()))
                    .collect(),
            ),
        }
    }

    /// Reads the algorithm tag of raw encrypted content, ignoring every
    /// other field.
    pub fn algorithm_of(content: &Value) -> Result<String, serde_json::Error> {
        AlgorithmTag::deserialize(content).map(|tag| tag.algorithm)
    }
}

/// Ciphertext of an encrypted event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ciphertext {
    /// Olm: one raw [`OlmCiphertext`] per recipient identity key.
    ///
    /// Entries stay unparsed so a malformed entry for another device does
    /// not affect ours.
    Olm(BTreeMap<IdentityKey, Value>),
    /// Megolm: a single group ciphertext.
    Megolm(String),
}

/// One recipient's Olm ciphertext.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OlmCiphertext {
    /// Raw message type; see [`OlmMessageType`]. Any JSON number is accepted
    /// here and checked later.
    #[serde(rename = "type")]
    pub message_type: Number,
    /// Base64 ciphertext body.
    pub body: String,
}

impl OlmCiphertext {
    /// Creates a ciphertext record of a known message type.
    pub fn new(message_type: OlmMessageType, body: impl Into<String>) -> Self {
        Self {
            message_type: i64::from(message_type).into(),
            body: body.into(),
        }
    }
}

impl From<OlmCiphertext> for Value {
    fn from(ciphertext: OlmCiphertext) -> Self {
        let mut entry = Map::new();
        entry.insert("type".to_owned(), Value::Number(ciphertext.message_type));
        entry.insert("body".to_owned(), Value::String(ciphertext.body));
        Value::Object(entry)
    }
}

/// Olm message types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OlmMessageType {
    /// A message that can establish a new session.
    PreKey,
    /// A message on an established session.
    Normal,
}

impl From<OlmMessageType> for i64 {
    fn from(value: OlmMessageType) -> Self {
        match value {
            OlmMessageType::PreKey => 0,
            OlmMessageType::Normal => 1,
        }
    }
}

impl TryFrom<&Number> for OlmMessageType {
    type Error = DecryptError;

    fn try_from(value: &Number) -> Result<Self, Self::Error> {
        match value.as_i64() {
            Some(0) => Ok(Self::PreKey),
            Some(1) => Ok(Self::Normal),
            _ => Err(DecryptError::UnsupportedOlmMessageType(value.clone())),
        }
    }
}
