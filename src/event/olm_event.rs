use crate::{DeviceId, Event, EventContent, FingerprintKey, IdentityKey, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fingerprint keys named inside an Olm payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OlmEventKeys {
    /// Ed25519 fingerprint key.
    pub ed25519: FingerprintKey,
}

/// The plaintext carried inside an Olm ciphertext, as sent on the wire.
///
/// Sender and recipient are repeated inside the encrypted payload so the
/// receiver can check them against the transport sender and its own identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OlmPayload {
    /// Claimed sending user.
    pub sender: UserId,
    /// Claimed sending device.
    pub sender_device: DeviceId,
    /// Claimed sender fingerprint key.
    pub keys: OlmEventKeys,
    /// Intended recipient user.
    pub recipient: UserId,
    /// Intended recipient fingerprint key.
    pub recipient_keys: OlmEventKeys,
    /// Inner event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Inner event content.
    pub content: serde_json::Value,
}

/// A decrypted and authenticated Olm event.
#[derive(Clone, Debug, PartialEq)]
pub struct DecryptedOlmEvent {
    /// The transport event this was decrypted from.
    pub source: Arc<Event>,
    /// Curve25519 identity key of the sending device.
    pub sender_key: IdentityKey,

    /// Sending user, equal to the transport sender.
    pub sender: UserId,
    /// Sending device as claimed by the payload.
    pub sender_device: DeviceId,
    /// Sender fingerprint key as claimed by the payload.
    pub keys: OlmEventKeys,
    /// Recipient user, equal to our own user id.
    pub recipient: UserId,
    /// Recipient fingerprint key, equal to our own fingerprint key.
    pub recipient_keys: OlmEventKeys,

    /// Inner event type.
    pub event_type: String,
    /// Parsed inner content.
    pub content: EventContent,
}
