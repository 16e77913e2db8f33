use crate::{DeviceId, IdentityKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `m.room_key`: a Megolm session key shared with this device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomKeyContent {
    /// Group encryption algorithm.
    pub algorithm: String,
    /// Room the session belongs to.
    pub room_id: String,
    /// Megolm session id.
    pub session_id: String,
    /// Exported session key.
    pub session_key: String,
}

/// `m.room_key_request`: another device asks for, or cancels a request for,
/// a room key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomKeyRequestContent {
    /// `request` or `request_cancellation`.
    pub action: String,
    /// Device that made the request.
    pub requesting_device_id: DeviceId,
    /// Request id, unique per requesting device.
    pub request_id: String,
    /// The requested key; absent on cancellations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestedKeyInfo>,
}

/// Identifies a requested room key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedKeyInfo {
    /// Group encryption algorithm.
    pub algorithm: String,
    /// Room the session belongs to.
    pub room_id: String,
    /// Identity key of the session creator.
    pub sender_key: IdentityKey,
    /// Megolm session id.
    pub session_id: String,
}

/// `m.forwarded_room_key`: a room key forwarded by another device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardedRoomKeyContent {
    /// Group encryption algorithm.
    pub algorithm: String,
    /// Room the session belongs to.
    pub room_id: String,
    /// Identity key of the session creator.
    pub sender_key: IdentityKey,
    /// Megolm session id.
    pub session_id: String,
    /// Exported session key.
    pub session_key: String,
    /// Fingerprint key the session creator claimed.
    pub sender_claimed_ed25519_key: String,
    /// Identity keys of every device the key passed through.
    #[serde(default)]
    pub forwarding_curve25519_key_chain: Vec<IdentityKey>,
}

/// `m.dummy`: carries nothing; used to ratchet a session forward after
/// unwedging.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DummyContent {}

/// `m.room.message`: a plain message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageContent {
    /// Message kind such as `m.text`.
    pub msgtype: String,
    /// Plain text body.
    pub body: String,
    /// Any other fields, kept as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Approval decision sent to a bot over an encrypted channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEventContent {
    /// Free text reason for the decision.
    #[serde(rename = "dealReason")]
    pub reason: String,
    /// Schema of the approval.
    pub schema_type: String,
    /// Selected answers.
    #[serde(rename = "org.matrix.msc3381.poll.response")]
    pub response: ApprovalResponse,
}

/// Answers of an approval.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalResponse {
    /// Identifiers of the chosen answers.
    pub answers: Vec<String>,
}
