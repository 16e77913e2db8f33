use crate::{FingerprintKey, UserId};

/// A boxed error raised by an injected primitive or store.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while decrypting an Olm-encrypted event.
///
/// Every variant is terminal for the event being decrypted: no partially
/// validated payload is ever returned alongside an error.
#[derive(thiserror::Error, Debug)]
pub enum DecryptError {
    /// The event content could not be parsed as encrypted content.
    #[error("event content is not valid encrypted content")]
    InvalidEncryptedContent(#[source] serde_json::Error),

    /// The Olm algorithm was declared but the ciphertext is not a recipient map.
    #[error("olm event has a megolm-shaped ciphertext")]
    IncorrectEncryptedContentType,

    /// The algorithm tag is not the Olm algorithm.
    #[error("unsupported event encryption algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// No ciphertext is addressed to our identity key.
    #[error("olm event doesn't contain ciphertext for this device")]
    NotEncryptedForMe,

    /// The per-recipient message type is neither pre-key nor normal.
    #[error("unsupported olm message type: {0}")]
    UnsupportedOlmMessageType(serde_json::Number),

    /// Stored sessions for the sender could not be loaded.
    #[error("failed to get sessions for {sender_key}")]
    SessionLookup {
        /// Sender identity key whose sessions were requested.
        sender_key: String,
        /// Underlying store failure.
        #[source]
        source: BoxError,
    },

    /// The structural pre-key match check itself failed.
    #[error("failed to check if ciphertext matches inbound session")]
    InboundSessionMatch(#[source] BoxError),

    /// A session structurally matched the pre-key message but could not decrypt it.
    #[error("failed to decrypt olm event: decryption failed with matching session")]
    DecryptionFailedWithMatchingSession,

    /// No stored session decrypted a normal message, and normal messages
    /// cannot create sessions.
    #[error("failed to decrypt olm event: decryption failed for normal message")]
    DecryptionFailedForNormalMessage,

    /// The account could not create an inbound session from the pre-key message.
    #[error("failed to create new session from prekey message")]
    CreateInboundSession(#[source] BoxError),

    /// The account's consumed one-time key could not be persisted.
    #[error("failed to persist account after creating inbound session")]
    PersistAccount(#[source] BoxError),

    /// A session created from the pre-key message could not decrypt it.
    ///
    /// The sender's device is marked for unwedging, like every other
    /// session-desync failure. Implementations that only unwedge on
    /// stored-session failures do not do this. The new session is still
    /// stored.
    #[error("failed to decrypt olm event with session created from prekey message")]
    DecryptWithNewSession(#[source] BoxError),

    /// The decrypted plaintext is not a valid Olm payload.
    #[error("failed to parse olm payload")]
    MalformedPayload(#[source] serde_json::Error),

    /// The payload's sender differs from the transport sender.
    #[error("mismatched sender in olm payload: expected {expected}, found {found}")]
    SenderMismatch {
        /// Sender reported by the transport.
        expected: UserId,
        /// Sender claimed inside the payload.
        found: UserId,
    },

    /// The payload is addressed to another user.
    #[error("mismatched recipient in olm payload: expected {expected}, found {found}")]
    RecipientMismatch {
        /// Our own user id.
        expected: UserId,
        /// Recipient claimed inside the payload.
        found: UserId,
    },

    /// The payload names a different recipient fingerprint key.
    #[error("mismatched recipient key in olm payload: expected {expected}, found {found}")]
    RecipientKeyMismatch {
        /// Our own fingerprint key.
        expected: FingerprintKey,
        /// Recipient key claimed inside the payload.
        found: FingerprintKey,
    },

    /// The inner content of a recognised event type is malformed.
    #[error("failed to parse content of olm payload event {event_type}")]
    MalformedContent {
        /// Declared inner event type.
        event_type: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Broad classes of [`DecryptError`], by what the caller should do about them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The event is not something this device can decrypt.
    Input,
    /// The payload decrypted but failed identity checks.
    Authentication,
    /// The Olm session with the sender is out of sync; the device was marked
    /// for unwedging.
    SessionDesync,
    /// A store, primitive or payload-structure failure.
    Infrastructure,
}

impl DecryptError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEncryptedContent(_)
            | Self::IncorrectEncryptedContentType
            | Self::UnsupportedAlgorithm(_)
            | Self::NotEncryptedForMe
            | Self::UnsupportedOlmMessageType(_) => ErrorKind::Input,
            Self::SenderMismatch { .. }
            | Self::RecipientMismatch { .. }
            | Self::RecipientKeyMismatch { .. } => ErrorKind::Authentication,
            Self::DecryptionFailedWithMatchingSession
            | Self::DecryptionFailedForNormalMessage
            | Self::CreateInboundSession(_)
            | Self::PersistAccount(_)
            | Self::DecryptWithNewSession(_) => ErrorKind::SessionDesync,
            Self::SessionLookup { .. }
            | Self::InboundSessionMatch(_)
            | Self::MalformedPayload(_)
            | Self::MalformedContent { .. } => ErrorKind::Infrastructure,
        }
    }

    /// Whether this error means the sender's device was marked for unwedging.
    pub fn is_session_desync(&self) -> bool {
        self.kind() == ErrorKind::SessionDesync
    }
}
