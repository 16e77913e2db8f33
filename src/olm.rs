//! Seams to the Olm cryptographic primitives.
//!
//! The ratchet itself lives behind these traits; this crate only decides
//! which session to use and what to do when none works.

use crate::{IdentityKey, IdentityKeys, OlmMessageType};

/// A double-ratchet session with exactly one peer identity key.
///
/// Decrypting advances the ratchet, successful or not, so a session must
/// only be handed to one decryption at a time.
pub trait OlmSession {
    /// Error raised by the primitive.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Identifier used in logs.
    fn session_id(&self) -> String;

    /// Whether a pre-key ciphertext was created for this session.
    ///
    /// A structural check on the embedded keys; it does not decrypt and does
    /// not change the session.
    fn matches_inbound_session(&self, ciphertext: &str) -> Result<bool, Self::Error>;

    /// Decrypts `ciphertext`, advancing the ratchet.
    fn decrypt(
        &mut self,
        ciphertext: &str,
        message_type: OlmMessageType,
    ) -> Result<Vec<u8>, Self::Error>;
}

/// The local Olm account: long-term keys and the pool of one-time keys.
///
/// Methods take `&self`; implementations own their synchronization. Callers
/// must still not create two inbound sessions for the same sender at once.
pub trait OlmAccount {
    /// Sessions created by this account.
    type Session: OlmSession;
    /// Error raised by the primitive.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The account's public fingerprint and identity keys.
    fn identity_keys(&self) -> IdentityKeys;

    /// Creates an inbound session from a pre-key message sent by `sender_key`.
    ///
    /// Consumes the one-time key the message references. The caller must
    /// [`persist`](Self::persist) the account before trusting the session.
    fn new_inbound_session_from(
        &self,
        sender_key: &IdentityKey,
        ciphertext: &str,
    ) -> Result<Self::Session, Self::Error>;

    /// Durably records the account state, including consumed one-time keys.
    fn persist(&self) -> Result<(), Self::Error>;
}
