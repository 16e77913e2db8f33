//! Session storage
//!
//! Sessions are grouped by the sender's identity key and kept in insertion
//! order. The store owns every session; decryption borrows a sender's
//! sessions exclusively through [`SessionStore::with_sessions`].

mod memory;
pub use memory::MemorySessionStore;

use crate::{IdentityKey, OlmSession};

/// Errors raised by a [`SessionStore`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend failed to read or write.
    #[error("session store backend failure: {0}")]
    Backend(String),

    /// Stored session data could not be decoded.
    #[error("stored session for {sender_key} is corrupted: {reason}")]
    Corrupted {
        /// Sender identity key of the corrupted entry.
        sender_key: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Persistent collection of Olm sessions per sender identity key.
///
/// Append-only as far as decryption is concerned: sessions are added, never
/// removed.
pub trait SessionStore {
    /// Stored session type.
    type Session: OlmSession;

    /// Runs `f` over the sessions stored for `sender_key`, in store order.
    ///
    /// An empty slice means no sessions are known. Any state `f` changes on
    /// the sessions is kept by the store.
    ///
    /// # Invariants
    ///
    /// - Order is stable for the duration of `f`
    /// - No other caller observes the sessions while `f` runs
    fn with_sessions<R>(
        &self,
        sender_key: &IdentityKey,
        f: impl FnOnce(&mut [Self::Session]) -> R,
    ) -> Result<R, StoreError>;

    /// Appends a session for `sender_key`.
    fn add_session(&self, sender_key: &IdentityKey, session: Self::Session)
    -> Result<(), StoreError>;
}
