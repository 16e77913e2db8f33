//! Fake Olm primitives and store wrappers for tests and fuzzing.
//!
//! A fake ciphertext body is unpadded base64 of a small JSON document naming
//! the session that can decrypt it, the one-time key a pre-key message was
//! built from, and the plaintext. Sessions decrypt a body only if it names
//! them, so which session a message belongs to is fully controlled by the
//! test.

use crate::{
    DeviceId, EncryptedEventContent, Event, FingerprintKey, IdentityKey, IdentityKeys, OlmAccount,
    OlmCiphertext, OlmEventKeys, OlmMessageType, OlmPayload, OlmSession, SessionStore, StoreError,
    UserId,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Errors raised by the fake primitives.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FakeError {
    /// The body is not a fake ciphertext.
    #[error("not a fake olm ciphertext: {0}")]
    Malformed(String),
    /// The body was encrypted for another session.
    #[error("session {0} cannot decrypt this message")]
    WrongSession(String),
    /// The session was told to fail.
    #[error("session {0} is poisoned")]
    Poisoned(String),
    /// The referenced one-time key is unknown or already used.
    #[error("unknown one-time key {0}")]
    UnknownOneTimeKey(String),
    /// The body carries no one-time key.
    #[error("message is not a pre-key message")]
    NotPreKey,
    /// The account was told to fail persisting.
    #[error("account storage unavailable")]
    PersistFailed,
}

/// Contents of a fake ciphertext body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FakeCiphertext {
    /// Session able to decrypt the body.
    pub session_id: String,
    /// One-time key a pre-key message was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_time_key: Option<String>,
    /// The plaintext.
    pub plaintext: String,
}

impl FakeCiphertext {
    /// A pre-key message for the session created from `one_time_key`.
    pub fn pre_key(
        session_id: impl Into<String>,
        one_time_key: impl Into<String>,
        plaintext: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            one_time_key: Some(one_time_key.into()),
            plaintext: plaintext.into(),
        }
    }

    /// A normal message on `session_id`.
    pub fn normal(session_id: impl Into<String>, plaintext: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            one_time_key: None,
            plaintext: plaintext.into(),
        }
    }

    /// Encodes the body as it would travel on the wire.
    pub fn encode(&self) -> String {
        STANDARD_NO_PAD.encode(serde_json::to_vec(self).unwrap_or_default())
    }

    /// Decodes a body produced by [`encode`](Self::encode).
    pub fn decode(body: &str) -> Result<Self, FakeError> {
        let bytes = STANDARD_NO_PAD
            .decode(body)
            .map_err(|e| FakeError::Malformed(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| FakeError::Malformed(e.to_string()))
    }
}

/// A session that decrypts fake ciphertexts naming it.
#[derive(Clone, Debug)]
pub struct FakeSession {
    session_id: String,
    one_time_key: Option<String>,
    poisoned: bool,
    decrypt_attempts: u32,
}

impl FakeSession {
    /// An established session; never matches a pre-key message.
    pub fn established(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            one_time_key: None,
            poisoned: false,
            decrypt_attempts: 0,
        }
    }

    /// A session created from a pre-key message that used `one_time_key`.
    pub fn inbound(session_id: impl Into<String>, one_time_key: impl Into<String>) -> Self {
        Self {
            one_time_key: Some(one_time_key.into()),
            ..Self::established(session_id)
        }
    }

    /// Makes every decrypt fail.
    pub fn poisoned(mut self) -> Self {
        self.poison();
        self
    }

    /// Makes every further decrypt fail.
    pub fn poison(&mut self) {
        self.poisoned = true;
    }

    /// Whether decrypts fail.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Number of decrypt calls, i.e. how far the ratchet was advanced.
    pub fn decrypt_attempts(&self) -> u32 {
        self.decrypt_attempts
    }

    /// One-time key the session was created from.
    pub fn one_time_key(&self) -> Option<&str> {
        self.one_time_key.as_deref()
    }
}

impl OlmSession for FakeSession {
    type Error = FakeError;

    fn session_id(&self) -> String {
        self.session_id.clone()
    }

    fn matches_inbound_session(&self, ciphertext: &str) -> Result<bool, FakeError> {
        let message = FakeCiphertext::decode(ciphertext)?;
        Ok(message.one_time_key.is_some() && message.one_time_key == self.one_time_key)
    }

    fn decrypt(
        &mut self,
        ciphertext: &str,
        _message_type: OlmMessageType,
    ) -> Result<Vec<u8>, FakeError> {
        self.decrypt_attempts += 1;
        let message = FakeCiphertext::decode(ciphertext)?;

        if self.poisoned {
            return Err(FakeError::Poisoned(self.session_id.clone()));
        }
        if message.session_id != self.session_id {
            return Err(FakeError::WrongSession(self.session_id.clone()));
        }

        Ok(message.plaintext.into_bytes())
    }
}

/// Side effects recorded by [`FakeAccount`], in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountEvent {
    /// A one-time key was consumed by a new inbound session.
    OneTimeKeyConsumed(String),
    /// The account was persisted.
    Persisted {
        /// One-time keys left at the time.
        unused_one_time_keys: usize,
    },
}

/// An account with a fixed set of one-time keys.
pub struct FakeAccount {
    keys: IdentityKeys,
    state: Mutex<FakeAccountState>,
}

#[derive(Default)]
struct FakeAccountState {
    one_time_keys: BTreeSet<String>,
    journal: Vec<AccountEvent>,
    fail_persist: bool,
    poison_new_sessions: bool,
}

impl FakeAccount {
    /// Creates an account with no one-time keys.
    pub fn new(keys: IdentityKeys) -> Self {
        Self {
            keys,
            state: Mutex::new(FakeAccountState::default()),
        }
    }

    /// Adds one-time keys.
    pub fn with_one_time_keys<K: Into<String>>(self, keys: impl IntoIterator<Item = K>) -> Self {
        self.lock()
            .one_time_keys
            .extend(keys.into_iter().map(Into::into));
        self
    }

    /// Makes [`OlmAccount::persist`] fail.
    pub fn fail_persist(&self, fail: bool) {
        self.lock().fail_persist = fail;
    }

    /// Makes new inbound sessions fail to decrypt.
    pub fn poison_new_sessions(&self, poison: bool) {
        self.lock().poison_new_sessions = poison;
    }

    /// Whether `one_time_key` is still unused.
    pub fn has_one_time_key(&self, one_time_key: &str) -> bool {
        self.lock().one_time_keys.contains(one_time_key)
    }

    /// Recorded side effects.
    pub fn journal(&self) -> Vec<AccountEvent> {
        self.lock().journal.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeAccountState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OlmAccount for FakeAccount {
    type Session = FakeSession;
    type Error = FakeError;

    fn identity_keys(&self) -> IdentityKeys {
        self.keys.clone()
    }

    fn new_inbound_session_from(
        &self,
        _sender_key: &IdentityKey,
        ciphertext: &str,
    ) -> Result<FakeSession, FakeError> {
        let message = FakeCiphertext::decode(ciphertext)?;
        let one_time_key = message.one_time_key.ok_or(FakeError::NotPreKey)?;

        let mut state = self.lock();
        if !state.one_time_keys.remove(&one_time_key) {
            return Err(FakeError::UnknownOneTimeKey(one_time_key));
        }
        state
            .journal
            .push(AccountEvent::OneTimeKeyConsumed(one_time_key.clone()));

        let mut session = FakeSession::inbound(message.session_id, one_time_key);
        if state.poison_new_sessions {
            session.poison();
        }
        Ok(session)
    }

    fn persist(&self) -> Result<(), FakeError> {
        let mut state = self.lock();
        if state.fail_persist {
            return Err(FakeError::PersistFailed);
        }
        let unused_one_time_keys = state.one_time_keys.len();
        state.journal.push(AccountEvent::Persisted {
            unused_one_time_keys,
        });
        Ok(())
    }
}

/// Store wrapper that fails reads or writes on demand.
#[derive(Clone)]
pub struct FaultyStore<S> {
    inner: S,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    write_attempts: Arc<AtomicUsize>,
}

impl<S> FaultyStore<S> {
    /// Wraps `inner`; nothing fails until told to.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
            write_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Makes [`SessionStore::with_sessions`] fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes [`SessionStore::add_session`] fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `add_session` calls, failed or not.
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: SessionStore> SessionStore for FaultyStore<S> {
    type Session = S::Session;

    fn with_sessions<R>(
        &self,
        sender_key: &IdentityKey,
        f: impl FnOnce(&mut [S::Session]) -> R,
    ) -> Result<R, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected read failure".to_owned()));
        }
        self.inner.with_sessions(sender_key, f)
    }

    fn add_session(&self, sender_key: &IdentityKey, session: S::Session) -> Result<(), StoreError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected write failure".to_owned()));
        }
        self.inner.add_session(sender_key, session)
    }
}

/// Builds the plaintext payload `sender` would encrypt for `recipient`.
pub fn olm_payload(
    sender: &str,
    sender_device: &str,
    recipient: &str,
    recipient_fingerprint: &str,
    event_type: &str,
    content: serde_json::Value,
) -> OlmPayload {
    OlmPayload {
        sender: UserId::from(sender),
        sender_device: DeviceId::from(sender_device),
        keys: OlmEventKeys {
            ed25519: FingerprintKey::from(format!("{sender_device}_ED25519")),
        },
        recipient: UserId::from(recipient),
        recipient_keys: OlmEventKeys {
            ed25519: FingerprintKey::from(recipient_fingerprint),
        },
        event_type: event_type.to_owned(),
        content,
    }
}

/// Wraps one recipient's ciphertext in an encrypted to-device event.
pub fn olm_event(
    sender: &str,
    sender_key: &str,
    recipient_key: &str,
    ciphertext: OlmCiphertext,
) -> Result<Arc<Event>, serde_json::Error> {
    let mut ciphertexts = BTreeMap::new();
    ciphertexts.insert(IdentityKey::from(recipient_key), ciphertext);
    let content = EncryptedEventContent::olm(sender_key, ciphertexts);
    Event::encrypted(sender, &content).map(Arc::new)
}
