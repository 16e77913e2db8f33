use super::{SessionStore, StoreError};
use crate::{IdentityKey, OlmSession};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// In-memory session store.
///
/// Clones share the same sessions. A single mutex guards every sender, which
/// also satisfies the one-decryption-per-sender requirement for callers that
/// route everything through one store.
pub struct MemorySessionStore<S> {
    inner: Arc<Mutex<HashMap<IdentityKey, Vec<S>>>>,
}

impl<S> MemorySessionStore<S> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of sessions stored for `sender_key`.
    pub fn session_count(&self, sender_key: &IdentityKey) -> usize {
        self.lock().get(sender_key).map_or(0, Vec::len)
    }

    /// Number of sender keys with at least one session.
    pub fn sender_count(&self) -> usize {
        self.lock().len()
    }

    // A panic while holding the lock leaves sessions in whatever state the
    // primitive left them, which is no worse than a failed decrypt.
    fn lock(&self) -> MutexGuard<'_, HashMap<IdentityKey, Vec<S>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S> Clone for MemorySessionStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> Default for MemorySessionStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: OlmSession> SessionStore for MemorySessionStore<S> {
    type Session = S;

    fn with_sessions<R>(
        &self,
        sender_key: &IdentityKey,
        f: impl FnOnce(&mut [S]) -> R,
    ) -> Result<R, StoreError> {
        let mut inner = self.lock();
        match inner.get_mut(sender_key) {
            Some(sessions) => Ok(f(sessions)),
            None => Ok(f(&mut [])),
        }
    }

    fn add_session(&self, sender_key: &IdentityKey, session: S) -> Result<(), StoreError> {
        self.lock()
            .entry(sender_key.clone())
            .or_default()
            .push(session);
        Ok(())
    }
}
