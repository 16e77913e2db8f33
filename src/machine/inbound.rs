use crate::{DecryptError, IdentityKey, OlmAccount, OlmSession, SessionStore};

/// Creates an inbound session from a pre-key message.
///
/// The account is persisted before the session is returned, so the consumed
/// one-time key is on disk before anything relies on the session. A persist
/// failure drops the session.
pub(crate) fn create_inbound_session<A: OlmAccount>(
    account: &A,
    sender_key: &IdentityKey,
    ciphertext: &str,
) -> Result<A::Session, DecryptError> {
    let session = account
        .new_inbound_session_from(sender_key, ciphertext)
        .map_err(|err| DecryptError::CreateInboundSession(Box::new(err)))?;

    account
        .persist()
        .map_err(|err| DecryptError::PersistAccount(Box::new(err)))?;

    tracing::info!(
        sender_key = %sender_key,
        session_id = %session.session_id(),
        "Created inbound olm session from pre-key message"
    );

    Ok(session)
}

/// Hands a newly created session to the store.
///
/// A store failure is only logged: the session already did its job for the
/// current message and is lost on restart.
pub(crate) fn store_inbound_session<S: SessionStore>(
    store: &S,
    sender_key: &IdentityKey,
    session: S::Session,
) {
    let session_id = session.session_id();
    if let Err(err) = store.add_session(sender_key, session) {
        tracing::error!(
            sender_key = %sender_key,
            session_id = %session_id,
            "Failed to store created inbound session: {}",
            err
        );
    }
}
