use crate::{DecryptError, IdentityKey, OlmMessageType, OlmSession, SessionStore};
use zeroize::Zeroizing;

/// Result of trying a sender's stored sessions against one ciphertext.
#[derive(Debug)]
pub(crate) enum TrialOutcome {
    /// A session decrypted the ciphertext.
    Decrypted(Zeroizing<Vec<u8>>),
    /// No session decrypted it and none was shown to be the right one.
    Inconclusive,
    /// The session the pre-key message was created for failed to decrypt it.
    MatchingSessionFailed {
        /// The matching session.
        session_id: String,
    },
}

/// Tries the stored sessions of `sender_key` in store order.
pub(crate) fn try_decrypt<S: SessionStore>(
    store: &S,
    sender_key: &IdentityKey,
    message_type: OlmMessageType,
    ciphertext: &str,
) -> Result<TrialOutcome, DecryptError> {
    store
        .with_sessions(sender_key, |sessions| {
            try_sessions(sessions, message_type, ciphertext)
        })
        .map_err(|err| DecryptError::SessionLookup {
            sender_key: sender_key.to_string(),
            source: Box::new(err),
        })?
}

/// Pre-key messages are only tried on the session they structurally match,
/// and that match is taken as the only candidate: its failure ends the trial.
/// Normal messages carry nothing to match on, so every session is tried
/// until one succeeds.
fn try_sessions<T: OlmSession>(
    sessions: &mut [T],
    message_type: OlmMessageType,
    ciphertext: &str,
) -> Result<TrialOutcome, DecryptError> {
    for session in sessions.iter_mut() {
        if message_type == OlmMessageType::PreKey {
            let matches = session
                .matches_inbound_session(ciphertext)
                .map_err(|err| DecryptError::InboundSessionMatch(Box::new(err)))?;
            if !matches {
                continue;
            }
        }

        match session.decrypt(ciphertext, message_type) {
            Ok(plaintext) => {
                tracing::debug!(session_id = %session.session_id(), "Decrypted olm message with stored session");
                return Ok(TrialOutcome::Decrypted(Zeroizing::new(plaintext)));
            }
            Err(err) if message_type == OlmMessageType::PreKey => {
                tracing::debug!(session_id = %session.session_id(), error = %err, "Matching session failed to decrypt pre-key message");
                return Ok(TrialOutcome::MatchingSessionFailed {
                    session_id: session.session_id(),
                });
            }
            Err(err) => {
                tracing::debug!(session_id = %session.session_id(), error = %err, "Stored session could not decrypt normal message");
            }
        }
    }

    Ok(TrialOutcome::Inconclusive)
}
