//! Olm event decryption pipeline
//!
//! An encrypted event is checked for shape, then decrypted with one of the
//! sender's stored sessions, or with a new session if it is a pre-key
//! message no stored session claims. The plaintext is authenticated against
//! the transport sender and our own identity before it is returned.
//!
//! Failures that show the session with the sender is out of sync mark the
//! sender's device for unwedging through the [`UnwedgeSink`].
//!
//! # Concurrency
//!
//! Decrypting mutates ratchet state and consumes one-time keys. Callers must
//! not decrypt two events from the same sender identity key at the same
//! time; events from different senders may be decrypted concurrently if the
//! store and account allow it.

mod inbound;
mod trial;

use crate::{
    Ciphertext, ContentRegistry, DecryptError, DecryptedOlmEvent, EncryptedEventContent, Event,
    IdentityKey, MachineConfig, OLM_V1_ALGORITHM, OlmAccount, OlmCiphertext, OlmMessageType,
    OlmPayload, OlmSession, SessionStore, UnwedgeQueue, UnwedgeRequest, UnwedgeSink, UserId,
};
use inbound::{create_inbound_session, store_inbound_session};
use serde::Deserialize;
use std::sync::Arc;
use trial::{TrialOutcome, try_decrypt};
use zeroize::Zeroizing;

/// Decrypts Olm-encrypted events addressed to the local device.
///
/// The account, session store and unwedge sink are injected; the machine
/// keeps no other state.
pub struct OlmMachine<A, S, U = UnwedgeQueue> {
    config: MachineConfig,
    account: A,
    store: S,
    unwedge: U,
    registry: ContentRegistry,
}

impl<A, S, U> OlmMachine<A, S, U>
where
    A: OlmAccount,
    S: SessionStore<Session = A::Session>,
    U: UnwedgeSink,
{
    /// Creates a machine with the default content registry.
    pub fn new(config: MachineConfig, account: A, store: S, unwedge: U) -> Self {
        Self {
            config,
            account,
            store,
            unwedge,
            registry: ContentRegistry::default(),
        }
    }

    /// Replaces the registry used to parse decrypted inner content.
    pub fn with_content_registry(mut self, registry: ContentRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Local identity configuration.
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// The injected account.
    pub fn account(&self) -> &A {
        &self.account
    }

    /// The injected session store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The injected unwedge sink.
    pub fn unwedge(&self) -> &U {
        &self.unwedge
    }

    /// Decrypts an Olm-encrypted event and authenticates its payload.
    ///
    /// # Errors
    ///
    /// See [`DecryptError`]; [`DecryptError::kind`] tells input, authentication,
    /// session-desync and infrastructure failures apart. Session-desync
    /// failures have already marked the sender's device for unwedging.
    pub fn decrypt_olm_event(&self, event: Arc<Event>) -> Result<DecryptedOlmEvent, DecryptError> {
        let _span = tracing::debug_span!(
            "decrypt_olm_event",
            sender = %event.sender,
            device = %self.config.device_id
        )
        .entered();

        let algorithm = EncryptedEventContent::algorithm_of(&event.content)
            .map_err(DecryptError::InvalidEncryptedContent)?;
        if algorithm != OLM_V1_ALGORITHM {
            return Err(DecryptError::UnsupportedAlgorithm(algorithm));
        }

        let content = EncryptedEventContent::deserialize(&event.content)
            .map_err(DecryptError::InvalidEncryptedContent)?;
        let Ciphertext::Olm(ciphertexts) = &content.ciphertext else {
            return Err(DecryptError::IncorrectEncryptedContentType);
        };

        let own_key = self.account.identity_keys().curve25519;
        let own_entry = ciphertexts
            .get(&own_key)
            .ok_or(DecryptError::NotEncryptedForMe)?;
        let own_ciphertext = OlmCiphertext::deserialize(own_entry)
            .map_err(DecryptError::InvalidEncryptedContent)?;
        let message_type = OlmMessageType::try_from(&own_ciphertext.message_type)?;

        let plaintext = self.decrypt_ciphertext(
            &event.sender,
            &content.sender_key,
            message_type,
            &own_ciphertext.body,
        )?;

        self.parse_payload(&event, content.sender_key.clone(), &plaintext)
    }

    fn decrypt_ciphertext(
        &self,
        sender: &UserId,
        sender_key: &IdentityKey,
        message_type: OlmMessageType,
        ciphertext: &str,
    ) -> Result<Zeroizing<Vec<u8>>, DecryptError> {
        match try_decrypt(&self.store, sender_key, message_type, ciphertext)? {
            TrialOutcome::Decrypted(plaintext) => Ok(plaintext),
            TrialOutcome::MatchingSessionFailed { session_id } => {
                tracing::warn!(
                    sender_key = %sender_key,
                    session_id = %session_id,
                    "Found matching session yet decryption failed for sender {}",
                    sender
                );
                self.mark_device_for_unwedging(sender, sender_key);
                Err(DecryptError::DecryptionFailedWithMatchingSession)
            }
            TrialOutcome::Inconclusive => match message_type {
                OlmMessageType::Normal => {
                    tracing::warn!(
                        sender_key = %sender_key,
                        "No stored session could decrypt normal message from {}",
                        sender
                    );
                    self.mark_device_for_unwedging(sender, sender_key);
                    Err(DecryptError::DecryptionFailedForNormalMessage)
                }
                OlmMessageType::PreKey => self.decrypt_with_new_session(sender, sender_key, ciphertext),
            },
        }
    }

    fn decrypt_with_new_session(
        &self,
        sender: &UserId,
        sender_key: &IdentityKey,
        ciphertext: &str,
    ) -> Result<Zeroizing<Vec<u8>>, DecryptError> {
        let mut session = match create_inbound_session(&self.account, sender_key, ciphertext) {
            Ok(session) => session,
            Err(err) => {
                let source: &(dyn std::error::Error + 'static) = &err;
                tracing::warn!(
                    sender_key = %sender_key,
                    error = source,
                    "Inbound session bootstrap failed"
                );
                self.mark_device_for_unwedging(sender, sender_key);
                return Err(err);
            }
        };

        let decrypted = session.decrypt(ciphertext, OlmMessageType::PreKey);
        store_inbound_session(&self.store, sender_key, session);

        match decrypted {
            Ok(plaintext) => Ok(Zeroizing::new(plaintext)),
            Err(err) => {
                let source: &(dyn std::error::Error + 'static) = &err;
                tracing::warn!(
                    sender_key = %sender_key,
                    error = source,
                    "Session created from pre-key message failed to decrypt it"
                );
                self.mark_device_for_unwedging(sender, sender_key);
                Err(DecryptError::DecryptWithNewSession(Box::new(err)))
            }
        }
    }

    fn parse_payload(
        &self,
        event: &Arc<Event>,
        sender_key: IdentityKey,
        plaintext: &[u8],
    ) -> Result<DecryptedOlmEvent, DecryptError> {
        let payload: OlmPayload =
            serde_json::from_slice(plaintext).map_err(DecryptError::MalformedPayload)?;

        if payload.sender != event.sender {
            return Err(DecryptError::SenderMismatch {
                expected: event.sender.clone(),
                found: payload.sender,
            });
        }
        if payload.recipient != self.config.user_id {
            return Err(DecryptError::RecipientMismatch {
                expected: self.config.user_id.clone(),
                found: payload.recipient,
            });
        }
        let own_fingerprint = self.account.identity_keys().ed25519;
        if payload.recipient_keys.ed25519 != own_fingerprint {
            return Err(DecryptError::RecipientKeyMismatch {
                expected: own_fingerprint,
                found: payload.recipient_keys.ed25519,
            });
        }

        let content = self
            .registry
            .parse(&payload.event_type, payload.content)
            .map_err(|source| DecryptError::MalformedContent {
                event_type: payload.event_type.clone(),
                source,
            })?;
        if content.is_unknown() {
            tracing::debug!(event_type = %payload.event_type, "Keeping olm payload content of unknown type raw");
        }

        Ok(DecryptedOlmEvent {
            source: Arc::clone(event),
            sender_key,
            sender: payload.sender,
            sender_device: payload.sender_device,
            keys: payload.keys,
            recipient: payload.recipient,
            recipient_keys: payload.recipient_keys,
            event_type: payload.event_type,
            content,
        })
    }

    fn mark_device_for_unwedging(&self, user_id: &UserId, sender_key: &IdentityKey) {
        self.unwedge.mark_device_for_unwedging(UnwedgeRequest {
            user_id: user_id.clone(),
            sender_key: sender_key.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        AccountEvent, FakeAccount, FakeCiphertext, FakeSession, FaultyStore, olm_event,
        olm_payload,
    };
    use crate::{
        EventContent, IdentityKeys, MEGOLM_V1_ALGORITHM, MemorySessionStore, OlmCiphertext,
        ROOM_MESSAGE_EVENT_TYPE,
    };
    use serde_json::json;

    const ALICE: &str = "@alice:example.com";
    const BOB: &str = "@bob:example.com";
    const OWN_KEY: &str = "ACC1";
    const OWN_FINGERPRINT: &str = "SIGB";
    const SENDER_KEY: &str = "SENDER1";

    type TestMachine = OlmMachine<FakeAccount, MemorySessionStore<FakeSession>>;

    fn machine() -> TestMachine {
        OlmMachine::new(
            MachineConfig::new(BOB, "BOBDEV"),
            FakeAccount::new(IdentityKeys::new(OWN_FINGERPRINT, OWN_KEY))
                .with_one_time_keys(["OTK7"]),
            MemorySessionStore::new(),
            UnwedgeQueue::new(),
        )
    }

    fn payload_from(sender: &str, recipient: &str, fingerprint: &str) -> String {
        let payload = olm_payload(
            sender,
            "ALICEDEV",
            recipient,
            fingerprint,
            ROOM_MESSAGE_EVENT_TYPE,
            json!({"msgtype": "m.text", "body": "hello bob"}),
        );
        serde_json::to_string(&payload).unwrap()
    }

    fn payload() -> String {
        payload_from(ALICE, BOB, OWN_FINGERPRINT)
    }

    fn pre_key_event(session_id: &str, one_time_key: &str, plaintext: &str) -> Arc<Event> {
        let body = FakeCiphertext::pre_key(session_id, one_time_key, plaintext).encode();
        olm_event(
            ALICE,
            SENDER_KEY,
            OWN_KEY,
            OlmCiphertext::new(OlmMessageType::PreKey, body),
        )
        .unwrap()
    }

    fn normal_event(session_id: &str, plaintext: &str) -> Arc<Event> {
        let body = FakeCiphertext::normal(session_id, plaintext).encode();
        olm_event(
            ALICE,
            SENDER_KEY,
            OWN_KEY,
            OlmCiphertext::new(OlmMessageType::Normal, body),
        )
        .unwrap()
    }

    fn raw_event(content: serde_json::Value) -> Arc<Event> {
        Arc::new(Event {
            sender: UserId::from(ALICE),
            event_type: crate::ENCRYPTED_EVENT_TYPE.to_owned(),
            event_id: None,
            content,
        })
    }

    fn alice_device() -> UnwedgeRequest {
        UnwedgeRequest {
            user_id: UserId::from(ALICE),
            sender_key: IdentityKey::from(SENDER_KEY),
        }
    }

    #[test]
    fn test_pre_key_message_bootstraps_session() {
        let machine = machine();
        let event = pre_key_event("S7", "OTK7", &payload());

        let decrypted = machine.decrypt_olm_event(Arc::clone(&event)).unwrap();

        assert!(Arc::ptr_eq(&decrypted.source, &event));
        assert_eq!(decrypted.sender_key, IdentityKey::from(SENDER_KEY));
        assert_eq!(decrypted.sender, UserId::from(ALICE));
        assert_eq!(decrypted.recipient, UserId::from(BOB));
        let EventContent::RoomMessage(message) = &decrypted.content else {
            panic!("expected a room message, got {:?}", decrypted.content);
        };
        assert_eq!(message.body, "hello bob");

        assert_eq!(
            machine.store().session_count(&IdentityKey::from(SENDER_KEY)),
            1
        );
        assert!(!machine.account().has_one_time_key("OTK7"));
        assert!(machine.unwedge().is_empty());
    }

    #[test]
    fn test_normal_message_uses_bootstrapped_session() {
        let machine = machine();
        machine
            .decrypt_olm_event(pre_key_event("S7", "OTK7", &payload()))
            .unwrap();

        let decrypted = machine
            .decrypt_olm_event(normal_event("S7", &payload()))
            .unwrap();

        assert_eq!(decrypted.event_type, ROOM_MESSAGE_EVENT_TYPE);
        assert_eq!(
            machine.store().session_count(&IdentityKey::from(SENDER_KEY)),
            1
        );
    }

    #[test]
    fn test_megolm_shaped_ciphertext_is_rejected() {
        let event = raw_event(json!({
            "algorithm": OLM_V1_ALGORITHM,
            "sender_key": SENDER_KEY,
            "ciphertext": "AwgAEhAi",
        }));

        let err = machine().decrypt_olm_event(event).unwrap_err();
        assert!(matches!(err, DecryptError::IncorrectEncryptedContentType));
    }

    #[test]
    fn test_other_algorithm_is_rejected() {
        let event = raw_event(json!({
            "algorithm": MEGOLM_V1_ALGORITHM,
            "sender_key": SENDER_KEY,
            "ciphertext": "AwgAEhAi",
        }));

        let err = machine().decrypt_olm_event(event).unwrap_err();
        assert!(
            matches!(err, DecryptError::UnsupportedAlgorithm(ref algorithm) if algorithm == MEGOLM_V1_ALGORITHM)
        );
    }

    #[test]
    fn test_content_missing_fields_is_invalid() {
        let event = raw_event(json!({"algorithm": OLM_V1_ALGORITHM}));

        let err = machine().decrypt_olm_event(event).unwrap_err();
        assert!(matches!(err, DecryptError::InvalidEncryptedContent(_)));
    }

    #[test]
    fn test_camel_case_field_names_are_accepted() {
        let body = FakeCiphertext::pre_key("S7", "OTK7", payload()).encode();
        let event = raw_event(json!({
            "algorithm": OLM_V1_ALGORITHM,
            "senderKey": SENDER_KEY,
            "ciphertexts": {OWN_KEY: {"type": 0, "body": body}},
        }));

        assert!(machine().decrypt_olm_event(event).is_ok());
    }

    #[test]
    fn test_not_encrypted_for_me() {
        let body = FakeCiphertext::pre_key("S7", "OTK7", payload()).encode();
        let event = olm_event(
            ALICE,
            SENDER_KEY,
            "ACC2",
            OlmCiphertext::new(OlmMessageType::PreKey, body),
        )
        .unwrap();

        let machine = machine();
        let err = machine.decrypt_olm_event(event).unwrap_err();
        assert!(matches!(err, DecryptError::NotEncryptedForMe));
        assert!(machine.account().has_one_time_key("OTK7"));
        assert!(machine.unwedge().is_empty());
    }

    #[test]
    fn test_unknown_message_type_is_rejected() {
        let event = raw_event(json!({
            "algorithm": OLM_V1_ALGORITHM,
            "sender_key": SENDER_KEY,
            "ciphertext": {OWN_KEY: {"type": 7, "body": "AAAA"}},
        }));

        let err = machine().decrypt_olm_event(event).unwrap_err();
        assert!(
            matches!(err, DecryptError::UnsupportedOlmMessageType(ref n) if n.as_i64() == Some(7))
        );
    }

    #[test]
    fn test_out_of_range_message_type_is_unsupported() {
        let event = raw_event(json!({
            "algorithm": OLM_V1_ALGORITHM,
            "sender_key": SENDER_KEY,
            "ciphertext": {OWN_KEY: {"type": u64::MAX, "body": "AAAA"}},
        }));

        let err = machine().decrypt_olm_event(event).unwrap_err();
        assert!(
            matches!(err, DecryptError::UnsupportedOlmMessageType(ref n) if n.as_u64() == Some(u64::MAX))
        );
    }

    #[test]
    fn test_megolm_event_without_sender_key_is_unsupported_algorithm() {
        let event = raw_event(json!({
            "algorithm": MEGOLM_V1_ALGORITHM,
            "ciphertext": "AwgA",
            "session_id": "X",
            "device_id": "D",
        }));

        let err = machine().decrypt_olm_event(event).unwrap_err();
        assert!(
            matches!(err, DecryptError::UnsupportedAlgorithm(ref algorithm) if algorithm == MEGOLM_V1_ALGORITHM)
        );
    }

    #[test]
    fn test_malformed_entry_for_other_device_is_ignored() {
        let body = FakeCiphertext::pre_key("S7", "OTK7", payload()).encode();
        let event = raw_event(json!({
            "algorithm": OLM_V1_ALGORITHM,
            "sender_key": SENDER_KEY,
            "ciphertext": {
                OWN_KEY: {"type": 0, "body": body},
                "ACC9": {"type": "1", "body": "x"},
            },
        }));

        let decrypted = machine().decrypt_olm_event(event).unwrap();
        assert_eq!(decrypted.event_type, ROOM_MESSAGE_EVENT_TYPE);
    }

    #[test]
    fn test_malformed_own_entry_is_invalid_content() {
        let event = raw_event(json!({
            "algorithm": OLM_V1_ALGORITHM,
            "sender_key": SENDER_KEY,
            "ciphertext": {OWN_KEY: {"type": "0", "body": "AAAA"}},
        }));

        let machine = machine();
        let err = machine.decrypt_olm_event(event).unwrap_err();
        assert!(matches!(err, DecryptError::InvalidEncryptedContent(_)));
        assert!(machine.account().journal().is_empty());
    }

    #[test]
    fn test_normal_message_without_sessions_unwedges() {
        let machine = machine();

        let err = machine
            .decrypt_olm_event(normal_event("S1", &payload()))
            .unwrap_err();

        assert!(matches!(err, DecryptError::DecryptionFailedForNormalMessage));
        assert_eq!(machine.unwedge().take(), vec![alice_device()]);
        assert!(machine.account().journal().is_empty());
    }

    #[test]
    fn test_matching_session_failure_does_not_bootstrap() {
        let machine = machine();
        machine
            .store()
            .add_session(
                &IdentityKey::from(SENDER_KEY),
                FakeSession::inbound("S7", "OTK7").poisoned(),
            )
            .unwrap();

        let err = machine
            .decrypt_olm_event(pre_key_event("S7", "OTK7", &payload()))
            .unwrap_err();

        assert!(matches!(
            err,
            DecryptError::DecryptionFailedWithMatchingSession
        ));
        assert!(machine.unwedge().is_marked(&alice_device()));
        assert!(machine.account().has_one_time_key("OTK7"));
        assert!(machine.account().journal().is_empty());
    }

    #[test]
    fn test_bootstrap_failure_unwedges() {
        let machine = machine();

        let err = machine
            .decrypt_olm_event(pre_key_event("S1", "OTK1", &payload()))
            .unwrap_err();

        assert!(matches!(err, DecryptError::CreateInboundSession(_)));
        assert!(err.is_session_desync());
        assert!(machine.unwedge().is_marked(&alice_device()));
        assert_eq!(
            machine.store().session_count(&IdentityKey::from(SENDER_KEY)),
            0
        );
    }

    #[test]
    fn test_persist_failure_discards_session() {
        let machine = machine();
        machine.account().fail_persist(true);

        let err = machine
            .decrypt_olm_event(pre_key_event("S7", "OTK7", &payload()))
            .unwrap_err();

        assert!(matches!(err, DecryptError::PersistAccount(_)));
        assert!(machine.unwedge().is_marked(&alice_device()));
        assert_eq!(
            machine.store().session_count(&IdentityKey::from(SENDER_KEY)),
            0
        );
    }

    #[test]
    fn test_new_session_decrypt_failure_still_stores_session() {
        let machine = machine();
        machine.account().poison_new_sessions(true);

        let err = machine
            .decrypt_olm_event(pre_key_event("S7", "OTK7", &payload()))
            .unwrap_err();

        assert!(matches!(err, DecryptError::DecryptWithNewSession(_)));
        assert!(machine.unwedge().is_marked(&alice_device()));
        assert_eq!(
            machine.store().session_count(&IdentityKey::from(SENDER_KEY)),
            1
        );
        assert_eq!(
            machine.account().journal(),
            vec![
                AccountEvent::OneTimeKeyConsumed("OTK7".to_owned()),
                AccountEvent::Persisted {
                    unused_one_time_keys: 0
                },
            ]
        );
    }

    #[test]
    fn test_sender_mismatch_is_rejected() {
        let machine = machine();
        let event = pre_key_event(
            "S7",
            "OTK7",
            &payload_from("@mallory:example.com", BOB, OWN_FINGERPRINT),
        );

        let err = machine.decrypt_olm_event(event).unwrap_err();

        let DecryptError::SenderMismatch { expected, found } = err else {
            panic!("expected a sender mismatch");
        };
        assert_eq!(expected, UserId::from(ALICE));
        assert_eq!(found, UserId::from("@mallory:example.com"));
        assert!(machine.unwedge().is_empty());
    }

    #[test]
    fn test_recipient_mismatch_is_rejected() {
        let machine = machine();
        let event = pre_key_event(
            "S7",
            "OTK7",
            &payload_from(ALICE, "@carol:example.com", OWN_FINGERPRINT),
        );

        let err = machine.decrypt_olm_event(event).unwrap_err();

        assert!(matches!(err, DecryptError::RecipientMismatch { .. }));
        assert_eq!(err.kind(), crate::ErrorKind::Authentication);
        assert!(machine.unwedge().is_empty());
    }

    #[test]
    fn test_recipient_key_mismatch_is_rejected() {
        let machine = machine();
        let event = pre_key_event("S7", "OTK7", &payload_from(ALICE, BOB, "OTHERSIG"));

        let err = machine.decrypt_olm_event(event).unwrap_err();

        let DecryptError::RecipientKeyMismatch { expected, found } = err else {
            panic!("expected a recipient key mismatch");
        };
        assert_eq!(expected, OWN_FINGERPRINT);
        assert_eq!(found, "OTHERSIG");
    }

    #[test]
    fn test_non_json_plaintext_is_malformed_payload() {
        let machine = machine();

        let err = machine
            .decrypt_olm_event(pre_key_event("S7", "OTK7", "not json"))
            .unwrap_err();

        assert!(matches!(err, DecryptError::MalformedPayload(_)));
        // The session decrypted correctly and is kept.
        assert_eq!(
            machine.store().session_count(&IdentityKey::from(SENDER_KEY)),
            1
        );
        assert!(machine.unwedge().is_empty());
    }

    #[test]
    fn test_malformed_known_content_is_rejected() {
        let payload = olm_payload(
            ALICE,
            "ALICEDEV",
            BOB,
            OWN_FINGERPRINT,
            crate::ROOM_KEY_EVENT_TYPE,
            json!({"algorithm": 5}),
        );
        let event = pre_key_event("S7", "OTK7", &serde_json::to_string(&payload).unwrap());

        let err = machine().decrypt_olm_event(event).unwrap_err();
        assert!(
            matches!(err, DecryptError::MalformedContent { ref event_type, .. } if event_type == crate::ROOM_KEY_EVENT_TYPE)
        );
    }

    #[test]
    fn test_unknown_inner_type_is_kept_raw() {
        let payload = olm_payload(
            ALICE,
            "ALICEDEV",
            BOB,
            OWN_FINGERPRINT,
            "com.example.custom",
            json!({"answer": 42}),
        );
        let event = pre_key_event("S7", "OTK7", &serde_json::to_string(&payload).unwrap());

        let decrypted = machine().decrypt_olm_event(event).unwrap();

        assert_eq!(decrypted.event_type, "com.example.custom");
        assert_eq!(decrypted.content, EventContent::Unknown(json!({"answer": 42})));
    }

    #[test]
    fn test_store_read_failure_is_not_a_desync() {
        let unwedge = Arc::new(UnwedgeQueue::new());
        let store = FaultyStore::new(MemorySessionStore::<FakeSession>::new());
        store.fail_reads(true);
        let machine = OlmMachine::new(
            MachineConfig::new(BOB, "BOBDEV"),
            FakeAccount::new(IdentityKeys::new(OWN_FINGERPRINT, OWN_KEY)),
            store,
            Arc::clone(&unwedge),
        );

        let err = machine
            .decrypt_olm_event(normal_event("S1", &payload()))
            .unwrap_err();

        assert!(matches!(err, DecryptError::SessionLookup { .. }));
        assert_eq!(err.kind(), crate::ErrorKind::Infrastructure);
        assert!(unwedge.is_empty());
    }

    #[test]
    fn test_closure_sink_receives_requests() {
        let seen = std::sync::Mutex::new(Vec::new());
        let machine = OlmMachine::new(
            MachineConfig::new(BOB, "BOBDEV"),
            FakeAccount::new(IdentityKeys::new(OWN_FINGERPRINT, OWN_KEY)),
            MemorySessionStore::<FakeSession>::new(),
            |request: UnwedgeRequest| seen.lock().unwrap().push(request),
        );

        let _ = machine.decrypt_olm_event(normal_event("S1", &payload()));
        let _ = machine.decrypt_olm_event(normal_event("S1", &payload()));

        drop(machine);
        assert_eq!(seen.into_inner().unwrap(), vec![alice_device(), alice_device()]);
    }

    #[test]
    fn test_custom_registry_replaces_builtins() {
        let machine = machine().with_content_registry(ContentRegistry::empty());

        let decrypted = machine
            .decrypt_olm_event(pre_key_event("S7", "OTK7", &payload()))
            .unwrap();

        assert!(decrypted.content.is_unknown());
    }
}
