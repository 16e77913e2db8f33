#[macro_use]
extern crate afl;
use olm_inbound::testing::{FakeAccount, FakeCiphertext, FakeSession, olm_event};
use olm_inbound::{
    IdentityKey, IdentityKeys, MachineConfig, MemorySessionStore, OlmCiphertext, OlmMachine,
    OlmMessageType, SessionStore, UnwedgeQueue,
};

// Arbitrary plaintext delivered through an established session, so every
// input reaches payload parsing and authentication.
fn main() {
    let store = MemorySessionStore::new();
    let _ = store.add_session(
        &IdentityKey::from("SENDER1"),
        FakeSession::established("S1"),
    );
    let machine = OlmMachine::new(
        MachineConfig::new("@bob:example.com", "BOBDEV"),
        FakeAccount::new(IdentityKeys::new("SIGB", "ACC1")),
        store,
        UnwedgeQueue::new(),
    );

    fuzz!(|data: &[u8]| {
        let plaintext = String::from_utf8_lossy(data);
        let body = FakeCiphertext::normal("S1", plaintext).encode();
        let ciphertext = OlmCiphertext::new(OlmMessageType::Normal, body);
        if let Ok(event) = olm_event("@alice:example.com", "SENDER1", "ACC1", ciphertext) {
            let _ = machine.decrypt_olm_event(event);
        }
    });
}
