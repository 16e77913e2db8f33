#[macro_use]
extern crate afl;
use olm_inbound::testing::{FakeAccount, FakeSession};
use olm_inbound::{
    Event, IdentityKeys, MachineConfig, MemorySessionStore, OlmMachine, UnwedgeQueue,
};
use std::sync::Arc;

fn main() {
    let machine = OlmMachine::new(
        MachineConfig::new("@bob:example.com", "BOBDEV"),
        FakeAccount::new(IdentityKeys::new("SIGB", "ACC1")).with_one_time_keys(["OTK7"]),
        MemorySessionStore::<FakeSession>::new(),
        UnwedgeQueue::new(),
    );

    fuzz!(|data: &[u8]| {
        if let Ok(event) = serde_json::from_slice::<Event>(data) {
            let _ = machine.decrypt_olm_event(Arc::new(event));
        }
    });
}
