//! Inbound decryption of Olm-encrypted to-device events.
//!
//! [`OlmMachine::decrypt_olm_event`] turns an `m.olm.v1.curve25519-aes-sha2`
//! event into an authenticated [`DecryptedOlmEvent`]. Ratchet cryptography
//! lives behind the [`OlmAccount`] and [`OlmSession`] traits; sessions are
//! kept in a [`SessionStore`].

mod types;
pub use types::*;

mod error;
pub use error::*;

mod config;
pub use config::MachineConfig;

mod event;
pub use event::*;

mod olm;
pub use olm::*;

mod store;
pub use store::*;

mod unwedge;
pub use unwedge::*;

mod machine;
pub use machine::OlmMachine;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
