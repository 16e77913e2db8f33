use super::string_newtype;

string_newtype!(
    /// A device's long-term Curve25519 identity key, unpadded base64.
    ///
    /// Ciphertexts are addressed by the recipient's identity key and stored
    /// sessions are grouped by the sender's identity key.
    IdentityKey
);

string_newtype!(
    /// A device's Ed25519 fingerprint (signing) key, unpadded base64.
    ///
    /// Decrypted payloads name the recipient's fingerprint key, which must
    /// match our own before the payload is trusted.
    FingerprintKey
);

/// The local account's long-term public keys.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IdentityKeys {
    /// Ed25519 fingerprint key.
    pub ed25519: FingerprintKey,
    /// Curve25519 identity key.
    pub curve25519: IdentityKey,
}

impl IdentityKeys {
    /// Creates the key pair from its two public halves.
    pub fn new(ed25519: impl Into<FingerprintKey>, curve25519: impl Into<IdentityKey>) -> Self {
        Self {
            ed25519: ed25519.into(),
            curve25519: curve25519.into(),
        }
    }
}
