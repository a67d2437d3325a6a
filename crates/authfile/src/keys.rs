//! Curve25519 key pair generation and serialization.
//!
//! Key pairs are stored the way the session file format expects: raw 32-byte
//! private and public keys, the public one without the Signal type prefix.

use std::fmt;

use libsignal_protocol::PrivateKey;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::buffer_json::Bytes;
use crate::error::Result;

/// Type byte Signal prepends to serialized Curve25519 public keys.
const DJB_TYPE: u8 = 0x05;

/// A Curve25519 key pair as persisted in the credential bundle.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    /// 32-byte Curve25519 private key.
    pub private: Bytes,
    /// 32-byte Curve25519 public key (no type prefix).
    pub public: Bytes,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private", &"<redacted>")
            .field("public", &self.public)
            .finish()
    }
}

impl KeyPair {
    /// Generate a fresh key pair.
    pub fn generate() -> Self {
        let pair = libsignal_protocol::KeyPair::generate(&mut OsRng);
        Self {
            private: Bytes(pair.private_key.serialize().to_vec()),
            public: Bytes(pair.public_key.serialize()[1..].to_vec()),
        }
    }

    /// Public key with the Signal type prefix, the form signatures are computed over.
    pub fn prefixed_public(&self) -> Vec<u8> {
        let mut prefixed = Vec::with_capacity(self.public.len() + 1);
        prefixed.push(DJB_TYPE);
        prefixed.extend_from_slice(self.public.as_slice());
        prefixed
    }

    /// XEdDSA signature over `message` with this pair's private key.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let private = PrivateKey::deserialize(self.private.as_slice())?;
        Ok(private.calculate_signature(message, &mut OsRng)?.to_vec())
    }
}

/// A pre-key signed by the identity key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedKeyPair {
    pub key_pair: KeyPair,
    pub signature: Bytes,
    pub key_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_s: Option<u64>,
}

impl SignedKeyPair {
    /// Generate a pre-key and sign its prefixed public key with `identity`.
    pub fn generate(identity: &KeyPair, key_id: u32) -> Result<Self> {
        let key_pair = KeyPair::generate();
        let signature = identity.sign(&key_pair.prefixed_public())?;
        Ok(Self {
            key_pair,
            signature: Bytes(signature),
            key_id,
            timestamp_s: None,
        })
    }
}
