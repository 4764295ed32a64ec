//! Key management for Solstice
//!
//! Handles key generation and validator identity derivation.

use ed25519_dalek::{
    SigningKey as Ed25519SigningKey,
    VerifyingKey as Ed25519VerifyingKey,
    SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use solstice_core::{PublicKey, SolsticeError, SolsticeResult, ValidatorId};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A keypair for signing and verification
#[derive(Clone)]
pub struct KeyPair {
    signing_key: Ed25519SigningKey,
}

impl KeyPair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = Ed25519SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create keypair from seed bytes
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = Ed25519SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Create keypair from secret key bytes
    pub fn from_secret_bytes(bytes: &[u8]) -> SolsticeResult<Self> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(SolsticeError::InvalidPrivateKey);
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(bytes);
        Ok(Self::from_seed(&seed))
    }

    /// Get the public key
    pub fn public_key(&self) -> PublicKey {
        let verifying_key = self.signing_key.verifying_key();
        PublicKey::from_bytes(verifying_key.to_bytes())
    }

    /// Get the validator identity (the signing public key)
    pub fn validator_id(&self) -> ValidatorId {
        self.public_key()
    }

    /// Get the secret key bytes (BE CAREFUL with this!)
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Get the internal signing key for signing operations
    pub(crate) fn signing_key(&self) -> &Ed25519SigningKey {
        &self.signing_key
    }
}

/// Convert Ed25519 verifying key to our PublicKey type
pub fn public_key_from_ed25519(key: &Ed25519VerifyingKey) -> PublicKey {
    PublicKey::from_bytes(key.to_bytes())
}

/// Convert our PublicKey type to Ed25519 verifying key
pub fn public_key_to_ed25519(key: &PublicKey) -> SolsticeResult<Ed25519VerifyingKey> {
    Ed25519VerifyingKey::from_bytes(key.as_bytes())
        .map_err(|_| SolsticeError::InvalidPublicKey)
}

/// Secure secret key storage (zeroizes on drop)
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; 32],
}

impl SecretKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    pub fn to_keypair(&self) -> KeyPair {
        KeyPair::from_seed(&self.bytes)
    }
}
