//! Solstice Cryptography Module
//!
//! Provides cryptographic primitives using standard, audited algorithms:
//! - Ed25519 for signatures
//! - BLAKE3 for hashing (SHA-256 fallback)

pub mod keys;
pub mod signing;
pub mod hashing;

pub use keys::*;
pub use signing::*;
pub use hashing::*;
