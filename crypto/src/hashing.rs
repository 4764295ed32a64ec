//! Hashing functions using BLAKE3 (with SHA-256 fallback)

use sha2::{Digest, Sha256};
use solstice_core::{BlockHeader, BlockId, Hash};

/// Compute BLAKE3 hash of data
pub fn blake3_hash(data: &[u8]) -> Hash {
    let hash = blake3::hash(data);
    Hash::from_bytes(*hash.as_bytes())
}

/// Compute SHA-256 hash of data (fallback)
pub fn sha256_hash(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&result);
    Hash::from_bytes(bytes)
}

/// Default hash function (BLAKE3)
pub fn hash(data: &[u8]) -> Hash {
    blake3_hash(data)
}

/// Hash multiple pieces of data
pub fn hash_multiple(parts: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    let hash = hasher.finalize();
    Hash::from_bytes(*hash.as_bytes())
}

/// Identifier of a block header: the BLAKE3 digest of its signing bytes
pub fn header_digest(header: &BlockHeader) -> BlockId {
    hash(&header.signing_bytes())
}

/// 128-bit digest over multiple inputs, interpreted as a big-endian
/// unsigned integer. Used by fork resolution for an unbiased,
/// globally-reproducible tie-break.
pub fn tiebreak_digest(parts: &[&[u8]]) -> u128 {
    let digest = hash_multiple(parts);
    let mut prefix = [0u8; 16];
    prefix.copy_from_slice(&digest.as_bytes()[..16]);
    u128::from_be_bytes(prefix)
}
