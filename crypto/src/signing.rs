//! Digital signature operations using Ed25519

use ed25519_dalek::{Signer, Verifier};
use solstice_core::{Block, BlockHeader, PublicKey, Signature, SolsticeError, SolsticeResult};

use crate::keys::{public_key_to_ed25519, KeyPair};

/// Sign a message using Ed25519
pub fn sign(keypair: &KeyPair, message: &[u8]) -> Signature {
    let signature = keypair.signing_key().sign(message);
    Signature::from_bytes(signature.to_bytes())
}

/// Verify a signature using Ed25519
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> SolsticeResult<()> {
    let verifying_key = public_key_to_ed25519(public_key)?;
    let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());

    verifying_key
        .verify(message, &sig)
        .map_err(|_| SolsticeError::InvalidSignature)
}

/// Check if a signature is valid (returns bool instead of Result)
pub fn is_valid_signature(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    verify(public_key, message, signature).is_ok()
}

/// Sign a finalized block header, producing the broadcastable block
pub fn sign_block(keypair: &KeyPair, header: BlockHeader) -> Block {
    let header_signature = sign(keypair, &header.signing_bytes());
    Block {
        header,
        header_signature,
    }
}

/// Verify a block's header signature against its declared signer
pub fn verify_block_signature(block: &Block) -> bool {
    is_valid_signature(
        &block.header.signer,
        &block.header.signing_bytes(),
        &block.header_signature,
    )
}
