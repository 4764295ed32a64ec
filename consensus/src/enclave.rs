//! Elapsed-time proof capability
//!
//! The registry-gated consensus treats "produce and verify a time-elapsed
//! proof" as an opaque capability normally backed by a hardware enclave.
//! `SimulatorProver` is the software stand-in: it produces the same artifacts
//! with recomputable (unattested) bindings, which is sufficient for
//! development networks and tests.

use rand::Rng;
use serde::{Deserialize, Serialize};
use solstice_core::{
    BlockHeader, Hash, SolsticeError, SolsticeResult, Timestamp, ValidatorId,
};
use solstice_crypto::hashing::{hash, hash_multiple};
use solstice_crypto::keys::KeyPair;
use solstice_state::SignupCredential;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A verifiable attestation that a validator waited its sampled duration
/// before claiming a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitCertificate {
    /// Validator the wait was sampled for
    pub validator_id: ValidatorId,
    /// When the wait began
    pub wait_start: Timestamp,
    /// Sampled wait duration in milliseconds
    pub duration_ms: u64,
    /// Digest binding this certificate to one candidate block
    pub binding: Hash,
}

impl WaitCertificate {
    /// The binding digest for a candidate block: previous block id and
    /// signer, fixed at initialization time.
    pub fn binding_for(header: &BlockHeader) -> Hash {
        hash_multiple(&[header.previous_id.as_bytes(), header.signer.as_bytes()])
    }

    /// Whether the sampled wait period has elapsed at `now`
    pub fn has_elapsed(&self, now: Timestamp) -> bool {
        self.wait_start.as_millis() + self.duration_ms <= now.as_millis()
    }

    pub fn to_bytes(&self) -> SolsticeResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> SolsticeResult<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| SolsticeError::InvalidConsensusPayload(e.to_string()))
    }
}

/// Capability producing and verifying elapsed-time proofs and signup
/// credentials.
pub trait ElapsedTimeProver: Send + Sync {
    /// Run the signup ceremony for a validator, producing a credential with
    /// sealed private material.
    fn create_signup(&self, validator_id: &ValidatorId) -> SolsticeResult<SignupCredential>;

    /// Sample a wait for a candidate block and bind it to the block
    fn create_proof(
        &self,
        validator_id: &ValidatorId,
        header: &BlockHeader,
    ) -> SolsticeResult<WaitCertificate>;

    /// Re-check a certificate against the block that embeds it
    fn verify_proof(&self, certificate: &WaitCertificate, header: &BlockHeader) -> bool;
}

/// Software prover simulating the enclave.
///
/// Wait durations are sampled uniformly from `[1, 2 * target_wait_ms]`, so
/// the expected wait equals the target. A target of zero disables waiting
/// entirely (useful in tests).
pub struct SimulatorProver {
    target_wait_ms: u64,
    signups_created: AtomicUsize,
}

impl SimulatorProver {
    pub fn new(target_wait_ms: u64) -> Self {
        Self {
            target_wait_ms,
            signups_created: AtomicUsize::new(0),
        }
    }

    /// Number of signup ceremonies this prover has run
    pub fn signup_count(&self) -> usize {
        self.signups_created.load(Ordering::SeqCst)
    }
}

impl ElapsedTimeProver for SimulatorProver {
    fn create_signup(&self, validator_id: &ValidatorId) -> SolsticeResult<SignupCredential> {
        let poet_keypair = KeyPair::generate();
        let poet_public_key = poet_keypair.public_key();
        let anti_sybil_id = hash(validator_id.as_bytes());
        let proof_data = hash_multiple(&[
            poet_public_key.as_bytes(),
            anti_sybil_id.as_bytes(),
            validator_id.as_bytes(),
        ]);

        self.signups_created.fetch_add(1, Ordering::SeqCst);

        Ok(SignupCredential {
            poet_public_key,
            anti_sybil_id,
            proof_data,
            sealed_signup_data: poet_keypair.secret_bytes().to_vec(),
        })
    }

    fn create_proof(
        &self,
        validator_id: &ValidatorId,
        header: &BlockHeader,
    ) -> SolsticeResult<WaitCertificate> {
        let duration_ms = if self.target_wait_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(1..=self.target_wait_ms * 2)
        };

        Ok(WaitCertificate {
            validator_id: *validator_id,
            wait_start: Timestamp::now(),
            duration_ms,
            binding: WaitCertificate::binding_for(header),
        })
    }

    fn verify_proof(&self, certificate: &WaitCertificate, header: &BlockHeader) -> bool {
        if certificate.validator_id != header.signer {
            return false;
        }
        if certificate.binding != WaitCertificate::binding_for(header) {
            return false;
        }
        // The sampled duration must be one this prover could have produced
        certificate.duration_ms <= self.target_wait_ms.saturating_mul(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solstice_core::PublicKey;

    fn sample_header(signer: ValidatorId) -> BlockHeader {
        BlockHeader {
            signer,
            previous_id: Hash::from_bytes([1u8; 32]),
            block_num: 3,
            state_root: Hash::ZERO,
            batch_ids: vec![],
            consensus: vec![],
        }
    }

    #[test]
    fn test_signup_credential_binding() {
        let prover = SimulatorProver::new(0);
        let validator_id = PublicKey::from_bytes([7u8; 32]);

        let credential = prover.create_signup(&validator_id).unwrap();
        assert!(credential.is_valid_for(&validator_id));
        assert!(!credential.is_valid_for(&PublicKey::from_bytes([8u8; 32])));
        assert_eq!(prover.signup_count(), 1);
    }

    #[test]
    fn test_proof_roundtrip() {
        let prover = SimulatorProver::new(0);
        let validator_id = PublicKey::from_bytes([7u8; 32]);
        let header = sample_header(validator_id);

        let cert = prover.create_proof(&validator_id, &header).unwrap();
        assert!(cert.has_elapsed(Timestamp::now()));
        assert!(prover.verify_proof(&cert, &header));

        let bytes = cert.to_bytes().unwrap();
        let restored = WaitCertificate::from_bytes(&bytes).unwrap();
        assert_eq!(cert, restored);
    }

    #[test]
    fn test_proof_rejects_foreign_block() {
        let prover = SimulatorProver::new(0);
        let validator_id = PublicKey::from_bytes([7u8; 32]);
        let header = sample_header(validator_id);

        let cert = prover.create_proof(&validator_id, &header).unwrap();

        let mut other = header.clone();
        other.previous_id = Hash::from_bytes([2u8; 32]);
        assert!(!prover.verify_proof(&cert, &other));

        let mut wrong_signer = header;
        wrong_signer.signer = PublicKey::from_bytes([8u8; 32]);
        assert!(!prover.verify_proof(&cert, &wrong_signer));
    }

    #[test]
    fn test_wait_not_elapsed() {
        let prover = SimulatorProver::new(60_000);
        let validator_id = PublicKey::from_bytes([7u8; 32]);
        let header = sample_header(validator_id);

        let cert = prover.create_proof(&validator_id, &header).unwrap();
        assert!(cert.duration_ms >= 1);
        assert!(!cert.has_elapsed(Timestamp::now()));
        assert!(cert.has_elapsed(Timestamp::now().saturating_add(120_000)));
    }
}
