//! Validator registry view
//!
//! Read-only projection over committed chain state mapping validator ids to
//! their registered signup credentials. The projection is bound to a state
//! root by the caller; it is queried, never mutated, by the consensus
//! publishers and verifiers.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use solstice_core::{Hash, PublicKey, SolsticeResult, ValidatorId};
use solstice_crypto::hashing::{hash, hash_multiple};
use std::sync::Arc;

/// A validator's registered signup credential.
///
/// Created once per validator via a registration ceremony and immutable after
/// acceptance; re-registration is an explicit new ceremony, never a silent
/// replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupCredential {
    /// Public identifier produced by the elapsed-time prover
    pub poet_public_key: PublicKey,
    /// Anti-sybil identifier binding the credential to one validator
    pub anti_sybil_id: Hash,
    /// Attestation digest over the credential contents
    pub proof_data: Hash,
    /// Sealed private material, opaque to everyone but the prover
    pub sealed_signup_data: Vec<u8>,
}

impl SignupCredential {
    /// Check the credential's cryptographic binding to a validator id.
    ///
    /// The software prover makes the attestation recomputable by any
    /// observer; a hardware enclave substitutes a real attestation check
    /// behind the same call.
    pub fn is_valid_for(&self, validator_id: &ValidatorId) -> bool {
        let expected_anti_sybil = hash(validator_id.as_bytes());
        if self.anti_sybil_id != expected_anti_sybil {
            return false;
        }
        let expected_proof = hash_multiple(&[
            self.poet_public_key.as_bytes(),
            self.anti_sybil_id.as_bytes(),
            validator_id.as_bytes(),
        ]);
        self.proof_data == expected_proof
    }
}

/// Read-only lookup of signup credentials by validator id
pub trait ValidatorRegistryView: Send + Sync {
    /// Get the accepted credential for a validator, or `None` if the
    /// validator has not registered (or its registration is not yet
    /// committed at this view's state root).
    fn get_credential(&self, validator_id: &ValidatorId)
        -> SolsticeResult<Option<SignupCredential>>;
}

/// In-memory registry view for tests and single-node development
#[derive(Default)]
pub struct InMemoryValidatorRegistry {
    credentials: DashMap<ValidatorId, SignupCredential>,
}

impl InMemoryValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a credential for a validator. Acceptance models the registry
    /// transaction family committing the registration on-chain.
    pub fn accept(&self, validator_id: ValidatorId, credential: SignupCredential) {
        self.credentials.insert(validator_id, credential);
    }

    pub fn remove(&self, validator_id: &ValidatorId) {
        self.credentials.remove(validator_id);
    }
}

impl ValidatorRegistryView for InMemoryValidatorRegistry {
    fn get_credential(
        &self,
        validator_id: &ValidatorId,
    ) -> SolsticeResult<Option<SignupCredential>> {
        Ok(self.credentials.get(validator_id).map(|c| c.clone()))
    }
}

/// Shared registry view
pub type SharedValidatorRegistry = Arc<dyn ValidatorRegistryView>;
