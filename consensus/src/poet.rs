//! Registry-gated elapsed-time consensus
//!
//! A validator may only finalize a candidate block if it holds registered
//! signup credentials and its claim history satisfies the timing and limit
//! rules recorded in the consensus-state snapshot of the parent block. The
//! wait itself is attested by the elapsed-time prover; the finalized proof
//! bytes travel in the header's consensus field for verifiers to re-check.

use solstice_core::{
    Block, BlockHeader, BlockPublisher, BlockVerifier, SolsticeResult, Timestamp, ValidatorId,
};
use solstice_state::{ConsensusStateStore, KeyState, KeyStateStore, ValidatorRegistryView};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::enclave::{ElapsedTimeProver, WaitCertificate};

/// Collaborators the registry-gated publisher and verifier operate against.
#[derive(Clone)]
pub struct PoetContext {
    pub registry: Arc<dyn ValidatorRegistryView>,
    pub consensus_state: Arc<dyn ConsensusStateStore>,
    pub key_state: Arc<dyn KeyStateStore>,
    pub prover: Arc<dyn ElapsedTimeProver>,
}

/// Registry-gated block publisher.
pub struct PoetPublisher {
    ctx: PoetContext,
    validator_id: ValidatorId,
    /// Wait certificate for the candidate under construction
    wait_certificate: Option<WaitCertificate>,
}

impl PoetPublisher {
    pub fn new(ctx: PoetContext, validator_id: ValidatorId) -> Self {
        Self {
            ctx,
            validator_id,
            wait_certificate: None,
        }
    }

    /// Run the registration ceremony, reusing pending sealed material when a
    /// prior attempt already produced a signup that has not yet committed.
    ///
    /// Key-storage failures are fatal: continuing past them risks
    /// double-registration.
    fn register_signup(&self, header: &BlockHeader) -> SolsticeResult<()> {
        if let Some(state) = self.ctx.key_state.get(&self.validator_id)? {
            if !state.committed {
                debug!(
                    validator = %self.validator_id,
                    "pending signup information already present, awaiting commit"
                );
                return Ok(());
            }
        }

        let credential = self.ctx.prover.create_signup(&self.validator_id)?;
        self.ctx.key_state.put(
            &self.validator_id,
            &KeyState::pending(
                credential.poet_public_key,
                credential.sealed_signup_data.clone(),
            ),
        )?;

        let snapshot = self.ctx.consensus_state.get_or_default(&header.previous_id)?;
        self.ctx.consensus_state.put(
            &header.previous_id,
            &snapshot.record_signup(self.validator_id, header.block_num),
        )?;

        info!(
            validator = %self.validator_id,
            poet_public_key = %credential.poet_public_key,
            "registered new signup information"
        );
        Ok(())
    }

}

impl BlockPublisher for PoetPublisher {
    fn initialize_block(&mut self, header: &mut BlockHeader) -> SolsticeResult<bool> {
        self.wait_certificate = None;

        // A read failure is not evidence of a missing registration: an
        // accepted credential must never be replaced because the view was
        // briefly unreachable. Registration happens only on a definitive
        // answer from the registry.
        let credential = match self.ctx.registry.get_credential(&self.validator_id) {
            Ok(Some(credential)) if credential.is_valid_for(&self.validator_id) => credential,
            Ok(Some(_)) => {
                warn!(
                    validator = %self.validator_id,
                    "registered signup information is invalid, registering anew"
                );
                self.register_signup(header)?;
                return Ok(false);
            }
            Ok(None) => {
                debug!(
                    validator = %self.validator_id,
                    "no public key found, so going to register new signup information"
                );
                self.register_signup(header)?;
                return Ok(false);
            }
            Err(err) => {
                warn!(error = %err, "failed to read validator registry");
                return Ok(false);
            }
        };

        let snapshot = match self.ctx.consensus_state.get_or_default(&header.previous_id) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "failed to read consensus state");
                return Ok(false);
            }
        };

        if snapshot.signup_committed_too_late(&self.validator_id) {
            info!(validator = %self.validator_id, "signup was committed too late");
            return Ok(false);
        }
        if snapshot.has_claimed_block_limit(&self.validator_id) {
            info!(validator = %self.validator_id, "block claim limit reached");
            return Ok(false);
        }
        if snapshot.is_claiming_too_early(&self.validator_id, header.block_num) {
            info!(validator = %self.validator_id, "claiming too early after signup");
            return Ok(false);
        }
        if snapshot.is_claiming_too_frequently(&self.validator_id, header.block_num) {
            info!(validator = %self.validator_id, "claiming too frequently");
            return Ok(false);
        }

        let certificate = match self.ctx.prover.create_proof(&self.validator_id, header) {
            Ok(certificate) => certificate,
            Err(err) => {
                warn!(error = %err, "elapsed-time prover failed to sample a wait");
                return Ok(false);
            }
        };

        debug!(
            validator = %self.validator_id,
            duration_ms = certificate.duration_ms,
            poet_public_key = %credential.poet_public_key,
            "initialized registry-gated candidate"
        );

        header.consensus = certificate.to_bytes()?;
        self.wait_certificate = Some(certificate);
        Ok(true)
    }

    fn check_publish_block(&mut self, _header: &BlockHeader) -> bool {
        match &self.wait_certificate {
            Some(certificate) => certificate.has_elapsed(Timestamp::now()),
            None => false,
        }
    }

    fn finalize_block(&mut self, header: &mut BlockHeader) -> SolsticeResult<()> {
        let certificate = self
            .wait_certificate
            .take()
            .ok_or(solstice_core::SolsticeError::NoCandidateBlock)?;
        header.consensus = certificate.to_bytes()?;
        Ok(())
    }
}

/// Registry-gated block verifier: re-derives the publisher's admission
/// checks against the block's claimed proof and registry state.
pub struct PoetVerifier {
    ctx: PoetContext,
}

impl PoetVerifier {
    pub fn new(ctx: PoetContext) -> Self {
        Self { ctx }
    }
}

impl BlockVerifier for PoetVerifier {
    fn verify_block(&self, block: &Block) -> bool {
        let signer = block.header.signer;

        let credential = match self.ctx.registry.get_credential(&signer) {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                debug!(signer = %signer, "block signer has no registered signup");
                return false;
            }
            Err(err) => {
                warn!(error = %err, "failed to read validator registry");
                return false;
            }
        };
        if !credential.is_valid_for(&signer) {
            debug!(signer = %signer, "block signer's signup credential is invalid");
            return false;
        }

        let snapshot = match self.ctx.consensus_state.get_or_default(&block.header.previous_id) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "failed to read consensus state");
                return false;
            }
        };
        if snapshot.signup_committed_too_late(&signer)
            || snapshot.has_claimed_block_limit(&signer)
            || snapshot.is_claiming_too_early(&signer, block.header.block_num)
            || snapshot.is_claiming_too_frequently(&signer, block.header.block_num)
        {
            debug!(signer = %signer, "block violates claim rules");
            return false;
        }

        let certificate = match WaitCertificate::from_bytes(&block.header.consensus) {
            Ok(certificate) => certificate,
            Err(err) => {
                debug!(error = %err, "block carries an unreadable wait certificate");
                return false;
            }
        };
        self.ctx.prover.verify_proof(&certificate, &block.header)
    }

    fn compute_block_weight(&self, block: &Block) -> u64 {
        block.header.block_num
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enclave::SimulatorProver;
    use solstice_core::{Hash, PublicKey, SolsticeError};
    use solstice_state::{
        ClaimBounds, ConsensusStateSnapshot, InMemoryValidatorRegistry,
        MemoryConsensusStateStore, MemoryKeyStateStore, SignupCredential,
    };
    use solstice_crypto::keys::KeyPair;
    use solstice_crypto::signing::sign_block;

    struct Fixture {
        registry: Arc<InMemoryValidatorRegistry>,
        consensus_state: Arc<MemoryConsensusStateStore>,
        key_state: Arc<MemoryKeyStateStore>,
        prover: Arc<SimulatorProver>,
        ctx: PoetContext,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(InMemoryValidatorRegistry::new());
        let consensus_state = Arc::new(MemoryConsensusStateStore::new());
        let key_state = Arc::new(MemoryKeyStateStore::new());
        let prover = Arc::new(SimulatorProver::new(0));
        let ctx = PoetContext {
            registry: registry.clone(),
            consensus_state: consensus_state.clone(),
            key_state: key_state.clone(),
            prover: prover.clone(),
        };
        Fixture {
            registry,
            consensus_state,
            key_state,
            prover,
            ctx,
        }
    }

    fn candidate(signer: ValidatorId, block_num: u64) -> BlockHeader {
        BlockHeader {
            signer,
            previous_id: Hash::from_bytes([1u8; 32]),
            block_num,
            state_root: Hash::from_bytes([6u8; 32]),
            batch_ids: vec![Hash::from_bytes([4u8; 32])],
            consensus: vec![],
        }
    }

    #[test]
    fn test_unregistered_validator_registers_once() {
        let fx = fixture();
        let validator_id = KeyPair::generate().validator_id();
        let mut publisher = PoetPublisher::new(fx.ctx.clone(), validator_id);
        let mut header = candidate(validator_id, 5);

        assert!(!publisher.initialize_block(&mut header).unwrap());
        assert_eq!(fx.prover.signup_count(), 1);

        // Pending sealed material is durable and reused
        let key_state = fx.key_state.get(&validator_id).unwrap().unwrap();
        assert!(!key_state.committed);

        // Repeated attempts against the same unresolved registry state do
        // not create a second signup
        assert!(!publisher.initialize_block(&mut header).unwrap());
        assert!(!publisher.initialize_block(&mut header).unwrap());
        assert_eq!(fx.prover.signup_count(), 1);
    }

    #[test]
    fn test_invalid_credential_follows_registration_path() {
        let fx = fixture();
        let validator_id = KeyPair::generate().validator_id();
        // Credential minted for a different validator fails the binding
        let foreign = fx
            .prover
            .create_signup(&KeyPair::generate().validator_id())
            .unwrap();
        fx.registry.accept(validator_id, foreign);
        let signups_before = fx.prover.signup_count();

        let mut publisher = PoetPublisher::new(fx.ctx.clone(), validator_id);
        let mut header = candidate(validator_id, 5);

        assert!(!publisher.initialize_block(&mut header).unwrap());
        assert_eq!(fx.prover.signup_count(), signups_before + 1);
    }

    #[test]
    fn test_claim_limit_blocks_without_reregistration() {
        let fx = fixture();
        let validator_id = KeyPair::generate().validator_id();
        let credential = fx.prover.create_signup(&validator_id).unwrap();
        fx.registry.accept(validator_id, credential);
        let signups_before = fx.prover.signup_count();

        // Parent snapshot already records an exhausted claim limit
        let bounds = ClaimBounds {
            block_claim_limit: 1,
            ..ClaimBounds::default()
        };
        let mut header = candidate(validator_id, 5);
        let exhausted = ConsensusStateSnapshot::with_bounds(bounds)
            .extend(&candidate(validator_id, 4));
        fx.consensus_state.put(&header.previous_id, &exhausted).unwrap();

        let mut publisher = PoetPublisher::new(fx.ctx.clone(), validator_id);
        assert!(!publisher.initialize_block(&mut header).unwrap());
        assert_eq!(fx.prover.signup_count(), signups_before);
    }

    struct UnavailableRegistry;

    impl ValidatorRegistryView for UnavailableRegistry {
        fn get_credential(
            &self,
            _validator_id: &ValidatorId,
        ) -> SolsticeResult<Option<SignupCredential>> {
            Err(SolsticeError::StorageError("registry unavailable".to_string()))
        }
    }

    #[test]
    fn test_registry_outage_does_not_reregister() {
        let fx = fixture();
        let validator_id = KeyPair::generate().validator_id();
        let committed = KeyState {
            poet_public_key: PublicKey::from_bytes([2u8; 32]),
            sealed_signup_data: vec![1, 2, 3],
            committed: true,
        };
        fx.key_state.put(&validator_id, &committed).unwrap();

        let ctx = PoetContext {
            registry: Arc::new(UnavailableRegistry),
            consensus_state: fx.consensus_state.clone(),
            key_state: fx.key_state.clone(),
            prover: fx.prover.clone(),
        };
        let mut publisher = PoetPublisher::new(ctx, validator_id);
        let mut header = candidate(validator_id, 5);

        // The claim is declined, but a committed registration survives the
        // outage untouched: no ceremony runs and no pending material is
        // written over the sealed keys.
        assert!(!publisher.initialize_block(&mut header).unwrap());
        assert_eq!(fx.prover.signup_count(), 0);
        assert_eq!(fx.key_state.get(&validator_id).unwrap().unwrap(), committed);
    }

    #[test]
    fn test_late_committed_signup_blocks_claim() {
        let fx = fixture();
        let validator_id = KeyPair::generate().validator_id();
        let credential = fx.prover.create_signup(&validator_id).unwrap();
        fx.registry.accept(validator_id, credential);
        let signups_before = fx.prover.signup_count();

        let mut header = candidate(validator_id, 5);
        let late = ConsensusStateSnapshot::default().flag_committed_too_late(validator_id);
        fx.consensus_state.put(&header.previous_id, &late).unwrap();

        let mut publisher = PoetPublisher::new(fx.ctx.clone(), validator_id);
        assert!(!publisher.initialize_block(&mut header).unwrap());
        assert_eq!(fx.prover.signup_count(), signups_before);
    }

    #[test]
    fn test_claim_too_soon_after_signup_blocks() {
        let fx = fixture();
        let validator_id = KeyPair::generate().validator_id();
        let credential = fx.prover.create_signup(&validator_id).unwrap();
        fx.registry.accept(validator_id, credential);

        // Signup at block 4 with the default delay of 1: block 5 is too
        // early, block 6 is allowed
        let fresh = ConsensusStateSnapshot::default().record_signup(validator_id, 4);
        let mut header = candidate(validator_id, 5);
        fx.consensus_state.put(&header.previous_id, &fresh).unwrap();

        let mut publisher = PoetPublisher::new(fx.ctx.clone(), validator_id);
        assert!(!publisher.initialize_block(&mut header).unwrap());

        let mut later = candidate(validator_id, 6);
        assert!(publisher.initialize_block(&mut later).unwrap());
    }

    #[test]
    fn test_claim_spacing_blocks_frequent_claims() {
        let fx = fixture();
        let validator_id = KeyPair::generate().validator_id();
        let credential = fx.prover.create_signup(&validator_id).unwrap();
        fx.registry.accept(validator_id, credential);

        let bounds = ClaimBounds {
            block_claim_spacing: 3,
            ..ClaimBounds::default()
        };
        let mut header = candidate(validator_id, 5);
        let recent_claim = ConsensusStateSnapshot::with_bounds(bounds)
            .extend(&candidate(validator_id, 4));
        fx.consensus_state.put(&header.previous_id, &recent_claim).unwrap();

        let mut publisher = PoetPublisher::new(fx.ctx.clone(), validator_id);
        assert!(!publisher.initialize_block(&mut header).unwrap());
    }

    #[test]
    fn test_publish_flow_and_verification_roundtrip() {
        let fx = fixture();
        let keypair = KeyPair::generate();
        let validator_id = keypair.validator_id();
        let credential = fx.prover.create_signup(&validator_id).unwrap();
        fx.registry.accept(validator_id, credential);

        let mut publisher = PoetPublisher::new(fx.ctx.clone(), validator_id);
        let mut header = candidate(validator_id, 5);

        assert!(publisher.initialize_block(&mut header).unwrap());
        // Target wait of zero elapses immediately
        assert!(publisher.check_publish_block(&header));
        publisher.finalize_block(&mut header).unwrap();
        assert!(!header.consensus.is_empty());

        let block = sign_block(&keypair, header);
        let verifier = PoetVerifier::new(fx.ctx.clone());
        assert!(verifier.verify_block(&block));
        assert_eq!(verifier.compute_block_weight(&block), 5);

        // Any tampering with the gated fields breaks verification
        let mut wrong_signer = block.clone();
        wrong_signer.header.signer = KeyPair::generate().validator_id();
        assert!(!verifier.verify_block(&wrong_signer));

        let mut wrong_proof = block.clone();
        wrong_proof.header.consensus[0] ^= 0xff;
        assert!(!verifier.verify_block(&wrong_proof));

        let mut wrong_parent = block;
        wrong_parent.header.previous_id = Hash::from_bytes([9u8; 32]);
        assert!(!verifier.verify_block(&wrong_parent));
    }

    #[test]
    fn test_finalize_without_candidate_fails() {
        let fx = fixture();
        let validator_id = KeyPair::generate().validator_id();
        let mut publisher = PoetPublisher::new(fx.ctx, validator_id);

        let mut header = candidate(validator_id, 5);
        assert!(publisher.finalize_block(&mut header).is_err());
        assert!(!publisher.check_publish_block(&header));
    }
}
