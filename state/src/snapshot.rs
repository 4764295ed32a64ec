//! Consensus-state snapshots
//!
//! Append-only, per-block bookkeeping of validator claim history. The
//! snapshot for block N is derived only from block N's header and the
//! snapshot for block N-1; snapshots are never mutated in place, only
//! extended forward.

use serde::{Deserialize, Serialize};
use solstice_core::{BlockHeader, ValidatorId};
use std::collections::BTreeMap;

/// Claim-timing bounds carried through every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimBounds {
    /// Maximum blocks one credential may claim before re-registration
    pub block_claim_limit: u64,
    /// Blocks a validator must wait after signup before its first claim
    pub block_claim_delay: u64,
    /// Minimum block gap between two claims by the same validator
    /// (0 = unrestricted)
    pub block_claim_spacing: u64,
}

impl Default for ClaimBounds {
    fn default() -> Self {
        Self {
            block_claim_limit: 25,
            block_claim_delay: 1,
            block_claim_spacing: 0,
        }
    }
}

/// Per-validator eligibility bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorState {
    /// Set by the registry transaction family when a signup landed on-chain
    /// too long after it was produced
    pub committed_too_late: bool,
    /// Blocks claimed under the current signup
    pub claim_count: u64,
    /// Block number at which the current signup was recorded
    pub signup_block_num: u64,
    /// Block number of this validator's most recent claim
    pub last_claim_block_num: Option<u64>,
}

/// Consensus state as of one block, keyed externally by that block's id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusStateSnapshot {
    bounds: ClaimBounds,
    validators: BTreeMap<ValidatorId, ValidatorState>,
}

impl ConsensusStateSnapshot {
    /// Genesis snapshot with explicit bounds
    pub fn with_bounds(bounds: ClaimBounds) -> Self {
        Self {
            bounds,
            validators: BTreeMap::new(),
        }
    }

    pub fn bounds(&self) -> ClaimBounds {
        self.bounds
    }

    pub fn validator(&self, validator_id: &ValidatorId) -> Option<&ValidatorState> {
        self.validators.get(validator_id)
    }

    /// Derive the snapshot for a block from this (the parent's) snapshot,
    /// recording the claim by the block's signer.
    pub fn extend(&self, header: &BlockHeader) -> Self {
        let mut next = self.clone();
        let state = next.validators.entry(header.signer).or_default();
        state.claim_count += 1;
        state.last_claim_block_num = Some(header.block_num);
        next
    }

    /// Derive a snapshot recording a fresh signup for a validator. The
    /// claim history under any previous signup is discarded.
    pub fn record_signup(&self, validator_id: ValidatorId, signup_block_num: u64) -> Self {
        let mut next = self.clone();
        next.validators.insert(
            validator_id,
            ValidatorState {
                committed_too_late: false,
                claim_count: 0,
                signup_block_num,
                last_claim_block_num: None,
            },
        );
        next
    }

    /// Derive a snapshot flagging a validator's signup as committed too
    /// late. Applied by the registry transaction family on commit.
    pub fn flag_committed_too_late(&self, validator_id: ValidatorId) -> Self {
        let mut next = self.clone();
        next.validators.entry(validator_id).or_default().committed_too_late = true;
        next
    }

    // Eligibility checks consumed by the registry-gated publisher and
    // verifier. A validator absent from the snapshot carries the default
    // (genesis-registered) state.

    pub fn signup_committed_too_late(&self, validator_id: &ValidatorId) -> bool {
        self.validator(validator_id)
            .map(|s| s.committed_too_late)
            .unwrap_or(false)
    }

    pub fn has_claimed_block_limit(&self, validator_id: &ValidatorId) -> bool {
        self.validator(validator_id)
            .map(|s| s.claim_count >= self.bounds.block_claim_limit)
            .unwrap_or(false)
    }

    pub fn is_claiming_too_early(&self, validator_id: &ValidatorId, block_num: u64) -> bool {
        self.validator(validator_id)
            .map(|s| block_num <= s.signup_block_num + self.bounds.block_claim_delay)
            .unwrap_or(false)
    }

    pub fn is_claiming_too_frequently(&self, validator_id: &ValidatorId, block_num: u64) -> bool {
        if self.bounds.block_claim_spacing == 0 {
            return false;
        }
        self.validator(validator_id)
            .and_then(|s| s.last_claim_block_num)
            .map(|last| block_num.saturating_sub(last) <= self.bounds.block_claim_spacing)
            .unwrap_or(false)
    }
}
