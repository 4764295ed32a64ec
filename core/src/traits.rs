//! Core traits defining Solstice interfaces
//!
//! These traits define the contracts between the consensus subsystem and the
//! rest of the validator.

use crate::types::*;

/// Result type for Solstice operations
pub type SolsticeResult<T> = Result<T, crate::error::SolsticeError>;

/// Read-only view over committed on-chain settings.
///
/// Settings are stored as strings; typed helpers surface parse failures as
/// configuration errors rather than silently defaulting.
pub trait SettingsView: Send + Sync {
    /// Get a raw setting value, or `None` if unset
    fn get_setting(&self, key: &str) -> Option<String>;

    /// Get an integer setting, falling back to `default` when unset.
    /// A present but unparsable value is a configuration error.
    fn get_setting_u64(&self, key: &str, default: u64) -> SolsticeResult<u64> {
        match self.get_setting(key) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| crate::error::SolsticeError::InvalidSetting {
                    key: key.to_string(),
                    value,
                }),
        }
    }

    /// Get a comma-separated list setting, or `None` if unset
    fn get_setting_list(&self, key: &str) -> Option<Vec<String>> {
        self.get_setting(key).map(|value| {
            value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }
}

/// Block publisher: drives a candidate block from initialization through
/// eligibility polling to finalization.
///
/// One publisher instance builds one candidate block at a time and is never
/// driven by two concurrent callers. None of the calls block; the caller
/// polls `check_publish_block` on its own schedule.
pub trait BlockPublisher: Send {
    /// Begin building a candidate block on top of `header.previous_id`.
    ///
    /// Stamps the header's consensus tag and sets up publisher-private
    /// scratch state. Returns `Ok(false)` when the local validator may not
    /// build on this attempt (a transient admission failure); the caller
    /// retries on its next scheduling tick.
    fn initialize_block(&mut self, header: &mut BlockHeader) -> SolsticeResult<bool>;

    /// Check whether the candidate block is ready to be claimed.
    fn check_publish_block(&mut self, header: &BlockHeader) -> bool;

    /// Apply any final consensus data to the header before it is signed and
    /// broadcast.
    fn finalize_block(&mut self, header: &mut BlockHeader) -> SolsticeResult<()>;
}

/// Block verifier: validates an externally-received block against the same
/// rule the publisher used to create it.
pub trait BlockVerifier: Send + Sync {
    /// Returns true if the block satisfies the consensus rule.
    /// Verification failures never error; the caller rejects the block.
    fn verify_block(&self, block: &Block) -> bool;

    /// Comparable weight for chain-length comparison
    fn compute_block_weight(&self, block: &Block) -> u64;
}

/// Fork resolver: deterministically picks between two competing chain heads.
pub trait ForkResolver: Send + Sync {
    /// Returns true if `candidate` should replace `current` as the chain
    /// head. The decision is a pure function of the two blocks passed in.
    fn compare_forks(&self, current: &Block, candidate: &Block) -> bool;
}
