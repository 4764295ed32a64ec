//! Dev-mode consensus
//!
//! Leader timing without registration: a validator may claim a block once a
//! configured wait interval has passed, optionally restricted to an
//! allow-list of signers. Eligibility is a publisher-side throttle, not a
//! safety property, so the matching verifier accepts any well-formed block.

use rand::Rng;
use solstice_core::{
    Block, BlockHeader, BlockPublisher, BlockVerifier, PublicKey, SettingsView,
    SolsticeError, SolsticeResult, Timestamp,
};
use solstice_state::settings::{
    SETTING_MAX_WAIT_TIME, SETTING_MIN_WAIT_TIME, SETTING_NUM_BATCHES,
    SETTING_VALID_BLOCK_PUBLISHERS,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Consensus tag stamped on dev-mode blocks
pub const DEVMODE_CONSENSUS_TAG: &[u8] = b"Devmode";
/// Consensus tag stamped by the fixed-interval sibling
pub const TIMED_CONSENSUS_TAG: &[u8] = b"TimedDevmode";

/// Wait-time configuration, re-read from on-chain settings for every
/// candidate block and immutable while that block is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaitTimeConfig {
    pub min_wait_ms: u64,
    pub max_wait_ms: u64,
    pub num_batches: u64,
    /// Optional allow-list of eligible signer keys
    pub valid_publishers: Option<Vec<PublicKey>>,
}

impl WaitTimeConfig {
    pub fn load(settings: &dyn SettingsView) -> SolsticeResult<Self> {
        let min_wait_ms = settings.get_setting_u64(SETTING_MIN_WAIT_TIME, 0)?;
        let max_wait_ms = settings.get_setting_u64(SETTING_MAX_WAIT_TIME, 0)?;
        let num_batches = settings.get_setting_u64(SETTING_NUM_BATCHES, 0)?;

        let valid_publishers = match settings.get_setting_list(SETTING_VALID_BLOCK_PUBLISHERS) {
            None => None,
            Some(entries) => {
                let mut keys = Vec::with_capacity(entries.len());
                for entry in entries {
                    let key = PublicKey::from_hex(&entry).map_err(|_| {
                        SolsticeError::InvalidSetting {
                            key: SETTING_VALID_BLOCK_PUBLISHERS.to_string(),
                            value: entry,
                        }
                    })?;
                    keys.push(key);
                }
                Some(keys)
            }
        };

        Ok(Self {
            min_wait_ms,
            max_wait_ms,
            num_batches,
            valid_publishers,
        })
    }
}

/// Dev-mode block publisher with randomized wait-interval leader timing.
pub struct DevModePublisher {
    settings: Arc<dyn SettingsView>,
    config: WaitTimeConfig,
    start_time: Timestamp,
    /// Sampled wait for the current candidate, private scratch state
    wait_ms: u64,
}

impl DevModePublisher {
    pub fn new(settings: Arc<dyn SettingsView>) -> Self {
        Self {
            settings,
            config: WaitTimeConfig::default(),
            start_time: Timestamp::from_millis(0),
            wait_ms: 0,
        }
    }
}

impl BlockPublisher for DevModePublisher {
    fn initialize_block(&mut self, header: &mut BlockHeader) -> SolsticeResult<bool> {
        self.config = WaitTimeConfig::load(&*self.settings)?;

        header.consensus = DEVMODE_CONSENSUS_TAG.to_vec();
        self.start_time = Timestamp::now();
        // Resampled for every candidate block, never persisted
        self.wait_ms = if self.config.min_wait_ms > 0
            && self.config.max_wait_ms > self.config.min_wait_ms
        {
            rand::thread_rng().gen_range(self.config.min_wait_ms..=self.config.max_wait_ms)
        } else {
            0
        };

        debug!(
            min_wait_ms = self.config.min_wait_ms,
            max_wait_ms = self.config.max_wait_ms,
            sampled_ms = self.wait_ms,
            "initialized dev-mode candidate"
        );
        Ok(true)
    }

    fn check_publish_block(&mut self, header: &BlockHeader) -> bool {
        if let Some(allow) = &self.config.valid_publishers {
            if !allow.contains(&header.signer) {
                return false;
            }
        }

        let now = Timestamp::now().as_millis();
        let start = self.start_time.as_millis();
        let min = self.config.min_wait_ms;
        let max = self.config.max_wait_ms;

        if min == 0 {
            true
        } else if max == 0 {
            start + min <= now
        } else if max > min {
            start + self.wait_ms <= now
        } else {
            // 0 < max <= min has no defined eligibility rule
            warn!(min_wait_ms = min, max_wait_ms = max, "malformed wait-time bounds");
            false
        }
    }

    fn finalize_block(&mut self, _header: &mut BlockHeader) -> SolsticeResult<()> {
        // Reserved for signature/metadata injection by stricter variants
        Ok(())
    }
}

/// Fixed-interval publisher: eligible once the configured wait has passed
/// since this validator's own last successful claim.
pub struct TimedPublisher {
    wait_time_ms: u64,
    last_claim_time: Timestamp,
}

impl TimedPublisher {
    pub fn new(wait_time_ms: u64) -> Self {
        Self {
            wait_time_ms,
            last_claim_time: Timestamp::now(),
        }
    }
}

impl Default for TimedPublisher {
    fn default() -> Self {
        Self::new(20_000)
    }
}

impl BlockPublisher for TimedPublisher {
    fn initialize_block(&mut self, header: &mut BlockHeader) -> SolsticeResult<bool> {
        header.consensus = TIMED_CONSENSUS_TAG.to_vec();
        Ok(true)
    }

    fn check_publish_block(&mut self, _header: &BlockHeader) -> bool {
        let now = Timestamp::now();
        if now.as_millis() - self.last_claim_time.as_millis() > self.wait_time_ms {
            self.last_claim_time = now;
            return true;
        }
        false
    }

    fn finalize_block(&mut self, _header: &mut BlockHeader) -> SolsticeResult<()> {
        Ok(())
    }
}

/// Dev-mode verifier: any well-formed block is accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct DevModeVerifier;

impl DevModeVerifier {
    pub fn new() -> Self {
        Self
    }
}

impl BlockVerifier for DevModeVerifier {
    fn verify_block(&self, _block: &Block) -> bool {
        true
    }

    fn compute_block_weight(&self, block: &Block) -> u64 {
        // longest chain wins
        block.header.block_num
    }
}
