//! Local consensus storage traits
//!
//! Two stores back the registry-gated publisher: consensus-state snapshots
//! keyed by block id, and sealed key material keyed by validator id. Both are
//! accessed through scoped handles; callers must not assume atomicity across
//! multiple store calls.

use serde::{Deserialize, Serialize};
use solstice_core::{BlockId, PublicKey, SolsticeResult, ValidatorId};

use crate::snapshot::ConsensusStateSnapshot;

/// Store of consensus-state snapshots by block id.
///
/// One snapshot exists per block on the current chain. Writes must be durable
/// before a dependent operation reports success.
pub trait ConsensusStateStore: Send + Sync {
    fn get(&self, block_id: &BlockId) -> SolsticeResult<Option<ConsensusStateSnapshot>>;

    fn put(&self, block_id: &BlockId, snapshot: &ConsensusStateSnapshot) -> SolsticeResult<()>;

    /// Snapshot for a block, or the genesis snapshot when none is recorded
    fn get_or_default(&self, block_id: &BlockId) -> SolsticeResult<ConsensusStateSnapshot> {
        Ok(self.get(block_id)?.unwrap_or_default())
    }
}

/// Sealed signup key material held in local key storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyState {
    /// Public identifier of the signup this material belongs to
    pub poet_public_key: PublicKey,
    /// Sealed private material from the elapsed-time prover
    pub sealed_signup_data: Vec<u8>,
    /// Whether the matching registration has been committed on-chain
    pub committed: bool,
}

impl KeyState {
    pub fn pending(poet_public_key: PublicKey, sealed_signup_data: Vec<u8>) -> Self {
        Self {
            poet_public_key,
            sealed_signup_data,
            committed: false,
        }
    }
}

/// Store of sealed key material by validator id.
///
/// A restart must find the same pending key state a prior registration
/// ceremony produced, so a node never re-registers spuriously.
pub trait KeyStateStore: Send + Sync {
    fn get(&self, validator_id: &ValidatorId) -> SolsticeResult<Option<KeyState>>;

    fn put(&self, validator_id: &ValidatorId, state: &KeyState) -> SolsticeResult<()>;

    fn delete(&self, validator_id: &ValidatorId) -> SolsticeResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state_serialization() {
        let state = KeyState::pending(PublicKey::from_bytes([3u8; 32]), vec![1, 2, 3]);
        let bytes = bincode::serialize(&state).unwrap();
        let restored: KeyState = bincode::deserialize(&bytes).unwrap();

        assert_eq!(state, restored);
        assert!(!restored.committed);
    }
}
