//! In-memory stores for testing and light nodes

use dashmap::DashMap;
use solstice_core::{BlockId, SolsticeResult, ValidatorId};
use std::sync::Arc;

use crate::snapshot::ConsensusStateSnapshot;
use crate::store::{ConsensusStateStore, KeyState, KeyStateStore};

/// In-memory consensus-state store
#[derive(Default)]
pub struct MemoryConsensusStateStore {
    snapshots: DashMap<BlockId, ConsensusStateSnapshot>,
}

impl MemoryConsensusStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl ConsensusStateStore for MemoryConsensusStateStore {
    fn get(&self, block_id: &BlockId) -> SolsticeResult<Option<ConsensusStateSnapshot>> {
        Ok(self.snapshots.get(block_id).map(|s| s.clone()))
    }

    fn put(&self, block_id: &BlockId, snapshot: &ConsensusStateSnapshot) -> SolsticeResult<()> {
        self.snapshots.insert(*block_id, snapshot.clone());
        Ok(())
    }
}

/// In-memory key-state store
#[derive(Default)]
pub struct MemoryKeyStateStore {
    keys: DashMap<ValidatorId, KeyState>,
}

impl MemoryKeyStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStateStore for MemoryKeyStateStore {
    fn get(&self, validator_id: &ValidatorId) -> SolsticeResult<Option<KeyState>> {
        Ok(self.keys.get(validator_id).map(|k| k.clone()))
    }

    fn put(&self, validator_id: &ValidatorId, state: &KeyState) -> SolsticeResult<()> {
        self.keys.insert(*validator_id, state.clone());
        Ok(())
    }

    fn delete(&self, validator_id: &ValidatorId) -> SolsticeResult<()> {
        self.keys.remove(validator_id);
        Ok(())
    }
}

/// Shared in-memory stores
pub type SharedConsensusStateStore = Arc<dyn ConsensusStateStore>;
pub type SharedKeyStateStore = Arc<dyn KeyStateStore>;
