//! Persistent consensus storage using sled
//!
//! Backs the consensus-state and key-state stores with one sled database so
//! registration side effects survive a node restart.

use sled::{Db, Tree};
use solstice_core::{BlockId, SolsticeError, SolsticeResult, ValidatorId};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::snapshot::ConsensusStateSnapshot;
use crate::store::{ConsensusStateStore, KeyState, KeyStateStore};

const CONSENSUS_STATE_TREE: &str = "consensus_state";
const KEY_STATE_TREE: &str = "key_state";

fn storage_err(err: sled::Error) -> SolsticeError {
    SolsticeError::StorageError(err.to_string())
}

/// Sled-backed consensus storage exposing both store handles
pub struct ConsensusStorage {
    db: Db,
    consensus_state: Tree,
    key_state: Tree,
}

impl ConsensusStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> SolsticeResult<Self> {
        let db = sled::open(path.as_ref()).map_err(storage_err)?;
        let consensus_state = db.open_tree(CONSENSUS_STATE_TREE).map_err(storage_err)?;
        let key_state = db.open_tree(KEY_STATE_TREE).map_err(storage_err)?;
        debug!(path = %path.as_ref().display(), "opened consensus storage");

        Ok(Self {
            db,
            consensus_state,
            key_state,
        })
    }

    pub fn flush(&self) -> SolsticeResult<()> {
        self.db.flush().map_err(storage_err)?;
        Ok(())
    }
}

impl ConsensusStateStore for ConsensusStorage {
    fn get(&self, block_id: &BlockId) -> SolsticeResult<Option<ConsensusStateSnapshot>> {
        match self.consensus_state.get(block_id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => {
                let snapshot = bincode::deserialize(&bytes).map_err(|e| {
                    SolsticeError::StateCorruption(format!(
                        "consensus state for {}: {}",
                        block_id, e
                    ))
                })?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    fn put(&self, block_id: &BlockId, snapshot: &ConsensusStateSnapshot) -> SolsticeResult<()> {
        let bytes = bincode::serialize(snapshot)?;
        self.consensus_state
            .insert(block_id.as_bytes(), bytes)
            .map_err(storage_err)?;
        // Durable before the caller may report success
        self.db.flush().map_err(storage_err)?;
        Ok(())
    }
}

impl KeyStateStore for ConsensusStorage {
    fn get(&self, validator_id: &ValidatorId) -> SolsticeResult<Option<KeyState>> {
        match self.key_state.get(validator_id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => {
                let state = bincode::deserialize(&bytes).map_err(|e| {
                    SolsticeError::KeyStorageError(format!(
                        "key state for {}: {}",
                        validator_id, e
                    ))
                })?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    fn put(&self, validator_id: &ValidatorId, state: &KeyState) -> SolsticeResult<()> {
        let bytes = bincode::serialize(state)?;
        self.key_state
            .insert(validator_id.as_bytes(), bytes)
            .map_err(storage_err)?;
        self.db.flush().map_err(storage_err)?;
        Ok(())
    }

    fn delete(&self, validator_id: &ValidatorId) -> SolsticeResult<()> {
        self.key_state
            .remove(validator_id.as_bytes())
            .map_err(storage_err)?;
        self.db.flush().map_err(storage_err)?;
        Ok(())
    }
}

/// Shared persistent storage
pub type SharedConsensusStorage = Arc<ConsensusStorage>;

/// Open shared consensus storage at a path
pub fn open_consensus_storage<P: AsRef<Path>>(path: P) -> SolsticeResult<SharedConsensusStorage> {
    Ok(Arc::new(ConsensusStorage::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solstice_core::{Hash, PublicKey};
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let storage = ConsensusStorage::open(tmp.path()).unwrap();

        let block_id = Hash::from_bytes([1u8; 32]);
        let snapshot = ConsensusStateSnapshot::default()
            .record_signup(PublicKey::from_bytes([2u8; 32]), 7);

        ConsensusStateStore::put(&storage, &block_id, &snapshot).unwrap();
        let restored = ConsensusStateStore::get(&storage, &block_id).unwrap().unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_key_state_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let validator_id = PublicKey::from_bytes([1u8; 32]);
        let state = KeyState::pending(PublicKey::from_bytes([2u8; 32]), vec![4, 5, 6]);

        {
            let storage = ConsensusStorage::open(tmp.path()).unwrap();
            KeyStateStore::put(&storage, &validator_id, &state).unwrap();
        }

        {
            let storage = ConsensusStorage::open(tmp.path()).unwrap();
            let restored = KeyStateStore::get(&storage, &validator_id).unwrap().unwrap();
            assert_eq!(restored, state);
        }
    }
}
