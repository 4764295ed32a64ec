//! Solstice State Views and Stores
//!
//! Provides the consensus subsystem's view onto committed chain state
//! (settings, validator registry) and its local bookkeeping stores
//! (consensus-state snapshots, sealed key material).

pub mod settings;
pub mod registry;
pub mod snapshot;
pub mod store;
pub mod memory;
pub mod persistent;

pub use settings::*;
pub use registry::*;
pub use snapshot::*;
pub use store::*;
pub use memory::*;
pub use persistent::*;
