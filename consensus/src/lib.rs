//! Solstice Consensus Modules
//!
//! Implements the pluggable consensus subsystem:
//! - A module registry resolving the active algorithm from on-chain settings
//! - Dev-mode publishing with randomized or fixed wait intervals
//! - PoET-style registry-gated publishing with elapsed-time proofs
//! - A deterministic fork-choice tie-break

pub mod factory;
pub mod devmode;
pub mod poet;
pub mod fork;
pub mod enclave;

pub use factory::*;
pub use devmode::*;
pub use poet::*;
pub use fork::*;
pub use enclave::*;
