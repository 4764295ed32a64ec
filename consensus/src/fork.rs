//! Deterministic fork resolution
//!
//! When two valid chains diverge from a common ancestor, every validator must
//! pick the same winner without coordinating. The tie-break hashes each
//! head's signer together with its header signature into a 128-bit integer;
//! the larger integer wins. Any two validators observing the same two heads
//! converge on the same decision, independent of arrival order.

use solstice_core::{Block, ForkResolver};
use solstice_crypto::hashing::tiebreak_digest;
use tracing::debug;

/// 128-bit tie-break value for a chain head
pub fn fork_priority(block: &Block) -> u128 {
    tiebreak_digest(&[
        block.header.signer.as_bytes(),
        block.header_signature.as_bytes(),
    ])
}

/// Fork resolver choosing the head with the greater tie-break digest.
///
/// The comparison reads only the two blocks passed in; the resolver keeps no
/// state between calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct TiebreakForkResolver;

impl TiebreakForkResolver {
    pub fn new() -> Self {
        Self
    }
}

impl ForkResolver for TiebreakForkResolver {
    fn compare_forks(&self, current: &Block, candidate: &Block) -> bool {
        let current_priority = fork_priority(current);
        let candidate_priority = fork_priority(candidate);

        let adopt = candidate_priority > current_priority;
        debug!(
            current = %current.header.signer,
            candidate = %candidate.header.signer,
            adopt,
            "fork comparison"
        );
        adopt
    }
}
