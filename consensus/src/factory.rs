//! Consensus module registry
//!
//! Maps short algorithm names to constructors producing a matched
//! publisher/verifier/fork-resolver bundle. The active algorithm is an
//! on-chain setting, so every validator resolves the same module for the
//! same chain state.

use solstice_core::{
    BlockPublisher, BlockVerifier, ForkResolver, SettingsView, SolsticeError, SolsticeResult,
    ValidatorId,
};
use solstice_state::settings::SETTING_CONSENSUS_ALGORITHM;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::devmode::{DevModePublisher, DevModeVerifier};
use crate::fork::TiebreakForkResolver;
use crate::poet::{PoetContext, PoetPublisher, PoetVerifier};

/// Algorithm used when the chain carries no explicit setting
pub const DEFAULT_CONSENSUS_MODULE: &str = "devmode";

/// A matched set of consensus components.
///
/// The three parts must come from the same module: a verifier from one
/// algorithm cannot judge blocks a publisher of another produced.
pub struct ModuleBundle {
    pub publisher: Box<dyn BlockPublisher>,
    pub verifier: Box<dyn BlockVerifier>,
    pub fork_resolver: Box<dyn ForkResolver>,
}

/// Everything a module constructor may need to wire up its components.
#[derive(Clone)]
pub struct ConsensusContext {
    pub settings: Arc<dyn SettingsView>,
    pub poet: PoetContext,
    pub validator_id: ValidatorId,
}

type ModuleConstructor = Box<dyn Fn(&ConsensusContext) -> ModuleBundle + Send + Sync>;

/// Registry of consensus modules by short name.
pub struct ConsensusRegistry {
    constructors: HashMap<String, ModuleConstructor>,
}

impl ConsensusRegistry {
    /// Registry with the built-in modules, `devmode` and `poet`.
    pub fn new() -> Self {
        let mut registry = Self {
            constructors: HashMap::new(),
        };
        registry.register("devmode", |ctx| ModuleBundle {
            publisher: Box::new(DevModePublisher::new(ctx.settings.clone())),
            verifier: Box::new(DevModeVerifier::new()),
            fork_resolver: Box::new(TiebreakForkResolver::new()),
        });
        registry.register("poet", |ctx| ModuleBundle {
            publisher: Box::new(PoetPublisher::new(ctx.poet.clone(), ctx.validator_id)),
            verifier: Box::new(PoetVerifier::new(ctx.poet.clone())),
            fork_resolver: Box::new(TiebreakForkResolver::new()),
        });
        registry
    }

    /// Register a module constructor under a short name. Re-registering a
    /// name replaces the previous constructor.
    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(&ConsensusContext) -> ModuleBundle + Send + Sync + 'static,
    {
        debug!(module = name, "registered consensus module");
        self.constructors
            .insert(name.to_lowercase(), Box::new(constructor));
    }

    /// Construct the bundle for a named module.
    pub fn resolve(&self, name: &str, ctx: &ConsensusContext) -> SolsticeResult<ModuleBundle> {
        let constructor = self
            .constructors
            .get(&name.to_lowercase())
            .ok_or_else(|| SolsticeError::UnknownConsensusModule(name.to_string()))?;
        Ok(constructor(ctx))
    }

    /// Construct the bundle named by the chain's consensus-algorithm
    /// setting, falling back to [`DEFAULT_CONSENSUS_MODULE`].
    pub fn resolve_configured(&self, ctx: &ConsensusContext) -> SolsticeResult<ModuleBundle> {
        let name = ctx
            .settings
            .get_setting(SETTING_CONSENSUS_ALGORITHM)
            .unwrap_or_else(|| DEFAULT_CONSENSUS_MODULE.to_string());
        info!(module = %name, "resolving configured consensus module");
        self.resolve(&name, ctx)
    }
}

impl Default for ConsensusRegistry {
    fn default() -> Self {
        Self::new()
    }
}
