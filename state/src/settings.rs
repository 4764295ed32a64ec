//! Settings view implementations
//!
//! On-chain settings are committed by the settings transaction family and
//! read here through the `SettingsView` capability. The in-memory view backs
//! tests and single-node development.

use dashmap::DashMap;
use solstice_core::SettingsView;
use std::sync::Arc;

/// Setting key selecting the active consensus algorithm
pub const SETTING_CONSENSUS_ALGORITHM: &str = "consensus.algorithm";
/// Minimum publisher wait time in milliseconds
pub const SETTING_MIN_WAIT_TIME: &str = "consensus.MinWaitTime";
/// Maximum publisher wait time in milliseconds
pub const SETTING_MAX_WAIT_TIME: &str = "consensus.MaxWaitTime";
/// Number of batches expected per block
pub const SETTING_NUM_BATCHES: &str = "consensus.num_batches";
/// Optional comma-separated allow-list of eligible signer keys
pub const SETTING_VALID_BLOCK_PUBLISHERS: &str = "consensus.ValidBlockPublishers";

/// In-memory settings view
#[derive(Default)]
pub struct InMemorySettingsView {
    settings: DashMap<String, String>,
}

impl InMemorySettingsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings<I, K, V>(settings: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let view = Self::new();
        for (key, value) in settings {
            view.settings.insert(key.into(), value.into());
        }
        view
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.settings.insert(key.into(), value.into());
    }

    pub fn unset(&self, key: &str) {
        self.settings.remove(key);
    }
}

impl SettingsView for InMemorySettingsView {
    fn get_setting(&self, key: &str) -> Option<String> {
        self.settings.get(key).map(|v| v.value().clone())
    }
}

/// Shared settings view
pub type SharedSettingsView = Arc<dyn SettingsView>;

#[cfg(test)]
mod tests {
    use super::*;
    use solstice_core::SolsticeError;

    #[test]
    fn test_get_setting_u64_default() {
        let view = InMemorySettingsView::new();
        assert_eq!(view.get_setting_u64(SETTING_MIN_WAIT_TIME, 0).unwrap(), 0);

        view.set(SETTING_MIN_WAIT_TIME, "250");
        assert_eq!(view.get_setting_u64(SETTING_MIN_WAIT_TIME, 0).unwrap(), 250);
    }

    #[test]
    fn test_get_setting_u64_malformed() {
        let view = InMemorySettingsView::with_settings([(SETTING_MAX_WAIT_TIME, "soon")]);
        let err = view.get_setting_u64(SETTING_MAX_WAIT_TIME, 0).unwrap_err();
        assert!(matches!(err, SolsticeError::InvalidSetting { .. }));
    }

    #[test]
    fn test_get_setting_list() {
        let view = InMemorySettingsView::with_settings([(
            SETTING_VALID_BLOCK_PUBLISHERS,
            "aa, bb ,cc",
        )]);
        let list = view.get_setting_list(SETTING_VALID_BLOCK_PUBLISHERS).unwrap();
        assert_eq!(list, vec!["aa", "bb", "cc"]);

        assert!(view.get_setting_list("consensus.unset").is_none());
    }
}
