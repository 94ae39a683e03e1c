//! Session configuration.

use crate::descriptor::{DescriptorInfo, PluginKind};
use crate::error::{Result, SessionError};
use crate::host::InstantiationMode;
use crate::view::ViewConfigurations;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Plugins known to misbehave when hosted in a simple playback chain.
pub const DEFAULT_DENYLIST: &[&str] = &["AUNewPitch", "AURoundTripAAC", "AUNetSend"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub instantiation_mode: InstantiationMode,

    /// Plugin names never offered by discovery (case-insensitive).
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,

    /// Drop effects that have no interface of their own. Needed on hosts that
    /// only render plugins inside a compact embedded view.
    #[serde(default)]
    pub require_custom_view_for_effects: bool,

    #[serde(default)]
    pub view_configurations: ViewConfigurations,

    #[serde(default = "default_view_index")]
    pub initial_view_index: usize,
}

fn default_denylist() -> Vec<String> {
    DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect()
}

fn default_view_index() -> usize {
    ViewConfigurations::EXPANDED
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            instantiation_mode: InstantiationMode::default(),
            denylist: default_denylist(),
            require_custom_view_for_effects: false,
            view_configurations: ViewConfigurations::default(),
            initial_view_index: default_view_index(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.view_configurations.get(self.initial_view_index).is_none() {
            return Err(SessionError::InvalidConfig(format!(
                "initial_view_index {} out of range (0-1)",
                self.initial_view_index
            )));
        }
        for config in self.view_configurations.to_vec() {
            if !(config.width > 0.0 && config.height > 0.0) {
                return Err(SessionError::InvalidConfig(format!(
                    "view configuration {}x{} must have a positive size",
                    config.width, config.height
                )));
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Whether discovery should offer `info` for a scan of `kind`.
    pub fn accepts(&self, kind: PluginKind, info: &DescriptorInfo) -> bool {
        if self
            .denylist
            .iter()
            .any(|denied| denied.eq_ignore_ascii_case(&info.name))
        {
            return false;
        }
        if kind == PluginKind::Effect
            && self.require_custom_view_for_effects
            && !info.has_custom_view
        {
            return false;
        }
        true
    }
}
