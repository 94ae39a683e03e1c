//! Discovery and instantiation collaborators.

use crate::descriptor::{DescriptorInfo, PluginKind};
use crate::error::Result;
use crate::instance::PluginInstance;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where a plugin instance runs relative to the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstantiationMode {
    InProcess,
    /// Isolated from the host so a crashing plugin cannot take it down.
    #[default]
    OutOfProcess,
}

impl std::fmt::Display for InstantiationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstantiationMode::InProcess => write!(f, "in-process"),
            InstantiationMode::OutOfProcess => write!(f, "out-of-process"),
        }
    }
}

/// Enumerates installed plugins. Queries may be slow and are run off the
/// delivery context.
pub trait PluginRegistry: Send + Sync {
    /// All plugins of `kind` for which `filter` returns true, in registry order.
    fn query(
        &self,
        kind: PluginKind,
        filter: &dyn Fn(&DescriptorInfo) -> bool,
    ) -> Result<Vec<DescriptorInfo>>;
}

/// Creates live instances from descriptors. May block.
pub trait PluginHost: Send + Sync {
    fn instantiate(
        &self,
        info: &DescriptorInfo,
        mode: InstantiationMode,
    ) -> Result<Arc<dyn PluginInstance>>;
}
