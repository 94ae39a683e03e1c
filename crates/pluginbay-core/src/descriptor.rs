//! Plugin descriptors produced by a discovery scan.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a plugin does with audio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PluginKind {
    Effect,
    Instrument,
}

impl PluginKind {
    pub fn label(self) -> &'static str {
        match self {
            PluginKind::Effect => "effect",
            PluginKind::Instrument => "instrument",
        }
    }
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything needed to identify and instantiate an installed plugin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorInfo {
    /// Unique component ID
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Vendor/author name
    pub vendor: String,

    pub kind: PluginKind,

    /// Does the plugin ship its own interface?
    pub has_custom_view: bool,

    /// Bundle location on disk, if the registry found it there
    pub location: Option<PathBuf>,
}

impl DescriptorInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: PluginKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            vendor: String::new(),
            kind,
            has_custom_view: false,
            location: None,
        }
    }

    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    pub fn custom_view(mut self, has_custom_view: bool) -> Self {
        self.has_custom_view = has_custom_view;
        self
    }

    pub fn location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }
}

/// An entry in the discovered list. `None` stands for "no plugin selected"
/// and is only ever synthesized at the head of an effect scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PluginDescriptor {
    None,
    Plugin(DescriptorInfo),
}

impl PluginDescriptor {
    pub fn is_none(&self) -> bool {
        matches!(self, PluginDescriptor::None)
    }

    pub fn info(&self) -> Option<&DescriptorInfo> {
        match self {
            PluginDescriptor::None => None,
            PluginDescriptor::Plugin(info) => Some(info),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PluginDescriptor::None => "(No effect)",
            PluginDescriptor::Plugin(info) => &info.name,
        }
    }
}

impl From<DescriptorInfo> for PluginDescriptor {
    fn from(info: DescriptorInfo) -> Self {
        PluginDescriptor::Plugin(info)
    }
}
