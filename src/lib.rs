//! # pluginbay - Audio Plugin Session Host
//!
//! Browse installed audio plugins, instantiate one into a playback graph,
//! switch its interface layout, and manage named presets with change
//! notifications.
//!
//! ## Architecture
//!
//! pluginbay is an umbrella crate that coordinates:
//! - **pluginbay-core** - Descriptors, presets, view configurations, collaborator traits, delivery context
//! - **pluginbay-session** - The session coordinator ([`SessionManager`])
//! - **pluginbay-virtual** - Directory/catalog registries, in-memory host, preset stores, recording graph
//!
//! ## Quick Start
//!
//! ```ignore
//! use pluginbay::prelude::*;
//!
//! let (dispatcher, _delivery) = Dispatcher::spawn("pluginbay-delivery")?;
//! let session = SessionManager::builder()
//!     .registry(Arc::new(DirectoryRegistry::system()))
//!     .host(Arc::new(VirtualHost::new([]).permissive()))
//!     .graph(Arc::new(RecordingGraph::new()))
//!     .dispatcher(dispatcher)
//!     .build()?;
//!
//! let effects = session.discover(PluginKind::Effect).await?;
//! session.select_descriptor(1).await?;
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Session coordinator plus `virtual`
//! - `virtual` - Concrete collaborators
//! - `demo` - The `pluginbay-demo` binary

/// Re-export of pluginbay-core for direct access
pub use pluginbay_core as core;

pub use pluginbay_core::{
    AudioGraph, DeliveryThread, DescriptorInfo, DispatchPump, Dispatcher, InstantiationMode,
    InstantiationStage, PendingChange, PluginDescriptor, PluginHost, PluginInstance, PluginKind,
    PluginRegistry, Preset, PresetChangeEvent, PresetChangeKind, PresetOperation, Result,
    SessionConfig, SessionError, ViewConfiguration, ViewConfigurations, ViewHandle,
};

pub use pluginbay_session::{ListenerId, SessionManager, SessionManagerBuilder};

// Concrete collaborators
#[cfg(feature = "virtual")]
pub use pluginbay_virtual as virtual_host;

#[cfg(feature = "virtual")]
pub use pluginbay_virtual::{
    CatalogRegistry, DirectoryRegistry, GraphEvent, PresetStore, RecordingGraph, VirtualHost,
    VirtualInstance, VirtualPlugin,
};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{
        Dispatcher, PluginDescriptor, PluginKind, Preset, PresetChangeEvent, PresetChangeKind,
        SessionConfig, SessionManager,
    };

    pub use std::sync::Arc;

    #[cfg(feature = "virtual")]
    pub use crate::{CatalogRegistry, DirectoryRegistry, RecordingGraph, VirtualHost, VirtualPlugin};
}
