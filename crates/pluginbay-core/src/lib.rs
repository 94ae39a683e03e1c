//! Core types for pluginbay
//!
//! Shared vocabulary between the session coordinator and the collaborators
//! it drives:
//!
//! - **Descriptors** - what a discovery scan finds ([`PluginDescriptor`])
//! - **Presets** - named parameter snapshots and their change events
//! - **Views** - the two layouts negotiated with a plugin's interface
//! - **Collaborators** - [`PluginRegistry`], [`PluginHost`], [`PluginInstance`], [`AudioGraph`]
//! - **Delivery context** - [`Dispatcher`], the single thread callbacks land on

pub mod error;
pub use error::{InstantiationStage, PresetOperation, Result, SessionError};

mod config;
pub use config::{SessionConfig, DEFAULT_DENYLIST};

mod descriptor;
pub use descriptor::{DescriptorInfo, PluginDescriptor, PluginKind};

mod dispatch;
pub use dispatch::{DeliveryThread, DispatchPump, Dispatcher};

mod graph;
pub use graph::AudioGraph;

mod host;
pub use host::{InstantiationMode, PluginHost, PluginRegistry};

mod instance;
pub use instance::{PluginInstance, PresetSignal, SubscriptionId};

mod preset;
pub use preset::{PendingChange, Preset, PresetChangeEvent, PresetChangeKind};

mod view;
pub use view::{ViewConfiguration, ViewConfigurations, ViewHandle};
