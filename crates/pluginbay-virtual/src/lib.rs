//! Concrete collaborators for pluginbay sessions
//!
//! - [`DirectoryRegistry`] - finds plugin bundles in the platform's plugin folders
//! - [`CatalogRegistry`] - serves a fixed descriptor list
//! - [`VirtualHost`] - instantiates in-memory [`VirtualInstance`]s
//! - [`PresetStore`] - user presets shared across instances, in memory or as JSON on disk
//! - [`RecordingGraph`] - audio graph stand-in that records every request
//!
//! ## Usage
//!
//! ```ignore
//! let plugins = vec![
//!     VirtualPlugin::new(DescriptorInfo::new("acme.verb", "Reverb", PluginKind::Effect))
//!         .factory_presets(["Hall", "Plate"]),
//! ];
//! let registry = CatalogRegistry::new(plugins.iter().map(|p| p.info().clone()));
//! let host = VirtualHost::new(plugins).preset_dir("presets");
//! let graph = RecordingGraph::new();
//! ```

mod graph;
pub use graph::{GraphEvent, RecordingGraph};

mod host;
pub use host::VirtualHost;

mod instance;
pub use instance::{VirtualInstance, VirtualPlugin};

mod registry;
pub use registry::{CatalogRegistry, DirectoryRegistry};

mod store;
pub use store::PresetStore;
