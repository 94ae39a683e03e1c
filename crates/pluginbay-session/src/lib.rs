//! Plugin session coordinator for pluginbay
//!
//! [`SessionManager`] discovers plugins through a [`PluginRegistry`],
//! instantiates the selected one through a [`PluginHost`], routes it into an
//! [`AudioGraph`], and re-broadcasts preset list changes as
//! [`PresetChangeEvent`]s classified as save, delete or external.
//!
//! ## Usage
//!
//! ```ignore
//! use pluginbay_session::SessionManager;
//! use pluginbay_core::{Dispatcher, PluginKind, Preset};
//!
//! let (dispatcher, _delivery) = Dispatcher::spawn("pluginbay-delivery")?;
//! let session = SessionManager::builder()
//!     .registry(registry)
//!     .host(host)
//!     .graph(graph)
//!     .dispatcher(dispatcher)
//!     .build()?;
//!
//! session.add_listener(|event| println!("{:?}: {} presets", event.kind, event.presets.len()));
//!
//! session.discover(PluginKind::Effect).await?;
//! if session.select_descriptor(1).await? {
//!     session.save_preset(&Preset::unsaved("My Sound"))?;
//! }
//! ```
//!
//! [`PluginRegistry`]: pluginbay_core::PluginRegistry
//! [`PluginHost`]: pluginbay_core::PluginHost
//! [`AudioGraph`]: pluginbay_core::AudioGraph
//! [`PresetChangeEvent`]: pluginbay_core::PresetChangeEvent

mod active;

mod builder;
pub use builder::SessionManagerBuilder;

mod listeners;
pub use listeners::ListenerId;

mod manager;
pub use manager::SessionManager;
