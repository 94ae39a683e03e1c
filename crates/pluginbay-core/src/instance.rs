//! Plugin instance trait.
//!
//! An instance is shared between the session and the audio graph, so every
//! method takes `&self` and implementations use interior mutability.

use crate::descriptor::DescriptorInfo;
use crate::error::Result;
use crate::preset::Preset;
use crate::view::{ViewConfiguration, ViewHandle};

/// Callback fired whenever an instance's user preset list changes.
/// May be invoked from any thread.
pub type PresetSignal = Box<dyn Fn() + Send + Sync>;

/// Token returned by [`PluginInstance::subscribe_presets`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A live, instantiated plugin.
pub trait PluginInstance: Send + Sync {
    fn info(&self) -> &DescriptorInfo;

    // =========================================================================
    // Presets
    // =========================================================================

    fn factory_presets(&self) -> Vec<Preset>;

    /// User presets in the instance's native order (oldest first).
    fn user_presets(&self) -> Vec<Preset>;

    fn current_preset(&self) -> Option<Preset>;

    fn set_current_preset(&self, preset: &Preset) -> Result<()>;

    /// Whether user presets can be saved, deleted and observed.
    fn supports_user_presets(&self) -> bool;

    /// Persist `preset`. Returns the stored preset with its assigned number.
    fn save_preset(&self, preset: &Preset) -> Result<Preset>;

    fn delete_preset(&self, preset: &Preset) -> Result<()>;

    fn subscribe_presets(&self, signal: PresetSignal) -> SubscriptionId;

    fn unsubscribe_presets(&self, id: SubscriptionId);

    // =========================================================================
    // Interface
    // =========================================================================

    /// Indices into `offered` of the configurations this plugin can render.
    fn supported_view_configurations(&self, offered: &[ViewConfiguration]) -> Vec<usize>;

    fn select_view_configuration(&self, config: &ViewConfiguration);

    fn provides_user_interface(&self) -> bool;

    /// May block while the plugin builds its interface.
    fn request_view(&self) -> Option<ViewHandle>;
}
