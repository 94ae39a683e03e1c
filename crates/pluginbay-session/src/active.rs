//! The currently selected plugin and its preset subscription.

use pluginbay_core::{PluginInstance, SubscriptionId};
use std::sync::Arc;

/// Preset-list subscription on one instance. Unsubscribes when dropped, so
/// an instance can never outlive its observer registration.
pub(crate) struct PresetSubscription {
    instance: Arc<dyn PluginInstance>,
    id: SubscriptionId,
}

impl PresetSubscription {
    pub(crate) fn new(instance: Arc<dyn PluginInstance>, id: SubscriptionId) -> Self {
        Self { instance, id }
    }
}

impl Drop for PresetSubscription {
    fn drop(&mut self) {
        self.instance.unsubscribe_presets(self.id);
        tracing::debug!(
            "Preset subscription {:?} on '{}' cancelled",
            self.id,
            self.instance.info().name
        );
    }
}

pub(crate) struct ActivePlugin {
    pub(crate) instance: Arc<dyn PluginInstance>,
    /// Selection generation that installed this instance.
    pub(crate) generation: u64,
    /// Held until the instance is released.
    #[allow(dead_code)]
    pub(crate) subscription: Option<PresetSubscription>,
}
