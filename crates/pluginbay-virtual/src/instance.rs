//! In-memory plugin instances.

use crate::store::PresetStore;
use parking_lot::Mutex;
use pluginbay_core::{
    DescriptorInfo, InstantiationMode, PluginInstance, Preset, PresetOperation, PresetSignal,
    Result, SessionError, SubscriptionId, ViewConfiguration, ViewHandle,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Blueprint for a plugin the virtual host can instantiate.
#[derive(Debug, Clone)]
pub struct VirtualPlugin {
    info: DescriptorInfo,
    factory_presets: Vec<Preset>,
    user_presets: bool,
    compact_view: bool,
    expanded_view: bool,
    user_interface: bool,
}

impl VirtualPlugin {
    /// A plugin with user preset support, an interface, and the expanded
    /// layout only.
    pub fn new(info: DescriptorInfo) -> Self {
        Self {
            info,
            factory_presets: Vec::new(),
            user_presets: true,
            compact_view: false,
            expanded_view: true,
            user_interface: true,
        }
    }

    pub fn info(&self) -> &DescriptorInfo {
        &self.info
    }

    pub fn supports_user_presets(&self) -> bool {
        self.user_presets
    }

    /// Factory presets are numbered in the order given, starting at 0.
    pub fn factory_presets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.factory_presets = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Preset::new(i as i64, name))
            .collect();
        self
    }

    pub fn user_presets(mut self, supported: bool) -> Self {
        self.user_presets = supported;
        self
    }

    pub fn views(mut self, compact: bool, expanded: bool) -> Self {
        self.compact_view = compact;
        self.expanded_view = expanded;
        self
    }

    pub fn user_interface(mut self, provided: bool) -> Self {
        self.user_interface = provided;
        self
    }
}

/// A live virtual plugin. User presets live in a [`PresetStore`] shared with
/// every other instance of the same plugin.
pub struct VirtualInstance {
    blueprint: VirtualPlugin,
    mode: InstantiationMode,
    store: Option<Arc<PresetStore>>,
    current: Mutex<Option<Preset>>,
    selected_view: Mutex<Option<ViewConfiguration>>,
    view_handle: ViewHandle,
    live: Arc<AtomicUsize>,
}

impl VirtualInstance {
    pub(crate) fn new(
        blueprint: VirtualPlugin,
        mode: InstantiationMode,
        store: Option<Arc<PresetStore>>,
        view_handle: ViewHandle,
        live: Arc<AtomicUsize>,
    ) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        let current = blueprint.factory_presets.first().cloned();
        Self {
            blueprint,
            mode,
            store,
            current: Mutex::new(current),
            selected_view: Mutex::new(None),
            view_handle,
            live,
        }
    }

    pub fn mode(&self) -> InstantiationMode {
        self.mode
    }

    pub fn selected_view(&self) -> Option<ViewConfiguration> {
        *self.selected_view.lock()
    }

    pub fn store(&self) -> Option<&Arc<PresetStore>> {
        self.store.as_ref()
    }

    fn user_store(&self, operation: PresetOperation) -> Result<&Arc<PresetStore>> {
        self.store.as_ref().ok_or_else(|| {
            SessionError::persistence(operation, "user presets are not supported")
        })
    }
}

impl Drop for VirtualInstance {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!("Released virtual instance '{}'", self.blueprint.info.name);
    }
}

impl PluginInstance for VirtualInstance {
    fn info(&self) -> &DescriptorInfo {
        &self.blueprint.info
    }

    fn factory_presets(&self) -> Vec<Preset> {
        self.blueprint.factory_presets.clone()
    }

    fn user_presets(&self) -> Vec<Preset> {
        self.store
            .as_ref()
            .map(|store| store.presets())
            .unwrap_or_default()
    }

    fn current_preset(&self) -> Option<Preset> {
        self.current.lock().clone()
    }

    fn set_current_preset(&self, preset: &Preset) -> Result<()> {
        let known = self.blueprint.factory_presets.contains(preset)
            || self.user_presets().contains(preset);
        if !known {
            return Err(SessionError::persistence(
                PresetOperation::Load,
                format!("unknown preset '{}' (#{})", preset.name, preset.number),
            ));
        }
        *self.current.lock() = Some(preset.clone());
        Ok(())
    }

    fn supports_user_presets(&self) -> bool {
        self.store.is_some()
    }

    fn save_preset(&self, preset: &Preset) -> Result<Preset> {
        let saved = self.user_store(PresetOperation::Save)?.save(preset)?;
        *self.current.lock() = Some(saved.clone());
        Ok(saved)
    }

    fn delete_preset(&self, preset: &Preset) -> Result<()> {
        self.user_store(PresetOperation::Delete)?.delete(preset)?;
        let mut current = self.current.lock();
        if current.as_ref() == Some(preset) {
            *current = None;
        }
        Ok(())
    }

    fn subscribe_presets(&self, signal: PresetSignal) -> SubscriptionId {
        match &self.store {
            Some(store) => store.subscribe(signal),
            // Nothing will ever fire.
            None => SubscriptionId(u64::MAX),
        }
    }

    fn unsubscribe_presets(&self, id: SubscriptionId) {
        if let Some(store) = &self.store {
            store.unsubscribe(id);
        }
    }

    fn supported_view_configurations(&self, offered: &[ViewConfiguration]) -> Vec<usize> {
        offered
            .iter()
            .enumerate()
            .filter(|(_, config)| {
                if config.host_provides_controller {
                    self.blueprint.compact_view
                } else {
                    self.blueprint.expanded_view
                }
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn select_view_configuration(&self, config: &ViewConfiguration) {
        *self.selected_view.lock() = Some(*config);
    }

    fn provides_user_interface(&self) -> bool {
        self.blueprint.user_interface
    }

    fn request_view(&self) -> Option<ViewHandle> {
        self.blueprint.user_interface.then_some(self.view_handle)
    }
}
