//! Plugin session coordinator.
//!
//! Owns the discovered descriptor list, the single active plugin instance and
//! the bookkeeping that tells a preset change this session caused apart from
//! one made elsewhere. Registry scans, instantiation and view requests run on
//! the tokio blocking pool; callbacks and preset notifications are delivered
//! on the session's [`Dispatcher`].

use crate::active::{ActivePlugin, PresetSubscription};
use crate::builder::SessionManagerBuilder;
use crate::listeners::{ListenerId, ListenerRegistry};
use arc_swap::ArcSwap;
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use pluginbay_core::{
    AudioGraph, DescriptorInfo, Dispatcher, InstantiationStage, PendingChange, PluginDescriptor,
    PluginHost, PluginInstance, PluginKind, PluginRegistry, Preset, PresetChangeEvent,
    PresetOperation, Result, SessionConfig, SessionError, ViewConfiguration, ViewConfigurations,
    ViewHandle,
};
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// Coordinates discovery, selection, presets and views for one plugin slot.
///
/// Cloning is cheap - all state is behind an Arc.
///
/// At most one plugin instance is active. Starting a selection drops the
/// previous instance (and its preset subscription) before anything else
/// happens; a selection that finishes after a newer one started is discarded.
/// Neither discovery nor instantiation can be cancelled.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    registry: Arc<dyn PluginRegistry>,
    host: Arc<dyn PluginHost>,
    graph: Arc<dyn AudioGraph>,
    dispatcher: Dispatcher,
    runtime: tokio::runtime::Handle,

    /// Replaced wholesale by each scan; readers always see a full list.
    discovered: ArcSwap<Vec<PluginDescriptor>>,
    active: Mutex<Option<ActivePlugin>>,
    /// Held while a selection changes what the graph routes. Never taken
    /// while `active` is held.
    routing: Mutex<()>,
    /// Bumped by every selection request.
    generation: AtomicU64,
    pending_change: AtomicU8,
    view_index: AtomicUsize,
    listeners: ListenerRegistry,
}

impl SessionManager {
    pub fn builder() -> SessionManagerBuilder {
        SessionManagerBuilder::default()
    }

    pub(crate) fn from_parts(
        config: SessionConfig,
        registry: Arc<dyn PluginRegistry>,
        host: Arc<dyn PluginHost>,
        graph: Arc<dyn AudioGraph>,
        dispatcher: Dispatcher,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        let view_index = config.initial_view_index;
        Self {
            inner: Arc::new(SessionInner {
                config,
                registry,
                host,
                graph,
                dispatcher,
                runtime,
                discovered: ArcSwap::from_pointee(Vec::new()),
                active: Mutex::new(None),
                routing: Mutex::new(()),
                generation: AtomicU64::new(0),
                pending_change: AtomicU8::new(PendingChange::None as u8),
                view_index: AtomicUsize::new(view_index),
                listeners: ListenerRegistry::default(),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Reset the audio graph, then scan the registry for plugins of `kind`.
    ///
    /// Effect scans start with [`PluginDescriptor::None`]. The result replaces
    /// the discovered list; on a registry error the list is left as it was.
    pub async fn discover(&self, kind: PluginKind) -> Result<Vec<PluginDescriptor>> {
        self.inner.graph.reset();

        let inner = Arc::clone(&self.inner);
        let found = self
            .inner
            .runtime
            .spawn_blocking(move || {
                inner.registry.query(kind, &|info: &DescriptorInfo| {
                    inner.config.accepts(kind, info)
                })
            })
            .await
            .map_err(|e| SessionError::Registry(format!("scan task failed: {}", e)))??;

        let found_count = found.len();
        let mut descriptors = Vec::with_capacity(found_count + 1);
        if kind == PluginKind::Effect {
            descriptors.push(PluginDescriptor::None);
        }
        descriptors.extend(found.into_iter().map(PluginDescriptor::Plugin));

        self.inner.discovered.store(Arc::new(descriptors.clone()));
        tracing::info!("Discovered {} {} plugin(s)", found_count, kind);

        Ok(descriptors)
    }

    /// Callback form of [`discover`](Self::discover); `on_complete` runs on
    /// the delivery context.
    pub fn discover_then<F>(&self, kind: PluginKind, on_complete: F)
    where
        F: FnOnce(Result<Vec<PluginDescriptor>>) + Send + 'static,
    {
        let session = self.clone();
        self.inner.runtime.spawn(async move {
            let result = session.discover(kind).await;
            session.inner.dispatcher.dispatch(move || on_complete(result));
        });
    }

    /// Snapshot of the discovered list.
    pub fn discovered(&self) -> Arc<Vec<PluginDescriptor>> {
        self.inner.discovered.load_full()
    }

    pub fn discovered_count(&self) -> usize {
        self.inner.discovered.load().len()
    }

    pub fn descriptor(&self, index: usize) -> Option<PluginDescriptor> {
        self.inner.discovered.load().get(index).cloned()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Make the descriptor at `index` the active plugin.
    ///
    /// Returns `Ok(false)` for the "none" entry, `Ok(true)` once the new
    /// instance is connected to the graph.
    pub async fn select_descriptor(&self, index: usize) -> Result<bool> {
        let generation = self.inner.supersede();
        self.select_with_generation(index, generation).await
    }

    /// Callback form of [`select_descriptor`](Self::select_descriptor). The
    /// previous instance is released before this returns.
    pub fn select_descriptor_then<F>(&self, index: usize, on_complete: F)
    where
        F: FnOnce(Result<bool>) + Send + 'static,
    {
        let generation = self.inner.supersede();
        let session = self.clone();
        self.inner.runtime.spawn(async move {
            let result = session.select_with_generation(index, generation).await;
            session.inner.dispatcher.dispatch(move || on_complete(result));
        });
    }

    async fn select_with_generation(&self, index: usize, generation: u64) -> Result<bool> {
        let discovered = self.inner.discovered.load_full();
        let info = match discovered.get(index) {
            None => {
                if !self.inner.is_current(generation) {
                    return Err(SessionError::Superseded);
                }
                return Err(SessionError::InvalidIndex {
                    index,
                    len: discovered.len(),
                });
            }
            Some(PluginDescriptor::None) => return self.inner.clear_selection(generation),
            Some(PluginDescriptor::Plugin(info)) => info.clone(),
        };

        let inner = Arc::clone(&self.inner);
        let name = info.name.clone();
        self.inner
            .runtime
            .spawn_blocking(move || inner.instantiate_and_install(&info, generation))
            .await
            .map_err(|e| {
                SessionError::instantiation(name, InstantiationStage::Instantiation, e.to_string())
            })?
    }

    pub fn has_active_instance(&self) -> bool {
        self.inner.active.lock().is_some()
    }

    pub fn active_instance(&self) -> Option<Arc<dyn PluginInstance>> {
        self.inner
            .active
            .lock()
            .as_ref()
            .map(|active| Arc::clone(&active.instance))
    }

    pub fn active_descriptor(&self) -> Option<DescriptorInfo> {
        self.active_instance().map(|instance| instance.info().clone())
    }

    // =========================================================================
    // Presets
    // =========================================================================

    /// Persist `preset` on the active instance.
    ///
    /// The change signal that follows is reported as
    /// [`PresetChangeKind::Save`](pluginbay_core::PresetChangeKind::Save).
    /// This is best-effort: an external change landing between the save and
    /// its signal takes the `Save` classification instead.
    pub fn save_preset(&self, preset: &Preset) -> Result<Preset> {
        let instance = self.preset_target(PresetOperation::Save)?;
        if preset.name.trim().is_empty() {
            return Err(SessionError::persistence(
                PresetOperation::Save,
                "preset name is empty",
            ));
        }

        self.inner.set_pending(PendingChange::Save);
        match instance.save_preset(preset) {
            Ok(saved) => {
                tracing::info!("Saved preset '{}' (#{})", saved.name, saved.number);
                Ok(saved)
            }
            Err(e) => {
                self.inner.set_pending(PendingChange::None);
                tracing::warn!("Failed to save preset '{}': {}", preset.name, e);
                Err(as_persistence(PresetOperation::Save, e))
            }
        }
    }

    /// Delete `preset` from the active instance. Same classification rules as
    /// [`save_preset`](Self::save_preset).
    pub fn delete_preset(&self, preset: &Preset) -> Result<()> {
        let instance = self.preset_target(PresetOperation::Delete)?;

        self.inner.set_pending(PendingChange::Delete);
        match instance.delete_preset(preset) {
            Ok(()) => {
                tracing::info!("Deleted preset '{}' (#{})", preset.name, preset.number);
                Ok(())
            }
            Err(e) => {
                self.inner.set_pending(PendingChange::None);
                tracing::warn!("Failed to delete preset '{}': {}", preset.name, e);
                Err(as_persistence(PresetOperation::Delete, e))
            }
        }
    }

    pub fn list_factory_presets(&self) -> Vec<Preset> {
        self.active_instance()
            .map(|instance| instance.factory_presets())
            .unwrap_or_default()
    }

    /// User presets, most recently added first.
    pub fn list_user_presets(&self) -> Vec<Preset> {
        self.active_instance()
            .map(|instance| newest_first(instance.user_presets()))
            .unwrap_or_default()
    }

    pub fn current_preset(&self) -> Option<Preset> {
        self.active_instance()
            .and_then(|instance| instance.current_preset())
    }

    /// Load `preset` into the active instance.
    pub fn select_preset(&self, preset: &Preset) -> Result<()> {
        let instance = self
            .active_instance()
            .ok_or(SessionError::NoActiveInstance)?;
        instance
            .set_current_preset(preset)
            .map_err(|e| as_persistence(PresetOperation::Load, e))
    }

    /// Action whose change signal has not been classified yet.
    pub fn pending_change(&self) -> PendingChange {
        PendingChange::from_u8(self.inner.pending_change.load(Ordering::SeqCst))
    }

    fn preset_target(&self, operation: PresetOperation) -> Result<Arc<dyn PluginInstance>> {
        let instance = self
            .active_instance()
            .ok_or(SessionError::NoActiveInstance)?;
        if !instance.supports_user_presets() {
            return Err(SessionError::persistence(
                operation,
                format!("'{}' does not support user presets", instance.info().name),
            ));
        }
        Ok(instance)
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Called on the delivery context for every preset change of the active
    /// instance.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&PresetChangeEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    pub fn event_stream(&self) -> Receiver<PresetChangeEvent> {
        self.inner.listeners.stream()
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn current_view_configuration(&self) -> ViewConfiguration {
        self.inner
            .view_configuration(self.inner.view_index.load(Ordering::SeqCst))
    }

    /// Switch between the compact and expanded layouts. Does nothing and
    /// returns `None` when no plugin is active.
    pub fn toggle_view_mode(&self) -> Option<ViewConfiguration> {
        let instance = self.active_instance()?;
        let previous = self.inner.view_index.fetch_xor(1, Ordering::SeqCst);
        let config = self.inner.view_configuration(previous ^ 1);
        instance.select_view_configuration(&config);
        tracing::debug!(
            "View mode switched to {}x{}",
            config.width,
            config.height
        );
        Some(config)
    }

    /// True when the active plugin can render both layouts.
    pub fn provides_alternative_views(&self) -> bool {
        self.active_instance()
            .map(|instance| {
                let supported = self.inner.supported_view_indices(instance.as_ref());
                supported.contains(&ViewConfigurations::COMPACT)
                    && supported.contains(&ViewConfigurations::EXPANDED)
            })
            .unwrap_or(false)
    }

    pub fn provides_user_interface(&self) -> bool {
        self.active_instance()
            .map(|instance| instance.provides_user_interface())
            .unwrap_or(false)
    }

    /// Native interface of the active plugin, if it has one.
    pub async fn request_view_handle(&self) -> Option<ViewHandle> {
        let instance = self.active_instance()?;
        if !instance.provides_user_interface() {
            return None;
        }

        match self
            .inner
            .runtime
            .spawn_blocking(move || instance.request_view())
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!("View request failed: {}", e);
                None
            }
        }
    }

    /// Callback form of [`request_view_handle`](Self::request_view_handle).
    pub fn request_view_handle_then<F>(&self, on_complete: F)
    where
        F: FnOnce(Option<ViewHandle>) + Send + 'static,
    {
        let session = self.clone();
        self.inner.runtime.spawn(async move {
            let handle = session.request_view_handle().await;
            session.inner.dispatcher.dispatch(move || on_complete(handle));
        });
    }

    // =========================================================================
    // Playback
    // =========================================================================

    pub fn start_playback(&self) -> Result<()> {
        self.inner.graph.start()
    }

    pub fn stop_playback(&self) {
        self.inner.graph.stop();
    }

    /// Returns whether the graph is playing afterwards.
    pub fn toggle_playback(&self) -> Result<bool> {
        if self.inner.graph.is_playing() {
            self.stop_playback();
            Ok(false)
        } else {
            self.start_playback()?;
            Ok(true)
        }
    }

    pub fn is_playing(&self) -> bool {
        self.inner.graph.is_playing()
    }
}

impl SessionInner {
    /// Begin a new selection: invalidate in-flight ones and release the
    /// active instance along with its preset subscription. A save or delete
    /// whose signal has not arrived yet belongs to the released instance.
    fn supersede(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_pending(PendingChange::None);
        let previous = self.active.lock().take();
        if let Some(previous) = previous {
            tracing::debug!("Releasing '{}'", previous.instance.info().name);
            self.graph.reset();
        }
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Empty the graph for a "none" selection, unless a newer selection has
    /// started since.
    fn clear_selection(&self, generation: u64) -> Result<bool> {
        let _routing = self.routing.lock();
        if !self.is_current(generation) {
            tracing::debug!("Ignoring superseded deselection");
            return Err(SessionError::Superseded);
        }
        self.graph.reset();
        tracing::info!("No plugin selected");
        Ok(false)
    }

    /// Runs on the blocking pool. Collaborators are called with only the
    /// routing lock held, so they may query the session.
    fn instantiate_and_install(
        self: &Arc<Self>,
        info: &DescriptorInfo,
        generation: u64,
    ) -> Result<bool> {
        let mode = self.config.instantiation_mode;
        tracing::info!("Instantiating '{}' ({})", info.name, mode);

        let instance = self.host.instantiate(info, mode).map_err(|e| match e {
            e @ SessionError::Instantiation { .. } => e,
            other => SessionError::instantiation(
                &info.name,
                InstantiationStage::Instantiation,
                other.to_string(),
            ),
        })?;

        let _routing = self.routing.lock();
        if !self.is_current(generation) {
            tracing::debug!("Discarding '{}': selection superseded", info.name);
            return Err(SessionError::Superseded);
        }

        if let Err(e) = self.graph.connect(Arc::clone(&instance)) {
            tracing::warn!("Failed to connect '{}': {}", info.name, e);
            self.graph.reset();
            return Err(SessionError::instantiation(
                &info.name,
                InstantiationStage::Connection,
                e.to_string(),
            ));
        }

        let current = self.view_index.load(Ordering::SeqCst);
        if self.supported_view_indices(instance.as_ref()).contains(&current) {
            instance.select_view_configuration(&self.view_configuration(current));
        }

        let subscription = if instance.supports_user_presets() {
            Some(self.subscribe(&instance, generation))
        } else {
            None
        };

        let mut active = self.active.lock();
        if !self.is_current(generation) {
            drop(active);
            drop(subscription);
            tracing::debug!("Discarding '{}': selection superseded", info.name);
            self.graph.reset();
            return Err(SessionError::Superseded);
        }
        *active = Some(ActivePlugin {
            instance,
            generation,
            subscription,
        });
        drop(active);
        tracing::info!("Selected '{}'", info.name);

        Ok(true)
    }

    fn subscribe(
        self: &Arc<Self>,
        instance: &Arc<dyn PluginInstance>,
        generation: u64,
    ) -> PresetSubscription {
        let session: Weak<SessionInner> = Arc::downgrade(self);
        let dispatcher = self.dispatcher.clone();

        let id = instance.subscribe_presets(Box::new(move || {
            let session = Weak::clone(&session);
            dispatcher.dispatch(move || {
                if let Some(session) = session.upgrade() {
                    session.presets_changed(generation);
                }
            });
        }));

        PresetSubscription::new(Arc::clone(instance), id)
    }

    /// Runs on the delivery context.
    fn presets_changed(&self, generation: u64) {
        let instance = match &*self.active.lock() {
            Some(active) if active.generation == generation => Arc::clone(&active.instance),
            _ => {
                tracing::debug!("Ignoring preset change from a released instance");
                return;
            }
        };

        let pending = PendingChange::from_u8(
            self.pending_change
                .swap(PendingChange::None as u8, Ordering::SeqCst),
        );
        let kind = pending.classify();
        let presets = newest_first(instance.user_presets());

        tracing::debug!(
            "User presets changed ({:?}, {} preset(s))",
            kind,
            presets.len()
        );
        self.listeners.emit(&PresetChangeEvent { kind, presets });
    }

    fn set_pending(&self, pending: PendingChange) {
        self.pending_change.store(pending as u8, Ordering::SeqCst);
    }

    fn view_configuration(&self, index: usize) -> ViewConfiguration {
        let configs = &self.config.view_configurations;
        configs.get(index).copied().unwrap_or(configs.expanded)
    }

    fn supported_view_indices(&self, instance: &dyn PluginInstance) -> Vec<usize> {
        instance.supported_view_configurations(&self.config.view_configurations.to_vec())
    }
}

fn newest_first(mut presets: Vec<Preset>) -> Vec<Preset> {
    presets.reverse();
    presets
}

fn as_persistence(operation: PresetOperation, error: SessionError) -> SessionError {
    match error {
        e @ SessionError::Persistence { .. } => e,
        other => SessionError::persistence(operation, other.to_string()),
    }
}
