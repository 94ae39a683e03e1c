//! In-memory plugin host.

use crate::instance::{VirtualInstance, VirtualPlugin};
use crate::store::PresetStore;
use parking_lot::Mutex;
use pluginbay_core::{
    DescriptorInfo, InstantiationMode, InstantiationStage, PluginHost, PluginInstance, Result,
    SessionError, ViewHandle,
};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Host that instantiates [`VirtualPlugin`]s.
///
/// Instances of the same plugin share one [`PresetStore`]: in memory by
/// default, or a JSON file per plugin under [`preset_dir`](Self::preset_dir).
/// Hand the same store to two hosts with [`with_store`](Self::with_store) to
/// model two processes editing one preset library.
pub struct VirtualHost {
    plugins: HashMap<String, VirtualPlugin>,
    /// Instantiate unknown descriptors with a default blueprint.
    permissive: bool,
    preset_dir: Option<PathBuf>,
    stores: Mutex<HashMap<String, Arc<PresetStore>>>,
    failures: Mutex<HashSet<String>>,
    latency: Option<Duration>,
    next_view_handle: AtomicU64,
    instantiations: AtomicUsize,
    live: Arc<AtomicUsize>,
}

impl VirtualHost {
    pub fn new(plugins: impl IntoIterator<Item = VirtualPlugin>) -> Self {
        Self {
            plugins: plugins
                .into_iter()
                .map(|plugin| (plugin.info().id.clone(), plugin))
                .collect(),
            permissive: false,
            preset_dir: None,
            stores: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashSet::new()),
            latency: None,
            next_view_handle: AtomicU64::new(0x1000),
            instantiations: AtomicUsize::new(0),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Accept descriptors with no registered blueprint, e.g. bundles found
    /// by a [`DirectoryRegistry`](crate::DirectoryRegistry).
    pub fn permissive(mut self) -> Self {
        self.permissive = true;
        self
    }

    pub fn preset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.preset_dir = Some(dir.into());
        self
    }

    /// Simulated load time for every instantiation.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_store(self, plugin_id: impl Into<String>, store: Arc<PresetStore>) -> Self {
        self.stores.lock().insert(plugin_id.into(), store);
        self
    }

    /// Make every later instantiation of `plugin_id` fail.
    pub fn fail_instantiation(&self, plugin_id: impl Into<String>) {
        self.failures.lock().insert(plugin_id.into());
    }

    pub fn store_for(&self, plugin_id: &str) -> Option<Arc<PresetStore>> {
        self.stores.lock().get(plugin_id).cloned()
    }

    pub fn instantiation_count(&self) -> usize {
        self.instantiations.load(Ordering::SeqCst)
    }

    /// Instances created by this host that are still alive.
    pub fn live_instances(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn blueprint(&self, info: &DescriptorInfo) -> Result<VirtualPlugin> {
        if let Some(plugin) = self.plugins.get(&info.id) {
            return Ok(plugin.clone());
        }
        if self.permissive {
            return Ok(VirtualPlugin::new(info.clone()));
        }
        Err(SessionError::instantiation(
            &info.name,
            InstantiationStage::Lookup,
            format!("no component registered for '{}'", info.id),
        ))
    }

    fn store(&self, plugin_id: &str) -> Result<Arc<PresetStore>> {
        let mut stores = self.stores.lock();
        if let Some(store) = stores.get(plugin_id) {
            return Ok(Arc::clone(store));
        }

        let store = match &self.preset_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                PresetStore::open(dir.join(format!("{}.json", sanitize(plugin_id))))?
            }
            None => PresetStore::in_memory(),
        };
        stores.insert(plugin_id.to_string(), Arc::clone(&store));
        Ok(store)
    }
}

impl PluginHost for VirtualHost {
    fn instantiate(
        &self,
        info: &DescriptorInfo,
        mode: InstantiationMode,
    ) -> Result<Arc<dyn PluginInstance>> {
        let blueprint = self.blueprint(info)?;

        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }

        if self.failures.lock().contains(&info.id) {
            return Err(SessionError::instantiation(
                &info.name,
                InstantiationStage::Instantiation,
                "component refused to initialize",
            ));
        }

        let store = if blueprint.supports_user_presets() {
            Some(self.store(&info.id)?)
        } else {
            None
        };

        let handle = ViewHandle(self.next_view_handle.fetch_add(1, Ordering::Relaxed));
        self.instantiations.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Instantiated virtual '{}' ({})", info.name, mode);

        Ok(Arc::new(VirtualInstance::new(
            blueprint,
            mode,
            store,
            handle,
            Arc::clone(&self.live),
        )))
    }
}

/// Plugin ids may contain characters that are not valid in file names.
fn sanitize(plugin_id: &str) -> String {
    plugin_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}
