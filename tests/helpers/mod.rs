//! Fixtures for pluginbay integration tests
//!
//! Sessions run against the virtual host and a recording graph. Delivery uses
//! a pumped dispatcher so each test decides exactly when notifications and
//! callbacks run.

use pluginbay::prelude::*;
use pluginbay::{DescriptorInfo, DispatchPump, PresetStore};
use std::time::Duration;

/// Long enough for a blocking-pool task to finish on a loaded CI machine.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn reverb() -> VirtualPlugin {
    VirtualPlugin::new(DescriptorInfo::new("acme.reverb", "Reverb", PluginKind::Effect))
        .factory_presets(["Small Room", "Large Hall"])
}

pub fn delay() -> VirtualPlugin {
    VirtualPlugin::new(DescriptorInfo::new("acme.delay", "Delay", PluginKind::Effect))
        .factory_presets(["Slapback"])
}

pub fn synth() -> VirtualPlugin {
    VirtualPlugin::new(DescriptorInfo::new(
        "acme.synth",
        "Poly Synth",
        PluginKind::Instrument,
    ))
}

/// The catalog every scenario starts from: `[none, Reverb, Delay]` for
/// effects, `[Poly Synth]` for instruments.
pub fn standard_catalog() -> Vec<VirtualPlugin> {
    vec![reverb(), delay(), synth()]
}

pub struct Fixture {
    pub session: SessionManager,
    pub pump: DispatchPump,
    pub host: Arc<VirtualHost>,
    pub graph: Arc<RecordingGraph>,
}

impl Fixture {
    /// Run every queued notification and callback.
    pub fn deliver(&self) -> usize {
        self.pump.run_pending()
    }

    /// Wait for the next queued job and run it.
    pub fn deliver_next(&self) -> bool {
        self.pump.run_next(DELIVERY_TIMEOUT)
    }
}

pub fn fixture() -> Fixture {
    fixture_with(standard_catalog(), |host| host, SessionConfig::default())
}

/// Build a session over `plugins`, letting the caller adjust the host.
pub fn fixture_with(
    plugins: Vec<VirtualPlugin>,
    configure_host: impl FnOnce(VirtualHost) -> VirtualHost,
    config: SessionConfig,
) -> Fixture {
    let registry = CatalogRegistry::new(plugins.iter().map(|p| p.info().clone()));
    let host = Arc::new(configure_host(VirtualHost::new(plugins)));
    let graph = Arc::new(RecordingGraph::new());
    let (dispatcher, pump) = Dispatcher::pumped();

    let session = SessionManager::builder()
        .config(config)
        .registry(Arc::new(registry))
        .host(host.clone())
        .graph(graph.clone())
        .dispatcher(dispatcher)
        .build()
        .expect("Failed to build test session");

    Fixture {
        session,
        pump,
        host,
        graph,
    }
}

/// Two sessions whose hosts share one preset store for `plugin_id`, like two
/// processes editing the same preset library.
pub fn shared_store_pair(store: Arc<PresetStore>, plugin_id: &str) -> (Fixture, Fixture) {
    let a = fixture_with(
        standard_catalog(),
        |host| host.with_store(plugin_id, store.clone()),
        SessionConfig::default(),
    );
    let b = fixture_with(
        standard_catalog(),
        |host| host.with_store(plugin_id, store.clone()),
        SessionConfig::default(),
    );
    (a, b)
}

/// Discover effects and select `index`, asserting that a plugin was installed.
pub async fn select_effect(fixture: &Fixture, index: usize) {
    fixture
        .session
        .discover(PluginKind::Effect)
        .await
        .expect("Discovery failed");
    assert!(fixture
        .session
        .select_descriptor(index)
        .await
        .expect("Selection failed"));
}

pub fn names(presets: &[Preset]) -> Vec<&str> {
    presets.iter().map(|p| p.name.as_str()).collect()
}
