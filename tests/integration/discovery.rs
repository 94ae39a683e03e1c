//! Discovery integration tests
//!
//! Registry scans, the synthetic "none" entry, and discovery filters.

use crate::helpers::*;
use pluginbay::prelude::*;
use pluginbay::{DescriptorInfo, DirectoryRegistry, GraphEvent, SessionError};
use std::sync::mpsc;

/// Effect scans always lead with the "none" entry.
#[tokio::test]
async fn test_effect_discovery_starts_with_none() {
    let f = fixture();

    let found = f.session.discover(PluginKind::Effect).await.unwrap();

    assert!(found[0].is_none());
    assert_eq!(found[0].name(), "(No effect)");
    let names: Vec<_> = found.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["(No effect)", "Reverb", "Delay"]);
}

/// Instrument scans have no "none" entry.
#[tokio::test]
async fn test_instrument_discovery() {
    let f = fixture();

    let found = f.session.discover(PluginKind::Instrument).await.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name(), "Poly Synth");
    assert!(found.iter().all(|d| !d.is_none()));
}

/// An empty registry still yields the "none" entry for effects.
#[tokio::test]
async fn test_empty_registry() {
    let f = fixture_with(Vec::new(), |host| host, SessionConfig::default());

    let effects = f.session.discover(PluginKind::Effect).await.unwrap();
    assert_eq!(effects.len(), 1);
    assert!(effects[0].is_none());

    let instruments = f.session.discover(PluginKind::Instrument).await.unwrap();
    assert!(instruments.is_empty());
    assert_eq!(f.session.discovered_count(), 0);
}

/// Each scan replaces the discovered list and resets the graph first.
#[tokio::test]
async fn test_discovery_replaces_list_and_resets_graph() {
    let f = fixture();

    f.session.discover(PluginKind::Effect).await.unwrap();
    assert_eq!(f.session.discovered_count(), 3);
    assert_eq!(f.graph.events(), vec![GraphEvent::Reset]);

    f.session.discover(PluginKind::Instrument).await.unwrap();
    assert_eq!(f.session.discovered_count(), 1);
    assert_eq!(
        f.session.descriptor(0).and_then(|d| d.info().cloned()).map(|i| i.id),
        Some("acme.synth".to_string())
    );
    assert!(f.session.descriptor(1).is_none());
    assert_eq!(f.graph.events(), vec![GraphEvent::Reset, GraphEvent::Reset]);
}

/// Denylisted plugins never show up, whatever their case.
#[tokio::test]
async fn test_denylist_filters_by_name() {
    let plugins = vec![
        reverb(),
        VirtualPlugin::new(DescriptorInfo::new(
            "apple.newpitch",
            "aunewpitch",
            PluginKind::Effect,
        )),
    ];
    let f = fixture_with(plugins, |host| host, SessionConfig::default());

    let found = f.session.discover(PluginKind::Effect).await.unwrap();
    let names: Vec<_> = found.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["(No effect)", "Reverb"]);
}

/// Effects without their own interface are dropped when the config asks
/// for it; instruments are unaffected.
#[tokio::test]
async fn test_custom_view_requirement() {
    let plugins = vec![
        VirtualPlugin::new(
            DescriptorInfo::new("acme.eq", "EQ", PluginKind::Effect).custom_view(true),
        ),
        reverb(),
        synth(),
    ];
    let config = SessionConfig {
        require_custom_view_for_effects: true,
        ..Default::default()
    };
    let f = fixture_with(plugins, |host| host, config);

    let effects = f.session.discover(PluginKind::Effect).await.unwrap();
    let names: Vec<_> = effects.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["(No effect)", "EQ"]);

    let instruments = f.session.discover(PluginKind::Instrument).await.unwrap();
    assert_eq!(instruments.len(), 1);
}

/// A failing registry reports the error and keeps the previous list.
#[tokio::test]
async fn test_registry_failure_keeps_previous_list() {
    let (dispatcher, _pump) = Dispatcher::pumped();
    let session = SessionManager::builder()
        .registry(Arc::new(CatalogRegistry::failing("scan crashed")))
        .host(Arc::new(VirtualHost::new([])))
        .graph(Arc::new(RecordingGraph::new()))
        .dispatcher(dispatcher)
        .build()
        .unwrap();

    let result = session.discover(PluginKind::Effect).await;
    match result {
        Err(SessionError::Registry(reason)) => assert_eq!(reason, "scan crashed"),
        other => panic!("expected registry error, got {:?}", other.map(|d| d.len())),
    }
    assert_eq!(session.discovered_count(), 0);
}

/// The callback form delivers on the session's delivery thread.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_discover_then_delivers_on_delivery_thread() {
    let plugins = standard_catalog();
    let (dispatcher, _delivery) = Dispatcher::spawn("test-delivery").unwrap();
    let session = SessionManager::builder()
        .registry(Arc::new(CatalogRegistry::new(
            plugins.iter().map(|p| p.info().clone()),
        )))
        .host(Arc::new(VirtualHost::new(plugins)))
        .graph(Arc::new(RecordingGraph::new()))
        .dispatcher(dispatcher)
        .build()
        .unwrap();

    let (tx, rx) = mpsc::channel();
    session.discover_then(PluginKind::Effect, move |result| {
        let thread = std::thread::current().name().map(str::to_string);
        let _ = tx.send((thread, result.map(|found| found.len())));
    });

    let (thread, count) = rx.recv_timeout(DELIVERY_TIMEOUT).unwrap();
    assert_eq!(thread.as_deref(), Some("test-delivery"));
    assert_eq!(count.unwrap(), 3);
}

/// Bundles on disk are found by extension and classified by name.
#[tokio::test]
async fn test_directory_registry_scan() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("Warm Synth.vst3")).unwrap();
    std::fs::write(dir.path().join("Echo.clap"), b"").unwrap();
    std::fs::write(dir.path().join("readme.txt"), b"").unwrap();

    let (dispatcher, _pump) = Dispatcher::pumped();
    let session = SessionManager::builder()
        .registry(Arc::new(DirectoryRegistry::new([dir.path()])))
        .host(Arc::new(VirtualHost::new([]).permissive()))
        .graph(Arc::new(RecordingGraph::new()))
        .dispatcher(dispatcher)
        .build()
        .unwrap();

    let effects = session.discover(PluginKind::Effect).await.unwrap();
    let names: Vec<_> = effects.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["(No effect)", "Echo"]);

    let instruments = session.discover(PluginKind::Instrument).await.unwrap();
    assert_eq!(instruments.len(), 1);
    let info = instruments[0].info().unwrap();
    assert_eq!(info.id, "vst3:Warm Synth");
    assert!(info.location.is_some());

    assert!(session.select_descriptor(0).await.unwrap());
    assert_eq!(
        session.active_descriptor().map(|i| i.name),
        Some("Warm Synth".to_string())
    );
}
