//! Selection integration tests
//!
//! Lifecycle of the active plugin: instantiation, replacement, the "none"
//! entry, failures and overlapping requests.

use crate::helpers::*;
use parking_lot::Mutex;
use pluginbay::prelude::*;
use pluginbay::{
    AudioGraph, DescriptorInfo, DispatchPump, GraphEvent, InstantiationStage, PluginInstance,
    SessionError,
};
use std::sync::mpsc;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

/// discover -> select Delay -> select none.
#[tokio::test]
async fn test_select_then_deselect_scenario() {
    let f = fixture();

    let found = f.session.discover(PluginKind::Effect).await.unwrap();
    let names: Vec<_> = found.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["(No effect)", "Reverb", "Delay"]);

    assert!(f.session.select_descriptor(2).await.unwrap());
    assert!(f.session.has_active_instance());
    assert_eq!(
        f.session.active_descriptor().map(|i| i.name),
        Some("Delay".to_string())
    );
    assert_eq!(f.graph.connected().as_deref(), Some("Delay"));

    assert!(!f.session.select_descriptor(0).await.unwrap());
    assert!(!f.session.has_active_instance());
    assert!(f.session.active_instance().is_none());
    assert_eq!(f.graph.connected(), None);
    assert_eq!(f.host.live_instances(), 0);
}

/// Selecting "none" with nothing active still yields no instance.
#[tokio::test]
async fn test_select_none_from_empty() {
    let f = fixture();
    f.session.discover(PluginKind::Effect).await.unwrap();

    assert!(!f.session.select_descriptor(0).await.unwrap());
    assert!(!f.session.has_active_instance());
    assert_eq!(f.host.instantiation_count(), 0);
}

/// Replacing the active plugin leaves exactly one instance alive.
#[tokio::test]
async fn test_replacement_keeps_one_instance() {
    let f = fixture();
    select_effect(&f, 1).await;
    assert_eq!(f.host.live_instances(), 1);

    assert!(f.session.select_descriptor(2).await.unwrap());
    assert_eq!(f.host.instantiation_count(), 2);
    assert_eq!(f.host.live_instances(), 1);
    assert_eq!(f.graph.connected().as_deref(), Some("Delay"));

    assert_eq!(
        f.graph.events(),
        vec![
            GraphEvent::Reset,
            GraphEvent::Connect("Reverb".to_string()),
            GraphEvent::Reset,
            GraphEvent::Connect("Delay".to_string()),
        ]
    );
}

/// The same plugin can be selected again and gets a fresh instance.
#[tokio::test]
async fn test_reselect_same_plugin() {
    let f = fixture();
    select_effect(&f, 1).await;
    let first = f.session.active_instance().unwrap();

    assert!(f.session.select_descriptor(1).await.unwrap());
    let second = f.session.active_instance().unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    drop(first);
    assert_eq!(f.host.live_instances(), 1);
}

#[tokio::test]
async fn test_out_of_range_index() {
    let f = fixture();
    f.session.discover(PluginKind::Effect).await.unwrap();

    let err = f.session.select_descriptor(3).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidIndex { index: 3, len: 3 }));
}

/// A failed instantiation still releases the previous plugin.
#[tokio::test]
async fn test_instantiation_failure_releases_previous() {
    let f = fixture();
    select_effect(&f, 1).await;
    f.host.fail_instantiation("acme.delay");

    let err = f.session.select_descriptor(2).await.unwrap_err();
    match err {
        SessionError::Instantiation { name, stage, .. } => {
            assert_eq!(name, "Delay");
            assert_eq!(stage, InstantiationStage::Instantiation);
        }
        other => panic!("expected instantiation error, got {}", other),
    }

    assert!(!f.session.has_active_instance());
    assert_eq!(f.graph.connected(), None);
    assert_eq!(f.host.live_instances(), 0);
}

/// A descriptor the host has no component for fails at lookup.
#[tokio::test]
async fn test_unknown_component_fails_lookup() {
    let (dispatcher, _pump) = Dispatcher::pumped();
    let session = SessionManager::builder()
        .registry(Arc::new(CatalogRegistry::new([DescriptorInfo::new(
            "ghost.fx",
            "Ghost",
            PluginKind::Effect,
        )])))
        .host(Arc::new(VirtualHost::new([])))
        .graph(Arc::new(RecordingGraph::new()))
        .dispatcher(dispatcher)
        .build()
        .unwrap();

    session.discover(PluginKind::Effect).await.unwrap();
    let err = session.select_descriptor(1).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Instantiation {
            stage: InstantiationStage::Lookup,
            ..
        }
    ));
}

/// A graph that refuses the connection leaves nothing active.
#[tokio::test]
async fn test_connection_failure() {
    let f = fixture();
    f.session.discover(PluginKind::Effect).await.unwrap();
    f.graph.refuse_connections(true);

    let err = f.session.select_descriptor(1).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Instantiation {
            stage: InstantiationStage::Connection,
            ..
        }
    ));
    assert!(err.to_string().contains("connecting to audio graph"));
    assert!(!f.session.has_active_instance());
    assert_eq!(f.host.live_instances(), 0);

    f.graph.refuse_connections(false);
    assert!(f.session.select_descriptor(1).await.unwrap());
}

/// An older selection finishing after a newer one started is discarded.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_overlapping_selection_is_superseded() {
    let f = fixture_with(
        standard_catalog(),
        |host| host.latency(Duration::from_millis(100)),
        SessionConfig::default(),
    );
    f.session.discover(PluginKind::Effect).await.unwrap();

    let (tx, rx) = mpsc::channel();
    f.session.select_descriptor_then(1, move |result| {
        let _ = tx.send(result);
    });
    assert!(f.session.select_descriptor(2).await.unwrap());

    assert!(f.deliver_next());
    let first = rx.try_recv().unwrap();
    assert!(matches!(first, Err(SessionError::Superseded)));

    assert_eq!(
        f.session.active_descriptor().map(|i| i.name),
        Some("Delay".to_string())
    );
    assert_eq!(f.host.instantiation_count(), 2);
    assert_eq!(f.host.live_instances(), 1);
}

/// Callback completions arrive only when the delivery context runs.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_select_then_waits_for_delivery() {
    let f = fixture();
    f.session.discover(PluginKind::Effect).await.unwrap();

    let (tx, rx) = mpsc::channel();
    f.session.select_descriptor_then(1, move |result| {
        let _ = tx.send(result.map_err(|e| e.to_string()));
    });

    assert!(f.deliver_next());
    assert_eq!(rx.try_recv().unwrap(), Ok(true));
    assert!(f.session.has_active_instance());
}

/// Releasing an instance cancels its preset subscription.
#[tokio::test]
async fn test_subscription_follows_active_instance() {
    let f = fixture();
    select_effect(&f, 1).await;
    let reverb_store = f.host.store_for("acme.reverb").unwrap();
    assert_eq!(reverb_store.subscriber_count(), 1);

    assert!(f.session.select_descriptor(2).await.unwrap());
    assert_eq!(reverb_store.subscriber_count(), 0);
    assert_eq!(f.host.store_for("acme.delay").unwrap().subscriber_count(), 1);

    f.session.select_descriptor(0).await.unwrap();
    assert_eq!(f.host.store_for("acme.delay").unwrap().subscriber_count(), 0);
}

/// Plugins without user presets are never subscribed to.
#[tokio::test]
async fn test_no_subscription_without_user_presets() {
    let f = fixture_with(
        vec![reverb().user_presets(false)],
        |host| host,
        SessionConfig::default(),
    );
    select_effect(&f, 1).await;

    assert!(f.host.store_for("acme.reverb").is_none());
    assert!(f.session.list_user_presets().is_empty());
}

#[tokio::test]
async fn test_playback_toggle() {
    let f = fixture();
    select_effect(&f, 1).await;

    assert!(f.session.toggle_playback().unwrap());
    assert!(f.session.is_playing());
    assert!(!f.session.toggle_playback().unwrap());
    assert!(!f.graph.events().is_empty());
    assert_eq!(f.graph.events().last(), Some(&GraphEvent::Stop));
}

/// Session whose spawned tasks only make progress while `stalled` is driven.
fn stalled_session(stalled: &Runtime) -> (SessionManager, DispatchPump, Arc<RecordingGraph>) {
    let plugins = standard_catalog();
    let graph = Arc::new(RecordingGraph::new());
    let (dispatcher, pump) = Dispatcher::pumped();
    let session = SessionManager::builder()
        .registry(Arc::new(CatalogRegistry::new(
            plugins.iter().map(|p| p.info().clone()),
        )))
        .host(Arc::new(VirtualHost::new(plugins)))
        .graph(graph.clone())
        .dispatcher(dispatcher)
        .runtime(stalled.handle().clone())
        .build()
        .unwrap();
    (session, pump, graph)
}

/// A "none" or out-of-range selection that runs after a newer selection
/// finished must not touch the newer plugin.
#[test]
fn test_late_deselection_is_superseded() {
    for stale_index in [0, 9] {
        let stalled = Builder::new_current_thread().build().unwrap();
        let driver = Runtime::new().unwrap();
        let (session, pump, graph) = stalled_session(&stalled);
        driver.block_on(session.discover(PluginKind::Effect)).unwrap();

        let (tx, rx) = mpsc::channel();
        session.select_descriptor_then(stale_index, move |result| {
            let _ = tx.send(result);
        });
        assert!(driver.block_on(session.select_descriptor(2)).unwrap());

        stalled.block_on(async {
            for _ in 0..1000 {
                if pump.pending() > 0 {
                    break;
                }
                tokio::task::yield_now().await;
            }
        });
        assert!(pump.run_next(DELIVERY_TIMEOUT));

        let older = rx.try_recv().unwrap();
        assert!(
            matches!(older, Err(SessionError::Superseded)),
            "index {}: {:?}",
            stale_index,
            older
        );
        assert_eq!(graph.connected().as_deref(), Some("Delay"));
        assert_eq!(graph.events().last(), Some(&GraphEvent::Connect("Delay".to_string())));
        assert_eq!(
            session.active_descriptor().map(|i| i.name),
            Some("Delay".to_string())
        );
    }
}

/// Graph that asks the session about its state while routing.
#[derive(Default)]
struct QueryingGraph {
    inner: RecordingGraph,
    session: Mutex<Option<SessionManager>>,
    active_during_connect: Mutex<Vec<bool>>,
}

impl AudioGraph for QueryingGraph {
    fn reset(&self) {
        self.inner.reset();
    }

    fn connect(&self, instance: Arc<dyn PluginInstance>) -> pluginbay::Result<()> {
        let session = self.session.lock().clone();
        if let Some(session) = session {
            self.active_during_connect
                .lock()
                .push(session.has_active_instance());
        }
        self.inner.connect(instance)
    }

    fn start(&self) -> pluginbay::Result<()> {
        self.inner.start()
    }

    fn stop(&self) {
        self.inner.stop();
    }

    fn is_playing(&self) -> bool {
        self.inner.is_playing()
    }
}

/// Collaborators may call back into the session while a plugin is being
/// installed.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_graph_can_query_session_while_connecting() {
    let plugins = standard_catalog();
    let graph = Arc::new(QueryingGraph::default());
    let (dispatcher, _pump) = Dispatcher::pumped();
    let session = SessionManager::builder()
        .registry(Arc::new(CatalogRegistry::new(
            plugins.iter().map(|p| p.info().clone()),
        )))
        .host(Arc::new(VirtualHost::new(plugins)))
        .graph(graph.clone())
        .dispatcher(dispatcher)
        .build()
        .unwrap();
    *graph.session.lock() = Some(session.clone());

    session.discover(PluginKind::Effect).await.unwrap();
    let selected = tokio::time::timeout(DELIVERY_TIMEOUT, session.select_descriptor(1)).await;
    assert!(selected.expect("selection deadlocked").unwrap());

    assert_eq!(*graph.active_during_connect.lock(), vec![false]);
    assert!(session.has_active_instance());

    graph.session.lock().take();
}
