//! Audio graph that records what the session asks of it.

use parking_lot::Mutex;
use pluginbay_core::{AudioGraph, PluginInstance, Result, SessionError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    Reset,
    Connect(String),
    Start,
    Stop,
}

/// Holds the connected instance like a real player would, so the instance
/// stays alive exactly as long as it is routed.
#[derive(Default)]
pub struct RecordingGraph {
    events: Mutex<Vec<GraphEvent>>,
    connected: Mutex<Option<Arc<dyn PluginInstance>>>,
    playing: AtomicBool,
    refuse_connect: AtomicBool,
}

impl RecordingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GraphEvent> {
        self.events.lock().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    /// Name of the plugin currently routed, if any.
    pub fn connected(&self) -> Option<String> {
        self.connected
            .lock()
            .as_ref()
            .map(|instance| instance.info().name.clone())
    }

    /// Make later `connect` calls fail.
    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse_connect.store(refuse, Ordering::SeqCst);
    }

    fn record(&self, event: GraphEvent) {
        self.events.lock().push(event);
    }
}

impl AudioGraph for RecordingGraph {
    fn reset(&self) {
        self.connected.lock().take();
        self.record(GraphEvent::Reset);
    }

    fn connect(&self, instance: Arc<dyn PluginInstance>) -> Result<()> {
        let name = instance.info().name.clone();
        if self.refuse_connect.load(Ordering::SeqCst) {
            return Err(SessionError::Graph(format!("refused to route '{}'", name)));
        }
        *self.connected.lock() = Some(instance);
        self.record(GraphEvent::Connect(name));
        Ok(())
    }

    fn start(&self) -> Result<()> {
        self.playing.store(true, Ordering::SeqCst);
        self.record(GraphEvent::Start);
        Ok(())
    }

    fn stop(&self) {
        self.playing.store(false, Ordering::SeqCst);
        self.record(GraphEvent::Stop);
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}
