use crate::error::Result;
use crate::instance::PluginInstance;
use std::sync::Arc;

/// The playback graph a selected plugin is routed into. Real-time rendering
/// lives behind this trait.
pub trait AudioGraph: Send + Sync {
    /// Return to the empty graph, tearing down any plugin connection.
    fn reset(&self);

    /// Route `instance` between the player and the output.
    fn connect(&self, instance: Arc<dyn PluginInstance>) -> Result<()>;

    fn start(&self) -> Result<()>;

    fn stop(&self);

    fn is_playing(&self) -> bool;
}
