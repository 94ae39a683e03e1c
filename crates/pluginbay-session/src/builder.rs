//! Builder for configuring and constructing a `SessionManager`.

use crate::SessionManager;
use pluginbay_core::{
    AudioGraph, Dispatcher, PluginHost, PluginRegistry, Result, SessionConfig, SessionError,
};
use std::sync::Arc;

/// Registry, host, graph and dispatcher are required. The runtime defaults
/// to the one the builder is called from.
///
/// # Example
///
/// ```ignore
/// let (dispatcher, _delivery) = Dispatcher::spawn("pluginbay-delivery")?;
///
/// let session = SessionManager::builder()
///     .registry(registry)
///     .host(host)
///     .graph(graph)
///     .dispatcher(dispatcher)
///     .build()?;
///
/// let effects = session.discover(PluginKind::Effect).await?;
/// ```
#[derive(Default)]
pub struct SessionManagerBuilder {
    config: SessionConfig,
    registry: Option<Arc<dyn PluginRegistry>>,
    host: Option<Arc<dyn PluginHost>>,
    graph: Option<Arc<dyn AudioGraph>>,
    dispatcher: Option<Dispatcher>,
    runtime: Option<tokio::runtime::Handle>,
}

impl SessionManagerBuilder {
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(mut self, registry: Arc<dyn PluginRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn host(mut self, host: Arc<dyn PluginHost>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn graph(mut self, graph: Arc<dyn AudioGraph>) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Context every completion and preset notification is delivered on.
    pub fn dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Runtime whose blocking pool runs scans, instantiation and view requests.
    pub fn runtime(mut self, handle: tokio::runtime::Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn build(self) -> Result<SessionManager> {
        self.config.validate()?;

        let registry = self.registry.ok_or_else(|| missing("registry"))?;
        let host = self.host.ok_or_else(|| missing("host"))?;
        let graph = self.graph.ok_or_else(|| missing("graph"))?;
        let dispatcher = self.dispatcher.ok_or_else(|| missing("dispatcher"))?;
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => tokio::runtime::Handle::try_current().map_err(|_| {
                SessionError::InvalidConfig(
                    "no tokio runtime: call inside a runtime or pass .runtime()".to_string(),
                )
            })?,
        };

        Ok(SessionManager::from_parts(
            self.config,
            registry,
            host,
            graph,
            dispatcher,
            runtime,
        ))
    }
}

fn missing(what: &str) -> SessionError {
    SessionError::InvalidConfig(format!("{} is required", what))
}
