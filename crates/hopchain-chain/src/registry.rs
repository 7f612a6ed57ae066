//! Name → factory tables for dialers and connectors.

use std::collections::HashMap;
use std::sync::Arc;

use crate::dialer::{Connector, Dialer};
use crate::error::ChainError;
use crate::metadata::Metadata;
use crate::plain::{ForwardConnector, TcpDialer};

pub type DialerFactory = Arc<dyn Fn() -> Box<dyn Dialer> + Send + Sync>;
pub type ConnectorFactory = Arc<dyn Fn() -> Box<dyn Connector> + Send + Sync>;

/// Adapters available to configuration, keyed by the names used in
/// `dialer = "..."` and `connector = "..."`.
#[derive(Clone, Default)]
pub struct Registry {
    dialers: HashMap<String, DialerFactory>,
    connectors: HashMap<String, ConnectorFactory>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the `tcp` dialer and the `forward` connector.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_dialer("tcp", || Box::new(TcpDialer::new()));
        registry.register_connector("forward", || Box::new(ForwardConnector));
        registry
    }

    pub fn register_dialer<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Dialer> + Send + Sync + 'static,
    {
        self.dialers.insert(name.into(), Arc::new(factory));
    }

    pub fn register_connector<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Connector> + Send + Sync + 'static,
    {
        self.connectors.insert(name.into(), Arc::new(factory));
    }

    pub fn has_dialer(&self, name: &str) -> bool {
        self.dialers.contains_key(name)
    }

    pub fn has_connector(&self, name: &str) -> bool {
        self.connectors.contains_key(name)
    }

    /// Create and initialise a dialer.
    pub fn dialer(&self, name: &str, md: &Metadata) -> Result<Arc<dyn Dialer>, ChainError> {
        let factory = self
            .dialers
            .get(name)
            .ok_or_else(|| ChainError::Config(format!("unknown dialer: {name}")))?;
        let mut dialer = factory();
        dialer
            .init(md)
            .map_err(|e| ChainError::Config(format!("dialer {name}: {e}")))?;
        Ok(Arc::from(dialer))
    }

    /// Create and initialise a connector.
    pub fn connector(&self, name: &str, md: &Metadata) -> Result<Arc<dyn Connector>, ChainError> {
        let factory = self
            .connectors
            .get(name)
            .ok_or_else(|| ChainError::Config(format!("unknown connector: {name}")))?;
        let mut connector = factory();
        connector
            .init(md)
            .map_err(|e| ChainError::Config(format!("connector {name}: {e}")))?;
        Ok(Arc::from(connector))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut dialers: Vec<_> = self.dialers.keys().collect();
        let mut connectors: Vec<_> = self.connectors.keys().collect();
        dialers.sort();
        connectors.sort();
        f.debug_struct("Registry")
            .field("dialers", &dialers)
            .field("connectors", &connectors)
            .finish()
    }
}
