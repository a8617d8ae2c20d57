//! Discovery connector selection.

use async_trait::async_trait;
use router_types::{ComponentError, ComponentResult, DiscoveryBackend};
use std::collections::HashMap;
use std::sync::Arc;

/// Scheme assumed for URIs written without one, e.g. `zk1:2181,zk2:2181`.
pub const DEFAULT_SCHEME: &str = "zookeeper";

/// Opens connections to one kind of discovery backend.
#[async_trait]
pub trait DiscoveryConnector: Send + Sync {
	/// URI scheme handled by this connector, without `://`.
	fn scheme(&self) -> &str;

	async fn connect(&self, uri: &str) -> ComponentResult<Arc<dyn DiscoveryBackend>>;
}

/// Connectors keyed by URI scheme.
#[derive(Default)]
pub struct ConnectorRegistry {
	connectors: HashMap<String, Arc<dyn DiscoveryConnector>>,
}

impl ConnectorRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a connector, replacing any previous one for its scheme.
	pub fn register<C>(&mut self, connector: Arc<C>)
	where
		C: DiscoveryConnector + 'static,
	{
		self.connectors
			.insert(connector.scheme().to_string(), connector);
	}

	pub fn with_connector<C>(mut self, connector: Arc<C>) -> Self
	where
		C: DiscoveryConnector + 'static,
	{
		self.register(connector);
		self
	}

	pub fn schemes(&self) -> Vec<String> {
		let mut schemes: Vec<String> = self.connectors.keys().cloned().collect();
		schemes.sort();
		schemes
	}

	/// Connect using the connector registered for the scheme of `uri`.
	pub async fn connect(&self, uri: &str) -> ComponentResult<Arc<dyn DiscoveryBackend>> {
		let scheme = scheme_of(uri);
		let connector = self.connectors.get(scheme).ok_or_else(|| {
			ComponentError::NotFound(format!("no discovery connector for scheme '{}'", scheme))
		})?;
		connector.connect(uri).await
	}
}

/// The scheme of `uri`, or [`DEFAULT_SCHEME`] when it has none.
pub fn scheme_of(uri: &str) -> &str {
	match uri.split_once("://") {
		Some((scheme, _)) if !scheme.is_empty() => scheme,
		_ => DEFAULT_SCHEME,
	}
}
