//! Process-local discovery backend.

use crate::registry::DiscoveryConnector;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use router_types::{ComponentError, ComponentResult, DiscoveryBackend};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Discovery backend that keeps registrations in memory.
///
/// Nodes sharing one [`InMemoryConnector`] see each other's registrations,
/// which is enough for a standalone node and for tests.
#[derive(Debug)]
pub struct InMemoryDiscovery {
	uri: String,
	namespaces: DashSet<String>,
	services: DashMap<String, String>,
	closed: AtomicBool,
}

impl InMemoryDiscovery {
	pub fn new(uri: impl Into<String>) -> Self {
		Self {
			uri: uri.into(),
			namespaces: DashSet::new(),
			services: DashMap::new(),
			closed: AtomicBool::new(false),
		}
	}

	pub fn has_namespace(&self, namespace: &str) -> bool {
		self.namespaces.contains(namespace)
	}

	/// The node a service is registered by, if any.
	pub fn service_node(&self, service: &str) -> Option<String> {
		self.services.get(service).map(|entry| entry.value().clone())
	}

	pub fn services(&self) -> Vec<String> {
		let mut names: Vec<String> = self.services.iter().map(|e| e.key().clone()).collect();
		names.sort();
		names
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	fn ensure_open(&self) -> ComponentResult<()> {
		if self.is_closed() {
			return Err(ComponentError::Connection(format!(
				"discovery connection to {} is closed",
				self.uri
			)));
		}
		Ok(())
	}
}

#[async_trait]
impl DiscoveryBackend for InMemoryDiscovery {
	fn uri(&self) -> &str {
		&self.uri
	}

	async fn register_installation(&self, namespace: &str) -> ComponentResult<()> {
		self.ensure_open()?;
		self.namespaces.insert(namespace.to_string());
		info!(%namespace, "Installation registered");
		Ok(())
	}

	async fn register_service(&self, service: &str, node: &str) -> ComponentResult<()> {
		self.ensure_open()?;
		self.services.insert(service.to_string(), node.to_string());
		debug!(%service, %node, "Service registered");
		Ok(())
	}

	async fn unregister_service(&self, service: &str) -> ComponentResult<()> {
		self.ensure_open()?;
		self.services
			.remove(service)
			.map(|_| ())
			.ok_or_else(|| ComponentError::NotFound(format!("service '{}'", service)))
	}

	async fn close(&self) -> ComponentResult<()> {
		if self.closed.swap(true, Ordering::SeqCst) {
			return Err(ComponentError::Connection(format!(
				"discovery connection to {} already closed",
				self.uri
			)));
		}
		self.services.clear();
		debug!(uri = %self.uri, "Discovery connection closed");
		Ok(())
	}
}

/// Connector for `memory://` URIs.
///
/// Every URI maps to one shared backend for the lifetime of the connector.
#[derive(Debug, Default)]
pub struct InMemoryConnector {
	backends: DashMap<String, Arc<InMemoryDiscovery>>,
}

impl InMemoryConnector {
	pub fn new() -> Self {
		Self::default()
	}

	/// The backend behind `uri`, once something has connected to it.
	pub fn backend(&self, uri: &str) -> Option<Arc<InMemoryDiscovery>> {
		self.backends.get(uri).map(|entry| Arc::clone(entry.value()))
	}
}

#[async_trait]
impl DiscoveryConnector for InMemoryConnector {
	fn scheme(&self) -> &str {
		"memory"
	}

	async fn connect(&self, uri: &str) -> ComponentResult<Arc<dyn DiscoveryBackend>> {
		let backend = self
			.backends
			.entry(uri.to_string())
			.or_insert_with(|| Arc::new(InMemoryDiscovery::new(uri)))
			.clone();

		if backend.is_closed() {
			let fresh = Arc::new(InMemoryDiscovery::new(uri));
			self.backends.insert(uri.to_string(), Arc::clone(&fresh));
			return Ok(fresh);
		}

		Ok(backend)
	}
}
