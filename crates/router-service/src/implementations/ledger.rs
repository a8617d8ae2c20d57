use async_trait::async_trait;
use router_types::{ComponentError, ComponentResult, DiscoveryBackend, LedgerClient};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Ledger client that authorizes all spend locally.
///
/// Announces itself in discovery while running so that peers find the
/// node's accounting endpoint.
pub struct StandaloneLedgerClient {
	service_name: String,
	node_identity: String,
	discovery: Arc<dyn DiscoveryBackend>,
	registered: AtomicBool,
}

impl StandaloneLedgerClient {
	pub fn new(
		service_name: impl Into<String>,
		node_identity: impl Into<String>,
		discovery: Arc<dyn DiscoveryBackend>,
	) -> Self {
		Self {
			service_name: service_name.into(),
			node_identity: node_identity.into(),
			discovery,
			registered: AtomicBool::new(false),
		}
	}

	pub fn is_registered(&self) -> bool {
		self.registered.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl LedgerClient for StandaloneLedgerClient {
	fn name(&self) -> &str {
		&self.service_name
	}

	async fn start(&self) -> ComponentResult<()> {
		self.discovery
			.register_service(&self.service_name, &self.node_identity)
			.await
			.map_err(|e| ComponentError::Start(format!("cannot register ledger client: {}", e)))?;
		self.registered.store(true, Ordering::SeqCst);
		info!(service = %self.service_name, "Ledger client registered");
		Ok(())
	}

	async fn shutdown(&self) -> ComponentResult<()> {
		if !self.registered.swap(false, Ordering::SeqCst) {
			return Ok(());
		}
		self.discovery
			.unregister_service(&self.service_name)
			.await
			.map_err(|e| ComponentError::Shutdown(format!("cannot unregister ledger client: {}", e)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use router_discovery::InMemoryDiscovery;

	#[tokio::test]
	async fn test_registers_while_running() {
		let discovery = Arc::new(InMemoryDiscovery::new("memory://test"));
		discovery.register_installation("test").await.unwrap();
		let ledger = StandaloneLedgerClient::new("router.ledgerClient", "r1/1", discovery.clone());

		ledger.start().await.unwrap();
		assert!(ledger.is_registered());
		assert_eq!(
			discovery.service_node("router.ledgerClient").as_deref(),
			Some("r1/1")
		);

		ledger.shutdown().await.unwrap();
		assert!(!ledger.is_registered());
		assert_eq!(discovery.service_node("router.ledgerClient"), None);
	}

	#[tokio::test]
	async fn test_shutdown_without_start_is_noop() {
		let discovery = Arc::new(InMemoryDiscovery::new("memory://test"));
		let ledger = StandaloneLedgerClient::new("router.ledgerClient", "r1/1", discovery);

		ledger.shutdown().await.unwrap();
	}
}
