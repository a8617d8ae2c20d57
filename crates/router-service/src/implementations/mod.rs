//! Concrete implementations of the node's supervised components.
//!
//! These are the components the `router-runner` binary supervises when no
//! external engine is linked in.

/// Ledger client that authorizes spend locally.
pub mod ledger;
/// Routing engine serving the bid request listener.
pub mod engine;

pub use engine::StandaloneRoutingEngine;
pub use ledger::StandaloneLedgerClient;

use async_trait::async_trait;
use router_core::ComponentFactory;
use router_discovery::ServiceContext;
use router_types::{ComponentResult, EngineSettings, LedgerClient, RoutingEngine};
use std::net::SocketAddr;
use std::sync::Arc;

/// Address the routing engine binds to unless told otherwise.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:0";

/// Builds the standalone ledger client and routing engine.
pub struct StandaloneComponents {
	bind_address: SocketAddr,
}

impl StandaloneComponents {
	pub fn new(bind_address: SocketAddr) -> Self {
		Self { bind_address }
	}
}

impl Default for StandaloneComponents {
	fn default() -> Self {
		Self::new(SocketAddr::from(([127, 0, 0, 1], 0)))
	}
}

#[async_trait]
impl ComponentFactory for StandaloneComponents {
	async fn create_ledger_client(
		&self,
		context: &ServiceContext,
		settings: &EngineSettings,
	) -> ComponentResult<Arc<dyn LedgerClient>> {
		Ok(Arc::new(StandaloneLedgerClient::new(
			settings.ledger_service_name(),
			context.node_identity(),
			context.discovery(),
		)))
	}

	async fn create_routing_engine(
		&self,
		context: &ServiceContext,
		settings: &EngineSettings,
	) -> ComponentResult<Arc<dyn RoutingEngine>> {
		Ok(Arc::new(StandaloneRoutingEngine::new(
			settings,
			context.node_identity(),
			context.discovery(),
			self.bind_address,
		)))
	}
}

#[cfg(test)]
pub(crate) fn test_engine() -> Arc<dyn RoutingEngine> {
	use router_discovery::InMemoryDiscovery;
	use std::time::Duration;

	let settings = EngineSettings {
		service_prefix: "router".to_string(),
		loss_timeout: Duration::from_secs(15),
		log_uris: Vec::new(),
	};
	Arc::new(StandaloneRoutingEngine::new(
		&settings,
		"r1/1",
		Arc::new(InMemoryDiscovery::new("memory://test")),
		SocketAddr::from(([127, 0, 0, 1], 0)),
	))
}
