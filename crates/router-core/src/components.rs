// router-core/src/components.rs

use async_trait::async_trait;
use router_discovery::ServiceContext;
use router_types::{ComponentResult, EngineSettings, LedgerClient, RoutingEngine};
use std::sync::Arc;

/// Constructs the node's two supervised components.
///
/// Construction must not start anything; the controller decides when each
/// component goes live.
#[async_trait]
pub trait ComponentFactory: Send + Sync {
	async fn create_ledger_client(
		&self,
		context: &ServiceContext,
		settings: &EngineSettings,
	) -> ComponentResult<Arc<dyn LedgerClient>>;

	async fn create_routing_engine(
		&self,
		context: &ServiceContext,
		settings: &EngineSettings,
	) -> ComponentResult<Arc<dyn RoutingEngine>>;
}
