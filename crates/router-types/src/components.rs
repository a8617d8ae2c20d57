// router-types/src/components.rs

use crate::{ComponentResult, ExchangeId, ExchangeSpec};
use async_trait::async_trait;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Parameters forwarded to the routing engine at construction.
///
/// The node does not interpret any of these values itself.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
	/// Prefix under which the engine and its ledger client register.
	pub service_prefix: String,
	/// Delay after which an unanswered bid is assumed lost.
	pub loss_timeout: Duration,
	/// Where the engine should publish its logs.
	pub log_uris: Vec<String>,
}

impl EngineSettings {
	/// Discovery name of the routing engine.
	pub fn engine_service_name(&self) -> String {
		self.service_prefix.clone()
	}

	/// Discovery name of the ledger client bound to the engine.
	pub fn ledger_service_name(&self) -> String {
		format!("{}.ledgerClient", self.service_prefix)
	}
}

/// Client of the financial ledger that authorizes spend against budgets.
#[async_trait]
pub trait LedgerClient: Send + Sync {
	fn name(&self) -> &str;

	/// Blocks until the client is able to account for spend.
	async fn start(&self) -> ComponentResult<()>;

	async fn shutdown(&self) -> ComponentResult<()>;
}

/// The routing and auction engine.
///
/// Calls arrive in the order `init`, `set_ledger_client`, `bind_transport`,
/// `start`, `shutdown`. The engine is handed a weak reference to the ledger
/// client: the node owns the ledger client, the engine only uses it.
#[async_trait]
pub trait RoutingEngine: Send + Sync {
	fn name(&self) -> &str;

	async fn init(&self) -> ComponentResult<()>;

	async fn set_ledger_client(&self, ledger: Weak<dyn LedgerClient>) -> ComponentResult<()>;

	async fn bind_transport(&self) -> ComponentResult<()>;

	/// Blocks until the engine accepts traffic.
	async fn start(&self) -> ComponentResult<()>;

	/// Stops the engine and every exchange connector attached to it.
	async fn shutdown(&self) -> ComponentResult<()>;
}

/// A live protocol adapter between the engine and one ad exchange.
pub trait ExchangeConnector: Send + Sync {
	fn exchange_id(&self) -> &ExchangeId;

	fn exchange_type(&self) -> &str;
}

/// Activates exchange connectors against a running engine.
#[async_trait]
pub trait ExchangeFactory: Send + Sync {
	async fn start_exchange(
		&self,
		engine: Arc<dyn RoutingEngine>,
		spec: &ExchangeSpec,
	) -> ComponentResult<Arc<dyn ExchangeConnector>>;
}
