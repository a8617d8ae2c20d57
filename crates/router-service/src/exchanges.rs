//! Exchange connector registry.

use async_trait::async_trait;
use router_types::{
	ComponentError, ComponentResult, ExchangeConnector, ExchangeFactory, ExchangeId, ExchangeSpec,
	RoutingEngine,
};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Builds connectors for one exchange type.
#[async_trait]
pub trait ExchangeConnectorFactory: Send + Sync {
	fn exchange_type(&self) -> &str;

	async fn create(
		&self,
		engine: Arc<dyn RoutingEngine>,
		spec: &ExchangeSpec,
	) -> ComponentResult<Arc<dyn ExchangeConnector>>;
}

/// Connector factories keyed by exchange type.
#[derive(Default)]
pub struct ExchangeRegistry {
	factories: HashMap<String, Box<dyn ExchangeConnectorFactory>>,
}

impl ExchangeRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registry with the connectors shipped with the node.
	pub fn with_builtin() -> Self {
		let mut registry = Self::new();
		registry.register(MockExchangeFactory);
		registry
	}

	/// Register a factory, replacing any previous one for its type.
	pub fn register<F>(&mut self, factory: F)
	where
		F: ExchangeConnectorFactory + 'static,
	{
		self.factories
			.insert(factory.exchange_type().to_string(), Box::new(factory));
	}

	pub fn exchange_types(&self) -> Vec<String> {
		let mut types: Vec<String> = self.factories.keys().cloned().collect();
		types.sort();
		types
	}
}

#[async_trait]
impl ExchangeFactory for ExchangeRegistry {
	async fn start_exchange(
		&self,
		engine: Arc<dyn RoutingEngine>,
		spec: &ExchangeSpec,
	) -> ComponentResult<Arc<dyn ExchangeConnector>> {
		let factory = self.factories.get(&spec.exchange_type).ok_or_else(|| {
			ComponentError::NotFound(format!("Exchange type '{}' not found", spec.exchange_type))
		})?;
		debug!(exchange = %spec.identity(), "Creating exchange connector");
		factory.create(engine, spec).await
	}
}

/// Exchange that never sends traffic. Used for standalone runs.
pub struct MockExchange {
	id: ExchangeId,
	engine: Weak<dyn RoutingEngine>,
}

impl MockExchange {
	/// Whether the engine this exchange feeds is still alive. The exchange
	/// never keeps the engine alive itself.
	pub fn is_attached(&self) -> bool {
		self.engine.strong_count() > 0
	}
}

impl ExchangeConnector for MockExchange {
	fn exchange_id(&self) -> &ExchangeId {
		&self.id
	}

	fn exchange_type(&self) -> &str {
		MockExchangeFactory::EXCHANGE_TYPE
	}
}

pub struct MockExchangeFactory;

impl MockExchangeFactory {
	pub const EXCHANGE_TYPE: &'static str = "mock";

	/// Build a mock exchange fed by `engine`.
	///
	/// `bidProbability` is optional and must lie in `[0, 1]`.
	pub async fn create_mock(
		&self,
		engine: Arc<dyn RoutingEngine>,
		spec: &ExchangeSpec,
	) -> ComponentResult<Arc<MockExchange>> {
		let bid_probability = match spec.parameters.get("bidProbability") {
			None => 1.0,
			Some(value) => value
				.as_f64()
				.filter(|p| (0.0..=1.0).contains(p))
				.ok_or_else(|| {
					ComponentError::InvalidParameters(format!(
						"bidProbability must be a number between 0 and 1, got {}",
						value
					))
				})?,
		};

		let id = spec.identity();
		debug!(exchange = %id, bid_probability, "Mock exchange attached");
		Ok(Arc::new(MockExchange {
			id,
			engine: Arc::downgrade(&engine),
		}))
	}
}

#[async_trait]
impl ExchangeConnectorFactory for MockExchangeFactory {
	fn exchange_type(&self) -> &str {
		Self::EXCHANGE_TYPE
	}

	async fn create(
		&self,
		engine: Arc<dyn RoutingEngine>,
		spec: &ExchangeSpec,
	) -> ComponentResult<Arc<dyn ExchangeConnector>> {
		let exchange: Arc<dyn ExchangeConnector> = self.create_mock(engine, spec).await?;
		Ok(exchange)
	}
}
