//! Recording fakes for the lifecycle tests.

use crate::components::ComponentFactory;
use async_trait::async_trait;
use router_config::{validate, FsDocumentSource, RawOptions};
use router_discovery::{bootstrap, ConnectorRegistry, InMemoryConnector, ServiceContext};
use router_types::{
	ComponentError, ComponentResult, EngineSettings, ExchangeConnector, ExchangeFactory,
	ExchangeId, ExchangeSpec, LedgerClient, MetricsConnector, MetricsSink, RoutingEngine,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

/// Ordered record of every collaborator call, shared by all fakes of a test.
#[derive(Clone, Default)]
pub struct CallLog {
	entries: Arc<Mutex<Vec<String>>>,
	failing: Arc<Mutex<HashSet<String>>>,
}

impl CallLog {
	/// Make every later call named `call` fail.
	pub fn fail_on(self, call: &str) -> Self {
		self.failing.lock().unwrap().insert(call.to_string());
		self
	}

	pub fn entries(&self) -> Vec<String> {
		self.entries.lock().unwrap().clone()
	}

	pub fn position(&self, call: &str) -> Option<usize> {
		self.entries().iter().position(|entry| entry == call)
	}

	fn call(&self, call: &str) -> ComponentResult<()> {
		self.entries.lock().unwrap().push(call.to_string());
		if self.failing.lock().unwrap().contains(call) {
			return Err(ComponentError::Start(format!("{} failed", call)));
		}
		Ok(())
	}
}

pub struct FakeLedger {
	log: CallLog,
}

#[async_trait]
impl LedgerClient for FakeLedger {
	fn name(&self) -> &str {
		"fake-ledger"
	}

	async fn start(&self) -> ComponentResult<()> {
		self.log.call("ledger.start")
	}

	async fn shutdown(&self) -> ComponentResult<()> {
		self.log.call("ledger.shutdown")
	}
}

pub struct FakeEngine {
	log: CallLog,
	ledger: Mutex<Option<Weak<dyn LedgerClient>>>,
}

impl FakeEngine {
	pub fn new(log: CallLog) -> Self {
		Self {
			log,
			ledger: Mutex::new(None),
		}
	}

	/// The bound ledger client, if it is still alive.
	pub fn ledger(&self) -> Option<Arc<dyn LedgerClient>> {
		self.ledger.lock().unwrap().as_ref()?.upgrade()
	}
}

#[async_trait]
impl RoutingEngine for FakeEngine {
	fn name(&self) -> &str {
		"fake-engine"
	}

	async fn init(&self) -> ComponentResult<()> {
		self.log.call("engine.init")
	}

	async fn set_ledger_client(&self, ledger: Weak<dyn LedgerClient>) -> ComponentResult<()> {
		self.log.call("engine.set_ledger_client")?;
		*self.ledger.lock().unwrap() = Some(ledger);
		Ok(())
	}

	async fn bind_transport(&self) -> ComponentResult<()> {
		self.log.call("engine.bind_transport")
	}

	async fn start(&self) -> ComponentResult<()> {
		self.log.call("engine.start")
	}

	async fn shutdown(&self) -> ComponentResult<()> {
		self.log.call("engine.shutdown")
	}
}

/// Builds fakes sharing one call log and keeps the last engine it built.
pub struct FakeComponents {
	log: CallLog,
	engine: Mutex<Option<Arc<FakeEngine>>>,
}

impl FakeComponents {
	pub fn new(log: CallLog) -> Self {
		Self {
			log,
			engine: Mutex::new(None),
		}
	}

	pub fn engine(&self) -> Option<Arc<FakeEngine>> {
		self.engine.lock().unwrap().clone()
	}
}

#[async_trait]
impl ComponentFactory for FakeComponents {
	async fn create_ledger_client(
		&self,
		_context: &ServiceContext,
		_settings: &EngineSettings,
	) -> ComponentResult<Arc<dyn LedgerClient>> {
		self.log.call("ledger.create")?;
		Ok(Arc::new(FakeLedger {
			log: self.log.clone(),
		}))
	}

	async fn create_routing_engine(
		&self,
		_context: &ServiceContext,
		_settings: &EngineSettings,
	) -> ComponentResult<Arc<dyn RoutingEngine>> {
		self.log.call("engine.create")?;
		let engine = Arc::new(FakeEngine::new(self.log.clone()));
		*self.engine.lock().unwrap() = Some(Arc::clone(&engine));
		Ok(engine)
	}
}

pub struct FakeConnector {
	id: ExchangeId,
	exchange_type: String,
}

impl ExchangeConnector for FakeConnector {
	fn exchange_id(&self) -> &ExchangeId {
		&self.id
	}

	fn exchange_type(&self) -> &str {
		&self.exchange_type
	}
}

pub struct FakeExchangeFactory {
	log: CallLog,
	failing_index: Option<usize>,
	calls: AtomicUsize,
}

impl FakeExchangeFactory {
	pub fn new(log: CallLog) -> Self {
		Self {
			log,
			failing_index: None,
			calls: AtomicUsize::new(0),
		}
	}

	pub fn failing_at(mut self, index: usize) -> Self {
		self.failing_index = Some(index);
		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl ExchangeFactory for FakeExchangeFactory {
	async fn start_exchange(
		&self,
		_engine: Arc<dyn RoutingEngine>,
		spec: &ExchangeSpec,
	) -> ComponentResult<Arc<dyn ExchangeConnector>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		let id = spec.identity();
		self.log.call(&format!("exchange.start {}", id))?;
		if self.failing_index == Some(spec.index) {
			return Err(ComponentError::InvalidParameters(format!(
				"exchange '{}' rejected its parameters",
				id
			)));
		}
		Ok(Arc::new(FakeConnector {
			id,
			exchange_type: spec.exchange_type.clone(),
		}))
	}
}

struct NoMetrics;

#[async_trait]
impl MetricsConnector for NoMetrics {
	async fn connect(
		&self,
		_endpoints: &[String],
		_prefix: &str,
	) -> ComponentResult<Box<dyn MetricsSink>> {
		Err(ComponentError::Connection("metrics disabled".to_string()))
	}
}

pub fn settings() -> EngineSettings {
	EngineSettings {
		service_prefix: "router".to_string(),
		loss_timeout: Duration::from_secs(15),
		log_uris: Vec::new(),
	}
}

/// A context bootstrapped against an in-memory discovery backend.
pub async fn context() -> ServiceContext {
	let raw = RawOptions {
		installation: Some("test".to_string()),
		node_name: Some("r1".to_string()),
		..RawOptions::default()
	};
	let config = validate(raw, &FsDocumentSource).unwrap();
	let connectors = ConnectorRegistry::new().with_connector(Arc::new(InMemoryConnector::new()));
	bootstrap(&config, &connectors, &NoMetrics).await.unwrap()
}
