use async_trait::async_trait;
use router_types::{
	ComponentError, ComponentResult, DiscoveryBackend, EngineSettings, LedgerClient, RoutingEngine,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Routing engine that owns the node's bid request listener.
///
/// Connections are accepted and dropped; no auction logic runs. The
/// listener is bound during `bind_transport` and served from `start`
/// until `shutdown`.
pub struct StandaloneRoutingEngine {
	service_name: String,
	node_identity: String,
	discovery: Arc<dyn DiscoveryBackend>,
	bind_address: SocketAddr,
	loss_timeout: Duration,
	ledger: Mutex<Option<Weak<dyn LedgerClient>>>,
	listener: Mutex<Option<TcpListener>>,
	local_addr: Mutex<Option<SocketAddr>>,
	accept_task: Mutex<Option<JoinHandle<()>>>,
	stop_tx: watch::Sender<bool>,
	registered: AtomicBool,
}

impl StandaloneRoutingEngine {
	pub fn new(
		settings: &EngineSettings,
		node_identity: impl Into<String>,
		discovery: Arc<dyn DiscoveryBackend>,
		bind_address: SocketAddr,
	) -> Self {
		let (stop_tx, _) = watch::channel(false);

		Self {
			service_name: settings.engine_service_name(),
			node_identity: node_identity.into(),
			discovery,
			bind_address,
			loss_timeout: settings.loss_timeout,
			ledger: Mutex::new(None),
			listener: Mutex::new(None),
			local_addr: Mutex::new(None),
			accept_task: Mutex::new(None),
			stop_tx,
			registered: AtomicBool::new(false),
		}
	}

	/// Address the transport is bound to, once bound.
	pub fn local_addr(&self) -> Option<SocketAddr> {
		self.local_addr.lock().ok().and_then(|addr| *addr)
	}

	fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> ComponentResult<std::sync::MutexGuard<'a, T>> {
		mutex
			.lock()
			.map_err(|_| ComponentError::Start(format!("{} state poisoned", self.service_name)))
	}
}

#[async_trait]
impl RoutingEngine for StandaloneRoutingEngine {
	fn name(&self) -> &str {
		&self.service_name
	}

	async fn init(&self) -> ComponentResult<()> {
		if self.loss_timeout.is_zero() {
			return Err(ComponentError::InvalidParameters(
				"loss timeout must be positive".to_string(),
			));
		}
		debug!(
			service = %self.service_name,
			loss_timeout_ms = self.loss_timeout.as_millis() as u64,
			"Routing engine initialized"
		);
		Ok(())
	}

	async fn set_ledger_client(&self, ledger: Weak<dyn LedgerClient>) -> ComponentResult<()> {
		*self.lock(&self.ledger)? = Some(ledger);
		Ok(())
	}

	async fn bind_transport(&self) -> ComponentResult<()> {
		let listener = TcpListener::bind(self.bind_address)
			.await
			.map_err(|e| ComponentError::Bind(format!("{}: {}", self.bind_address, e)))?;
		let local_addr = listener
			.local_addr()
			.map_err(|e| ComponentError::Bind(e.to_string()))?;

		info!(%local_addr, "Routing engine transport bound");
		*self.lock(&self.local_addr)? = Some(local_addr);
		*self.lock(&self.listener)? = Some(listener);
		Ok(())
	}

	async fn start(&self) -> ComponentResult<()> {
		let ledger_live = self
			.lock(&self.ledger)?
			.as_ref()
			.is_some_and(|ledger| ledger.strong_count() > 0);
		if !ledger_live {
			return Err(ComponentError::Start(
				"no ledger client bound to the routing engine".to_string(),
			));
		}

		let listener = self
			.lock(&self.listener)?
			.take()
			.ok_or_else(|| ComponentError::Start("transport not bound".to_string()))?;

		self.discovery
			.register_service(&self.service_name, &self.node_identity)
			.await
			.map_err(|e| ComponentError::Start(format!("cannot register routing engine: {}", e)))?;
		self.registered.store(true, Ordering::SeqCst);

		let mut stop_rx = self.stop_tx.subscribe();
		let handle = tokio::spawn(async move {
			loop {
				tokio::select! {
					accepted = listener.accept() => match accepted {
						Ok((_stream, peer)) => debug!(%peer, "Connection accepted"),
						Err(e) => warn!(error = %e, "Accept failed"),
					},
					_ = stop_rx.changed() => break,
				}
			}
		});
		*self.lock(&self.accept_task)? = Some(handle);

		info!(service = %self.service_name, "Routing engine running");
		Ok(())
	}

	async fn shutdown(&self) -> ComponentResult<()> {
		let _ = self.stop_tx.send(true);

		let task = self
			.accept_task
			.lock()
			.map_err(|_| ComponentError::Shutdown(format!("{} state poisoned", self.service_name)))?
			.take();
		if let Some(task) = task {
			if let Err(e) = task.await {
				warn!(error = %e, "Accept loop ended abnormally");
			}
		}

		if self.registered.swap(false, Ordering::SeqCst) {
			self.discovery
				.unregister_service(&self.service_name)
				.await
				.map_err(|e| {
					ComponentError::Shutdown(format!("cannot unregister routing engine: {}", e))
				})?;
		}

		info!(service = %self.service_name, "Routing engine stopped");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::StandaloneLedgerClient;
	use router_discovery::InMemoryDiscovery;
	use tokio::net::TcpStream;

	fn engine(discovery: Arc<InMemoryDiscovery>) -> StandaloneRoutingEngine {
		let settings = EngineSettings {
			service_prefix: "router".to_string(),
			loss_timeout: Duration::from_secs(15),
			log_uris: Vec::new(),
		};
		StandaloneRoutingEngine::new(
			&settings,
			"r1/1",
			discovery,
			"127.0.0.1:0".parse().unwrap(),
		)
	}

	#[tokio::test]
	async fn test_serves_until_shutdown() {
		let discovery = Arc::new(InMemoryDiscovery::new("memory://test"));
		let ledger: Arc<dyn LedgerClient> = Arc::new(StandaloneLedgerClient::new(
			"router.ledgerClient",
			"r1/1",
			discovery.clone(),
		));
		let engine = engine(discovery.clone());

		engine.init().await.unwrap();
		engine.set_ledger_client(Arc::downgrade(&ledger)).await.unwrap();
		engine.bind_transport().await.unwrap();
		let addr = engine.local_addr().unwrap();
		assert_ne!(addr.port(), 0);

		engine.start().await.unwrap();
		assert_eq!(discovery.service_node("router").as_deref(), Some("r1/1"));
		assert!(TcpStream::connect(addr).await.is_ok());

		engine.shutdown().await.unwrap();
		assert_eq!(discovery.service_node("router"), None);
	}

	#[tokio::test]
	async fn test_start_requires_live_ledger() {
		let discovery = Arc::new(InMemoryDiscovery::new("memory://test"));
		let engine = engine(discovery.clone());
		engine.bind_transport().await.unwrap();

		let ledger: Arc<dyn LedgerClient> =
			Arc::new(StandaloneLedgerClient::new("router.ledgerClient", "r1/1", discovery));
		engine.set_ledger_client(Arc::downgrade(&ledger)).await.unwrap();
		drop(ledger);

		assert!(matches!(engine.start().await, Err(ComponentError::Start(_))));
	}

	#[tokio::test]
	async fn test_start_requires_bound_transport() {
		let discovery = Arc::new(InMemoryDiscovery::new("memory://test"));
		let ledger: Arc<dyn LedgerClient> = Arc::new(StandaloneLedgerClient::new(
			"router.ledgerClient",
			"r1/1",
			discovery.clone(),
		));
		let engine = engine(discovery);
		engine.set_ledger_client(Arc::downgrade(&ledger)).await.unwrap();

		assert!(matches!(engine.start().await, Err(ComponentError::Start(_))));
	}

	#[tokio::test]
	async fn test_bind_conflict() {
		let discovery = Arc::new(InMemoryDiscovery::new("memory://test"));
		let first = engine(discovery.clone());
		first.bind_transport().await.unwrap();

		let settings = EngineSettings {
			service_prefix: "router".to_string(),
			loss_timeout: Duration::from_secs(15),
			log_uris: Vec::new(),
		};
		let second = StandaloneRoutingEngine::new(
			&settings,
			"r1/2",
			discovery,
			first.local_addr().unwrap(),
		);
		assert!(matches!(
			second.bind_transport().await,
			Err(ComponentError::Bind(_))
		));
	}
}
