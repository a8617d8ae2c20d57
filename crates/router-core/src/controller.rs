// router-core/src/controller.rs

use crate::activation::{activate_all, ActivationOutcome};
use crate::components::ComponentFactory;
use crate::error::{ActivationError, Component, LifecycleError, Stage};
use crate::handles::{ComponentHandle, ComponentHandles};
use crate::lifecycle::LifecycleManager;
use router_discovery::ServiceContext;
use router_types::{
	ComponentError, EngineSettings, ExchangeFactory, ExchangeId, ExchangeSpec, LedgerClient,
	LifecycleState, RoutingEngine,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, instrument, warn};

/// A component stop call that failed during shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownFailure {
	pub component: Component,
	pub error: ComponentError,
}

/// What went wrong while shutting down. Shutdown itself always completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
	pub failures: Vec<ShutdownFailure>,
}

impl ShutdownReport {
	pub fn is_clean(&self) -> bool {
		self.failures.is_empty()
	}
}

/// Drives the ledger client and the routing engine through the node
/// lifecycle.
///
/// Every transition takes the handle lock for its whole duration, so
/// concurrent callers are applied one after the other and always observe
/// a settled state.
pub struct LifecycleController {
	factory: Arc<dyn ComponentFactory>,
	settings: EngineSettings,
	lifecycle: LifecycleManager,
	handles: Mutex<ComponentHandles>,
}

impl LifecycleController {
	pub fn new(factory: Arc<dyn ComponentFactory>, settings: EngineSettings) -> Self {
		Self {
			factory,
			settings,
			lifecycle: LifecycleManager::new(),
			handles: Mutex::new(ComponentHandles::default()),
		}
	}

	pub async fn state(&self) -> LifecycleState {
		self.lifecycle.get_state().await
	}

	/// Notified once when shutdown begins.
	pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
		self.lifecycle.subscribe_shutdown()
	}

	/// Identities of the active exchange connectors, in activation order.
	pub async fn exchange_ids(&self) -> Vec<ExchangeId> {
		self.handles.lock().await.exchange_ids()
	}

	/// Construct and bind both components. Nothing is started.
	#[instrument(skip_all)]
	pub async fn init(&self, context: &ServiceContext) -> Result<(), LifecycleError> {
		let mut handles = self.handles.lock().await;
		self.require("init", LifecycleState::Uninitialized).await?;

		let ledger = self
			.factory
			.create_ledger_client(context, &self.settings)
			.await
			.map_err(|e| LifecycleError::component(Component::LedgerClient, Stage::Construction, e));
		let ledger = match ledger {
			Ok(ledger) => ledger,
			Err(e) => return Err(self.fail(e).await),
		};

		let engine = match self.build_engine(context, &ledger).await {
			Ok(engine) => engine,
			Err(e) => return Err(self.fail(e).await),
		};

		info!(ledger = ledger.name(), engine = engine.name(), "Components constructed and bound");
		handles.ledger = Some(ComponentHandle::new(ledger).with_state(LifecycleState::Initialized));
		handles.engine = Some(ComponentHandle::new(engine).with_state(LifecycleState::Initialized));
		self.lifecycle.set_state(LifecycleState::Initialized).await
	}

	async fn build_engine(
		&self,
		context: &ServiceContext,
		ledger: &Arc<dyn LedgerClient>,
	) -> Result<Arc<dyn RoutingEngine>, LifecycleError> {
		let engine = self
			.factory
			.create_routing_engine(context, &self.settings)
			.await
			.map_err(|e| LifecycleError::component(Component::RoutingEngine, Stage::Construction, e))?;

		engine
			.init()
			.await
			.map_err(|e| LifecycleError::component(Component::RoutingEngine, Stage::Init, e))?;
		engine
			.set_ledger_client(Arc::downgrade(ledger))
			.await
			.map_err(|e| LifecycleError::component(Component::RoutingEngine, Stage::LedgerBinding, e))?;
		engine
			.bind_transport()
			.await
			.map_err(|e| {
				LifecycleError::component(Component::RoutingEngine, Stage::TransportBinding, e)
			})?;

		Ok(engine)
	}

	/// Start the ledger client, then the routing engine.
	///
	/// If the engine fails to start the ledger client is shut down again
	/// before the error is returned.
	#[instrument(skip_all)]
	pub async fn start(&self) -> Result<(), LifecycleError> {
		let mut handles = self.handles.lock().await;
		self.require("start", LifecycleState::Initialized).await?;

		let ComponentHandles { ledger, engine, .. } = &mut *handles;
		let (Some(ledger), Some(engine)) = (ledger.as_mut(), engine.as_mut()) else {
			let state = self.lifecycle.get_state().await;
			return Err(LifecycleError::InvalidTransition {
				operation: "start",
				state,
			});
		};

		if let Err(e) = ledger.component().start().await {
			ledger.set_state(LifecycleState::Failed);
			let err = LifecycleError::component(Component::LedgerClient, Stage::Start, e);
			return Err(self.fail(err).await);
		}
		ledger.set_state(LifecycleState::Running);
		info!("Ledger client started");

		if let Err(e) = engine.component().start().await {
			engine.set_state(LifecycleState::Failed);
			warn!("Routing engine failed to start, stopping ledger client");
			match ledger.component().shutdown().await {
				Ok(()) => ledger.set_state(LifecycleState::Stopped),
				Err(stop_err) => {
					ledger.set_state(LifecycleState::Failed);
					error!(error = %stop_err, "Ledger client rollback failed");
				}
			}
			let err = LifecycleError::component(Component::RoutingEngine, Stage::Start, e);
			return Err(self.fail(err).await);
		}
		engine.set_state(LifecycleState::Running);
		info!("Routing engine started");

		self.lifecycle.set_state(LifecycleState::Running).await
	}

	/// Activate one exchange connector per spec against the running engine.
	///
	/// Specs whose identity is already active are rejected with
	/// [`ActivationError::AlreadyActive`]; outcomes follow the input order.
	pub async fn activate_exchanges(
		&self,
		specs: &[ExchangeSpec],
		factory: &dyn ExchangeFactory,
	) -> Vec<ActivationOutcome> {
		let mut handles = self.handles.lock().await;

		let engine = match handles.engine.as_ref() {
			Some(engine) if engine.is_running() => engine,
			_ => {
				warn!("Routing engine not running, no exchange activated");
				return specs
					.iter()
					.cloned()
					.map(|spec| ActivationOutcome::rejected(spec, ActivationError::EngineNotRunning))
					.collect();
			}
		};

		let mut seen: HashSet<ExchangeId> = handles.exchange_ids().into_iter().collect();
		let mut duplicate = Vec::with_capacity(specs.len());
		let mut fresh = Vec::new();
		for spec in specs {
			let is_new = seen.insert(spec.identity());
			duplicate.push(!is_new);
			if is_new {
				fresh.push(spec.clone());
			}
		}

		let mut activated = activate_all(engine, &fresh, factory).await.into_iter();
		let mut outcomes = Vec::with_capacity(specs.len());
		for (spec, duplicate) in specs.iter().zip(duplicate) {
			if duplicate {
				let id = spec.identity();
				warn!(exchange = %id, "Exchange already active");
				outcomes.push(ActivationOutcome::rejected(
					spec.clone(),
					ActivationError::AlreadyActive(id),
				));
			} else if let Some(outcome) = activated.next() {
				outcomes.push(outcome);
			}
		}

		for outcome in &outcomes {
			if let Ok(connector) = &outcome.result {
				handles
					.exchanges
					.push((outcome.spec.identity(), Arc::clone(connector)));
			}
		}

		outcomes
	}

	/// Stop the routing engine, release the exchange connectors, then stop
	/// the ledger client.
	///
	/// Stop failures are collected in the report and never interrupt the
	/// sequence; the node always ends `Stopped`.
	#[instrument(skip_all)]
	pub async fn shutdown(&self) -> Result<ShutdownReport, LifecycleError> {
		let mut handles = self.handles.lock().await;

		match self.lifecycle.get_state().await {
			LifecycleState::Stopped => return Ok(ShutdownReport::default()),
			LifecycleState::Uninitialized => {
				return Err(LifecycleError::InvalidTransition {
					operation: "shutdown",
					state: LifecycleState::Uninitialized,
				})
			}
			_ => {},
		}

		self.lifecycle.set_state(LifecycleState::ShuttingDown).await?;
		info!("Shutting down node components");

		let mut report = ShutdownReport::default();

		if let Some(engine) = handles.engine.as_mut().filter(|h| !is_stopped(h)) {
			let result = engine.component().shutdown().await;
			settle(Component::RoutingEngine, engine, result, &mut report);
		}

		let released = handles.exchanges.len();
		handles.exchanges.clear();
		if released > 0 {
			info!(exchanges = released, "Released exchange connectors");
		}

		if let Some(ledger) = handles.ledger.as_mut().filter(|h| !is_stopped(h)) {
			let result = ledger.component().shutdown().await;
			settle(Component::LedgerClient, ledger, result, &mut report);
		}

		self.lifecycle.set_state(LifecycleState::Stopped).await?;
		if report.is_clean() {
			info!("Node stopped");
		} else {
			warn!(failures = report.failures.len(), "Node stopped with errors");
		}
		Ok(report)
	}

	async fn require(
		&self,
		operation: &'static str,
		expected: LifecycleState,
	) -> Result<(), LifecycleError> {
		let state = self.lifecycle.get_state().await;
		if state != expected {
			return Err(LifecycleError::InvalidTransition { operation, state });
		}
		Ok(())
	}

	async fn fail(&self, err: LifecycleError) -> LifecycleError {
		error!(error = %err, "Lifecycle transition failed");
		self.lifecycle.fail().await;
		err
	}
}

fn is_stopped<T: ?Sized>(handle: &ComponentHandle<T>) -> bool {
	handle.state() == LifecycleState::Stopped
}

fn settle<T: ?Sized>(
	component: Component,
	handle: &mut ComponentHandle<T>,
	result: Result<(), ComponentError>,
	report: &mut ShutdownReport,
) {
	match result {
		Ok(()) => {
			handle.set_state(LifecycleState::Stopped);
			info!("{} stopped", component);
		}
		Err(e) => {
			handle.set_state(LifecycleState::Failed);
			error!(error = %e, "{} failed to stop", component);
			report.failures.push(ShutdownFailure {
				component,
				error: e,
			});
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{context, settings, CallLog, FakeComponents, FakeExchangeFactory};

	fn controller(log: &CallLog) -> (LifecycleController, Arc<FakeComponents>) {
		let components = Arc::new(FakeComponents::new(log.clone()));
		let controller = LifecycleController::new(components.clone(), settings());
		(controller, components)
	}

	fn specs(names: &[&str]) -> Vec<ExchangeSpec> {
		names
			.iter()
			.enumerate()
			.map(|(i, name)| ExchangeSpec::new(i, "openrtb").with_name(*name))
			.collect()
	}

	async fn running(log: &CallLog) -> (LifecycleController, Arc<FakeComponents>) {
		let (controller, components) = controller(log);
		controller.init(&context().await).await.unwrap();
		controller.start().await.unwrap();
		(controller, components)
	}

	#[tokio::test]
	async fn test_init_constructs_and_binds_in_order() {
		let log = CallLog::default();
		let (controller, components) = controller(&log);

		controller.init(&context().await).await.unwrap();

		assert_eq!(controller.state().await, LifecycleState::Initialized);
		assert_eq!(
			log.entries(),
			vec![
				"ledger.create",
				"engine.create",
				"engine.init",
				"engine.set_ledger_client",
				"engine.bind_transport",
			]
		);
		let engine = components.engine().unwrap();
		assert_eq!(engine.ledger().unwrap().name(), "fake-ledger");
	}

	#[tokio::test]
	async fn test_init_failure_marks_failed_and_starts_nothing() {
		let log = CallLog::default().fail_on("engine.bind_transport");
		let (controller, _) = controller(&log);

		let err = controller.init(&context().await).await.unwrap_err();

		assert!(matches!(
			err,
			LifecycleError::Component {
				component: Component::RoutingEngine,
				stage: Stage::TransportBinding,
				..
			}
		));
		assert_eq!(controller.state().await, LifecycleState::Failed);
		assert!(controller.start().await.is_err());
		assert!(!log.entries().iter().any(|e| e.ends_with(".start")));
	}

	#[tokio::test]
	async fn test_ledger_construction_failure() {
		let log = CallLog::default().fail_on("ledger.create");
		let (controller, _) = controller(&log);

		let err = controller.init(&context().await).await.unwrap_err();
		assert!(matches!(
			err,
			LifecycleError::Component {
				component: Component::LedgerClient,
				stage: Stage::Construction,
				..
			}
		));
		assert_eq!(log.entries(), vec!["ledger.create"]);
	}

	#[tokio::test]
	async fn test_ledger_starts_before_engine() {
		let log = CallLog::default();
		let (controller, _) = running(&log).await;

		assert_eq!(controller.state().await, LifecycleState::Running);
		let ledger = log.position("ledger.start").unwrap();
		let engine = log.position("engine.start").unwrap();
		assert!(ledger < engine);
	}

	#[tokio::test]
	async fn test_start_requires_init() {
		let (controller, _) = controller(&CallLog::default());

		let err = controller.start().await.unwrap_err();
		assert!(matches!(
			err,
			LifecycleError::InvalidTransition {
				operation: "start",
				state: LifecycleState::Uninitialized
			}
		));
	}

	#[tokio::test]
	async fn test_ledger_start_failure_never_starts_engine() {
		let log = CallLog::default().fail_on("ledger.start");
		let (controller, _) = controller(&log);
		controller.init(&context().await).await.unwrap();

		assert!(controller.start().await.is_err());
		assert_eq!(controller.state().await, LifecycleState::Failed);
		assert_eq!(log.position("engine.start"), None);
	}

	#[tokio::test]
	async fn test_engine_start_failure_rolls_back_ledger() {
		let log = CallLog::default().fail_on("engine.start");
		let (controller, _) = controller(&log);
		controller.init(&context().await).await.unwrap();

		let err = controller.start().await.unwrap_err();

		assert!(matches!(
			err,
			LifecycleError::Component {
				component: Component::RoutingEngine,
				stage: Stage::Start,
				..
			}
		));
		assert_eq!(controller.state().await, LifecycleState::Failed);
		let entries = log.entries();
		assert_eq!(
			&entries[entries.len() - 3..],
			&["ledger.start", "engine.start", "ledger.shutdown"]
		);
	}

	#[tokio::test]
	async fn test_shutdown_stops_engine_before_ledger() {
		let log = CallLog::default();
		let (controller, _) = running(&log).await;

		let report = controller.shutdown().await.unwrap();

		assert!(report.is_clean());
		assert_eq!(controller.state().await, LifecycleState::Stopped);
		assert!(log.position("engine.shutdown").unwrap() < log.position("ledger.shutdown").unwrap());
	}

	#[tokio::test]
	async fn test_shutdown_continues_past_failures() {
		for failing in ["engine.shutdown", "ledger.shutdown"] {
			let log = CallLog::default().fail_on(failing);
			let (controller, _) = running(&log).await;

			let report = controller.shutdown().await.unwrap();

			assert_eq!(report.failures.len(), 1);
			assert_eq!(controller.state().await, LifecycleState::Stopped);
			assert!(log.position("engine.shutdown").is_some());
			assert!(log.position("ledger.shutdown").is_some());
		}
	}

	#[tokio::test]
	async fn test_shutdown_reports_both_failures() {
		let log = CallLog::default()
			.fail_on("engine.shutdown")
			.fail_on("ledger.shutdown");
		let (controller, _) = running(&log).await;

		let report = controller.shutdown().await.unwrap();

		let failed: Vec<Component> = report.failures.iter().map(|f| f.component).collect();
		assert_eq!(failed, vec![Component::RoutingEngine, Component::LedgerClient]);
		assert_eq!(controller.state().await, LifecycleState::Stopped);
	}

	#[tokio::test]
	async fn test_shutdown_is_idempotent_once_stopped() {
		let log = CallLog::default();
		let (controller, _) = running(&log).await;

		controller.shutdown().await.unwrap();
		let calls = log.entries().len();
		let report = controller.shutdown().await.unwrap();

		assert!(report.is_clean());
		assert_eq!(log.entries().len(), calls);
	}

	#[tokio::test]
	async fn test_shutdown_before_init_is_rejected() {
		let (controller, _) = controller(&CallLog::default());

		assert!(matches!(
			controller.shutdown().await,
			Err(LifecycleError::InvalidTransition {
				operation: "shutdown",
				..
			})
		));
		assert_eq!(controller.state().await, LifecycleState::Uninitialized);
	}

	#[tokio::test]
	async fn test_shutdown_after_rollback_skips_stopped_ledger() {
		let log = CallLog::default().fail_on("engine.start");
		let (controller, _) = controller(&log);
		controller.init(&context().await).await.unwrap();
		let _ = controller.start().await;

		controller.shutdown().await.unwrap();

		assert_eq!(controller.state().await, LifecycleState::Stopped);
		let stops = log
			.entries()
			.iter()
			.filter(|e| *e == "ledger.shutdown")
			.count();
		assert_eq!(stops, 1);
		assert!(log.position("engine.shutdown").is_some());
	}

	#[tokio::test]
	async fn test_shutdown_from_initialized() {
		let log = CallLog::default();
		let (controller, _) = controller(&log);
		controller.init(&context().await).await.unwrap();

		controller.shutdown().await.unwrap();

		assert_eq!(controller.state().await, LifecycleState::Stopped);
		assert!(log.position("engine.shutdown").unwrap() < log.position("ledger.shutdown").unwrap());
	}

	#[tokio::test]
	async fn test_shutdown_notifies_subscribers() {
		let (controller, _) = running(&CallLog::default()).await;
		let mut rx = controller.subscribe_shutdown();

		controller.shutdown().await.unwrap();
		assert!(rx.try_recv().is_ok());
	}

	#[tokio::test]
	async fn test_activation_before_start_is_rejected() {
		let log = CallLog::default();
		let (controller, _) = controller(&log);
		controller.init(&context().await).await.unwrap();
		let factory = FakeExchangeFactory::new(log.clone());

		let outcomes = controller
			.activate_exchanges(&specs(&["a", "b"]), &factory)
			.await;

		assert!(outcomes
			.iter()
			.all(|o| o.error() == Some(&ActivationError::EngineNotRunning)));
		assert_eq!(factory.calls(), 0);
		assert!(controller.exchange_ids().await.is_empty());
	}

	#[tokio::test]
	async fn test_activation_tracks_active_exchanges() {
		let log = CallLog::default();
		let (controller, _) = running(&log).await;
		let factory = FakeExchangeFactory::new(log.clone()).failing_at(1);

		let outcomes = controller
			.activate_exchanges(&specs(&["a", "b", "c"]), &factory)
			.await;

		let active: Vec<bool> = outcomes.iter().map(|o| o.is_active()).collect();
		assert_eq!(active, vec![true, false, true]);
		assert_eq!(controller.exchange_ids().await, vec!["a", "c"]);
	}

	#[tokio::test]
	async fn test_activation_rejects_already_active() {
		let log = CallLog::default();
		let (controller, _) = running(&log).await;
		let factory = FakeExchangeFactory::new(log.clone());

		controller
			.activate_exchanges(&specs(&["a"]), &factory)
			.await;
		let outcomes = controller
			.activate_exchanges(&specs(&["a", "b"]), &factory)
			.await;

		assert_eq!(
			outcomes[0].error(),
			Some(&ActivationError::AlreadyActive("a".to_string()))
		);
		assert!(outcomes[1].is_active());
		assert_eq!(outcomes[1].spec.index, 1);
		assert_eq!(factory.calls(), 2);
		assert_eq!(controller.exchange_ids().await, vec!["a", "b"]);
	}

	#[tokio::test]
	async fn test_shutdown_releases_exchanges_after_engine_stop() {
		let log = CallLog::default();
		let (controller, _) = running(&log).await;
		let factory = FakeExchangeFactory::new(log.clone());
		controller
			.activate_exchanges(&specs(&["a", "b"]), &factory)
			.await;

		controller.shutdown().await.unwrap();

		assert!(controller.exchange_ids().await.is_empty());
		assert!(
			log.position("exchange.start b").unwrap() < log.position("engine.shutdown").unwrap()
		);
	}
}
