//! The node run sequence.

use crate::exchanges::ExchangeRegistry;
use crate::implementations::StandaloneComponents;
use anyhow::{Context, Result};
use router_config::{validate, DocumentSource, FsDocumentSource, NodeConfig, RawOptions};
use router_core::{ActivationOutcome, ComponentFactory, LifecycleController, ShutdownReport};
use router_discovery::{
	bootstrap, teardown, ConnectorRegistry, InMemoryConnector, ServiceContext,
};
use router_monitoring::CarbonConnector;
use router_types::{ExchangeId, LifecycleState, MetricSample, MetricsConnector};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// What a completed run did.
#[derive(Debug)]
pub struct RunSummary {
	pub active_exchanges: Vec<ExchangeId>,
	pub failed_exchanges: Vec<ExchangeId>,
	pub shutdown: ShutdownReport,
}

/// Runs one router node from raw options to teardown.
pub struct NodeRunner {
	options: RawOptions,
	documents: Box<dyn DocumentSource>,
	connectors: ConnectorRegistry,
	metrics: Box<dyn MetricsConnector>,
	components: Arc<dyn ComponentFactory>,
	exchanges: ExchangeRegistry,
}

impl NodeRunner {
	pub fn new(options: RawOptions) -> Self {
		Self {
			options,
			documents: Box::new(FsDocumentSource),
			connectors: ConnectorRegistry::new().with_connector(Arc::new(InMemoryConnector::new())),
			metrics: Box::new(CarbonConnector::new()),
			components: Arc::new(StandaloneComponents::default()),
			exchanges: ExchangeRegistry::with_builtin(),
		}
	}

	pub fn with_documents(mut self, documents: impl DocumentSource + 'static) -> Self {
		self.documents = Box::new(documents);
		self
	}

	pub fn with_connectors(mut self, connectors: ConnectorRegistry) -> Self {
		self.connectors = connectors;
		self
	}

	pub fn with_metrics(mut self, metrics: impl MetricsConnector + 'static) -> Self {
		self.metrics = Box::new(metrics);
		self
	}

	pub fn with_components(mut self, components: Arc<dyn ComponentFactory>) -> Self {
		self.components = components;
		self
	}

	pub fn with_exchanges(mut self, exchanges: ExchangeRegistry) -> Self {
		self.exchanges = exchanges;
		self
	}

	/// Validate, bootstrap, bring the node up and serve until
	/// `shutdown_signal` resolves, then tear everything down.
	///
	/// Returns an error when the node could not be brought up; whatever was
	/// started by then has been stopped again.
	#[instrument(skip_all)]
	pub async fn run<F>(self, shutdown_signal: F) -> Result<RunSummary>
	where
		F: Future<Output = ()>,
	{
		let config = validate(self.options.clone(), self.documents.as_ref())
			.context("Invalid configuration")?;
		info!(
			installation = %config.installation(),
			node = %config.node_name(),
			exchanges = config.exchanges().len(),
			"Configuration validated"
		);

		let context = bootstrap(&config, &self.connectors, self.metrics.as_ref())
			.await
			.context("Failed to bootstrap discovery")?;
		if context.is_degraded() {
			warn!("Running without metrics publication");
		}

		let controller =
			LifecycleController::new(Arc::clone(&self.components), config.engine_settings());
		if let Err(e) = self.bring_up(&controller, &context).await {
			abort(&controller, context).await;
			return Err(e);
		}

		let outcomes = controller
			.activate_exchanges(config.exchanges(), &self.exchanges)
			.await;
		let (active_exchanges, failed_exchanges) = partition(&outcomes);
		info!(
			active = active_exchanges.len(),
			failed = failed_exchanges.len(),
			"Router node running"
		);
		publish_status(&context, &controller, Some(&outcomes)).await;

		shutdown_signal.await;
		info!("Shutdown signal received, stopping node");

		let shutdown = finish(&controller, context).await?;

		Ok(RunSummary {
			active_exchanges,
			failed_exchanges,
			shutdown,
		})
	}

	/// Validate the options without acquiring any resource.
	pub fn check(&self) -> Result<NodeConfig> {
		validate(self.options.clone(), self.documents.as_ref()).context("Invalid configuration")
	}

	async fn bring_up(
		&self,
		controller: &LifecycleController,
		context: &ServiceContext,
	) -> Result<()> {
		controller
			.init(context)
			.await
			.context("Failed to initialize node components")?;
		controller
			.start()
			.await
			.context("Failed to start node components")?;
		Ok(())
	}
}

/// Shut the node down and close the context, even when shutdown fails.
async fn finish(
	controller: &LifecycleController,
	context: ServiceContext,
) -> Result<ShutdownReport> {
	let shutdown = controller.shutdown().await;
	publish_status(&context, controller, None).await;
	teardown(context).await;
	shutdown.context("Failed to shut down node")
}

/// Stop whatever a failed bring-up left behind and close the context.
async fn abort(controller: &LifecycleController, context: ServiceContext) {
	publish_status(&context, controller, None).await;
	match controller.shutdown().await {
		Ok(report) if !report.is_clean() => {
			warn!(failures = report.failures.len(), "Cleanup after failed start was incomplete")
		}
		Ok(_) => {},
		Err(e) => error!(error = %e, "Cleanup after failed start failed"),
	}
	teardown(context).await;
}

fn partition(outcomes: &[ActivationOutcome]) -> (Vec<ExchangeId>, Vec<ExchangeId>) {
	let mut active = Vec::new();
	let mut failed = Vec::new();
	for outcome in outcomes {
		if outcome.is_active() {
			active.push(outcome.spec.identity());
		} else {
			failed.push(outcome.spec.identity());
		}
	}
	(active, failed)
}

async fn publish_status(
	context: &ServiceContext,
	controller: &LifecycleController,
	outcomes: Option<&[ActivationOutcome]>,
) {
	let state: LifecycleState = controller.state().await;
	let mut samples = vec![MetricSample::new("lifecycle.state", f64::from(state.code()))];

	if let Some(outcomes) = outcomes {
		let active = outcomes.iter().filter(|o| o.is_active()).count();
		samples.push(MetricSample::new("exchanges.active", active as f64));
		samples.push(MetricSample::new(
			"exchanges.failed",
			(outcomes.len() - active) as f64,
		));
	}

	context.publish_metrics(samples).await;
}
