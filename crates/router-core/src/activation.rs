// router-core/src/activation.rs

use crate::error::ActivationError;
use crate::handles::ComponentHandle;
use router_types::{ExchangeConnector, ExchangeFactory, ExchangeSpec, RoutingEngine};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of activating one exchange spec.
pub struct ActivationOutcome {
	pub spec: ExchangeSpec,
	pub result: Result<Arc<dyn ExchangeConnector>, ActivationError>,
}

impl ActivationOutcome {
	pub(crate) fn rejected(spec: ExchangeSpec, error: ActivationError) -> Self {
		Self {
			spec,
			result: Err(error),
		}
	}

	pub fn is_active(&self) -> bool {
		self.result.is_ok()
	}

	pub fn error(&self) -> Option<&ActivationError> {
		self.result.as_ref().err()
	}
}

impl std::fmt::Debug for ActivationOutcome {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let result = match &self.result {
			Ok(connector) => Ok(connector.exchange_id()),
			Err(e) => Err(e),
		};
		f.debug_struct("ActivationOutcome")
			.field("index", &self.spec.index)
			.field("exchange", &self.spec.identity())
			.field("result", &result)
			.finish()
	}
}

/// Activate one connector per spec, in order.
///
/// A spec that fails is reported and the loop moves on. Against an engine
/// that is not running every spec is rejected and the factory is never
/// called.
#[instrument(skip_all, fields(exchanges = specs.len()))]
pub async fn activate_all(
	engine: &ComponentHandle<dyn RoutingEngine>,
	specs: &[ExchangeSpec],
	factory: &dyn ExchangeFactory,
) -> Vec<ActivationOutcome> {
	if !engine.is_running() {
		warn!(state = %engine.state(), "Routing engine not running, no exchange activated");
		return specs
			.iter()
			.cloned()
			.map(|spec| ActivationOutcome::rejected(spec, ActivationError::EngineNotRunning))
			.collect();
	}

	let mut outcomes = Vec::with_capacity(specs.len());
	for spec in specs {
		let id = spec.identity();
		let result = factory
			.start_exchange(Arc::clone(engine.component()), spec)
			.await
			.map_err(ActivationError::from);

		match &result {
			Ok(_) => info!(exchange = %id, exchange_type = %spec.exchange_type, "Exchange active"),
			Err(e) => warn!(exchange = %id, index = spec.index, error = %e, "Exchange failed to activate"),
		}

		outcomes.push(ActivationOutcome {
			spec: spec.clone(),
			result,
		});
	}
	outcomes
}
