// router-core/src/handles.rs

use router_types::{ExchangeConnector, ExchangeId, LedgerClient, LifecycleState, RoutingEngine};
use std::sync::Arc;

/// A supervised component together with the state the controller last
/// drove it to.
pub struct ComponentHandle<T: ?Sized> {
	component: Arc<T>,
	state: LifecycleState,
}

impl<T: ?Sized> ComponentHandle<T> {
	pub fn new(component: Arc<T>) -> Self {
		Self {
			component,
			state: LifecycleState::Uninitialized,
		}
	}

	pub fn component(&self) -> &Arc<T> {
		&self.component
	}

	pub fn state(&self) -> LifecycleState {
		self.state
	}

	pub fn is_running(&self) -> bool {
		self.state == LifecycleState::Running
	}

	pub(crate) fn set_state(&mut self, state: LifecycleState) {
		self.state = state;
	}

	pub(crate) fn with_state(mut self, state: LifecycleState) -> Self {
		self.state = state;
		self
	}
}

impl<T: ?Sized> std::fmt::Debug for ComponentHandle<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ComponentHandle")
			.field("state", &self.state)
			.finish_non_exhaustive()
	}
}

/// Slots owned by the controller.
#[derive(Default)]
pub(crate) struct ComponentHandles {
	pub(crate) ledger: Option<ComponentHandle<dyn LedgerClient>>,
	pub(crate) engine: Option<ComponentHandle<dyn RoutingEngine>>,
	/// Active connectors in activation order, unique by identity.
	pub(crate) exchanges: Vec<(ExchangeId, Arc<dyn ExchangeConnector>)>,
}

impl ComponentHandles {
	pub(crate) fn exchange_ids(&self) -> Vec<ExchangeId> {
		self.exchanges.iter().map(|(id, _)| id.clone()).collect()
	}
}
