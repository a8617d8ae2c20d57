// router-core/src/error.rs

use router_types::{ComponentError, ExchangeId, LifecycleState};
use thiserror::Error;

/// Components supervised by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
	LedgerClient,
	RoutingEngine,
}

impl std::fmt::Display for Component {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::LedgerClient => write!(f, "ledger client"),
			Self::RoutingEngine => write!(f, "routing engine"),
		}
	}
}

/// Step of a transition at which a component call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
	Construction,
	Init,
	LedgerBinding,
	TransportBinding,
	Start,
}

impl std::fmt::Display for Stage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Construction => write!(f, "construction"),
			Self::Init => write!(f, "init"),
			Self::LedgerBinding => write!(f, "ledger binding"),
			Self::TransportBinding => write!(f, "transport binding"),
			Self::Start => write!(f, "start"),
		}
	}
}

#[derive(Error, Debug)]
pub enum LifecycleError {
	#[error("Cannot {operation} while {state}")]
	InvalidTransition {
		operation: &'static str,
		state: LifecycleState,
	},

	#[error("Invalid state transition from {from} to {to}")]
	IllegalStateChange {
		from: LifecycleState,
		to: LifecycleState,
	},

	#[error("{component} {stage} failed: {source}")]
	Component {
		component: Component,
		stage: Stage,
		#[source]
		source: ComponentError,
	},
}

impl LifecycleError {
	pub(crate) fn component(component: Component, stage: Stage, source: ComponentError) -> Self {
		Self::Component {
			component,
			stage,
			source,
		}
	}
}

/// Why a single exchange connector did not go live.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActivationError {
	#[error("Routing engine is not running")]
	EngineNotRunning,

	#[error("Exchange '{0}' is already active")]
	AlreadyActive(ExchangeId),

	#[error("Exchange connector failed to start: {0}")]
	Factory(#[from] ComponentError),
}
