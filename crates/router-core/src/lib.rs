//! # Router Core
//!
//! Dependency-ordered lifecycle control for a router node.
//!
//! ## Ordering
//!
//! ```text
//! init:      construct ledger client -> construct engine -> engine.init
//!            -> bind engine to ledger client -> bind engine transport
//! start:     ledger client.start -> engine.start
//! activate:  one exchange connector per spec, in document order
//! shutdown:  engine.shutdown -> ledger client.shutdown
//! ```
//!
//! The ledger client is live before the engine starts, so the engine can
//! charge budgets from its first request; shutdown reverses the order so
//! the engine stops generating chargeable events before its accounting
//! counterpart goes away. If the engine fails to start, the ledger client
//! is stopped again before the node reports failure.
//!
//! ## Key Components
//!
//! - [`LifecycleController`] - owns the component handles and drives every transition
//! - [`LifecycleManager`] - the validated state machine shared with observers
//! - [`activate_all`] - the exchange activation loop
//! - [`ComponentFactory`] - how the controller constructs its ledger client and engine

pub mod activation;
pub mod components;
pub mod controller;
pub mod error;
pub mod handles;
pub mod lifecycle;

#[cfg(test)]
mod test_support;

pub use activation::{activate_all, ActivationOutcome};
pub use components::ComponentFactory;
pub use controller::{LifecycleController, ShutdownFailure, ShutdownReport};
pub use error::{ActivationError, Component, LifecycleError, Stage};
pub use handles::ComponentHandle;
pub use lifecycle::LifecycleManager;
pub use router_types::LifecycleState;
