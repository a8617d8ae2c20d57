//! Shared types and collaborator contracts for the router node.
//!
//! The lifecycle controller never reaches into the components it
//! supervises. Everything it knows about the ledger client, the routing
//! engine, exchange connectors, the discovery backend and the metrics
//! channel is expressed by the traits in this crate.
//!
//! # Modules
//!
//! - `components`: ledger client, routing engine and exchange contracts
//! - `discovery`: discovery backend contract
//! - `errors`: the outcome type shared by every collaborator call
//! - `exchange`: exchange connector specifications
//! - `lifecycle`: the lifecycle state machine states
//! - `telemetry`: metrics publication contracts

pub mod components;
pub mod discovery;
pub mod errors;
pub mod exchange;
pub mod lifecycle;
pub mod telemetry;

pub use components::*;
pub use discovery::*;
pub use errors::*;
pub use exchange::*;
pub use lifecycle::*;
pub use telemetry::*;
