//! Router node service.
//!
//! Wires configuration, discovery, the lifecycle controller and the
//! exchange connectors into a runnable node.
//!
//! # Components
//!
//! - `cli`: command-line interface
//! - `exchanges`: exchange connector registry
//! - `implementations`: standalone ledger client and routing engine
//! - `runner`: the node run sequence from validation to teardown

pub mod cli;
pub mod exchanges;
pub mod implementations;
pub mod runner;

pub use runner::{NodeRunner, RunSummary};
