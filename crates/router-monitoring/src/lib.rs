//! Monitoring and observability for the router node.
//!
//! # Components
//!
//! - `tracing`: structured logging setup shared by every binary
//! - `carbon`: best-effort metrics publication to carbon daemons
//!
//! Metrics are an observability aid only. Nothing in this crate is allowed
//! to fail the node: a carbon daemon that cannot be reached is logged and
//! skipped.

pub mod carbon;
pub mod tracing;

pub use carbon::{CarbonConnector, CarbonPublisher};
pub use crate::tracing::{init_tracing, LogFormat, TracingConfig};
