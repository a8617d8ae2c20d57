// router-discovery/src/lib.rs

//! # Router Discovery Library
//!
//! Connects the node to its service-discovery backend and, optionally, to
//! a metrics publication channel, producing the [`ServiceContext`] every
//! later component is built against.
//!
//! ## Key Components
//!
//! - [`bootstrap`] / [`teardown`] - the only creation and close points of a context
//! - [`ServiceContext`] - discovery connection plus optional metrics sink
//! - [`ConnectorRegistry`] - selects a [`DiscoveryConnector`] by URI scheme
//! - [`InMemoryDiscovery`] - process-local backend for standalone runs and tests

pub mod bootstrap;
pub mod context;
pub mod memory;
pub mod registry;

pub use bootstrap::{bootstrap, teardown, BootstrapError};
pub use context::ServiceContext;
pub use memory::{InMemoryConnector, InMemoryDiscovery};
pub use registry::{ConnectorRegistry, DiscoveryConnector};
