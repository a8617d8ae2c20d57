// router-types/src/discovery.rs

use crate::ComponentResult;
use async_trait::async_trait;
use std::fmt::Debug;

/// Connection to the service-discovery backend.
///
/// Registrations are keyed by service name inside the installation
/// namespace the backend was registered under.
#[async_trait]
pub trait DiscoveryBackend: Send + Sync + Debug {
	/// The URI this backend is connected to.
	fn uri(&self) -> &str;

	async fn register_installation(&self, namespace: &str) -> ComponentResult<()>;

	/// Announce a service provided by `node`.
	async fn register_service(&self, service: &str, node: &str) -> ComponentResult<()>;

	async fn unregister_service(&self, service: &str) -> ComponentResult<()>;

	async fn close(&self) -> ComponentResult<()>;
}
