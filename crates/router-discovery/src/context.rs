//! Shared service context.

use router_types::{DiscoveryBackend, MetricSample, MetricsSink};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Handle on the discovery connection and the optional metrics channel.
///
/// Created by [`crate::bootstrap`] and closed by [`crate::teardown`];
/// everything in between borrows it.
pub struct ServiceContext {
	pub(crate) installation: String,
	pub(crate) node_name: String,
	pub(crate) instance_id: Uuid,
	pub(crate) discovery: Arc<dyn DiscoveryBackend>,
	pub(crate) metrics: Option<Box<dyn MetricsSink>>,
	pub(crate) metrics_requested: bool,
}

impl ServiceContext {
	pub fn installation(&self) -> &str {
		&self.installation
	}

	pub fn node_name(&self) -> &str {
		&self.node_name
	}

	/// The value services are registered with: `nodeName/instance`.
	///
	/// The instance part is distinct across restarts of the same node.
	pub fn node_identity(&self) -> String {
		format!("{}/{}", self.node_name, self.instance_id)
	}

	pub fn discovery(&self) -> Arc<dyn DiscoveryBackend> {
		Arc::clone(&self.discovery)
	}

	pub fn metrics(&self) -> Option<&dyn MetricsSink> {
		self.metrics.as_deref()
	}

	/// Metrics were configured but could not be established.
	pub fn is_degraded(&self) -> bool {
		self.metrics_requested && self.metrics.is_none()
	}

	/// Record and flush samples; failures are logged, never returned.
	pub async fn publish_metrics(&self, samples: Vec<MetricSample>) {
		let Some(sink) = self.metrics() else {
			debug!("No metrics channel, dropping {} samples", samples.len());
			return;
		};

		for sample in samples {
			if let Err(e) = sink.record(sample).await {
				warn!(error = %e, "Failed to record metric");
			}
		}

		if let Err(e) = sink.flush().await {
			warn!(error = %e, "Failed to flush metrics");
		}
	}
}

impl fmt::Debug for ServiceContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ServiceContext")
			.field("installation", &self.installation)
			.field("node_name", &self.node_name)
			.field("instance_id", &self.instance_id)
			.field("discovery", &self.discovery.uri())
			.field("metrics", &self.metrics.as_ref().map(|m| m.prefix().to_string()))
			.finish()
	}
}
