//! Discovery and telemetry bootstrap.
//!
//! # Order
//! ```text
//! connect discovery -> register installation -> (optional) open metrics
//! ```
//! Discovery failures are fatal and not retried. Metrics failures leave the
//! node running in degraded mode.

use crate::{ConnectorRegistry, ServiceContext};
use router_config::NodeConfig;
use router_types::MetricsConnector;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum BootstrapError {
	#[error("Discovery backend {uri} unreachable: {reason}")]
	DiscoveryUnreachable { uri: String, reason: String },

	#[error("Cannot register installation '{namespace}' with discovery: {reason}")]
	RegistrationFailed { namespace: String, reason: String },
}

/// Build the service context for `config`.
#[instrument(skip_all, fields(installation = %config.installation(), node = %config.node_name()))]
pub async fn bootstrap(
	config: &NodeConfig,
	connectors: &ConnectorRegistry,
	metrics: &dyn MetricsConnector,
) -> Result<ServiceContext, BootstrapError> {
	let uri = config.discovery_uri();
	info!(%uri, "Connecting to discovery backend");

	let discovery = connectors
		.connect(uri)
		.await
		.map_err(|e| BootstrapError::DiscoveryUnreachable {
			uri: uri.to_string(),
			reason: e.to_string(),
		})?;

	if let Err(e) = discovery.register_installation(config.installation()).await {
		if let Err(close_err) = discovery.close().await {
			warn!(error = %close_err, "Failed to close discovery after registration failure");
		}
		return Err(BootstrapError::RegistrationFailed {
			namespace: config.installation().to_string(),
			reason: e.to_string(),
		});
	}

	let metrics_requested = !config.carbon_uris().is_empty();
	let metrics_sink = if metrics_requested {
		let prefix = config.metrics_prefix();
		match metrics.connect(config.carbon_uris(), &prefix).await {
			Ok(sink) => {
				info!(%prefix, "Metrics publication enabled");
				Some(sink)
			}
			Err(e) => {
				warn!(
					%prefix,
					error = %e,
					"Metrics publication unavailable, continuing without metrics"
				);
				None
			}
		}
	} else {
		None
	};

	let context = ServiceContext {
		installation: config.installation().to_string(),
		node_name: config.node_name().to_string(),
		instance_id: Uuid::new_v4(),
		discovery,
		metrics: metrics_sink,
		metrics_requested,
	};

	info!(instance = %context.instance_id, "Service context ready");
	Ok(context)
}

/// Close the service context.
///
/// Flushes pending metrics and closes the discovery connection; failures
/// are logged and teardown always completes.
pub async fn teardown(context: ServiceContext) {
	if let Some(sink) = context.metrics() {
		if let Err(e) = sink.flush().await {
			warn!(error = %e, "Failed to flush metrics during teardown");
		}
	}

	if let Err(e) = context.discovery.close().await {
		warn!(error = %e, "Failed to close discovery connection");
	}

	info!("Service context closed");
}
