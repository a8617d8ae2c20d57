//! Validation of raw options into a [`NodeConfig`].

use crate::exchange::{parse_exchange_document, DocumentSource};
use crate::types::{DEFAULT_DISCOVERY_URI, DEFAULT_LOSS_SECONDS, DEFAULT_SERVICE_PREFIX};
use crate::{ConfigError, NodeConfig, RawOptions};
use std::time::Duration;
use tracing::{debug, info};

/// Validate raw options and load the exchange configuration document.
///
/// Required fields are checked before anything is read, so a missing
/// installation or node name has no side effect at all.
pub fn validate(raw: RawOptions, documents: &dyn DocumentSource) -> Result<NodeConfig, ConfigError> {
	let installation = required(raw.installation, "installation")?;
	let node_name = required(raw.node_name, "node-name")?;

	let loss_seconds = raw.loss_seconds.unwrap_or(DEFAULT_LOSS_SECONDS);
	let loss_timeout = Some(loss_seconds)
		.filter(|s| s.is_finite() && *s > 0.0)
		.and_then(|s| Duration::try_from_secs_f64(s).ok())
		.ok_or_else(|| ConfigError::InvalidValue {
			field: "loss-seconds",
			reason: format!("must be a positive number of seconds, got {}", loss_seconds),
		})?;

	let discovery_uri = match raw.zookeeper_uri {
		Some(uri) if uri.trim().is_empty() => {
			return Err(ConfigError::InvalidValue {
				field: "zookeeper-uri",
				reason: "must not be empty".to_string(),
			})
		}
		Some(uri) => uri,
		None => DEFAULT_DISCOVERY_URI.to_string(),
	};

	let service_prefix = match raw.service_prefix {
		Some(prefix) if prefix.trim().is_empty() => {
			return Err(ConfigError::InvalidValue {
				field: "service-prefix",
				reason: "must not be empty".to_string(),
			})
		}
		Some(prefix) => prefix,
		None => DEFAULT_SERVICE_PREFIX.to_string(),
	};

	let exchanges = match &raw.exchange_configuration {
		Some(path) => {
			debug!("Reading exchange configuration from {:?}", path);
			let bytes = documents
				.read(path)
				.map_err(|source| ConfigError::ExchangeConfigUnreadable {
					path: path.clone(),
					source,
				})?;
			parse_exchange_document(&bytes)?
		}
		None => Vec::new(),
	};

	info!(
		installation = %installation,
		node = %node_name,
		exchanges = exchanges.len(),
		"Configuration validated"
	);

	Ok(NodeConfig {
		discovery_uri,
		installation,
		node_name,
		loss_seconds,
		loss_timeout,
		log_uris: raw.log_uri,
		carbon_uris: raw.carbon_connection,
		exchange_configuration: raw.exchange_configuration,
		exchanges,
		service_prefix,
	})
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
	match value {
		Some(v) if !v.trim().is_empty() => Ok(v),
		_ => Err(ConfigError::MissingRequiredField(field)),
	}
}
