//! Configuration types for the router node.

use router_types::{EngineSettings, ExchangeSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Loss timeout applied when none is configured.
pub const DEFAULT_LOSS_SECONDS: f64 = 15.0;

/// Discovery backend used when none is configured.
pub const DEFAULT_DISCOVERY_URI: &str = "memory://local";

/// Prefix the routing engine and ledger client register under.
pub const DEFAULT_SERVICE_PREFIX: &str = "router";

/// Unvalidated operator input.
///
/// Every field is optional so that the option file, the environment and
/// the command line can each supply a subset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawOptions {
	pub zookeeper_uri: Option<String>,
	pub installation: Option<String>,
	pub node_name: Option<String>,
	pub loss_seconds: Option<f64>,
	pub log_uri: Vec<String>,
	pub carbon_connection: Vec<String>,
	pub exchange_configuration: Option<PathBuf>,
	pub service_prefix: Option<String>,
}

impl RawOptions {
	/// Layer `overrides` on top of `self`.
	///
	/// Scalars set in `overrides` win; lists replace the base list only
	/// when non-empty.
	pub fn merge(self, overrides: RawOptions) -> RawOptions {
		RawOptions {
			zookeeper_uri: overrides.zookeeper_uri.or(self.zookeeper_uri),
			installation: overrides.installation.or(self.installation),
			node_name: overrides.node_name.or(self.node_name),
			loss_seconds: overrides.loss_seconds.or(self.loss_seconds),
			log_uri: if overrides.log_uri.is_empty() {
				self.log_uri
			} else {
				overrides.log_uri
			},
			carbon_connection: if overrides.carbon_connection.is_empty() {
				self.carbon_connection
			} else {
				overrides.carbon_connection
			},
			exchange_configuration: overrides
				.exchange_configuration
				.or(self.exchange_configuration),
			service_prefix: overrides.service_prefix.or(self.service_prefix),
		}
	}
}

/// Validated node configuration.
///
/// Only [`crate::validate`] builds one, so the invariants hold for every
/// instance: installation and node name are non-empty and the loss timeout
/// is positive.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
	pub(crate) discovery_uri: String,
	pub(crate) installation: String,
	pub(crate) node_name: String,
	pub(crate) loss_seconds: f64,
	pub(crate) loss_timeout: Duration,
	pub(crate) log_uris: Vec<String>,
	pub(crate) carbon_uris: Vec<String>,
	pub(crate) exchange_configuration: Option<PathBuf>,
	pub(crate) exchanges: Vec<ExchangeSpec>,
	pub(crate) service_prefix: String,
}

impl NodeConfig {
	pub fn discovery_uri(&self) -> &str {
		&self.discovery_uri
	}

	pub fn installation(&self) -> &str {
		&self.installation
	}

	pub fn node_name(&self) -> &str {
		&self.node_name
	}

	pub fn loss_seconds(&self) -> f64 {
		self.loss_seconds
	}

	pub fn loss_timeout(&self) -> Duration {
		self.loss_timeout
	}

	pub fn log_uris(&self) -> &[String] {
		&self.log_uris
	}

	pub fn carbon_uris(&self) -> &[String] {
		&self.carbon_uris
	}

	pub fn exchange_configuration(&self) -> Option<&Path> {
		self.exchange_configuration.as_deref()
	}

	/// Exchange specifications in document order.
	pub fn exchanges(&self) -> &[ExchangeSpec] {
		&self.exchanges
	}

	pub fn service_prefix(&self) -> &str {
		&self.service_prefix
	}

	/// Name metrics are published under: `installation.nodeName`.
	pub fn metrics_prefix(&self) -> String {
		format!("{}.{}", self.installation, self.node_name)
	}

	pub fn engine_settings(&self) -> EngineSettings {
		EngineSettings {
			service_prefix: self.service_prefix.clone(),
			loss_timeout: self.loss_timeout(),
			log_uris: self.log_uris.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_prefers_overrides() {
		let file = RawOptions {
			installation: Some("prod".into()),
			node_name: Some("r1".into()),
			loss_seconds: Some(10.0),
			carbon_connection: vec!["carbon-a:2003".into()],
			..Default::default()
		};
		let cli = RawOptions {
			node_name: Some("r2".into()),
			carbon_connection: vec!["carbon-b:2003".into()],
			..Default::default()
		};

		let merged = file.merge(cli);
		assert_eq!(merged.installation.as_deref(), Some("prod"));
		assert_eq!(merged.node_name.as_deref(), Some("r2"));
		assert_eq!(merged.loss_seconds, Some(10.0));
		assert_eq!(merged.carbon_connection, vec!["carbon-b:2003".to_string()]);
	}

	#[test]
	fn test_merge_keeps_base_lists_when_override_empty() {
		let file = RawOptions {
			log_uri: vec!["tcp://logs:5000".into()],
			..Default::default()
		};

		let merged = file.merge(RawOptions::default());
		assert_eq!(merged.log_uri, vec!["tcp://logs:5000".to_string()]);
	}
}
