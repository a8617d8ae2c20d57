//! Command-line interface definitions.

use crate::implementations::DEFAULT_BIND_ADDRESS;
use clap::Parser;
use router_config::RawOptions;
use router_monitoring::{LogFormat, TracingConfig};
use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "router-runner")]
#[command(about = "Real-time bidding router node", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
	/// URI of the discovery backend
	#[arg(short = 'Z', long, env = "ROUTER_ZOOKEEPER_URI")]
	pub zookeeper_uri: Option<String>,

	/// Name of the installation this node belongs to
	#[arg(short = 'I', long, env = "ROUTER_INSTALLATION")]
	pub installation: Option<String>,

	/// Name of this node within the installation
	#[arg(short = 'N', long, env = "ROUTER_NODE_NAME")]
	pub node_name: Option<String>,

	/// Seconds after which an unanswered bid is assumed lost [default: 15]
	#[arg(short = 'l', long, env = "ROUTER_LOSS_SECONDS")]
	pub loss_seconds: Option<f64>,

	/// URI to publish logs to (repeatable, one URI per occurrence)
	#[arg(long = "log-uri", env = "ROUTER_LOG_URI")]
	pub log_uri: Vec<String>,

	/// Carbon daemon to publish metrics to (repeatable, one URI per occurrence)
	#[arg(short = 'c', long, env = "ROUTER_CARBON_CONNECTION")]
	pub carbon_connection: Vec<String>,

	/// JSON document listing the exchanges to activate
	#[arg(short = 'x', long, env = "ROUTER_EXCHANGE_CONFIGURATION")]
	pub exchange_configuration: Option<PathBuf>,

	/// Prefix the engine and ledger client register under
	#[arg(long, env = "ROUTER_SERVICE_PREFIX")]
	pub service_prefix: Option<String>,

	/// Path to a TOML option file
	#[arg(long, env = "ROUTER_CONFIG")]
	pub config: Option<PathBuf>,

	/// Address the routing engine listens on
	#[arg(long, env = "ROUTER_BIND_ADDRESS", default_value = DEFAULT_BIND_ADDRESS)]
	pub bind_address: SocketAddr,

	/// Log level (trace, debug, info, warn, error)
	#[arg(long, env = "ROUTER_LOG_LEVEL", default_value = "info")]
	pub log_level: Level,

	/// Log output format (pretty, json)
	#[arg(long, env = "ROUTER_LOG_FORMAT", default_value = "pretty")]
	pub log_format: LogFormat,
}

impl Args {
	/// Parse `args`. Help, version and usage errors all come back as `Err`.
	pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
	where
		I: IntoIterator<Item = T>,
		T: Into<OsString> + Clone,
	{
		Self::try_parse_from(args)
	}

	/// Options given on the command line or through the environment.
	pub fn options(&self) -> RawOptions {
		RawOptions {
			zookeeper_uri: self.zookeeper_uri.clone(),
			installation: self.installation.clone(),
			node_name: self.node_name.clone(),
			loss_seconds: self.loss_seconds,
			log_uri: self.log_uri.clone(),
			carbon_connection: self.carbon_connection.clone(),
			exchange_configuration: self.exchange_configuration.clone(),
			service_prefix: self.service_prefix.clone(),
		}
	}

	pub fn tracing_config(&self) -> TracingConfig {
		TracingConfig::new()
			.with_level(self.log_level)
			.with_format(self.log_format)
	}
}

/// Process exit code for a failed parse.
///
/// Only an explicit version request succeeds; asking for help is treated
/// like a usage error.
pub fn parse_failure_code(error: &clap::Error) -> u8 {
	match error.kind() {
		clap::error::ErrorKind::DisplayVersion => 0,
		_ => 1,
	}
}
