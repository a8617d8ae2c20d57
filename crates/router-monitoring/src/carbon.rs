//! Carbon (graphite plaintext protocol) metrics publisher.
//!
//! Samples are buffered by [`CarbonPublisher::record`] and written to every
//! connected daemon on [`CarbonPublisher::flush`] as
//! `<prefix>.<name> <value> <unix-seconds>\n`. A daemon whose socket fails
//! is dropped from the publisher; the remaining daemons keep receiving.

use async_trait::async_trait;
use router_types::{ComponentError, ComponentResult, MetricSample, MetricsConnector, MetricsSink};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Port carbon listens on for plaintext lines.
pub const DEFAULT_CARBON_PORT: u16 = 2003;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Normalise an endpoint to `host:port`.
///
/// Accepts `host`, `host:port` and the same behind a `carbon://` or
/// `tcp://` scheme.
pub fn endpoint_address(endpoint: &str) -> String {
	let stripped = endpoint
		.split_once("://")
		.map(|(_, rest)| rest)
		.unwrap_or(endpoint)
		.trim_end_matches('/');

	if stripped.contains(':') {
		stripped.to_string()
	} else {
		format!("{}:{}", stripped, DEFAULT_CARBON_PORT)
	}
}

/// Render one sample as a plaintext protocol line.
pub fn format_line(prefix: &str, sample: &MetricSample) -> String {
	format!(
		"{}.{} {} {}\n",
		prefix,
		sample.name,
		sample.value,
		sample.timestamp.timestamp()
	)
}

struct CarbonEndpoint {
	address: String,
	stream: TcpStream,
}

/// Publishes metrics to one or more carbon daemons.
pub struct CarbonPublisher {
	prefix: String,
	endpoints: Mutex<Vec<CarbonEndpoint>>,
	buffer: Mutex<Vec<String>>,
}

impl CarbonPublisher {
	/// Connect to every endpoint, skipping those that cannot be reached.
	///
	/// Fails only when no endpoint at all could be connected.
	pub async fn connect(
		endpoints: &[String],
		prefix: impl Into<String>,
		connect_timeout: Duration,
	) -> ComponentResult<Self> {
		let prefix = prefix.into();
		let mut connected = Vec::new();
		let mut errors = Vec::new();

		for endpoint in endpoints {
			let address = endpoint_address(endpoint);
			match tokio::time::timeout(connect_timeout, TcpStream::connect(&address)).await {
				Ok(Ok(stream)) => {
					debug!(%address, "Connected to carbon daemon");
					connected.push(CarbonEndpoint { address, stream });
				}
				Ok(Err(e)) => {
					warn!(%address, error = %e, "Cannot connect to carbon daemon");
					errors.push(format!("{}: {}", address, e));
				}
				Err(_) => {
					warn!(%address, "Timed out connecting to carbon daemon");
					errors.push(format!("{}: connect timed out", address));
				}
			}
		}

		if connected.is_empty() {
			return Err(ComponentError::Connection(format!(
				"no carbon endpoint reachable ({})",
				errors.join(", ")
			)));
		}

		info!(
			prefix = %prefix,
			connected = connected.len(),
			configured = endpoints.len(),
			"Carbon publication established"
		);

		Ok(Self {
			prefix,
			endpoints: Mutex::new(connected),
			buffer: Mutex::new(Vec::new()),
		})
	}

	pub async fn connected_endpoints(&self) -> Vec<String> {
		self.endpoints
			.lock()
			.await
			.iter()
			.map(|e| e.address.clone())
			.collect()
	}
}

#[async_trait]
impl MetricsSink for CarbonPublisher {
	fn prefix(&self) -> &str {
		&self.prefix
	}

	async fn record(&self, sample: MetricSample) -> ComponentResult<()> {
		self.buffer
			.lock()
			.await
			.push(format_line(&self.prefix, &sample));
		Ok(())
	}

	async fn flush(&self) -> ComponentResult<()> {
		let payload: String = {
			let mut buffer = self.buffer.lock().await;
			if buffer.is_empty() {
				return Ok(());
			}
			buffer.drain(..).collect()
		};

		let mut endpoints = self.endpoints.lock().await;
		let mut alive = Vec::with_capacity(endpoints.len());

		for mut endpoint in endpoints.drain(..) {
			match endpoint.stream.write_all(payload.as_bytes()).await {
				Ok(()) => alive.push(endpoint),
				Err(e) => warn!(
					address = %endpoint.address,
					error = %e,
					"Dropping carbon daemon after write failure"
				),
			}
		}

		*endpoints = alive;

		if endpoints.is_empty() {
			Err(ComponentError::Connection(
				"all carbon endpoints disconnected".to_string(),
			))
		} else {
			Ok(())
		}
	}
}

/// [`MetricsConnector`] producing [`CarbonPublisher`]s.
#[derive(Debug, Clone)]
pub struct CarbonConnector {
	connect_timeout: Duration,
}

impl CarbonConnector {
	pub fn new() -> Self {
		Self {
			connect_timeout: DEFAULT_CONNECT_TIMEOUT,
		}
	}
}

impl Default for CarbonConnector {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl MetricsConnector for CarbonConnector {
	async fn connect(
		&self,
		endpoints: &[String],
		prefix: &str,
	) -> ComponentResult<Box<dyn MetricsSink>> {
		let publisher = CarbonPublisher::connect(endpoints, prefix, self.connect_timeout).await?;
		Ok(Box::new(publisher))
	}
}
