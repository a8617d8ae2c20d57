// router-types/src/telemetry.rs

use crate::ComponentResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One metric value at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
	/// Name relative to the publication prefix, e.g. `exchanges.active`.
	pub name: String,
	pub value: f64,
	pub timestamp: DateTime<Utc>,
}

impl MetricSample {
	pub fn new(name: impl Into<String>, value: f64) -> Self {
		Self {
			name: name.into(),
			value,
			timestamp: Utc::now(),
		}
	}

	pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
		self.timestamp = timestamp;
		self
	}
}

/// Best-effort metrics publication channel.
#[async_trait]
pub trait MetricsSink: Send + Sync {
	/// The prefix every sample is published under.
	fn prefix(&self) -> &str;

	async fn record(&self, sample: MetricSample) -> ComponentResult<()>;

	async fn flush(&self) -> ComponentResult<()>;
}

/// Opens a metrics publication channel.
#[async_trait]
pub trait MetricsConnector: Send + Sync {
	async fn connect(
		&self,
		endpoints: &[String],
		prefix: &str,
	) -> ComponentResult<Box<dyn MetricsSink>>;
}
