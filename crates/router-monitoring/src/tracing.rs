use std::str::FromStr;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
	Pretty,
	Json,
}

impl FromStr for LogFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"pretty" | "text" => Ok(LogFormat::Pretty),
			"json" => Ok(LogFormat::Json),
			other => Err(format!("unknown log format '{}'", other)),
		}
	}
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
	pub level: Level,
	pub format: LogFormat,
	pub with_target: bool,
	pub with_thread_ids: bool,
}

impl Default for TracingConfig {
	fn default() -> Self {
		Self {
			level: Level::INFO,
			format: LogFormat::Pretty,
			with_target: true,
			with_thread_ids: false,
		}
	}
}

impl TracingConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_level(mut self, level: Level) -> Self {
		self.level = level;
		self
	}

	pub fn with_format(mut self, format: LogFormat) -> Self {
		self.format = format;
		self
	}

	pub fn production() -> Self {
		Self {
			level: Level::INFO,
			format: LogFormat::Json,
			with_target: false,
			with_thread_ids: true,
		}
	}

	/// The filter applied when `RUST_LOG` is unset.
	fn default_filter(&self) -> EnvFilter {
		EnvFilter::new(self.level.as_str().to_ascii_lowercase())
	}
}

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: TracingConfig) -> Result<(), Box<dyn std::error::Error>> {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| config.default_filter());

	match config.format {
		LogFormat::Json => {
			let json_layer = tracing_subscriber::fmt::layer()
				.json()
				.with_thread_ids(config.with_thread_ids)
				.with_target(config.with_target);

			tracing_subscriber::registry()
				.with(env_filter)
				.with(json_layer)
				.try_init()
				.map_err(|e| format!("Failed to initialize tracing: {}", e))?;
		}
		LogFormat::Pretty => {
			let fmt_layer = tracing_subscriber::fmt::layer()
				.with_thread_ids(config.with_thread_ids)
				.with_target(config.with_target);

			tracing_subscriber::registry()
				.with(env_filter)
				.with(fmt_layer)
				.try_init()
				.map_err(|e| format!("Failed to initialize tracing: {}", e))?;
		}
	}

	info!("Tracing initialized with level: {:?}", config.level);
	Ok(())
}
