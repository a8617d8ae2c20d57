use anyhow::{Context, Result};
use clap::Parser;
use router_config::{OptionsLoader, RawOptions};
use router_monitoring::init_tracing;
use router_service::cli::{parse_failure_code, Args};
use router_service::implementations::StandaloneComponents;
use router_service::NodeRunner;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
	let args = match Args::try_parse() {
		Ok(args) => args,
		Err(e) => {
			let _ = e.print();
			return ExitCode::from(parse_failure_code(&e));
		}
	};

	if let Err(e) = init_tracing(args.tracing_config()) {
		eprintln!("Failed to initialize logging: {}", e);
		return ExitCode::from(1);
	}

	match run(args).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!("{:#}", e);
			ExitCode::from(1)
		}
	}
}

async fn run(args: Args) -> Result<()> {
	info!("Starting router node");

	let options = load_options(&args).context("Failed to load options")?;
	let summary = NodeRunner::new(options)
		.with_components(Arc::new(StandaloneComponents::new(args.bind_address)))
		.run(shutdown_signal())
		.await?;

	if !summary.failed_exchanges.is_empty() {
		warn!(exchanges = ?summary.failed_exchanges, "Some exchanges never went live");
	}
	for failure in &summary.shutdown.failures {
		warn!(component = %failure.component, error = %failure.error, "Component failed to stop");
	}

	info!("Router node stopped");
	Ok(())
}

fn load_options(args: &Args) -> Result<RawOptions> {
	let mut loader = OptionsLoader::new().with_overrides(args.options());
	if let Some(path) = &args.config {
		loader = loader.with_file(path);
	}
	Ok(loader.load()?)
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			error!(error = %e, "Failed to listen for Ctrl+C");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			}
			Err(e) => {
				error!(error = %e, "Failed to install SIGTERM handler");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
