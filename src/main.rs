//! PricePulse aggregator binary
//!
//! Loads configuration, wires the engine and runs until interrupted.

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pricepulse_aggregator::{load_config, AggregatorBuilder, LogFormat};

fn init_tracing(level: &str, format: LogFormat) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(level.to_string()));
	let builder = tracing_subscriber::fmt().with_env_filter(filter);
	match format {
		LogFormat::Json => builder.json().init(),
		LogFormat::Pretty => builder.init(),
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let settings = load_config()?;
	init_tracing(&settings.logging.level, settings.logging.format);
	pricepulse_config::log_service_info();

	let handle = match AggregatorBuilder::new().with_settings(settings).start().await {
		Ok(handle) => handle,
		Err(e) => {
			error!("failed to start the aggregation engine: {e}");
			return Err(e.into());
		},
	};

	tokio::signal::ctrl_c().await?;
	info!("interrupt received, shutting down");
	handle.shutdown().await;
	Ok(())
}
