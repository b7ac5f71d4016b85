//! Service startup logging
//!
//! Emits the service, environment and configuration summary lines once at
//! boot so operators can see what the engine came up with.

use std::env;
use tracing::info;

use crate::Settings;

/// Log service and environment information at startup
pub fn log_service_info() {
	let service_name = "pricepulse-aggregator";
	let service_version = env!("CARGO_PKG_VERSION");

	info!("=== PricePulse Aggregator Starting ===");
	info!("🚀 Service: {} v{}", service_name, service_version);
	info!("💻 Platform: {}", env::consts::OS);
	info!("🏗️ Architecture: {}", env::consts::ARCH);

	if let Ok(rust_log) = env::var("RUST_LOG") {
		info!("🔧 Log Filter: {}", rust_log);
	}

	if let Ok(cwd) = env::current_dir() {
		info!("📁 Working Directory: {}", cwd.display());
	}

	info!(
		"🕒 Started at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Log the effective configuration once everything is wired
pub fn log_startup_complete(settings: &Settings, retailer_count: usize, adapter_count: usize) {
	info!(
		"🏪 Retailers: {} configured, {} enabled",
		settings.retailers.len(),
		retailer_count
	);
	info!("🔌 Adapters: {} registered", adapter_count);
	info!(
		"🗄️ Cache: {} (TTL {}s)",
		if settings.cache.enabled { "enabled" } else { "disabled" },
		settings.cache.ttl_secs
	);
	info!(
		"⚡ Fan-out: up to {} concurrent fetches, {}ms global timeout",
		settings.aggregation.max_concurrent_fetches, settings.aggregation.global_timeout_ms
	);
	match settings.queues.refresh_interval_secs {
		Some(secs) => info!("🔄 Scheduled refresh: every {}s", secs),
		None => info!("🔄 Scheduled refresh: disabled"),
	}
	info!("✅ Aggregator initialization complete");
}
