//! Configuration loading utilities

use crate::Settings;
use config::{Config, ConfigError, Environment, File};

/// Load configuration from the config file plus environment overrides
///
/// Reads `config/config.{toml,json,yaml}` when present, then applies
/// `PRICEPULSE__`-prefixed environment variables (`__` separates nesting,
/// e.g. `PRICEPULSE__CACHE__TTL_SECS=300`). Every section has serde defaults,
/// so an absent file yields default settings.
pub fn load_config() -> Result<Settings, ConfigError> {
	let s = Config::builder()
		.add_source(File::with_name("config/config").required(false))
		.add_source(Environment::with_prefix("PRICEPULSE").separator("__"))
		.build()?;

	s.try_deserialize()
}
