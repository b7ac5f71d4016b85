//! PricePulse Config
//!
//! Typed settings, the file+environment loader, and startup logging.

pub mod loader;
pub mod settings;
pub mod startup_logger;

pub use loader::load_config;
pub use settings::{
	AggregationSettings, CacheSettings, LogFormat, LoggingSettings, QueueTuning, QueuesSettings,
	RetailerConfig, SelectorSettings, Settings,
};
pub use startup_logger::{log_service_info, log_startup_complete};
