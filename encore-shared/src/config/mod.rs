pub mod app;

pub use app::{Config, ConfigError, LogFormat, LoggingConfig, ServerConfig, SyncConfig};
