use std::{env, fs, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported configuration format; use 'yaml', 'yml', or 'json'")]
    UnsupportedFormat,
    #[error("failed to parse configuration file: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Text,
    Json,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port for the HTTP server.
    pub port: u16,

    /// Header used to propagate request identifiers.
    pub request_id_header: String,

    /// Shared secret required on `/api/admin` routes; `None` disables the
    /// guard (local development).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_token: Option<String>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Logging level directive (e.g. `info`, `server=debug`).
    pub level: String,

    /// Text for interactive use, JSON for shipping.
    pub format: LogFormat,
}

/// Timing contract shared by the server and every sync client.
///
/// Both sides must agree on these: the server expires typing flags with
/// `typing_ttl_ms` while clients clear them via the `typing_debounce_ms`
/// inactivity window, and the poll interval bounds how stale a polling
/// client's view can get.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Fixed poll interval for clients without a push stream.
    pub poll_interval_ms: u64,

    /// Composer inactivity window before the typing flag is cleared.
    pub typing_debounce_ms: u64,

    /// Server-side expiry on a set typing flag.
    pub typing_ttl_ms: u64,

    /// Heartbeat age after which a user is reported away, and at three times
    /// which, offline.
    pub presence_ttl_ms: u64,
}

impl SyncConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn typing_debounce(&self) -> Duration {
        Duration::from_millis(self.typing_debounce_ms)
    }

    #[must_use]
    pub fn typing_ttl(&self) -> Duration {
        Duration::from_millis(self.typing_ttl_ms)
    }

    #[must_use]
    pub fn presence_ttl(&self) -> Duration {
        Duration::from_millis(self.presence_ttl_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 3000,
            typing_debounce_ms: 2000,
            typing_ttl_ms: 10_000,
            presence_ttl_ms: 30_000,
        }
    }
}

/// The main configuration structure for the Encore support platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    /// Generates a default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            server: ServerConfig {
                port: 8080,
                request_id_header: "x-request-id".to_string(),
                admin_token: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Text,
            },
            sync: SyncConfig::default(),
        }
    }

    /// Loads the configuration, resolving in order: defaults, an optional
    /// YAML/JSON file, `ENCORE_*` environment variables, and finally the
    /// command-line port override.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an environment
    /// variable holds an unusable value, or validation fails.
    pub fn load(
        config_path: Option<PathBuf>,
        port_override: Option<u16>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            let content = fs::read_to_string(&path)?;
            match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => serde_yml::from_str(&content)
                    .map_err(|err| ConfigError::Parse(err.to_string()))?,
                Some("json") => serde_json::from_str(&content)
                    .map_err(|err| ConfigError::Parse(err.to_string()))?,
                _ => return Err(ConfigError::UnsupportedFormat),
            }
        } else {
            Config::with_defaults()
        };

        config.apply_env_overrides()?;

        if let Some(port) = port_override {
            config.server.port = port;
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(port) = env::var("ENCORE_SERVER_PORT") {
            self.server.port = port.parse().map_err(|_| {
                ConfigError::Invalid("ENCORE_SERVER_PORT must be a number between 1 and 65535".into())
            })?;
        }
        if let Ok(token) = env::var("ENCORE_ADMIN_TOKEN") {
            self.server.admin_token = Some(token);
        }
        if let Ok(level) = env::var("ENCORE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("ENCORE_LOG_FORMAT") {
            self.logging.format = match format.as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::Invalid(
                        "ENCORE_LOG_FORMAT must be 'text' or 'json'".into(),
                    ));
                }
            };
        }
        if let Ok(interval) = env::var("ENCORE_POLL_INTERVAL_MS") {
            self.sync.poll_interval_ms = interval.parse().map_err(|_| {
                ConfigError::Invalid("ENCORE_POLL_INTERVAL_MS must be a number".into())
            })?;
        }
        Ok(())
    }

    /// Validates the resolved configuration.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid(
                "server.port must be greater than 0".into(),
            ));
        }
        if self.server.request_id_header.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "server.request_id_header must not be empty".into(),
            ));
        }
        if self.sync.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "sync.poll_interval_ms must be greater than 0".into(),
            ));
        }
        if self.sync.typing_ttl_ms < self.sync.typing_debounce_ms {
            return Err(ConfigError::Invalid(
                "sync.typing_ttl_ms must be at least sync.typing_debounce_ms".into(),
            ));
        }
        Ok(())
    }
}
