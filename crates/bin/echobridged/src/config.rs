//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `echobridge.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stable hub identity; 32 hex characters preferred. Generated (with a
    /// warning) when absent.
    pub hub_id: Option<String>,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// SSDP discovery settings.
    pub ssdp: SsdpSettings,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Static device table standing in for the host environment.
    pub devices: Vec<DeviceEntry>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port. Echo firmware only pairs against port 80; 443 requests
    /// HTTPS (served as plain HTTP with a fallback status when no TLS
    /// material exists).
    pub port: u16,
    /// Verbose request logging.
    pub debug: bool,
}

/// SSDP responder configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SsdpSettings {
    /// Disable to run the directive endpoint without discovery.
    pub enabled: bool,
    /// Seconds between alive advertisements.
    pub ad_interval_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// One statically configured device.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEntry {
    pub id: String,
    pub name: String,
    /// Overrides the semantic topic on delivered events.
    pub topic: Option<String>,
}

impl Config {
    /// Load configuration from `echobridge.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or when
    /// validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("echobridge.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ECHOBRIDGE_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("ECHOBRIDGE_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("ECHOBRIDGE_HUB_ID") {
            self.hub_id = Some(val);
        }
        if let Ok(val) = std::env::var("ECHOBRIDGE_DEBUG") {
            self.server.debug = val == "1" || val.eq_ignore_ascii_case("true");
        }
        if let Ok(val) = std::env::var("ECHOBRIDGE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.ssdp.ad_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "ssdp.ad_interval_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// The tracing filter, widened when `debug` is on.
    #[must_use]
    pub fn log_filter(&self) -> String {
        if self.server.debug {
            format!(
                "{},echobridged=debug,echobridge=debug,tower_http=debug",
                self.logging.filter
            )
        } else {
            self.logging.filter.clone()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 80,
            debug: false,
        }
    }
}

impl Default for SsdpSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ad_interval_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "echobridged=info,echobridge=info,tower_http=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
