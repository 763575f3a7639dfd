//! # Configuration Types
//!
//! Configuration structures shared by Plinth backends and the binaries that
//! embed them. Backend crates are expected to consume [`BackendConfig`] as
//! their standard connection block so that every provider is configured the
//! same way.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ConfigError, PlinthError};

/// Backend connection configuration shared across providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Idle timeout for connections
    pub idle_timeout: Option<Duration>,

    /// Whether to require TLS for backend connections
    pub use_ssl: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "memory://".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            use_ssl: false,
        }
    }
}

/// Telemetry output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level used when `RUST_LOG` is not set (trace, debug, info, warn, error)
    pub level: String,

    /// Log format ("pretty" or "compact")
    pub format: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Top-level configuration block for binaries embedding Plinth
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlinthConfig {
    /// Backend connection settings
    pub backend: BackendConfig,

    /// Telemetry output settings
    pub telemetry: TelemetryConfig,
}

/// Common configuration validation trait
pub trait ConfigValidation {
    type Error: PlinthError;

    /// Validate the configuration
    fn validate(&self) -> Result<(), Self::Error>;

    /// Get configuration warnings (non-fatal issues)
    fn warnings(&self) -> Vec<String> {
        Vec::new()
    }
}

impl ConfigValidation for BackendConfig {
    type Error = ConfigError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.url.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "url".to_string(),
                value: self.url.clone(),
                reason: "Backend URL cannot be empty".to_string(),
            });
        }

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_connections".to_string(),
                value: self.max_connections.to_string(),
                reason: "Max connections must be greater than 0".to_string(),
            });
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::InvalidValue {
                key: "min_connections".to_string(),
                value: self.min_connections.to_string(),
                reason: "Min connections cannot be greater than max connections".to_string(),
            });
        }

        Ok(())
    }
}

impl ConfigValidation for TelemetryConfig {
    type Error = ConfigError;

    fn validate(&self) -> Result<(), Self::Error> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "level".to_string(),
                value: self.level.clone(),
                reason: format!("Expected one of: {}", LEVELS.join(", ")),
            });
        }

        Ok(())
    }

    fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.format != "pretty" && self.format != "compact" {
            warnings.push(format!(
                "Unknown telemetry format '{}', falling back to pretty",
                self.format
            ));
        }
        warnings
    }
}

impl ConfigValidation for PlinthConfig {
    type Error = ConfigError;

    fn validate(&self) -> Result<(), Self::Error> {
        self.backend.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }

    fn warnings(&self) -> Vec<String> {
        self.telemetry.warnings()
    }
}
