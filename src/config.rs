//! # Configuration Management
//!
//! Centralized configuration for the bind codec and the stream framing around it.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()`
//!
//! ## Defaults
//! - 4280-byte transmit and receive fragments, the usual Windows client values
//! - A zero association group, asking the server to create one
//! - Fragments up to the largest value `frag_length` can hold

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Connection-oriented RPC major version
pub const RPC_VERSION: u8 = 5;

/// Minor version written by default
pub const RPC_VERSION_MINOR: u8 = 0;

/// Smallest fragment size a conforming peer must accept
pub const MIN_FRAGMENT_SIZE: u16 = 1432;

/// Default `max_xmit_frag` / `max_recv_frag`
pub const DEFAULT_FRAGMENT_SIZE: u16 = 4280;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CodecConfig {
    /// Values proposed in outgoing bind requests
    #[serde(default)]
    pub bind: BindDefaults,

    /// Stream framing limits
    #[serde(default)]
    pub framing: FramingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CodecConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("DCERPC_BIND_MAX_XMIT_FRAG") {
            config.bind.max_xmit_frag = parse_env("DCERPC_BIND_MAX_XMIT_FRAG", &value)?;
        }

        if let Ok(value) = std::env::var("DCERPC_BIND_MAX_RECV_FRAG") {
            config.bind.max_recv_frag = parse_env("DCERPC_BIND_MAX_RECV_FRAG", &value)?;
        }

        if let Ok(value) = std::env::var("DCERPC_BIND_ASSOC_GROUP_ID") {
            config.bind.assoc_group_id = parse_env("DCERPC_BIND_ASSOC_GROUP_ID", &value)?;
        }

        if let Ok(value) = std::env::var("DCERPC_BIND_MAX_FRAG_LENGTH") {
            config.framing.max_frag_length = parse_env("DCERPC_BIND_MAX_FRAG_LENGTH", &value)?;
        }

        if let Ok(value) = std::env::var("DCERPC_BIND_LOG_LEVEL") {
            config.logging.log_level = value.parse::<Level>().map_err(|_| {
                ProtocolError::ConfigError(format!("Invalid DCERPC_BIND_LOG_LEVEL: {value}"))
            })?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.bind.validate());
        errors.extend(self.framing.validate());
        errors.extend(self.logging.validate());

        if usize::from(self.bind.max_recv_frag) > self.framing.max_frag_length {
            errors.push(format!(
                "max_recv_frag {} exceeds framing max_frag_length {}",
                self.bind.max_recv_frag, self.framing.max_frag_length
            ));
        }

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| ProtocolError::ConfigError(format!("Invalid {name}: {value}")))
}

/// Fields proposed in an outgoing bind request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BindDefaults {
    /// Largest fragment this side will transmit
    pub max_xmit_frag: u16,

    /// Largest fragment this side can receive
    pub max_recv_frag: u16,

    /// Association group to join, 0 for a new one
    pub assoc_group_id: u32,
}

impl Default for BindDefaults {
    fn default() -> Self {
        Self {
            max_xmit_frag: DEFAULT_FRAGMENT_SIZE,
            max_recv_frag: DEFAULT_FRAGMENT_SIZE,
            assoc_group_id: 0,
        }
    }
}

impl BindDefaults {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_xmit_frag < MIN_FRAGMENT_SIZE {
            errors.push(format!(
                "max_xmit_frag too small: {} (minimum: {MIN_FRAGMENT_SIZE})",
                self.max_xmit_frag
            ));
        }

        if self.max_recv_frag < MIN_FRAGMENT_SIZE {
            errors.push(format!(
                "max_recv_frag too small: {} (minimum: {MIN_FRAGMENT_SIZE})",
                self.max_recv_frag
            ));
        }

        errors
    }
}

/// Stream framing limits
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FramingConfig {
    /// Fragments declaring a larger `frag_length` are rejected
    pub max_frag_length: usize,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            max_frag_length: usize::from(u16::MAX),
        }
    }
}

impl FramingConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_frag_length < crate::core::header::COMMON_HEADER_SIZE {
            errors.push(format!(
                "max_frag_length too small: {} (minimum: 16)",
                self.max_frag_length
            ));
        } else if self.max_frag_length > usize::from(u16::MAX) {
            errors.push(format!(
                "max_frag_length too large: {} (frag_length is 16 bits)",
                self.max_frag_length
            ));
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("dcerpc-bind"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
