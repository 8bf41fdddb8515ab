//! Configuration types for mcadmin

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration shared by the server and the CLI
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    /// HTTP endpoint settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Memcached cluster to administer
    #[serde(default)]
    pub memcached: MemcachedConfig,

    /// Console command settings
    #[serde(default)]
    pub command: CommandConfig,
}

/// HTTP listening configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable access logging
    #[serde(default = "default_true")]
    pub access_log: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            access_log: true,
        }
    }
}

/// Memcached cluster configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemcachedConfig {
    /// Cache nodes as `host:port`
    #[serde(default = "default_servers")]
    pub servers: Vec<String>,

    /// Read/write timeout in milliseconds (0 = transport default)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for MemcachedConfig {
    fn default() -> Self {
        Self {
            servers: default_servers(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Console command configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CommandConfig {
    /// Clear the terminal before every run, even without `--clear`
    #[serde(default)]
    pub clearable: bool,
}

// Default value functions
fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_servers() -> Vec<String> {
    vec!["localhost:11211".to_string()]
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

impl AdminConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Convert to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Check values the parser cannot reject on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port cannot be 0".to_string(),
            ));
        }

        for server in &self.memcached.servers {
            let valid = server
                .rsplit_once(':')
                .map(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok_and(|p| p > 0))
                .unwrap_or(false);
            if !valid {
                return Err(ConfigError::ValidationError(format!(
                    "Memcached server '{}' is not a valid host:port",
                    server
                )));
            }
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
