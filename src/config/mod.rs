//! Configuration management for vaultgate
//!
//! Supports loading configuration from:
//! - Environment variables (VAULTGATE_*)
//! - Config file (config.toml)

use crate::errors::{Result, VaultGateError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Policy configuration
    pub policy: PolicySettings,

    /// Security configuration
    pub security: SecurityConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server (gRPC) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address for TCP
    pub listen_addr: String,

    /// Port number
    pub port: u16,

    /// Max concurrent connections
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1".to_string(),
            port: 50061,
            max_connections: 100,
        }
    }
}

/// Policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySettings {
    /// Path to the policy document
    pub rules_path: Option<PathBuf>,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            rules_path: Some(PathBuf::from("./config/policies.json")),
        }
    }
}

/// Security configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Require API token auth on the gRPC surface
    pub require_auth: bool,

    /// Accepted API tokens
    #[serde(default)]
    pub api_tokens: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Start with defaults
        builder = builder.add_source(config::Config::try_from(&Config::default()).unwrap());

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        } else {
            // Try default locations
            builder = builder
                .add_source(config::File::with_name("config").required(false))
                .add_source(config::File::with_name("/etc/vaultgate/config").required(false));
        }

        // Load from environment (VAULTGATE_SERVER__PORT, etc.)
        builder = builder.add_source(
            config::Environment::with_prefix("VAULTGATE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| VaultGateError::ConfigError(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| VaultGateError::ConfigError(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.security.require_auth && self.security.api_tokens.is_empty() {
            return Err(VaultGateError::ConfigError(
                "Auth required but no API tokens configured".to_string(),
            ));
        }

        if let Some(path) = &self.policy.rules_path {
            if !path.exists() {
                info!(
                    "Policy document does not exist, starting default-deny: {:?}",
                    path
                );
            }
        }

        Ok(())
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.listen_addr, self.server.port)
    }
}
