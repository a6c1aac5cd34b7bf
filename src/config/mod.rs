//! Configuration module for the cooperative JSON-RPC peer.
//!
//! This module provides a comprehensive configuration system that can load
//! settings from files (TOML, YAML, JSON) and override them with environment
//! variables. All configuration values are validated for correctness before
//! use.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::config::ConfigError;
use config::{Config, ConfigError as ExternalConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

pub mod client;
pub mod server;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A trait for types that can be validated.
pub trait Validate {
    /// Validates that the configuration is correct.
    fn validate(&self) -> ConfigResult<()>;
}

/// Top-level configuration for the peer binary.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PeerToolConfig {
    /// Client-side (pending-request registry) configuration.
    pub client: client::ClientConfig,

    /// Server-side (request dispatcher) configuration.
    pub server: server::ServerConfig,

    /// Log configuration.
    pub log: LogConfig,
}

impl Validate for PeerToolConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.client.validate()?;
        self.server.validate()?;
        self.log.validate()?;
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Whether to log in JSON format
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Validate for LogConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "invalid log level: {other}"
            ))),
        }
    }
}

/// Configuration loader for the peer binary.
#[derive(Debug)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// * `config_path` - optional path to a TOML/JSON/YAML configuration file
    /// * `env_prefix` - prefix for environment variables that override configuration values
    pub fn new<P: AsRef<Path>>(config_path: Option<P>, env_prefix: &str) -> Self {
        Self {
            config_path: config_path.map(|p| p.as_ref().to_path_buf()),
            env_prefix: env_prefix.to_string(),
        }
    }

    /// Loads the configuration from a file and environment variables.
    pub fn load(&self) -> ConfigResult<PeerToolConfig> {
        let mut builder = Config::builder();

        builder = builder.add_source(
            Config::try_from(&PeerToolConfig::default())
                .map_err(|e| ConfigError::ParseError(e.to_string()))?,
        );

        if let Some(path) = &self.config_path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }

            builder = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => builder.add_source(File::with_name(path.to_str().unwrap())),
                Some("json") => builder.add_source(
                    File::with_name(path.to_str().unwrap()).format(config::FileFormat::Json),
                ),
                Some("yaml" | "yml") => builder.add_source(
                    File::with_name(path.to_str().unwrap()).format(config::FileFormat::Yaml),
                ),
                _ => {
                    return Err(ConfigError::ParseError(format!(
                        "unsupported file extension for: {path:?}"
                    )))
                }
            };
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(|e| match e {
            ExternalConfigError::NotFound(path) => ConfigError::FileNotFound(PathBuf::from(path)),
            ExternalConfigError::PathParse(path) => {
                ConfigError::ParseError(format!("invalid path: {path:?}"))
            }
            ExternalConfigError::FileParse { .. } => {
                ConfigError::ParseError("error parsing config file".to_string())
            }
            ExternalConfigError::Foreign(err) => ConfigError::ParseError(err.to_string()),
            ExternalConfigError::Frozen => {
                ConfigError::ParseError("configuration is frozen".to_string())
            }
            ExternalConfigError::Message(msg) => ConfigError::ParseError(msg),
            ExternalConfigError::Type { .. } => {
                ConfigError::ParseError("type conversion error".to_string())
            }
        })?;

        let tool_config: PeerToolConfig = config
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        tool_config.validate()?;

        Ok(tool_config)
    }
}

/// Global configuration accessor.
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    config: Arc<PeerToolConfig>,
}

impl GlobalConfig {
    /// Creates a new global configuration handle.
    pub fn new(config: PeerToolConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Returns a reference to the configuration.
    pub fn get(&self) -> &PeerToolConfig {
        &self.config
    }
}

/// Global configuration instance.
static GLOBAL_CONFIG: OnceCell<GlobalConfig> = OnceCell::new();

/// Initializes the global configuration.
///
/// Has no effect if the global configuration has already been initialized.
pub fn init_global_config(config: PeerToolConfig) {
    let _ = GLOBAL_CONFIG.set(GlobalConfig::new(config));
}

/// Returns a reference to the global configuration.
///
/// # Panics
///
/// Panics if the global configuration has not been initialized.
pub fn get_global_config() -> &'static GlobalConfig {
    GLOBAL_CONFIG
        .get()
        .expect("global configuration not initialized")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        let config = PeerToolConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn log_config_rejects_unknown_level() {
        let log = LogConfig { level: "verbose".to_string(), json: false };
        assert!(log.validate().is_err());
    }

    #[test]
    fn loads_toml_file_and_applies_env_override() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [client]
            max_requests = 7
            default_timeout_ms = 1234

            [server]
            max_requests = 9
            max_input_len = 2048
            parallel = true

            [log]
            level = "debug"
            json = false
            "#
        )
        .unwrap();

        let env_var = "COOPERATIVE_JRPC_TEST__SERVER__MAX_REQUESTS";
        std::env::set_var(env_var, "99");

        let loader = ConfigLoader::new(Some(file.path()), "COOPERATIVE_JRPC_TEST");
        let loaded = loader.load().expect("config should load");

        std::env::remove_var(env_var);

        assert_eq!(loaded.client.max_requests, 7);
        assert_eq!(loaded.client.default_timeout_ms, 1234);
        assert_eq!(loaded.server.max_requests, 99);
        assert!(loaded.server.parallel);
        assert_eq!(loaded.log.level, "debug");
    }

    #[test]
    fn missing_config_file_is_reported() {
        let loader = ConfigLoader::new(Some("/nonexistent/path/config.toml"), "COOPERATIVE_JRPC_MISSING");
        assert!(matches!(loader.load(), Err(ConfigError::FileNotFound(_))));
    }
}
