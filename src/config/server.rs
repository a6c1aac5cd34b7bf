//! Server-side (request dispatcher) configuration.

use super::ConfigResult;
use super::Validate;
use crate::error::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Configuration for the server-side request dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Maximum number of handler invocations in flight at once. Exceeding
    /// this on a new request yields a `-32001` error envelope.
    pub max_requests: u32,

    /// Maximum accepted inbound payload length, in UTF-8 bytes. Exceeding
    /// this yields a `-32000` error envelope.
    pub max_input_len: usize,

    /// Selects the batch execution strategy: `true` for parallel
    /// (pre-allocate-then-launch, unordered completion), `false` for
    /// sequential (one sub-request in flight at a time, order-preserving).
    pub parallel: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_requests: 64,
            max_input_len: 64 * 1024,
            parallel: false,
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_requests == 0 {
            return Err(ConfigError::ValidationError(
                "server.max_requests must be greater than 0".to_string(),
            ));
        }
        if self.max_input_len == 0 {
            return Err(ConfigError::ValidationError(
                "server.max_input_len must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
