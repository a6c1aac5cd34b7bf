//! Client-side (pending-request registry) configuration.

use super::ConfigResult;
use super::Validate;
use crate::error::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Configuration for the client-side pending-request registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Maximum number of in-flight (armed) requests. A `send_request` call
    /// made while the registry is at capacity completes synchronously with
    /// `TooManyRequests`.
    pub max_requests: u32,

    /// Default request timeout, in milliseconds, used by callers that don't
    /// specify one explicitly.
    pub default_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_requests: 32,
            default_timeout_ms: 5_000,
        }
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_requests == 0 {
            return Err(ConfigError::ValidationError(
                "client.max_requests must be greater than 0".to_string(),
            ));
        }
        if self.default_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "client.default_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
