//! Client configuration and defaults.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Configuration for client initialization.
///
/// All fields are overridable before the client is constructed; afterwards
/// they are fixed for the client's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Timeout applied locally when opening a transport to an endpoint
    pub connect_timeout: Duration,
    /// Operations issued on one connection before it is recycled onto the
    /// next endpoint
    pub operations_per_connection: u32,
    /// Extra attempts after the first failure of a retryable operation;
    /// zero disables retries entirely
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            operations_per_connection: 10_000,
            max_retries: 3,
        }
    }
}

impl ClientConfig {
    /// Create new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transport open timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-connection operation limit
    pub fn with_operations_per_connection(mut self, limit: u32) -> Self {
        self.operations_per_connection = limit;
        self
    }

    /// Set the retry count for retryable operations
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        if self.operations_per_connection == 0 {
            return Err(ConfigurationError::ZeroOperationLimit);
        }

        Ok(())
    }
}
