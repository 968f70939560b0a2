//! Error types for queue client operations.

use std::time::Duration;
use thiserror::Error;

/// Comprehensive error type for all client operations
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Connection to {endpoint} failed: {message}")]
    ConnectionFailed { endpoint: String, message: String },

    #[error("Connection to {endpoint} timed out after {timeout:?}")]
    ConnectTimeout { endpoint: String, timeout: Duration },

    #[error("Remote {operation} call failed: {message}")]
    RemoteCall { operation: String, message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl QueueError {
    /// Check if error occurred while establishing a connection, as opposed to
    /// during a remote call on an established one
    pub fn is_connect(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::ConnectTimeout { .. }
        )
    }

    /// Shorthand for a remote-call failure on a named operation
    pub fn remote_call(operation: &str, message: impl Into<String>) -> Self {
        Self::RemoteCall {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

/// Errors in client construction and configuration
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Endpoint list must contain at least one endpoint")]
    EmptyEndpointList,

    #[error("Invalid endpoint address: {message}")]
    InvalidEndpoint { message: String },

    #[error("Invalid queue name: {message}")]
    InvalidQueueName { message: String },

    #[error("operations_per_connection must be at least 1")]
    ZeroOperationLimit,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
