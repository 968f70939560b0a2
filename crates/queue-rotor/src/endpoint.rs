//! Server endpoints and round-robin rotation.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;

/// One network address of a queue server instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint(String);

impl Endpoint {
    /// Create new endpoint with validation
    pub fn new(address: impl Into<String>) -> Result<Self, ConfigurationError> {
        let address = address.into();

        if address.is_empty() {
            return Err(ConfigurationError::InvalidEndpoint {
                message: "address must not be empty".to_string(),
            });
        }

        if address.chars().any(|c| c.is_whitespace()) {
            return Err(ConfigurationError::InvalidEndpoint {
                message: "address must not contain whitespace".to_string(),
            });
        }

        Ok(Self(address))
    }

    /// Get endpoint address as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Endpoint {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Ordered endpoint list plus the index of the currently selected endpoint.
///
/// Rotation is deterministic round-robin; previously failed endpoints are not
/// skipped. A single-endpoint list is a valid degenerate case in which every
/// rotation reselects the same endpoint.
#[derive(Debug, Clone)]
pub struct EndpointRotator {
    endpoints: Vec<Endpoint>,
    index: usize,
}

impl EndpointRotator {
    /// Create rotator over a non-empty endpoint list.
    ///
    /// The index starts on the last endpoint so the first rotation selects
    /// endpoint 0.
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self, ConfigurationError> {
        if endpoints.is_empty() {
            return Err(ConfigurationError::EmptyEndpointList);
        }

        let index = endpoints.len() - 1;
        Ok(Self { endpoints, index })
    }

    /// Advance to the next endpoint in round-robin order and return it
    pub fn advance(&mut self) -> &Endpoint {
        self.index = (self.index + 1) % self.endpoints.len();
        &self.endpoints[self.index]
    }

    /// Get the currently selected endpoint
    pub fn current(&self) -> &Endpoint {
        &self.endpoints[self.index]
    }

    /// Number of endpoints in the rotation
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always false; construction rejects empty lists
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
