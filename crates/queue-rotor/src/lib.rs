//! # Queue Rotor
//!
//! Fault-tolerant client for remote queue services reached over a framed,
//! binary RPC protocol. Applications enqueue byte-string items, dequeue and
//! reserve items for processing, and confirm or abort reservations, while the
//! client spreads load and retries across a fixed set of interchangeable
//! server endpoints.
//!
//! This library provides:
//! - Deterministic round-robin endpoint rotation
//! - Connection recycling after a configurable operation volume
//! - Bounded retries that rotate failed operations onto the next endpoint
//! - Non-retried confirm/abort acknowledgments
//! - An in-memory service implementation for tests and development
//!
//! ## Module Organization
//!
//! - [error] - Error types for all client operations
//! - [endpoint] - Endpoints and round-robin rotation
//! - [item] - Queue names, items, and the self-acknowledging item handle
//! - [config] - Client configuration and defaults
//! - [service] - The service proxy and connector seams
//! - [client] - The retrying client facade
//! - [memory] - In-process broker implementing the service seams
//!
//! The wire protocol itself lives behind the [service] traits and is not
//! implemented here.

pub mod client;
pub mod config;
mod connection;
pub mod endpoint;
pub mod error;
pub mod item;
pub mod memory;
pub mod service;

// Re-export commonly used types at crate root for convenience
pub use client::{OperationClass, QueueClient};
pub use config::ClientConfig;
pub use endpoint::{Endpoint, EndpointRotator};
pub use error::{ConfigurationError, QueueError};
pub use item::{Item, QueueItem, QueueName};
pub use memory::{MemoryBroker, MemoryConnector, MemoryProxy};
pub use service::{Connector, QueueRpc};
