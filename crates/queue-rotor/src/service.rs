//! External collaborator seams: the transport-bound service proxy and the
//! connector that produces one.
//!
//! The wire encoding, framing, and call marshaling live behind these traits.
//! The crate ships no network implementation; the [memory](crate::memory)
//! module provides an in-process one for tests and development.

use crate::endpoint::Endpoint;
use crate::error::QueueError;
use crate::item::{Item, QueueName};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashSet;
use std::time::Duration;

/// Remote-call interface bound to one open transport.
///
/// A proxy owns its transport: dropping or closing the proxy tears the
/// connection down. Implementations forward the dequeue wait and reservation
/// durations to the server as protocol values; they are not enforced
/// client-side.
#[async_trait]
pub trait QueueRpc: Send {
    /// Append payloads to a queue, returning the accepted count
    async fn enqueue(&mut self, queue: &QueueName, payloads: &[Bytes]) -> Result<u32, QueueError>;

    /// Dequeue and reserve up to `max_items` items.
    ///
    /// A zero `wait` returns immediately with whatever is available. Reserved
    /// items are auto-released by the server after `reservation` unless
    /// confirmed first.
    async fn dequeue(
        &mut self,
        queue: &QueueName,
        max_items: u32,
        wait: Duration,
        reservation: Duration,
    ) -> Result<Vec<Item>, QueueError>;

    /// Permanently remove reserved items, returning the confirmed count
    async fn confirm(&mut self, queue: &QueueName, ids: &HashSet<i64>) -> Result<u32, QueueError>;

    /// Release reservations, returning the released count
    async fn abort(&mut self, queue: &QueueName, ids: &HashSet<i64>) -> Result<u32, QueueError>;

    /// Drop every item from every queue on the server
    async fn flush_all_queues(&mut self) -> Result<(), QueueError>;

    /// Close the underlying transport.
    ///
    /// Callers discard close errors; the connection is abandoned either way.
    async fn close(&mut self) -> Result<(), QueueError>;
}

/// Opens a transport to an endpoint and binds a service proxy to it.
///
/// The connect timeout is enforced by the caller, so implementations may
/// block indefinitely without harm.
#[async_trait]
pub trait Connector: Send + Sync {
    type Proxy: QueueRpc;

    async fn connect(&self, endpoint: &Endpoint) -> Result<Self::Proxy, QueueError>;
}
