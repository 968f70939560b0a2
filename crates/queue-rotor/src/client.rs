//! The retrying client facade applications call.

use crate::config::ClientConfig;
use crate::connection::ConnectionManager;
use crate::endpoint::{Endpoint, EndpointRotator};
use crate::error::QueueError;
use crate::item::{Item, QueueName};
use crate::service::{Connector, QueueRpc};
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::warn;

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Retry classification for queue operations.
///
/// Enqueue, dequeue, and flush are safe to reissue against another endpoint.
/// Confirm and abort are acknowledgments: reissuing one after a timeout could
/// double-acknowledge or mask a partial failure, so their first error is
/// surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationClass {
    IdempotentRetryable,
    Acknowledgment,
}

/// Total attempt count for an operation class under a given retry budget
pub(crate) fn attempts_for(class: OperationClass, max_retries: u32) -> u32 {
    match class {
        OperationClass::IdempotentRetryable => max_retries.saturating_add(1),
        OperationClass::Acknowledgment => 1,
    }
}

struct ClientInner<C: Connector> {
    max_retries: u32,
    manager: Mutex<ConnectionManager<C>>,
}

/// Fault-tolerant client for a set of interchangeable queue server endpoints.
///
/// One live connection at a time, recycled onto the next endpoint in
/// round-robin order after a configurable operation volume, with failed
/// retryable operations reissued against the next endpoint.
///
/// The handle is cheap to clone; clones share the same connection state, and
/// the state lock is held for an operation's entire attempt loop, so at most
/// one operation is in flight per client instance at a time. Once a remote
/// call has been issued there is no client-side cancellation.
pub struct QueueClient<C: Connector> {
    inner: Arc<ClientInner<C>>,
}

impl<C: Connector> Clone for QueueClient<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connector> QueueClient<C> {
    /// Create a client over a non-empty endpoint list with default
    /// configuration
    pub fn new(connector: C, endpoints: Vec<Endpoint>) -> Result<Self, QueueError> {
        Self::with_config(connector, endpoints, ClientConfig::default())
    }

    /// Create a client with explicit configuration
    pub fn with_config(
        connector: C,
        endpoints: Vec<Endpoint>,
        config: ClientConfig,
    ) -> Result<Self, QueueError> {
        config.validate()?;
        let rotator = EndpointRotator::new(endpoints)?;
        let manager = ConnectionManager::new(connector, rotator, &config);

        Ok(Self {
            inner: Arc::new(ClientInner {
                max_retries: config.max_retries,
                manager: Mutex::new(manager),
            }),
        })
    }

    /// Append payloads to a queue, returning the accepted count. Retried.
    pub async fn enqueue(
        &self,
        queue: &QueueName,
        payloads: &[Bytes],
    ) -> Result<u32, QueueError> {
        let mut manager = self.inner.manager.lock().await;
        let attempts = attempts_for(OperationClass::IdempotentRetryable, self.inner.max_retries);
        let mut attempt = 1;

        loop {
            let result = match manager.checkout().await {
                Ok(proxy) => proxy.enqueue(queue, payloads).await,
                Err(error) => Err(error),
            };

            match result {
                Ok(count) => return Ok(count),
                Err(error) => {
                    manager.invalidate().await;
                    if attempt >= attempts {
                        return Err(error);
                    }
                    warn!(
                        operation = "enqueue",
                        queue = %queue,
                        attempt,
                        error = %error,
                        "operation failed, rotating to next endpoint"
                    );
                    attempt += 1;
                }
            }
        }
    }

    /// Dequeue and reserve up to `max_items` items. Retried.
    ///
    /// A zero `wait` returns immediately with whatever is available. Reserved
    /// items are auto-released by the server after `reservation` unless
    /// confirmed first; both durations are forwarded to the server, not
    /// enforced locally.
    pub async fn dequeue(
        &self,
        queue: &QueueName,
        max_items: u32,
        wait: Duration,
        reservation: Duration,
    ) -> Result<Vec<Item>, QueueError> {
        let mut manager = self.inner.manager.lock().await;
        let attempts = attempts_for(OperationClass::IdempotentRetryable, self.inner.max_retries);
        let mut attempt = 1;

        loop {
            let result = match manager.checkout().await {
                Ok(proxy) => proxy.dequeue(queue, max_items, wait, reservation).await,
                Err(error) => Err(error),
            };

            match result {
                Ok(items) => return Ok(items),
                Err(error) => {
                    manager.invalidate().await;
                    if attempt >= attempts {
                        return Err(error);
                    }
                    warn!(
                        operation = "dequeue",
                        queue = %queue,
                        attempt,
                        error = %error,
                        "operation failed, rotating to next endpoint"
                    );
                    attempt += 1;
                }
            }
        }
    }

    /// Permanently remove previously dequeued items, returning the confirmed
    /// count. NOT retried; the first error is surfaced to the caller.
    pub async fn confirm(&self, queue: &QueueName, items: &[Item]) -> Result<u32, QueueError> {
        self.acknowledge(Acknowledgment::Confirm, queue, items).await
    }

    /// Release reservations on previously dequeued items, returning the
    /// released count. NOT retried; the first error is surfaced to the
    /// caller.
    pub async fn abort(&self, queue: &QueueName, items: &[Item]) -> Result<u32, QueueError> {
        self.acknowledge(Acknowledgment::Abort, queue, items).await
    }

    /// Drop every item from every queue on the current server. Retried.
    pub async fn flush_all_queues(&self) -> Result<(), QueueError> {
        let mut manager = self.inner.manager.lock().await;
        let attempts = attempts_for(OperationClass::IdempotentRetryable, self.inner.max_retries);
        let mut attempt = 1;

        loop {
            let result = match manager.checkout().await {
                Ok(proxy) => proxy.flush_all_queues().await,
                Err(error) => Err(error),
            };

            match result {
                Ok(()) => return Ok(()),
                Err(error) => {
                    manager.invalidate().await;
                    if attempt >= attempts {
                        return Err(error);
                    }
                    warn!(
                        operation = "flush_all_queues",
                        attempt,
                        error = %error,
                        "operation failed, rotating to next endpoint"
                    );
                    attempt += 1;
                }
            }
        }
    }

    /// Single-attempt path shared by confirm and abort.
    ///
    /// Acknowledgments still go through `ensure_connection` and count toward
    /// the per-connection operation budget; a failure invalidates the
    /// connection like any other, it just is not reissued.
    async fn acknowledge(
        &self,
        kind: Acknowledgment,
        queue: &QueueName,
        items: &[Item],
    ) -> Result<u32, QueueError> {
        let ids: HashSet<i64> = items.iter().map(|item| item.id).collect();
        let mut manager = self.inner.manager.lock().await;

        let result = match manager.checkout().await {
            Ok(proxy) => match kind {
                Acknowledgment::Confirm => proxy.confirm(queue, &ids).await,
                Acknowledgment::Abort => proxy.abort(queue, &ids).await,
            },
            Err(error) => Err(error),
        };

        if result.is_err() {
            manager.invalidate().await;
        }

        result
    }
}

#[derive(Debug, Clone, Copy)]
enum Acknowledgment {
    Confirm,
    Abort,
}
