//! In-process queue service for tests and development.
//!
//! [MemoryBroker] holds the queues; [MemoryConnector] and [MemoryProxy]
//! implement the [Connector](crate::service::Connector) and
//! [QueueRpc](crate::service::QueueRpc) seams over it. The broker supports
//! real reservation semantics (dequeue reserves, confirm removes, abort
//! releases, expired reservations are reclaimed lazily), per-endpoint
//! reachability control, injected call failures, and connect/call/close
//! counters so the rotation and retry engine can be exercised without a live
//! server.
//!
//! A zero reservation duration means dequeued items are consumed outright
//! with no hold to confirm or abort.

use crate::endpoint::Endpoint;
use crate::error::QueueError;
use crate::item::{Item, QueueName};
use crate::service::{Connector, QueueRpc};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

/// How long a waiting dequeue sleeps between polls of the broker
const DEQUEUE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// An item under reservation, pending confirm or abort
struct Reservation {
    item: Item,
    expires_at: Option<Instant>,
}

impl Reservation {
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Instant::now() >= expires_at,
            None => false,
        }
    }
}

/// State for a single queue
#[derive(Default)]
struct MemoryQueue {
    /// Items available for dequeue, FIFO order
    ready: VecDeque<Item>,
    /// Reserved items keyed by item id
    reserved: HashMap<i64, Reservation>,
}

impl MemoryQueue {
    /// Move expired reservations back to the front of the ready queue
    fn reclaim_expired(&mut self) {
        let expired: Vec<i64> = self
            .reserved
            .iter()
            .filter(|(_, reservation)| reservation.is_expired())
            .map(|(id, _)| *id)
            .collect();

        for id in expired {
            if let Some(reservation) = self.reserved.remove(&id) {
                self.ready.push_front(reservation.item);
            }
        }
    }
}

/// Shared broker state
struct BrokerState {
    queues: HashMap<QueueName, MemoryQueue>,
    next_item_id: i64,
    unreachable: HashSet<Endpoint>,
    injected_call_failures: u32,
    connect_log: Vec<Endpoint>,
    call_log: Vec<&'static str>,
    closed_connections: u32,
}

impl BrokerState {
    fn new() -> Self {
        Self {
            queues: HashMap::new(),
            next_item_id: 1,
            unreachable: HashSet::new(),
            injected_call_failures: 0,
            connect_log: Vec::new(),
            call_log: Vec::new(),
            closed_connections: 0,
        }
    }

    fn queue_mut(&mut self, queue: &QueueName) -> &mut MemoryQueue {
        self.queues.entry(queue.clone()).or_default()
    }
}

/// Thread-safe in-process queue service
#[derive(Clone)]
pub struct MemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl MemoryBroker {
    /// Create new empty broker
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BrokerState::new())),
        }
    }

    fn state(&self) -> MutexGuard<'_, BrokerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mark an endpoint reachable or unreachable for future connects
    pub fn set_unreachable(&self, endpoint: &Endpoint, unreachable: bool) {
        let mut state = self.state();
        if unreachable {
            state.unreachable.insert(endpoint.clone());
        } else {
            state.unreachable.remove(endpoint);
        }
    }

    /// Fail the next `count` remote calls with a remote-call error
    pub fn inject_call_failures(&self, count: u32) {
        self.state().injected_call_failures = count;
    }

    /// Endpoints that connect attempts were made against, in order
    pub fn connect_attempts(&self) -> Vec<Endpoint> {
        self.state().connect_log.clone()
    }

    /// Number of remote calls that reached a proxy for the named operation
    pub fn calls_for(&self, operation: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|name| **name == operation)
            .count()
    }

    /// Number of proxies closed so far
    pub fn closed_connections(&self) -> u32 {
        self.state().closed_connections
    }

    /// Items available for dequeue on a queue
    pub fn queue_depth(&self, queue: &QueueName) -> usize {
        self.state()
            .queues
            .get(queue)
            .map(|q| q.ready.len())
            .unwrap_or(0)
    }

    /// Items currently under reservation on a queue
    pub fn reserved_count(&self, queue: &QueueName) -> usize {
        self.state()
            .queues
            .get(queue)
            .map(|q| q.reserved.len())
            .unwrap_or(0)
    }

    fn begin_call(&self, operation: &'static str) -> Result<(), QueueError> {
        let mut state = self.state();
        state.call_log.push(operation);

        if state.injected_call_failures > 0 {
            state.injected_call_failures -= 1;
            return Err(QueueError::remote_call(operation, "injected failure"));
        }

        Ok(())
    }

    fn enqueue(&self, queue: &QueueName, payloads: &[Bytes]) -> u32 {
        let mut state = self.state();
        for payload in payloads {
            let id = state.next_item_id;
            state.next_item_id += 1;
            state
                .queue_mut(queue)
                .ready
                .push_back(Item::new(id, payload.clone()));
        }
        payloads.len() as u32
    }

    /// Take up to `max_items` ready items, reserving them when a hold is
    /// requested. Returns an empty vec when nothing is ready.
    fn take(&self, queue: &QueueName, max_items: u32, reservation: Duration) -> Vec<Item> {
        let mut state = self.state();
        let queue = state.queue_mut(queue);
        queue.reclaim_expired();

        let expires_at = if reservation.is_zero() {
            None
        } else {
            Some(Instant::now() + reservation)
        };

        let mut items = Vec::new();
        while items.len() < max_items as usize {
            let Some(item) = queue.ready.pop_front() else {
                break;
            };
            if expires_at.is_some() {
                queue.reserved.insert(
                    item.id,
                    Reservation {
                        item: item.clone(),
                        expires_at,
                    },
                );
            }
            items.push(item);
        }

        items
    }

    fn confirm(&self, queue: &QueueName, ids: &HashSet<i64>) -> u32 {
        let mut state = self.state();
        let queue = state.queue_mut(queue);

        let mut confirmed = 0;
        for id in ids {
            if queue.reserved.remove(id).is_some() {
                confirmed += 1;
            }
        }
        confirmed
    }

    fn abort(&self, queue: &QueueName, ids: &HashSet<i64>) -> u32 {
        let mut state = self.state();
        let queue = state.queue_mut(queue);

        let mut released = 0;
        for id in ids {
            if let Some(reservation) = queue.reserved.remove(id) {
                queue.ready.push_front(reservation.item);
                released += 1;
            }
        }
        released
    }

    fn flush_all_queues(&self) {
        self.state().queues.clear();
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

/// Connector producing proxies bound to a shared [MemoryBroker]
pub struct MemoryConnector {
    broker: MemoryBroker,
}

impl MemoryConnector {
    /// Create connector over a broker handle
    pub fn new(broker: &MemoryBroker) -> Self {
        Self {
            broker: broker.clone(),
        }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Proxy = MemoryProxy;

    async fn connect(&self, endpoint: &Endpoint) -> Result<Self::Proxy, QueueError> {
        let reachable = {
            let mut state = self.broker.state();
            state.connect_log.push(endpoint.clone());
            !state.unreachable.contains(endpoint)
        };

        if !reachable {
            return Err(QueueError::ConnectionFailed {
                endpoint: endpoint.to_string(),
                message: "endpoint marked unreachable".to_string(),
            });
        }

        Ok(MemoryProxy {
            broker: self.broker.clone(),
        })
    }
}

/// Service proxy over one "connection" to the broker
pub struct MemoryProxy {
    broker: MemoryBroker,
}

#[async_trait]
impl QueueRpc for MemoryProxy {
    async fn enqueue(&mut self, queue: &QueueName, payloads: &[Bytes]) -> Result<u32, QueueError> {
        self.broker.begin_call("enqueue")?;
        Ok(self.broker.enqueue(queue, payloads))
    }

    async fn dequeue(
        &mut self,
        queue: &QueueName,
        max_items: u32,
        wait: Duration,
        reservation: Duration,
    ) -> Result<Vec<Item>, QueueError> {
        self.broker.begin_call("dequeue")?;

        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let items = self.broker.take(queue, max_items, reservation);
            if !items.is_empty() || tokio::time::Instant::now() >= deadline {
                return Ok(items);
            }
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            tokio::time::sleep(DEQUEUE_POLL_INTERVAL.min(remaining)).await;
        }
    }

    async fn confirm(&mut self, queue: &QueueName, ids: &HashSet<i64>) -> Result<u32, QueueError> {
        self.broker.begin_call("confirm")?;
        Ok(self.broker.confirm(queue, ids))
    }

    async fn abort(&mut self, queue: &QueueName, ids: &HashSet<i64>) -> Result<u32, QueueError> {
        self.broker.begin_call("abort")?;
        Ok(self.broker.abort(queue, ids))
    }

    async fn flush_all_queues(&mut self) -> Result<(), QueueError> {
        self.broker.begin_call("flush_all_queues")?;
        self.broker.flush_all_queues();
        Ok(())
    }

    async fn close(&mut self) -> Result<(), QueueError> {
        self.broker.state().closed_connections += 1;
        Ok(())
    }
}
