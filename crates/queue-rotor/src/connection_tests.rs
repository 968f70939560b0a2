//! Tests for connection lifecycle management.

use super::*;
use crate::endpoint::Endpoint;
use crate::error::QueueError;
use crate::memory::{MemoryBroker, MemoryConnector, MemoryProxy};
use crate::service::Connector;
use async_trait::async_trait;
use tokio_test::assert_ok;

fn endpoints(count: usize) -> Vec<Endpoint> {
    (0..count)
        .map(|i| Endpoint::new(format!("q{}.example:2229", i)).expect("valid endpoint"))
        .collect()
}

fn manager(
    broker: &MemoryBroker,
    endpoints: Vec<Endpoint>,
    config: &ClientConfig,
) -> ConnectionManager<MemoryConnector> {
    let rotator = EndpointRotator::new(endpoints).expect("valid rotator");
    ConnectionManager::new(MemoryConnector::new(broker), rotator, config)
}

#[tokio::test]
async fn test_ensure_connection_connects_once() {
    // Arrange
    let broker = MemoryBroker::new();
    let mut manager = manager(&broker, endpoints(2), &ClientConfig::default());

    // Act
    assert_ok!(manager.ensure_connection().await);
    assert_ok!(manager.ensure_connection().await);

    // Assert - the second call is a no-op
    assert_eq!(broker.connect_attempts().len(), 1);
    assert!(manager.has_active_connection());
}

#[tokio::test]
async fn test_first_connection_uses_first_endpoint() {
    let broker = MemoryBroker::new();
    let list = endpoints(3);
    let mut manager = manager(&broker, list.clone(), &ClientConfig::default());

    assert_ok!(manager.ensure_connection().await);

    assert_eq!(broker.connect_attempts(), vec![list[0].clone()]);
}

#[tokio::test]
async fn test_operation_threshold_triggers_single_reconnect() {
    // Arrange - recycle the connection after two operations
    let broker = MemoryBroker::new();
    let config = ClientConfig::new().with_operations_per_connection(2);
    let list = endpoints(2);
    let mut manager = manager(&broker, list.clone(), &config);

    // Act - two operations fit on the first connection
    assert_ok!(manager.checkout().await);
    assert_ok!(manager.checkout().await);
    assert_eq!(broker.connect_attempts().len(), 1);

    // The third crosses the threshold
    assert_ok!(manager.checkout().await);

    // Assert - exactly one reconnect, rotated to the next endpoint, old
    // connection closed, counter restarted
    assert_eq!(broker.connect_attempts(), vec![list[0].clone(), list[1].clone()]);
    assert_eq!(broker.closed_connections(), 1);
    assert_eq!(manager.operations_on_connection(), 1);
}

#[tokio::test]
async fn test_connect_failure_leaves_no_active_connection() {
    // Arrange
    let broker = MemoryBroker::new();
    let list = endpoints(2);
    broker.set_unreachable(&list[0], true);
    broker.set_unreachable(&list[1], true);
    let mut manager = manager(&broker, list.clone(), &ClientConfig::default());

    // Act
    let result = manager.ensure_connection().await;

    // Assert
    assert!(result.is_err());
    assert!(!manager.has_active_connection());

    // The next attempt runs the full sequence again on the next endpoint
    broker.set_unreachable(&list[1], false);
    assert_ok!(manager.ensure_connection().await);
    assert_eq!(broker.connect_attempts(), vec![list[0].clone(), list[1].clone()]);
}

#[tokio::test]
async fn test_invalidate_closes_and_forces_reconnect() {
    let broker = MemoryBroker::new();
    let list = endpoints(2);
    let mut manager = manager(&broker, list.clone(), &ClientConfig::default());

    assert_ok!(manager.ensure_connection().await);
    manager.invalidate().await;

    assert!(!manager.has_active_connection());
    assert_eq!(broker.closed_connections(), 1);

    // Reconnect rotates onward rather than reusing the abandoned endpoint
    assert_ok!(manager.ensure_connection().await);
    assert_eq!(broker.connect_attempts(), vec![list[0].clone(), list[1].clone()]);
}

/// Connector whose connect never completes, for exercising the local
/// connect timeout
struct HangingConnector;

#[async_trait]
impl Connector for HangingConnector {
    type Proxy = MemoryProxy;

    async fn connect(&self, _endpoint: &Endpoint) -> Result<Self::Proxy, QueueError> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_connect_timeout_enforced_locally() {
    let config = ClientConfig::new().with_connect_timeout(Duration::from_secs(3));
    let rotator = EndpointRotator::new(endpoints(1)).expect("valid rotator");
    let mut manager = ConnectionManager::new(HangingConnector, rotator, &config);

    let result = manager.ensure_connection().await;

    match result {
        Err(QueueError::ConnectTimeout { timeout, .. }) => {
            assert_eq!(timeout, Duration::from_secs(3));
        }
        other => panic!("Expected ConnectTimeout, got: {:?}", other),
    }
    assert!(!manager.has_active_connection());
}
