//! Tests for error types.

use super::*;

#[test]
fn test_connect_phase_classification() {
    assert!(QueueError::ConnectionFailed {
        endpoint: "q1.example:2229".to_string(),
        message: "connection refused".to_string(),
    }
    .is_connect());

    assert!(QueueError::ConnectTimeout {
        endpoint: "q1.example:2229".to_string(),
        timeout: Duration::from_secs(3),
    }
    .is_connect());

    assert!(!QueueError::remote_call("enqueue", "queue is full").is_connect());

    assert!(!QueueError::Configuration(ConfigurationError::EmptyEndpointList).is_connect());
}

#[test]
fn test_remote_call_shorthand() {
    let error = QueueError::remote_call("dequeue", "server shutting down");

    match error {
        QueueError::RemoteCall { operation, message } => {
            assert_eq!(operation, "dequeue");
            assert_eq!(message, "server shutting down");
        }
        other => panic!("Expected RemoteCall error, got: {:?}", other),
    }
}

#[test]
fn test_display_includes_endpoint() {
    let error = QueueError::ConnectionFailed {
        endpoint: "q2.example:2229".to_string(),
        message: "connection refused".to_string(),
    };

    let rendered = error.to_string();
    assert!(rendered.contains("q2.example:2229"));
    assert!(rendered.contains("connection refused"));
}

#[test]
fn test_configuration_error_conversion() {
    let error: QueueError = ConfigurationError::ZeroOperationLimit.into();

    assert!(matches!(
        error,
        QueueError::Configuration(ConfigurationError::ZeroOperationLimit)
    ));
}
