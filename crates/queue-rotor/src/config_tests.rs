//! Tests for client configuration.

use super::*;

#[test]
fn test_defaults() {
    let config = ClientConfig::default();

    assert_eq!(config.connect_timeout, Duration::from_secs(3));
    assert_eq!(config.operations_per_connection, 10_000);
    assert_eq!(config.max_retries, 3);
}

#[test]
fn test_builder_overrides() {
    let config = ClientConfig::new()
        .with_connect_timeout(Duration::from_millis(500))
        .with_operations_per_connection(100)
        .with_max_retries(0);

    assert_eq!(config.connect_timeout, Duration::from_millis(500));
    assert_eq!(config.operations_per_connection, 100);
    assert_eq!(config.max_retries, 0);
}

#[test]
fn test_zero_operation_limit_rejected() {
    let config = ClientConfig::new().with_operations_per_connection(0);

    assert!(matches!(
        config.validate(),
        Err(ConfigurationError::ZeroOperationLimit)
    ));
}

#[test]
fn test_default_config_is_valid() {
    assert!(ClientConfig::default().validate().is_ok());
}
