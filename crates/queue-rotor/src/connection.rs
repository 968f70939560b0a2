//! Connection lifecycle: when to create, recycle, and tear down the active
//! service proxy.

use crate::config::ClientConfig;
use crate::endpoint::EndpointRotator;
use crate::error::QueueError;
use crate::service::{Connector, QueueRpc};
use std::time::Duration;
use tracing::debug;

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;

/// Sole owner of the active connection.
///
/// Holds the endpoint rotator, the active proxy (if any), and the count of
/// operations issued on it. Connections are created and destroyed here and
/// nowhere else.
pub(crate) struct ConnectionManager<C: Connector> {
    connector: C,
    rotator: EndpointRotator,
    connect_timeout: Duration,
    operations_per_connection: u32,
    active: Option<C::Proxy>,
    operations_on_connection: u32,
}

impl<C: Connector> ConnectionManager<C> {
    pub(crate) fn new(connector: C, rotator: EndpointRotator, config: &ClientConfig) -> Self {
        Self {
            connector,
            rotator,
            connect_timeout: config.connect_timeout,
            operations_per_connection: config.operations_per_connection,
            active: None,
            operations_on_connection: 0,
        }
    }

    /// Reconnect if there is no active proxy or the current one has reached
    /// its operation limit; otherwise a no-op.
    pub(crate) async fn ensure_connection(&mut self) -> Result<(), QueueError> {
        if self.active.is_none()
            || self.operations_on_connection >= self.operations_per_connection
        {
            self.reconnect().await?;
        }

        Ok(())
    }

    /// Ensure a live connection and count one operation against it.
    ///
    /// The counter increments before the remote call executes, so failed
    /// calls still consume connection budget.
    pub(crate) async fn checkout(&mut self) -> Result<&mut C::Proxy, QueueError> {
        self.ensure_connection().await?;
        self.operations_on_connection += 1;

        match self.active.as_mut() {
            Some(proxy) => Ok(proxy),
            // ensure_connection either stored a proxy or returned the error
            None => Err(QueueError::ConnectionFailed {
                endpoint: self.rotator.current().to_string(),
                message: "no active connection".to_string(),
            }),
        }
    }

    /// Rotate to the next endpoint, tear down any open connection, and open a
    /// fresh one.
    ///
    /// On failure the client is left with no active connection; the next
    /// `ensure_connection` runs the full sequence again, advancing the
    /// rotator once more.
    async fn reconnect(&mut self) -> Result<(), QueueError> {
        let endpoint = self.rotator.advance().clone();

        self.invalidate().await;

        debug!(endpoint = %endpoint, "opening connection");
        let connect = self.connector.connect(&endpoint);
        let proxy = match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(proxy)) => proxy,
            Ok(Err(error)) => return Err(error),
            Err(_) => {
                return Err(QueueError::ConnectTimeout {
                    endpoint: endpoint.to_string(),
                    timeout: self.connect_timeout,
                })
            }
        };

        self.active = Some(proxy);
        self.operations_on_connection = 0;
        Ok(())
    }

    /// Drop the active proxy, closing it best-effort, so the next
    /// `ensure_connection` reconnects and rotates.
    pub(crate) async fn invalidate(&mut self) {
        if let Some(mut proxy) = self.active.take() {
            if let Err(error) = proxy.close().await {
                debug!(error = %error, "discarding close error on abandoned connection");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn has_active_connection(&self) -> bool {
        self.active.is_some()
    }

    #[cfg(test)]
    pub(crate) fn operations_on_connection(&self) -> u32 {
        self.operations_on_connection
    }
}
