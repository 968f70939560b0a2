//! Queue names, queue items, and the self-acknowledging item handle.

use crate::client::QueueClient;
use crate::error::{ConfigurationError, QueueError};
use crate::service::Connector;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;

/// Validated queue name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueName(String);

impl QueueName {
    /// Create new queue name with validation
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigurationError> {
        let name = name.into();

        if name.is_empty() || name.len() > 250 {
            return Err(ConfigurationError::InvalidQueueName {
                message: "must be 1-250 characters".to_string(),
            });
        }

        // Queue names travel on the wire unescaped
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(ConfigurationError::InvalidQueueName {
                message: "only ASCII alphanumeric, hyphens, underscores, and dots allowed"
                    .to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get queue name as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueName {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// An item dequeued from (or destined for) a queue: a server-assigned opaque
/// id plus the payload bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Reservation handle, meaningful only to the server that issued it
    pub id: i64,
    /// Opaque payload
    #[serde(with = "payload_serde")]
    pub payload: Bytes,
}

/// Base64 round-trip for payload bytes in serialized form
mod payload_serde {
    use base64::{engine::general_purpose, Engine as _};
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = general_purpose::STANDARD.encode(bytes);
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let decoded = general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)?;
        Ok(Bytes::from(decoded))
    }
}

impl Item {
    /// Create new item
    pub fn new(id: i64, payload: Bytes) -> Self {
        Self { id, payload }
    }
}

/// A dequeued item bound to the queue it came from and the client that
/// produced it, so it can acknowledge itself.
///
/// Created after a successful dequeue. Once [confirm](QueueItem::confirm) or
/// [abort](QueueItem::abort) has been called the handle is spent; further
/// calls are not defensively rejected, the server simply no longer knows the
/// reservation.
pub struct QueueItem<C: Connector> {
    item: Item,
    queue: QueueName,
    client: QueueClient<C>,
}

impl<C: Connector> Clone for QueueItem<C> {
    fn clone(&self) -> Self {
        Self {
            item: self.item.clone(),
            queue: self.queue.clone(),
            client: self.client.clone(),
        }
    }
}

impl<C: Connector> QueueItem<C> {
    /// Bind a dequeued item to its queue and originating client
    pub fn new(item: Item, queue: QueueName, client: QueueClient<C>) -> Self {
        Self {
            item,
            queue,
            client,
        }
    }

    /// Bind a whole dequeue batch at once
    pub fn wrap_all(items: Vec<Item>, queue: &QueueName, client: &QueueClient<C>) -> Vec<Self> {
        items
            .into_iter()
            .map(|item| Self::new(item, queue.clone(), client.clone()))
            .collect()
    }

    /// Get the underlying item
    pub fn item(&self) -> &Item {
        &self.item
    }

    /// Get the server-assigned reservation id
    pub fn id(&self) -> i64 {
        self.item.id
    }

    /// Get the payload bytes
    pub fn payload(&self) -> &Bytes {
        &self.item.payload
    }

    /// Get the queue this item was dequeued from
    pub fn queue(&self) -> &QueueName {
        &self.queue
    }

    /// Permanently remove this item from the queue.
    ///
    /// Delegates to the owning client's confirm with a singleton set; the
    /// confirmed count is discarded. Not retried.
    pub async fn confirm(&self) -> Result<(), QueueError> {
        self.client
            .confirm(&self.queue, std::slice::from_ref(&self.item))
            .await
            .map(|_| ())
    }

    /// Release this item's reservation, making it eligible for dequeue again.
    ///
    /// Delegates to the owning client's abort with a singleton set; the
    /// released count is discarded. Not retried.
    pub async fn abort(&self) -> Result<(), QueueError> {
        self.client
            .abort(&self.queue, std::slice::from_ref(&self.item))
            .await
            .map(|_| ())
    }
}
