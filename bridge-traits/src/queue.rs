//! Durable Work Queue Abstraction
//!
//! Producer/consumer interface to the durable queue that decouples change
//! discovery from derivative production. The settlement model follows
//! partial-batch acknowledgment: each received message is individually
//! acknowledged (removed) or released (made visible again for redelivery
//! under the queue's own retry policy).

use async_trait::async_trait;

use crate::error::Result;

/// One message received from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Queue-issued receipt identifier, used for acknowledge/release.
    pub id: String,
    /// Serialized message body.
    pub body: String,
}

/// Durable work queue operations.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Publish a message body to the queue.
    async fn send(&self, body: String) -> Result<()>;

    /// Receive up to `max_messages` pending messages, marking them in flight.
    async fn receive(&self, max_messages: u32) -> Result<Vec<QueueMessage>>;

    /// Acknowledge (permanently remove) a received message.
    async fn acknowledge(&self, message_id: &str) -> Result<()>;

    /// Release a received message for redelivery.
    async fn release(&self, message_id: &str) -> Result<()>;
}
