//! The broadcast layer between the chat actor and the room registries.
//!
//! The chat actor publishes every stored message once; each process runs a
//! [`RoomRegistry`](super::RoomRegistry) subscribed to the backplane that delivers
//! the message to its own local sessions. A shared backplane (a message bus) lets
//! several processes serve the same rooms; [`BroadcastBackplane`] is the
//! single-process version.

use super::ChatError;
use crate::model::Message;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

#[async_trait]
pub trait Backplane: Send + Sync {
    /// Publishes a stored message. Returns how many subscribers will see it.
    async fn publish(&self, message: &Message) -> Result<usize, ChatError>;

    /// A new subscription that sees every message published from now on, in
    /// publication order.
    fn subscribe(&self) -> broadcast::Receiver<Message>;
}

/// In-process backplane over a `tokio::sync::broadcast` channel.
pub struct BroadcastBackplane {
    sender: broadcast::Sender<Message>,
}

impl BroadcastBackplane {
    /// `capacity` messages are retained for a lagging subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }
}

#[async_trait]
impl Backplane for BroadcastBackplane {
    async fn publish(&self, message: &Message) -> Result<usize, ChatError> {
        // An error only means nobody is subscribed.
        let receivers = self.sender.send(message.clone()).unwrap_or(0);
        trace!(message_id = %message.id, receivers, "published");
        Ok(receivers)
    }

    fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.sender.subscribe()
    }
}
