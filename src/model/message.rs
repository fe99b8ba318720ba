//! Chat messages attached to an order's conversation.

use crate::model::{MessageId, OrderId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted chat message.
///
/// Once stored a message belongs to its order's history for good; only the
/// `read` flag ever changes, and only from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: UserId,
    /// `None` when the message is addressed to the staff at large.
    pub receiver: Option<UserId>,
    pub order_id: OrderId,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// What a client asks to send; the sender comes from the session identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDraft {
    pub order_id: OrderId,
    pub content: String,
    #[serde(default)]
    pub receiver: Option<UserId>,
}

impl MessageDraft {
    pub fn new(order_id: OrderId, content: impl Into<String>) -> Self {
        Self {
            order_id,
            content: content.into(),
            receiver: None,
        }
    }

    pub fn to(mut self, receiver: impl Into<UserId>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }
}

/// One page of an order's conversation, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub messages: Vec<Message>,
    /// Pass back as `after` to fetch the next page; `None` on the last page.
    pub next_cursor: Option<MessageId>,
}
