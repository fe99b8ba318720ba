//! JSON events exchanged with a connected chat client.
//!
//! Both directions are internally tagged on `type`:
//!
//! ```json
//! {"type":"join_chat","order_id":"0190c7b4-..."}
//! {"type":"send_message","order_id":"0190c7b4-...","content":"Extra napkins please"}
//! {"type":"new_message","message":{...}}
//! {"type":"delivery_failed","order_id":"0190c7b4-...","kind":"persistence","reason":"...","retryable":true}
//! ```

use super::ChatError;
use crate::error::ErrorKind;
use crate::model::{Message, MessageDraft, MessageId, OrderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events a client sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinChat { order_id: OrderId },
    LeaveChat { order_id: OrderId },
    SendMessage(MessageDraft),
}

impl ClientEvent {
    pub fn from_json(raw: &str) -> Result<Self, ChatError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Events the server pushes to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A message was posted in a room this session joined.
    NewMessage { message: Message },
    /// The sender's message was stored and broadcast.
    MessageAck {
        message_id: MessageId,
        order_id: OrderId,
        created_at: DateTime<Utc>,
    },
    /// The sender's message was not stored; nothing was broadcast.
    DeliveryFailed {
        order_id: OrderId,
        kind: ErrorKind,
        reason: String,
        retryable: bool,
    },
    /// A request other than a send failed.
    Error { kind: ErrorKind, message: String },
}

impl ServerEvent {
    pub fn ack(message: &Message) -> Self {
        ServerEvent::MessageAck {
            message_id: message.id,
            order_id: message.order_id,
            created_at: message.created_at,
        }
    }

    pub fn delivery_failed(order_id: OrderId, error: &ChatError) -> Self {
        ServerEvent::DeliveryFailed {
            order_id,
            kind: error.kind(),
            reason: error.to_string(),
            retryable: error.is_retryable(),
        }
    }

    pub fn error(error: &ChatError) -> Self {
        ServerEvent::Error {
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String, ChatError> {
        Ok(serde_json::to_string(self)?)
    }
}
