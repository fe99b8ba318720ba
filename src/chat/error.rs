//! Error types for the order chat.

use crate::error::ErrorKind;
use crate::model::{AccessError, OrderId};
use crate::order_actor::OrderError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur while chatting about an order.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChatError {
    /// The message or request is malformed.
    #[error("Chat validation error: {0}")]
    Validation(String),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The message could not be stored.
    #[error("Chat persistence error: {0}")]
    Persistence(String),

    /// The store did not answer within the configured time.
    #[error("Chat persistence timed out after {0} ms")]
    Timeout(u64),

    #[error(transparent)]
    Forbidden(#[from] AccessError),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunication(String),

    /// An event could not be encoded or decoded.
    #[error("Malformed event: {0}")]
    Codec(String),
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::Validation(_) | ChatError::Codec(_) => ErrorKind::Validation,
            ChatError::OrderNotFound(_) => ErrorKind::NotFound,
            ChatError::Persistence(_) => ErrorKind::Persistence,
            ChatError::Timeout(_) | ChatError::ActorCommunication(_) => ErrorKind::Unavailable,
            ChatError::Forbidden(_) => ErrorKind::Forbidden,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Translates an order lookup failure for `order_id`.
    pub(crate) fn from_order(order_id: OrderId, e: OrderError) -> Self {
        match e {
            OrderError::NotFound(_) => ChatError::OrderNotFound(order_id),
            OrderError::Forbidden(access) => ChatError::Forbidden(access),
            OrderError::Persistence(msg) => ChatError::Persistence(msg),
            other => ChatError::ActorCommunication(other.to_string()),
        }
    }
}

impl From<StoreError> for ChatError {
    fn from(e: StoreError) -> Self {
        ChatError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(e: serde_json::Error) -> Self {
        ChatError::Codec(e.to_string())
    }
}
