//! # Storage collaborator
//!
//! The core talks to durable storage only through the traits in this module:
//!
//! - [`Repository`]: generic load/insert/save/remove, used by every
//!   [`ResourceActor`](crate::framework::ResourceActor) as its backing store.
//! - [`OrderStore`]: adds the overlap query the scheduler needs.
//! - [`MessageStore`]: the chat history, read flags and unread counters.
//!
//! Any backend offering these operations with read-your-writes consistency will do.
//! [`MemoryStore`] is the in-process implementation used by the binary and the tests.

pub mod memory;

pub use memory::MemoryStore;

use crate::framework::ActorEntity;
use crate::model::{HistoryPage, MenuItem, Message, MessageId, Order, OrderId, OrderStatus, UserId};
use crate::schedule::TimeSlot;
use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a storage backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A record with the same key already exists.
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    /// A record the operation depends on does not exist.
    #[error("Record not found: {0}")]
    Missing(String),
}

/// Generic persistence for one entity type.
#[async_trait]
pub trait Repository<T: ActorEntity>: Send + Sync {
    async fn load(&self, id: &T::Id) -> Result<Option<T>, StoreError>;

    async fn load_all(&self) -> Result<Vec<T>, StoreError>;

    /// Stores a new record. Fails with [`StoreError::Duplicate`] if the id is taken.
    async fn insert(&self, item: &T) -> Result<(), StoreError>;

    /// Overwrites an existing record.
    async fn save(&self, item: &T) -> Result<(), StoreError>;

    /// Returns whether a record was removed.
    async fn remove(&self, id: &T::Id) -> Result<bool, StoreError>;
}

/// Order persistence with the slot query used for conflict detection.
#[async_trait]
pub trait OrderStore: Repository<Order> {
    /// Orders whose status is not in `skip_statuses` and whose slot intersects `slot`.
    async fn find_overlapping(
        &self,
        slot: &TimeSlot,
        skip_statuses: &[OrderStatus],
    ) -> Result<Vec<Order>, StoreError>;
}

/// Chat message persistence.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert_message(&self, message: &Message) -> Result<(), StoreError>;

    /// The whole conversation of an order, oldest first.
    async fn messages_for_order(&self, order_id: &OrderId) -> Result<Vec<Message>, StoreError>;

    /// Up to `limit` messages following the `after` cursor, oldest first.
    async fn message_page(
        &self,
        order_id: &OrderId,
        after: Option<&MessageId>,
        limit: usize,
    ) -> Result<HistoryPage, StoreError>;

    /// Flags every unread message of `order_id` addressed to `receiver` as read.
    ///
    /// Returns how many messages changed.
    async fn mark_read(&self, order_id: &OrderId, receiver: &UserId) -> Result<u64, StoreError>;

    /// Unread messages addressed to `receiver` across all orders.
    async fn count_unread(&self, receiver: &UserId) -> Result<u64, StoreError>;
}

/// Everything the platform needs from one backend.
pub trait Store: OrderStore + MessageStore + Repository<MenuItem> {}

impl<S> Store for S where S: OrderStore + MessageStore + Repository<MenuItem> {}
