//! In-process implementation of the storage traits.
//!
//! Besides serving as the default backend, the store can be switched offline or
//! slowed down so that the failure paths of the core can be exercised.

use super::{MessageStore, OrderStore, Repository, StoreError};
use crate::model::{
    HistoryPage, MenuItem, MenuItemId, Message, MessageId, Order, OrderId, OrderStatus, UserId,
};
use crate::schedule::TimeSlot;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::trace;

#[derive(Default)]
struct Tables {
    orders: HashMap<OrderId, Order>,
    menu: HashMap<MenuItemId, MenuItem>,
    /// Kept in insertion (persistence) order.
    messages: Vec<Message>,
}

/// A [`Store`](super::Store) backed by in-memory tables.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    offline: AtomicBool,
    write_delay_ms: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            offline: AtomicBool::new(false),
            write_delay_ms: AtomicU64::new(0),
        }
    }

    /// While offline every operation fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Adds artificial latency to every write.
    pub fn set_write_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.write_delay_ms.store(millis, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    async fn before_write(&self) -> Result<(), StoreError> {
        self.ensure_online()?;
        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(())
    }
}

#[async_trait]
impl Repository<Order> for MemoryStore {
    async fn load(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        self.ensure_online()?;
        Ok(self.tables.read().await.orders.get(id).cloned())
    }

    async fn load_all(&self) -> Result<Vec<Order>, StoreError> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables.orders.values().cloned().collect();
        orders.sort_by_key(|order| (order.created_at, order.id));
        Ok(orders)
    }

    async fn insert(&self, item: &Order) -> Result<(), StoreError> {
        self.before_write().await?;
        let mut tables = self.tables.write().await;
        if tables.orders.contains_key(&item.id) {
            return Err(StoreError::Duplicate(item.id.to_string()));
        }
        tables.orders.insert(item.id, item.clone());
        trace!(order_id = %item.id, "order inserted");
        Ok(())
    }

    async fn save(&self, item: &Order) -> Result<(), StoreError> {
        self.before_write().await?;
        let mut tables = self.tables.write().await;
        match tables.orders.get_mut(&item.id) {
            Some(existing) => {
                *existing = item.clone();
                Ok(())
            }
            None => Err(StoreError::Missing(item.id.to_string())),
        }
    }

    async fn remove(&self, id: &OrderId) -> Result<bool, StoreError> {
        self.before_write().await?;
        Ok(self.tables.write().await.orders.remove(id).is_some())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn find_overlapping(
        &self,
        slot: &TimeSlot,
        skip_statuses: &[OrderStatus],
    ) -> Result<Vec<Order>, StoreError> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        let mut found: Vec<Order> = tables
            .orders
            .values()
            .filter(|order| !skip_statuses.contains(&order.status))
            .filter(|order| order.slot().is_some_and(|existing| existing.overlaps(slot)))
            .cloned()
            .collect();
        found.sort_by_key(|order| order.scheduled_time);
        Ok(found)
    }
}

#[async_trait]
impl Repository<MenuItem> for MemoryStore {
    async fn load(&self, id: &MenuItemId) -> Result<Option<MenuItem>, StoreError> {
        self.ensure_online()?;
        Ok(self.tables.read().await.menu.get(id).cloned())
    }

    async fn load_all(&self) -> Result<Vec<MenuItem>, StoreError> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        let mut items: Vec<MenuItem> = tables.menu.values().cloned().collect();
        items.sort_by_key(|item| item.id);
        Ok(items)
    }

    async fn insert(&self, item: &MenuItem) -> Result<(), StoreError> {
        self.before_write().await?;
        let mut tables = self.tables.write().await;
        if tables.menu.contains_key(&item.id) {
            return Err(StoreError::Duplicate(item.id.to_string()));
        }
        tables.menu.insert(item.id, item.clone());
        Ok(())
    }

    async fn save(&self, item: &MenuItem) -> Result<(), StoreError> {
        self.before_write().await?;
        let mut tables = self.tables.write().await;
        match tables.menu.get_mut(&item.id) {
            Some(existing) => {
                *existing = item.clone();
                Ok(())
            }
            None => Err(StoreError::Missing(item.id.to_string())),
        }
    }

    async fn remove(&self, id: &MenuItemId) -> Result<bool, StoreError> {
        self.before_write().await?;
        Ok(self.tables.write().await.menu.remove(id).is_some())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert_message(&self, message: &Message) -> Result<(), StoreError> {
        self.before_write().await?;
        let mut tables = self.tables.write().await;
        if tables.messages.iter().any(|m| m.id == message.id) {
            return Err(StoreError::Duplicate(message.id.to_string()));
        }
        tables.messages.push(message.clone());
        trace!(message_id = %message.id, order_id = %message.order_id, "message inserted");
        Ok(())
    }

    async fn messages_for_order(&self, order_id: &OrderId) -> Result<Vec<Message>, StoreError> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        let mut messages: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| &m.order_id == order_id)
            .cloned()
            .collect();
        // Stable: equal timestamps keep persistence order.
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn message_page(
        &self,
        order_id: &OrderId,
        after: Option<&MessageId>,
        limit: usize,
    ) -> Result<HistoryPage, StoreError> {
        let conversation = self.messages_for_order(order_id).await?;
        let start = match after {
            Some(cursor) => {
                let position = conversation
                    .iter()
                    .position(|m| &m.id == cursor)
                    .ok_or_else(|| StoreError::Missing(cursor.to_string()))?;
                position + 1
            }
            None => 0,
        };

        let remaining = &conversation[start..];
        let messages: Vec<Message> = remaining.iter().take(limit).cloned().collect();
        let next_cursor = if remaining.len() > messages.len() {
            messages.last().map(|m| m.id)
        } else {
            None
        };
        Ok(HistoryPage {
            messages,
            next_cursor,
        })
    }

    async fn mark_read(&self, order_id: &OrderId, receiver: &UserId) -> Result<u64, StoreError> {
        self.before_write().await?;
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for message in tables.messages.iter_mut().filter(|m| {
            &m.order_id == order_id && !m.read && m.receiver.as_ref() == Some(receiver)
        }) {
            message.read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn count_unread(&self, receiver: &UserId) -> Result<u64, StoreError> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        let count = tables
            .messages
            .iter()
            .filter(|m| !m.read && m.receiver.as_ref() == Some(receiver))
            .count();
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
    }

    fn scheduled(start: DateTime<Utc>, minutes: u32, status: OrderStatus) -> Order {
        let slot = TimeSlot::from_start(start, minutes).unwrap();
        Order {
            id: OrderId::generate(),
            user: UserId::from("alice"),
            items: vec![],
            total_amount: 0.0,
            status,
            scheduled_time: Some(slot.start),
            duration_minutes: minutes,
            expected_completion_time: Some(slot.end),
            created_at: start,
            updated_at: start,
        }
    }

    fn message(order_id: OrderId, receiver: Option<&str>, offset_secs: i64) -> Message {
        Message {
            id: MessageId::generate(),
            sender: UserId::from("staff"),
            receiver: receiver.map(UserId::from),
            order_id,
            content: format!("message {offset_secs}"),
            read: false,
            created_at: at(12, 0) + ChronoDuration::seconds(offset_secs),
        }
    }

    #[tokio::test]
    async fn test_find_overlapping_skips_terminal_orders() {
        let store = MemoryStore::new();
        let active = scheduled(at(10, 0), 30, OrderStatus::Pending);
        let cancelled = scheduled(at(10, 0), 30, OrderStatus::Cancelled);
        let later = scheduled(at(11, 0), 30, OrderStatus::Ready);
        for order in [&active, &cancelled, &later] {
            Repository::<Order>::insert(&store, order).await.unwrap();
        }

        let probe = TimeSlot::from_start(at(10, 15), 30).unwrap();
        let found = store
            .find_overlapping(&probe, &OrderStatus::TERMINAL)
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, active.id);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let store = MemoryStore::new();
        let order = scheduled(at(10, 0), 30, OrderStatus::Pending);
        Repository::<Order>::insert(&store, &order).await.unwrap();

        let err = Repository::<Order>::insert(&store, &order).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_operation() {
        let store = MemoryStore::new();
        store.set_offline(true);

        let order_id = OrderId::generate();
        assert!(store.insert_message(&message(order_id, None, 0)).await.is_err());
        assert!(store.count_unread(&UserId::from("alice")).await.is_err());

        store.set_offline(false);
        assert_eq!(store.count_unread(&UserId::from("alice")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_read_reports_changed_count() {
        let store = MemoryStore::new();
        let order_id = OrderId::generate();
        let other_order = OrderId::generate();
        store.insert_message(&message(order_id, Some("alice"), 0)).await.unwrap();
        store.insert_message(&message(order_id, Some("alice"), 1)).await.unwrap();
        store.insert_message(&message(order_id, Some("bob"), 2)).await.unwrap();
        store.insert_message(&message(other_order, Some("alice"), 3)).await.unwrap();

        let alice = UserId::from("alice");
        assert_eq!(store.count_unread(&alice).await.unwrap(), 3);
        assert_eq!(store.mark_read(&order_id, &alice).await.unwrap(), 2);
        assert_eq!(store.mark_read(&order_id, &alice).await.unwrap(), 0);
        assert_eq!(store.count_unread(&alice).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_message_page_walks_the_conversation() {
        let store = MemoryStore::new();
        let order_id = OrderId::generate();
        let mut sent = Vec::new();
        for i in 0..5 {
            let m = message(order_id, None, i);
            store.insert_message(&m).await.unwrap();
            sent.push(m.id);
        }

        let first = store.message_page(&order_id, None, 2).await.unwrap();
        assert_eq!(first.messages.iter().map(|m| m.id).collect::<Vec<_>>(), sent[0..2]);
        assert_eq!(first.next_cursor, Some(sent[1]));

        let second = store
            .message_page(&order_id, first.next_cursor.as_ref(), 2)
            .await
            .unwrap();
        assert_eq!(second.messages.iter().map(|m| m.id).collect::<Vec<_>>(), sent[2..4]);

        let last = store
            .message_page(&order_id, second.next_cursor.as_ref(), 2)
            .await
            .unwrap();
        assert_eq!(last.messages.len(), 1);
        assert_eq!(last.next_cursor, None);
    }
}
