//! # Chat Actor
//!
//! Stores chat messages and hands them to the [`Backplane`].
//!
//! Sends are processed one at a time: validate, look up the order, store the
//! message within the persistence timeout, then publish. A message that was not
//! stored is never published. Processing sends sequentially also gives every
//! stored message a `created_at` no earlier than the previous one, so history
//! order and broadcast order agree.

use super::{Backplane, ChatError};
use crate::clients::{ActorClient, OrderClient};
use crate::model::{HistoryPage, Identity, Message, MessageDraft, MessageId, Order, OrderId, Role, UserId};
use crate::store::{MessageStore, StoreError};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, instrument, warn};

type Reply<T> = oneshot::Sender<Result<T, ChatError>>;

#[derive(Debug)]
enum ChatRequest {
    Send {
        sender: Identity,
        draft: MessageDraft,
        respond_to: Reply<Message>,
    },
    History {
        caller: Identity,
        order_id: OrderId,
        respond_to: Reply<Vec<Message>>,
    },
    HistoryPage {
        caller: Identity,
        order_id: OrderId,
        after: Option<MessageId>,
        limit: Option<usize>,
        respond_to: Reply<HistoryPage>,
    },
    MarkRead {
        caller: Identity,
        order_id: OrderId,
        respond_to: Reply<()>,
    },
    UnreadCount {
        user: UserId,
        respond_to: Reply<u64>,
    },
}

/// Tunables of the chat actor.
#[derive(Debug, Clone, Copy)]
pub struct ChatSettings {
    pub persistence_timeout: Duration,
    pub history_page_size: usize,
}

pub struct ChatActor {
    receiver: mpsc::Receiver<ChatRequest>,
    store: Arc<dyn MessageStore>,
    orders: OrderClient,
    backplane: Arc<dyn Backplane>,
    settings: ChatSettings,
    last_created_at: Option<DateTime<Utc>>,
}

impl ChatActor {
    pub fn new(
        buffer_size: usize,
        store: Arc<dyn MessageStore>,
        orders: OrderClient,
        backplane: Arc<dyn Backplane>,
        settings: ChatSettings,
    ) -> (Self, ChatClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store,
            orders,
            backplane,
            settings,
            last_created_at: None,
        };
        (actor, ChatClient { sender })
    }

    pub async fn run_until(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(entity_type = "Chat", "Actor started");
        loop {
            let request = tokio::select! {
                request = self.receiver.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            };
            self.handle(request).await;
        }
        info!(entity_type = "Chat", "Shutdown");
    }

    async fn handle(&mut self, request: ChatRequest) {
        match request {
            ChatRequest::Send {
                sender,
                draft,
                respond_to,
            } => {
                let result = self.send(&sender, draft).await;
                let _ = respond_to.send(result);
            }
            ChatRequest::History {
                caller,
                order_id,
                respond_to,
            } => {
                let result = match self.authorized_order(&caller, order_id).await {
                    Ok(_) => self.store.messages_for_order(&order_id).await.map_err(ChatError::from),
                    Err(e) => Err(e),
                };
                let _ = respond_to.send(result);
            }
            ChatRequest::HistoryPage {
                caller,
                order_id,
                after,
                limit,
                respond_to,
            } => {
                let limit = limit.unwrap_or(self.settings.history_page_size).max(1);
                let result = match self.authorized_order(&caller, order_id).await {
                    Ok(_) => self
                        .store
                        .message_page(&order_id, after.as_ref(), limit)
                        .await
                        .map_err(|e| match e {
                            StoreError::Missing(cursor) => {
                                ChatError::Validation(format!("unknown history cursor {cursor}"))
                            }
                            other => ChatError::from(other),
                        }),
                    Err(e) => Err(e),
                };
                let _ = respond_to.send(result);
            }
            ChatRequest::MarkRead {
                caller,
                order_id,
                respond_to,
            } => {
                let result = match self.authorized_order(&caller, order_id).await {
                    Ok(_) => self.mark_read(&caller.user_id, order_id).await,
                    Err(e) => Err(e),
                };
                let _ = respond_to.send(result);
            }
            ChatRequest::UnreadCount { user, respond_to } => {
                let result = self.store.count_unread(&user).await.map_err(ChatError::from);
                let _ = respond_to.send(result);
            }
        }
    }

    async fn send(&mut self, sender: &Identity, draft: MessageDraft) -> Result<Message, ChatError> {
        let content = draft.content.trim();
        if content.is_empty() {
            return Err(ChatError::Validation("message content is empty".into()));
        }
        let order = self.authorized_order(sender, draft.order_id).await?;

        let receiver = draft.receiver.or_else(|| infer_receiver(&order, &sender.user_id));
        let now = Utc::now();
        let created_at = match self.last_created_at {
            Some(last) if last > now => last,
            _ => now,
        };
        let message = Message {
            id: MessageId::generate(),
            sender: sender.user_id.clone(),
            receiver,
            order_id: order.id,
            content: content.to_string(),
            read: false,
            created_at,
        };

        self.bounded(self.store.insert_message(&message))
            .await
            .inspect_err(|e| {
                error!(order_id = %message.order_id, error = %e, "Message not stored");
            })?;
        self.last_created_at = Some(created_at);

        let receivers = self.backplane.publish(&message).await?;
        info!(
            order_id = %message.order_id,
            message_id = %message.id,
            receivers,
            "Message sent"
        );
        Ok(message)
    }

    async fn mark_read(&self, user: &UserId, order_id: OrderId) -> Result<(), ChatError> {
        let changed = self.bounded(self.store.mark_read(&order_id, user)).await?;
        debug!(%order_id, %user, changed, "Marked read");
        Ok(())
    }

    /// Loads the order and checks the caller may chat about it: its owner or
    /// any staff member.
    async fn authorized_order(&self, caller: &Identity, order_id: OrderId) -> Result<Order, ChatError> {
        let order = self
            .orders
            .get(order_id)
            .await
            .map_err(|e| ChatError::from_order(order_id, e))?
            .ok_or(ChatError::OrderNotFound(order_id))?;
        if order.user != caller.user_id {
            caller.require(Role::Staff, "chat about other customers' orders")?;
        }
        Ok(order)
    }

    /// Runs a store write under the persistence timeout.
    async fn bounded<T>(
        &self,
        write: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, ChatError> {
        let limit = self.settings.persistence_timeout;
        match tokio::time::timeout(limit, write).await {
            Ok(result) => result.map_err(ChatError::from),
            Err(_) => {
                warn!(timeout_ms = limit.as_millis() as u64, "Store write timed out");
                Err(ChatError::Timeout(limit.as_millis() as u64))
            }
        }
    }
}

/// A message without an explicit receiver goes to the order's owner, unless the
/// owner is the one writing; then it is for the staff at large.
pub fn infer_receiver(order: &Order, sender: &UserId) -> Option<UserId> {
    (order.user != *sender).then(|| order.user.clone())
}

/// Handle for talking to the [`ChatActor`].
#[derive(Clone)]
pub struct ChatClient {
    sender: mpsc::Sender<ChatRequest>,
}

impl ChatClient {
    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> ChatRequest) -> Result<T, ChatError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(make(respond_to))
            .await
            .map_err(|_| ChatError::ActorCommunication("chat actor closed".into()))?;
        response
            .await
            .map_err(|_| ChatError::ActorCommunication("chat actor dropped response".into()))?
    }

    /// Stores and broadcasts a message from `sender`. Returns the stored message.
    #[instrument(skip(self, sender, draft), fields(caller = %sender.user_id, order_id = %draft.order_id))]
    pub async fn send_message(&self, sender: &Identity, draft: MessageDraft) -> Result<Message, ChatError> {
        let sender = sender.clone();
        self.request(|respond_to| ChatRequest::Send {
            sender,
            draft,
            respond_to,
        })
        .await
    }

    /// The whole conversation of an order, oldest first.
    #[instrument(skip(self, caller), fields(caller = %caller.user_id))]
    pub async fn history(&self, caller: &Identity, order_id: OrderId) -> Result<Vec<Message>, ChatError> {
        let caller = caller.clone();
        self.request(|respond_to| ChatRequest::History {
            caller,
            order_id,
            respond_to,
        })
        .await
    }

    /// One page of the conversation following `after`. `limit` defaults to the
    /// configured page size.
    #[instrument(skip(self, caller), fields(caller = %caller.user_id))]
    pub async fn history_page(
        &self,
        caller: &Identity,
        order_id: OrderId,
        after: Option<MessageId>,
        limit: Option<usize>,
    ) -> Result<HistoryPage, ChatError> {
        let caller = caller.clone();
        self.request(|respond_to| ChatRequest::HistoryPage {
            caller,
            order_id,
            after,
            limit,
            respond_to,
        })
        .await
    }

    /// Marks every message of the order addressed to the caller as read.
    /// Calling it again changes nothing.
    #[instrument(skip(self, caller), fields(caller = %caller.user_id))]
    pub async fn mark_read(&self, caller: &Identity, order_id: OrderId) -> Result<(), ChatError> {
        let caller = caller.clone();
        self.request(|respond_to| ChatRequest::MarkRead {
            caller,
            order_id,
            respond_to,
        })
        .await
    }

    /// Unread messages addressed to `user` across all orders.
    #[instrument(skip(self))]
    pub async fn unread_count(&self, user: &UserId) -> Result<u64, ChatError> {
        let user = user.clone();
        self.request(|respond_to| ChatRequest::UnreadCount { user, respond_to })
            .await
    }
}
