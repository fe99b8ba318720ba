//! # Room Registry
//!
//! One actor per process that owns the room memberships of the local sessions
//! and delivers backplane messages to them.
//!
//! Joins, leaves, disconnects and deliveries are all handled by the same task,
//! so a delivery never sees a half-applied membership change.
//!
//! Each session has a bounded outbox. Delivery never waits on a session:
//! - outbox full: the event is dropped for that session and a warning logged;
//! - outbox closed: the session is evicted from every room.

use super::{ChatError, ServerEvent};
use crate::model::{Message, OrderId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Identifies one connected client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session_{}", self.0.simple())
    }
}

#[derive(Debug)]
enum RegistryRequest {
    Register {
        session: SessionId,
        outbox: mpsc::Sender<ServerEvent>,
        respond_to: oneshot::Sender<()>,
    },
    Join {
        order_id: OrderId,
        session: SessionId,
        respond_to: oneshot::Sender<Result<bool, ChatError>>,
    },
    Leave {
        order_id: OrderId,
        session: SessionId,
        respond_to: oneshot::Sender<bool>,
    },
    Disconnect {
        session: SessionId,
        respond_to: oneshot::Sender<usize>,
    },
    Members {
        order_id: OrderId,
        respond_to: oneshot::Sender<Vec<SessionId>>,
    },
}

/// The registry actor. Start it with [`RoomRegistry::run_until`].
pub struct RoomRegistry {
    receiver: mpsc::Receiver<RegistryRequest>,
    messages: broadcast::Receiver<Message>,
    rooms: HashMap<OrderId, HashSet<SessionId>>,
    outboxes: HashMap<SessionId, mpsc::Sender<ServerEvent>>,
}

impl RoomRegistry {
    /// `messages` is a backplane subscription; it should be taken before
    /// anything is published.
    pub fn new(
        buffer_size: usize,
        messages: broadcast::Receiver<Message>,
    ) -> (Self, RegistryClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let registry = Self {
            receiver,
            messages,
            rooms: HashMap::new(),
            outboxes: HashMap::new(),
        };
        (registry, RegistryClient { sender })
    }

    pub async fn run_until(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(entity_type = "RoomRegistry", "Actor started");
        let mut backplane_open = true;

        loop {
            tokio::select! {
                request = self.receiver.recv() => match request {
                    Some(request) => self.handle(request),
                    None => break,
                },
                message = self.messages.recv(), if backplane_open => match message {
                    Ok(message) => self.deliver(&message),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(entity_type = "RoomRegistry", skipped, "Backplane lagged, messages lost");
                    }
                    Err(RecvError::Closed) => {
                        debug!(entity_type = "RoomRegistry", "Backplane closed");
                        backplane_open = false;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(
            entity_type = "RoomRegistry",
            rooms = self.rooms.len(),
            sessions = self.outboxes.len(),
            "Shutdown"
        );
    }

    fn handle(&mut self, request: RegistryRequest) {
        match request {
            RegistryRequest::Register {
                session,
                outbox,
                respond_to,
            } => {
                self.outboxes.insert(session, outbox);
                debug!(%session, "Session registered");
                let _ = respond_to.send(());
            }
            RegistryRequest::Join {
                order_id,
                session,
                respond_to,
            } => {
                let result = if self.outboxes.contains_key(&session) {
                    let added = self.rooms.entry(order_id).or_default().insert(session);
                    debug!(%session, %order_id, added, "Join");
                    Ok(added)
                } else {
                    warn!(%session, %order_id, "Join from unknown session");
                    Err(ChatError::Validation(format!("{session} is not connected")))
                };
                let _ = respond_to.send(result);
            }
            RegistryRequest::Leave {
                order_id,
                session,
                respond_to,
            } => {
                let removed = self.remove_member(&order_id, &session);
                debug!(%session, %order_id, removed, "Leave");
                let _ = respond_to.send(removed);
            }
            RegistryRequest::Disconnect {
                session,
                respond_to,
            } => {
                let left = self.evict(&session);
                info!(%session, rooms_left = left, "Session disconnected");
                let _ = respond_to.send(left);
            }
            RegistryRequest::Members {
                order_id,
                respond_to,
            } => {
                let mut members: Vec<SessionId> = self
                    .rooms
                    .get(&order_id)
                    .map(|room| room.iter().copied().collect())
                    .unwrap_or_default();
                members.sort();
                let _ = respond_to.send(members);
            }
        }
    }

    fn deliver(&mut self, message: &Message) {
        let Some(room) = self.rooms.get(&message.order_id) else {
            debug!(order_id = %message.order_id, "No local members");
            return;
        };

        let mut closed = Vec::new();
        let mut delivered = 0usize;
        for session in room {
            let Some(outbox) = self.outboxes.get(session) else {
                continue;
            };
            let event = ServerEvent::NewMessage {
                message: message.clone(),
            };
            match outbox.try_send(event) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(%session, message_id = %message.id, "Session outbox full, event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*session),
            }
        }
        debug!(order_id = %message.order_id, message_id = %message.id, delivered, "Delivered");

        for session in closed {
            let left = self.evict(&session);
            info!(%session, rooms_left = left, "Closed session evicted");
        }
    }

    fn remove_member(&mut self, order_id: &OrderId, session: &SessionId) -> bool {
        let Some(room) = self.rooms.get_mut(order_id) else {
            return false;
        };
        let removed = room.remove(session);
        if room.is_empty() {
            self.rooms.remove(order_id);
        }
        removed
    }

    /// Removes `session` from every room; returns how many rooms it was in.
    fn evict(&mut self, session: &SessionId) -> usize {
        self.outboxes.remove(session);
        let mut left = 0;
        self.rooms.retain(|_, room| {
            if room.remove(session) {
                left += 1;
            }
            !room.is_empty()
        });
        left
    }
}

/// Handle for talking to the [`RoomRegistry`].
#[derive(Clone)]
pub struct RegistryClient {
    sender: mpsc::Sender<RegistryRequest>,
}

impl RegistryClient {
    async fn request<R>(
        &self,
        make: impl FnOnce(oneshot::Sender<R>) -> RegistryRequest,
    ) -> Result<R, ChatError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(make(respond_to))
            .await
            .map_err(|_| ChatError::ActorCommunication("room registry closed".into()))?;
        response
            .await
            .map_err(|_| ChatError::ActorCommunication("room registry dropped response".into()))
    }

    /// Makes `outbox` the delivery target for `session`.
    pub async fn register(
        &self,
        session: SessionId,
        outbox: mpsc::Sender<ServerEvent>,
    ) -> Result<(), ChatError> {
        self.request(|respond_to| RegistryRequest::Register {
            session,
            outbox,
            respond_to,
        })
        .await
    }

    /// Adds `session` to the room of `order_id`. Returns `false` if it was
    /// already a member.
    pub async fn join(&self, order_id: OrderId, session: SessionId) -> Result<bool, ChatError> {
        self.request(|respond_to| RegistryRequest::Join {
            order_id,
            session,
            respond_to,
        })
        .await?
    }

    /// Returns `false` if `session` was not in the room.
    pub async fn leave(&self, order_id: OrderId, session: SessionId) -> Result<bool, ChatError> {
        self.request(|respond_to| RegistryRequest::Leave {
            order_id,
            session,
            respond_to,
        })
        .await
    }

    /// Removes `session` from every room. Returns how many rooms it left.
    pub async fn disconnect(&self, session: SessionId) -> Result<usize, ChatError> {
        self.request(|respond_to| RegistryRequest::Disconnect {
            session,
            respond_to,
        })
        .await
    }

    /// Queues a disconnect without waiting for it, for callers that cannot
    /// await such as `Drop`. A closed registry has nothing left to clean up.
    pub fn release(&self, session: SessionId) {
        let (respond_to, _) = oneshot::channel();
        let request = RegistryRequest::Disconnect {
            session,
            respond_to,
        };
        match self.sender.try_send(request) {
            Ok(()) | Err(mpsc::error::TrySendError::Closed(_)) => {}
            Err(mpsc::error::TrySendError::Full(request)) => {
                match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => {
                        let sender = self.sender.clone();
                        runtime.spawn(async move {
                            let _ = sender.send(request).await;
                        });
                    }
                    Err(_) => warn!(%session, "Registry busy and no runtime, session not released"),
                }
            }
        }
    }

    /// Local sessions currently in the room of `order_id`.
    pub async fn members(&self, order_id: OrderId) -> Result<Vec<SessionId>, ChatError> {
        self.request(|respond_to| RegistryRequest::Members {
            order_id,
            respond_to,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MessageId, UserId};
    use chrono::Utc;

    fn message(order_id: OrderId, content: &str) -> Message {
        Message {
            id: MessageId::generate(),
            sender: UserId::new("alice"),
            receiver: None,
            order_id,
            content: content.into(),
            read: false,
            created_at: Utc::now(),
        }
    }

    fn start() -> (broadcast::Sender<Message>, RegistryClient, watch::Sender<bool>) {
        let (publish, subscription) = broadcast::channel(16);
        let (registry, client) = RoomRegistry::new(8, subscription);
        let (stop, shutdown) = watch::channel(false);
        tokio::spawn(registry.run_until(shutdown));
        (publish, client, stop)
    }

    async fn connect(client: &RegistryClient, buffer: usize) -> (SessionId, mpsc::Receiver<ServerEvent>) {
        let session = SessionId::generate();
        let (outbox, inbox) = mpsc::channel(buffer);
        client.register(session, outbox).await.unwrap();
        (session, inbox)
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        let (_publish, client, _stop) = start();
        let (session, _inbox) = connect(&client, 4).await;
        let order = OrderId::generate();

        assert!(client.join(order, session).await.unwrap());
        assert!(!client.join(order, session).await.unwrap());
        assert_eq!(client.members(order).await.unwrap(), vec![session]);
    }

    #[tokio::test]
    async fn test_unknown_session_cannot_join() {
        let (_publish, client, _stop) = start();
        let err = client
            .join(OrderId::generate(), SessionId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    #[tokio::test]
    async fn test_disconnect_leaves_every_room() {
        let (_publish, client, _stop) = start();
        let (session, _inbox) = connect(&client, 4).await;
        let (a, b) = (OrderId::generate(), OrderId::generate());
        client.join(a, session).await.unwrap();
        client.join(b, session).await.unwrap();

        assert_eq!(client.disconnect(session).await.unwrap(), 2);
        assert!(client.members(a).await.unwrap().is_empty());
        assert!(client.members(b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_release_leaves_every_room_without_waiting() {
        let (_publish, client, _stop) = start();
        let (session, _inbox) = connect(&client, 4).await;
        let order = OrderId::generate();
        client.join(order, session).await.unwrap();

        client.release(session);
        // Requests are served in order, so the release is applied by now.
        assert!(client.members(order).await.unwrap().is_empty());
        let err = client.join(order, session).await.unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    #[tokio::test]
    async fn test_closed_outbox_is_evicted_on_delivery() {
        let (publish, client, _stop) = start();
        let (gone, inbox) = connect(&client, 4).await;
        let (stays, mut stays_inbox) = connect(&client, 4).await;
        let order = OrderId::generate();
        client.join(order, gone).await.unwrap();
        client.join(order, stays).await.unwrap();
        drop(inbox);

        publish.send(message(order, "hello")).unwrap();
        assert!(matches!(
            stays_inbox.recv().await,
            Some(ServerEvent::NewMessage { .. })
        ));
        assert_eq!(client.members(order).await.unwrap(), vec![stays]);
    }

    #[tokio::test]
    async fn test_full_outbox_drops_without_blocking_others() {
        let (publish, client, _stop) = start();
        let (slow, mut slow_inbox) = connect(&client, 1).await;
        let (fast, mut fast_inbox) = connect(&client, 4).await;
        let order = OrderId::generate();
        client.join(order, slow).await.unwrap();
        client.join(order, fast).await.unwrap();

        publish.send(message(order, "one")).unwrap();
        publish.send(message(order, "two")).unwrap();

        for expected in ["one", "two"] {
            match fast_inbox.recv().await {
                Some(ServerEvent::NewMessage { message }) => assert_eq!(message.content, expected),
                other => panic!("unexpected event {other:?}"),
            }
        }
        // Members barrier: both deliveries have been attempted by now.
        assert_eq!(client.members(order).await.unwrap().len(), 2);
        assert!(matches!(slow_inbox.try_recv(), Ok(ServerEvent::NewMessage { .. })));
        assert!(slow_inbox.try_recv().is_err());
    }
}
