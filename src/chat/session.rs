//! One connected chat client.
//!
//! A [`ChatSession`] turns the client's [`ClientEvent`]s into calls on the chat
//! actor and the room registry, and answers on the session's outbox. Messages
//! posted by others arrive on the same outbox through the registry.

use super::{ChatClient, ChatError, ClientEvent, RegistryClient, ServerEvent, SessionId};
use crate::clients::OrderClient;
use crate::model::{Identity, MessageDraft, OrderId};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

pub struct ChatSession {
    id: SessionId,
    identity: Identity,
    chat: ChatClient,
    registry: RegistryClient,
    orders: OrderClient,
    outbox: mpsc::Sender<ServerEvent>,
    disconnected: bool,
}

impl ChatSession {
    /// Registers a new session and returns it with the receiving end of its
    /// outbox. `buffer` bounds the outbox.
    pub async fn connect(
        identity: Identity,
        chat: ChatClient,
        registry: RegistryClient,
        orders: OrderClient,
        buffer: usize,
    ) -> Result<(Self, mpsc::Receiver<ServerEvent>), ChatError> {
        let id = SessionId::generate();
        let (outbox, inbox) = mpsc::channel(buffer);
        registry.register(id, outbox.clone()).await?;
        info!(session = %id, user = %identity.user_id, "Session connected");
        let session = Self {
            id,
            identity,
            chat,
            registry,
            orders,
            outbox,
            disconnected: false,
        };
        Ok((session, inbox))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Handles one raw JSON frame. Malformed frames are answered with an
    /// `error` event rather than closing the session.
    pub async fn handle_json(&self, raw: &str) -> Result<(), ChatError> {
        match ClientEvent::from_json(raw) {
            Ok(event) => self.handle(event).await,
            Err(e) => {
                debug!(session = %self.id, error = %e, "Malformed frame");
                self.reply(ServerEvent::error(&e)).await
            }
        }
    }

    /// Handles one client event.
    ///
    /// Failures of the request itself are reported to the client as events;
    /// the returned error means the session's outbox is gone.
    #[instrument(skip(self), fields(session = %self.id))]
    pub async fn handle(&self, event: ClientEvent) -> Result<(), ChatError> {
        match event {
            ClientEvent::JoinChat { order_id } => match self.join(order_id).await {
                Ok(_) => Ok(()),
                Err(e) => self.reply(ServerEvent::error(&e)).await,
            },
            ClientEvent::LeaveChat { order_id } => match self.registry.leave(order_id, self.id).await {
                Ok(_) => Ok(()),
                Err(e) => self.reply(ServerEvent::error(&e)).await,
            },
            ClientEvent::SendMessage(draft) => self.send(draft).await,
        }
    }

    /// Joins the room of an existing order the caller may see. Returns `false`
    /// if the session was already in it.
    pub async fn join(&self, order_id: OrderId) -> Result<bool, ChatError> {
        self.orders
            .get_order(&self.identity, order_id)
            .await
            .map_err(|e| ChatError::from_order(order_id, e))?;
        self.registry.join(order_id, self.id).await
    }

    async fn send(&self, draft: MessageDraft) -> Result<(), ChatError> {
        let order_id = draft.order_id;
        let event = match self.chat.send_message(&self.identity, draft).await {
            Ok(message) => ServerEvent::ack(&message),
            Err(e) => {
                warn!(session = %self.id, %order_id, error = %e, "Delivery failed");
                ServerEvent::delivery_failed(order_id, &e)
            }
        };
        self.reply(event).await
    }

    async fn reply(&self, event: ServerEvent) -> Result<(), ChatError> {
        self.outbox
            .send(event)
            .await
            .map_err(|_| ChatError::ActorCommunication(format!("{} outbox closed", self.id)))
    }

    /// Leaves every room. Returns how many rooms the session was in.
    pub async fn disconnect(mut self) -> Result<usize, ChatError> {
        let left = self.registry.disconnect(self.id).await?;
        self.disconnected = true;
        info!(session = %self.id, rooms_left = left, "Session closed");
        Ok(left)
    }
}

/// A session dropped by its transport without [`ChatSession::disconnect`]
/// still leaves every room.
impl Drop for ChatSession {
    fn drop(&mut self) {
        if !self.disconnected {
            debug!(session = %self.id, "Session dropped, releasing rooms");
            self.registry.release(self.id);
        }
    }
}
