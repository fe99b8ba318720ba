use crate::chat::{
    Backplane, BroadcastBackplane, ChatActor, ChatClient, ChatError, ChatSession, ChatSettings,
    RegistryClient, RoomRegistry, ServerEvent,
};
use crate::clients::{MenuClient, OrderClient};
use crate::config::PlatformConfig;
use crate::model::{Identity, MenuItem, Order};
use crate::order_actor::OrderContext;
use crate::schedule::Scheduler;
use crate::store::{MemoryStore, MessageStore, OrderStore, Repository, Store};
use crate::{menu_actor, order_actor};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

/// Owns the running actors and hands out their clients.
///
/// Must be created inside a Tokio runtime; every actor is spawned right away.
pub struct RestaurantSystem {
    pub order_client: OrderClient,
    pub menu_client: MenuClient,
    pub chat_client: ChatClient,
    pub registry: RegistryClient,
    config: PlatformConfig,
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl RestaurantSystem {
    /// Starts the system on `store` with an in-process backplane.
    pub fn new<S: Store + 'static>(config: PlatformConfig, store: Arc<S>) -> Self {
        let backplane = Arc::new(BroadcastBackplane::new(config.backplane_capacity));
        Self::with_backplane(config, store, backplane)
    }

    /// Starts the system on a fresh [`MemoryStore`].
    pub fn in_memory(config: PlatformConfig) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()))
    }

    pub fn with_backplane<S: Store + 'static>(
        config: PlatformConfig,
        store: Arc<S>,
        backplane: Arc<dyn Backplane>,
    ) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);

        // 1. Create actors (no dependencies yet)
        let menu_repo: Arc<dyn Repository<MenuItem>> = store.clone();
        let order_repo: Arc<dyn Repository<Order>> = store.clone();
        let order_store: Arc<dyn OrderStore> = store.clone();
        let message_store: Arc<dyn MessageStore> = store;

        let (menu_actor, menu_client) = menu_actor::new(config.actor_buffer, menu_repo);
        let (order_actor, order_client) = order_actor::new(config.actor_buffer, order_repo);
        let (registry_actor, registry) =
            RoomRegistry::new(config.actor_buffer, backplane.subscribe());
        let settings = ChatSettings {
            persistence_timeout: config.persistence_timeout(),
            history_page_size: config.history_page_size,
        };
        let (chat_actor, chat_client) = ChatActor::new(
            config.actor_buffer,
            message_store,
            order_client.clone(),
            backplane,
            settings,
        );

        // 2. Start actors with their dependencies injected
        let order_context = OrderContext {
            scheduler: Scheduler::new(order_store, config.default_duration_minutes),
            menu: menu_client.clone(),
            policy: config.status_policy,
        };
        let handles = vec![
            tokio::spawn(menu_actor.run_until((), shutdown_rx.clone())),
            tokio::spawn(order_actor.run_until(order_context, shutdown_rx.clone())),
            tokio::spawn(registry_actor.run_until(shutdown_rx.clone())),
            tokio::spawn(chat_actor.run_until(shutdown_rx)),
        ];
        info!(actors = handles.len(), "Restaurant system started");

        Self {
            order_client,
            menu_client,
            chat_client,
            registry,
            config,
            shutdown,
            handles,
        }
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Opens a chat session for `identity`. Events for the client arrive on the
    /// returned receiver.
    pub async fn connect(
        &self,
        identity: Identity,
    ) -> Result<(ChatSession, mpsc::Receiver<ServerEvent>), ChatError> {
        ChatSession::connect(
            identity,
            self.chat_client.clone(),
            self.registry.clone(),
            self.order_client.clone(),
            self.config.session_buffer,
        )
        .await
    }

    /// Signals every actor to stop and waits for them.
    ///
    /// Requests already being processed finish; queued ones are dropped and
    /// their callers see an actor communication error.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
        info!("Restaurant system stopped");
    }
}
