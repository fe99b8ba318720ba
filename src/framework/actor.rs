//! # Generic Actor Server
//!
//! [`ResourceActor`] is the single writer for one entity type. It owns the
//! receiving end of the request channel and a handle to the backing
//! [`Repository`], and processes requests strictly one after another.

use crate::framework::{ActorEntity, FrameworkError, ResourceClient, ResourceRequest};
use crate::store::Repository;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// The generic actor that serves a collection of entities.
///
/// **Concurrency model**: every request for this entity type goes through one
/// Tokio task. Entity hooks may read the repository and the actor then writes,
/// with no other request of the same type interleaving in between. This is what
/// makes the order scheduler's conflict check and insert atomic without locks or
/// storage transactions.
///
/// ## Operations
///
/// * **Create**: allocate an id, `from_create_params`, `on_create`, `insert`.
///   Nothing is written if either hook fails.
/// * **Get**: `load` by id.
/// * **Update**: `load`, `on_update`, `save`.
/// * **Delete**: `load`, `on_delete`, `remove`.
/// * **Action**: `load`, `handle_action`, `save`.
/// * **Query**: `handle_query` against the repository.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    repository: Arc<dyn Repository<T>>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// `buffer_size` bounds the request queue; callers wait when it is full.
    pub fn new(
        buffer_size: usize,
        repository: Arc<dyn Repository<T>>,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            repository,
            next_id_fn: Box::new(next_id_fn),
        };
        (actor, ResourceClient::new(sender))
    }

    /// Runs the event loop until every client has been dropped.
    pub async fn run(self, context: T::Context) {
        let (_keep_open, shutdown) = watch::channel(false);
        self.run_until(context, shutdown).await;
    }

    /// Runs the event loop until every client has been dropped or `shutdown`
    /// flips to `true` (or its sender goes away).
    ///
    /// The `context` is injected into every entity hook, which lets dependencies
    /// be wired after the actor was constructed.
    pub async fn run_until(mut self, context: T::Context, mut shutdown: watch::Receiver<bool>) {
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        loop {
            let msg = tokio::select! {
                msg = self.receiver.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!(entity_type, "Shutdown signalled");
                        break;
                    }
                    continue;
                }
            };
            self.handle(msg, &context, entity_type).await;
        }

        info!(entity_type, "Shutdown");
    }

    async fn handle(&self, msg: ResourceRequest<T>, context: &T::Context, entity_type: &str) {
        match msg {
            ResourceRequest::Create { params, respond_to } => {
                debug!(entity_type, ?params, "Create");
                let _ = respond_to.send(self.create(params, context, entity_type).await);
            }
            ResourceRequest::Get { id, respond_to } => {
                let result = self.repository.load(&id).await.map_err(FrameworkError::from);
                debug!(entity_type, %id, found = matches!(result, Ok(Some(_))), "Get");
                let _ = respond_to.send(result);
            }
            ResourceRequest::Update { id, update, respond_to } => {
                debug!(entity_type, %id, ?update, "Update");
                let result = match self.load_existing(&id, entity_type).await {
                    Ok(mut item) => match item.on_update(update, context).await {
                        Ok(()) => match self.repository.save(&item).await {
                            Ok(()) => {
                                info!(entity_type, %id, "Updated");
                                Ok(item)
                            }
                            Err(e) => Err(self.storage_failed(e, entity_type)),
                        },
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Update failed");
                            Err(FrameworkError::EntityError(Box::new(e)))
                        }
                    },
                    Err(e) => Err(e),
                };
                let _ = respond_to.send(result);
            }
            ResourceRequest::Delete { id, respond_to } => {
                debug!(entity_type, %id, "Delete");
                let result = match self.load_existing(&id, entity_type).await {
                    Ok(item) => match item.on_delete(context).await {
                        Ok(()) => match self.repository.remove(&id).await {
                            Ok(_) => {
                                info!(entity_type, %id, "Deleted");
                                Ok(())
                            }
                            Err(e) => Err(self.storage_failed(e, entity_type)),
                        },
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "on_delete failed");
                            Err(FrameworkError::EntityError(Box::new(e)))
                        }
                    },
                    Err(e) => Err(e),
                };
                let _ = respond_to.send(result);
            }
            ResourceRequest::Action { id, action, respond_to } => {
                debug!(entity_type, %id, ?action, "Action");
                let result = match self.load_existing(&id, entity_type).await {
                    Ok(mut item) => match item.handle_action(action, context).await {
                        Ok(output) => match self.repository.save(&item).await {
                            Ok(()) => {
                                info!(entity_type, %id, "Action ok");
                                Ok(output)
                            }
                            Err(e) => Err(self.storage_failed(e, entity_type)),
                        },
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Action failed");
                            Err(FrameworkError::EntityError(Box::new(e)))
                        }
                    },
                    Err(e) => Err(e),
                };
                let _ = respond_to.send(result);
            }
            ResourceRequest::Query { query, respond_to } => {
                debug!(entity_type, ?query, "Query");
                let result = T::handle_query(query, self.repository.as_ref(), context)
                    .await
                    .map_err(|e| {
                        warn!(entity_type, error = %e, "Query failed");
                        FrameworkError::EntityError(Box::new(e))
                    });
                let _ = respond_to.send(result);
            }
        }
    }

    async fn create(
        &self,
        params: T::Create,
        context: &T::Context,
        entity_type: &str,
    ) -> Result<T, FrameworkError> {
        let id = (self.next_id_fn)();
        let mut item = T::from_create_params(id.clone(), params, context).map_err(|e| {
            warn!(entity_type, error = %e, "Create failed");
            FrameworkError::EntityError(Box::new(e))
        })?;

        if let Err(e) = item.on_create(context).await {
            warn!(entity_type, error = %e, "on_create failed");
            return Err(FrameworkError::EntityError(Box::new(e)));
        }

        self.repository
            .insert(&item)
            .await
            .map_err(|e| self.storage_failed(e, entity_type))?;
        info!(entity_type, %id, "Created");
        Ok(item)
    }

    async fn load_existing(&self, id: &T::Id, entity_type: &str) -> Result<T, FrameworkError> {
        match self.repository.load(id).await {
            Ok(Some(item)) => Ok(item),
            Ok(None) => {
                warn!(entity_type, %id, "Not found");
                Err(FrameworkError::NotFound(id.to_string()))
            }
            Err(e) => Err(self.storage_failed(e, entity_type)),
        }
    }

    fn storage_failed(&self, e: crate::store::StoreError, entity_type: &str) -> FrameworkError {
        warn!(entity_type, error = %e, "Storage failed");
        FrameworkError::Storage(e)
    }
}
