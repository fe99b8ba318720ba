//! # ActorEntity Trait
//!
//! The contract a persisted resource (an [`Order`](crate::model::Order), a
//! [`MenuItem`](crate::model::MenuItem)) implements to be served by the generic
//! [`ResourceActor`](crate::framework::ResourceActor).
//!
//! All hooks run *inside* the actor task, one request at a time. A hook that
//! reads the backing store and the write that follows it therefore form a single
//! step with respect to every other request for the same resource type. The
//! order scheduler relies on this to make "check for conflicts, then insert"
//! race-free.

use crate::store::Repository;
use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any resource entity must implement to be managed by `ResourceActor`.
///
/// Associated types keep every operation type-safe: an `Order` actor only accepts
/// `OrderCreate` payloads, answers `OrderQuery` with `OrderQueryResult`, and fails
/// with `OrderError`.
#[async_trait]
pub trait ActorEntity: Clone + Debug + Send + Sync + 'static {
    /// The unique identifier for this entity.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// The data required to update an existing instance.
    type Update: Send + Sync + Debug;

    /// Resource-specific operations on one instance.
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// Read-only questions about the whole collection.
    type Query: Send + Sync + Debug;

    /// The answer to a [`ActorEntity::Query`].
    type QueryResult: Send + Sync + Debug;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync;

    /// One error enum per actor; clients downcast it back out of
    /// [`FrameworkError::EntityError`](crate::framework::FrameworkError::EntityError).
    type Error: std::error::Error + Send + Sync + 'static;

    fn id(&self) -> &Self::Id;

    /// Construct the full entity from the allocated id and the payload.
    /// Called synchronously before `on_create`.
    fn from_create_params(
        id: Self::Id,
        params: Self::Create,
        ctx: &Self::Context,
    ) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks (Async) ---

    /// Runs after construction and before the entity is persisted.
    /// An error here means nothing is written.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Applies an update in place; the actor persists the result.
    async fn on_update(&mut self, update: Self::Update, ctx: &Self::Context)
        -> Result<(), Self::Error>;

    /// Runs before the entity is removed.
    async fn on_delete(&self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handle a custom resource-specific action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;

    /// Answer a collection-level query from the actor's point of view.
    async fn handle_query(
        query: Self::Query,
        repository: &dyn Repository<Self>,
        ctx: &Self::Context,
    ) -> Result<Self::QueryResult, Self::Error>;
}
