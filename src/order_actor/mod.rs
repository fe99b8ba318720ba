//! # Order Actor
//!
//! The single writer for orders. Every create, update, delete and query of an
//! order passes through one [`ResourceActor<Order>`], which is what makes the
//! slot conflict check and the insert one atomic step.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](crate::framework::ActorEntity) implementation for [`Order`]
//!   with its [`OrderContext`], [`OrderQuery`] and [`OrderQueryResult`]
//! - [`error`] - [`OrderError`] type for type-safe error handling
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Dependencies
//!
//! The actor is started with an [`OrderContext`] holding the
//! [`Scheduler`](crate::schedule::Scheduler), a [`MenuClient`](crate::clients::MenuClient)
//! and the configured [`TransitionPolicy`](crate::config::TransitionPolicy):
//!
//! ```rust,ignore
//! let (order_actor, order_client) = order_actor::new(32, store.clone());
//! tokio::spawn(order_actor.run(OrderContext { scheduler, menu: menu_client, policy }));
//! ```

pub mod entity;
pub mod error;

pub use entity::{OrderAction, OrderContext, OrderQuery, OrderQueryResult};
pub use error::*;

use crate::clients::OrderClient;
use crate::framework::ResourceActor;
use crate::model::{Order, OrderId};
use crate::store::Repository;
use std::sync::Arc;

/// Creates a new Order actor and its client.
pub fn new(
    buffer_size: usize,
    repository: Arc<dyn Repository<Order>>,
) -> (ResourceActor<Order>, OrderClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size, repository, OrderId::generate);
    (actor, OrderClient::new(generic_client))
}
