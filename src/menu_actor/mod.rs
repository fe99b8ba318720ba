//! # Menu Actor
//!
//! The menu item resource: CRUD plus the [`MenuAction::SetAvailability`] action.
//! Order creation consults it to make sure every referenced item exists and can
//! currently be ordered.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](crate::framework::ActorEntity) implementation for [`MenuItem`]
//! - [`error`] - [`MenuError`] type for type-safe error handling
//! - [`actions`] - [`MenuAction`], [`MenuActionResult`] and [`MenuQuery`]
//! - [`new()`] - Factory function that creates the actor and client

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::clients::MenuClient;
use crate::framework::ResourceActor;
use crate::model::{MenuItem, MenuItemId};
use crate::store::Repository;
use std::sync::Arc;

/// Creates a new Menu actor and its client.
pub fn new(
    buffer_size: usize,
    repository: Arc<dyn Repository<MenuItem>>,
) -> (ResourceActor<MenuItem>, MenuClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size, repository, MenuItemId::generate);
    (actor, MenuClient::new(generic_client))
}
