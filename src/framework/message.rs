//! # Generic Messages
//!
//! The request envelope sent from a [`ResourceClient`](crate::framework::ResourceClient)
//! to its [`ResourceActor`](crate::framework::ResourceActor).

use crate::framework::{ActorEntity, FrameworkError};
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Internal message type sent to the actor to request operations.
///
/// The variants map to CRUD on a single resource, plus `Action` for
/// resource-specific mutations and `Query` for read-only questions about the
/// whole collection (for orders: "is this slot free?", "which orders belong to
/// this customer?").
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Update {
        id: T::Id,
        update: T::Update,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
    Query {
        query: T::Query,
        respond_to: Response<T::QueryResult>,
    },
}
