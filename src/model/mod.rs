//! Pure data structures (DTOs) for orders, menu items, chat messages and caller identity.
//!
//! [`Order`] and [`MenuItem`] implement the [`ActorEntity`](crate::framework::ActorEntity)
//! trait (see [`crate::order_actor`] and [`crate::menu_actor`]); [`Message`] is persisted
//! by the chat actor and never mutated apart from its `read` flag.

pub mod identity;
pub mod ids;
pub mod menu;
pub mod message;
pub mod order;

pub use identity::*;
pub use ids::*;
pub use menu::*;
pub use message::*;
pub use order::*;
