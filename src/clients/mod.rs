//! Type-safe wrappers around [`ResourceClient`](crate::framework::ResourceClient).
//!
//! The wrappers are where caller identity is checked: the actors trust every
//! request they receive.

pub mod actor_client;
pub mod menu_client;
pub mod order_client;

pub use actor_client::*;
pub use menu_client::*;
pub use order_client::*;
