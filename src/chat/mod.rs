//! # Order Chat
//!
//! Real-time conversation attached to an order.
//!
//! ```text
//! ChatSession ──send──▶ ChatActor ──store──▶ MessageStore
//!                            │
//!                         publish
//!                            ▼
//!                        Backplane ──▶ RoomRegistry ──▶ session outboxes
//! ```
//!
//! ## Structure
//!
//! - [`service`] - [`ChatActor`] and [`ChatClient`]: store, read flags, history
//! - [`backplane`] - [`Backplane`] trait and the in-process [`BroadcastBackplane`]
//! - [`registry`] - [`RoomRegistry`] actor: room membership and fan-out
//! - [`session`] - [`ChatSession`]: one connected client
//! - [`events`] - the JSON [`ClientEvent`] / [`ServerEvent`] protocol
//! - [`error`] - [`ChatError`]

pub mod backplane;
pub mod error;
pub mod events;
pub mod registry;
pub mod service;
pub mod session;

pub use backplane::{Backplane, BroadcastBackplane};
pub use error::ChatError;
pub use events::{ClientEvent, ServerEvent};
pub use registry::{RegistryClient, RoomRegistry, SessionId};
pub use service::{infer_receiver, ChatActor, ChatClient, ChatSettings};
pub use session::ChatSession;
