//! Generic actor framework for resource management.
//!
//! Each resource type (orders, menu items) gets one [`ResourceActor`] that owns
//! every write to that type. Callers talk to it through a cloneable
//! [`ResourceClient`]; the business rules live in the [`ActorEntity`] hooks.
//!
//! # Main Components
//!
//! - [`ActorEntity`] - Trait that resource types implement to be managed by actors
//! - [`ResourceActor`] - Generic actor that serves one entity type sequentially
//! - [`ResourceClient`] - Type-safe handle for sending requests to an actor
//! - [`FrameworkError`] - Errors raised by the plumbing, wrapping entity errors
//!
//! # Testing
//!
//! See [`mock`] for utilities to test clients without spawning full actors.

pub mod actor;
pub mod client;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;

pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};
