//! # System Lifecycle
//!
//! Creates, wires, starts and stops the actors.
//!
//! ## Wiring
//!
//! Actors are created first and receive their dependencies when they start
//! (late binding through each actor's context):
//!
//! 1. the menu actor, with no dependencies;
//! 2. the order actor, with a [`Scheduler`](crate::schedule::Scheduler) over the
//!    order store, the menu client and the status transition policy;
//! 3. the room registry, subscribed to the backplane before anything is published;
//! 4. the chat actor, with the message store, the order client and the backplane.
//!
//! The dependency graph is acyclic: orders call the menu, chat calls orders.
//!
//! ## Shutdown
//!
//! [`RestaurantSystem::shutdown`] flips a `watch` channel every actor listens
//! to, then awaits every actor task. Clients that outlive the system get
//! `ActorClosed`-style errors instead of hanging.

pub mod platform;
pub mod tracing;

pub use self::platform::RestaurantSystem;
pub use self::tracing::setup_tracing;
