//! # Diner
//!
//! > **Order scheduling and order-scoped chat for a restaurant, built from resource actors.**
//!
//! Customers place orders for a time slot and talk to the staff about them;
//! staff move orders through the kitchen workflow; managers run the menu.
//!
//! ## Design
//!
//! ### No double-booking
//! Two active orders may never claim overlapping slots. All order writes go
//! through one actor ([`ResourceActor<Order>`](framework::ResourceActor)); the
//! conflict check runs in its `on_create` hook, so checking and inserting is a
//! single step that no other booking can interleave with.
//!
//! ### Rooms per order
//! A chat message is stored, then published on a [`Backplane`](chat::Backplane).
//! The [`RoomRegistry`](chat::RoomRegistry) delivers it to the sessions that
//! joined that order's room and to nobody else. The sender is told whether the
//! message made it (`message_ack`) or not (`delivery_failed`).
//!
//! ### Context injection
//! Actors are created first and get their dependencies when started, through
//! the entity's `Context` type. See [`lifecycle`].
//!
//! ## Module Tour
//!
//! - [`framework`]: the generic [`ActorEntity`](framework::ActorEntity) /
//!   [`ResourceActor`](framework::ResourceActor) / [`ResourceClient`](framework::ResourceClient)
//!   machinery and its [`mock`](framework::mock) helpers.
//! - [`model`]: plain data: orders, menu items, messages, identities.
//! - [`schedule`]: [`TimeSlot`](schedule::TimeSlot) and the conflict checker.
//! - [`order_actor`], [`menu_actor`]: the entity implementations.
//! - [`clients`]: typed clients that also enforce roles.
//! - [`chat`]: chat actor, room registry, backplane, sessions and the JSON events.
//! - [`store`]: storage traits and the in-memory backend.
//! - [`config`]: [`PlatformConfig`](config::PlatformConfig) loaded from TOML.
//! - [`lifecycle`]: [`RestaurantSystem`](lifecycle::RestaurantSystem) and tracing setup.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use diner::config::PlatformConfig;
//! use diner::lifecycle::RestaurantSystem;
//! use diner::model::{Identity, MenuItemCreate, OrderCreate, OrderItem};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let system = RestaurantSystem::in_memory(PlatformConfig::default());
//!
//!     let manager = Identity::manager("max");
//!     let burger = system
//!         .menu_client
//!         .create_item(&manager, MenuItemCreate::new("Burger", "Beef patty", 9.5))
//!         .await?;
//!
//!     let alice = Identity::customer("alice");
//!     let order = system
//!         .order_client
//!         .create_order(
//!             &alice,
//!             OrderCreate {
//!                 user: alice.user_id.clone(),
//!                 items: vec![OrderItem { menu_item: burger.id, quantity: 1 }],
//!                 total_amount: 9.5,
//!                 scheduled_time: Some(chrono::Utc::now()),
//!                 duration_minutes: None,
//!             },
//!         )
//!         .await?;
//!     println!("booked until {:?}", order.expected_completion_time);
//!
//!     system.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Testing
//!
//! See [`framework::mock`] for utilities to test clients without spawning full actors.

pub mod chat;
pub mod clients;
pub mod config;
pub mod error;
pub mod framework;
pub mod lifecycle;
pub mod menu_actor;
pub mod model;
pub mod order_actor;
pub mod schedule;
pub mod store;
