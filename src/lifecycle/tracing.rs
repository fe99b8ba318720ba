//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the structured logger for the whole system.
//!
//! The output is compact and hides module paths (`with_target(false)`); actors
//! identify themselves through the `entity_type` field instead. Levels come
//! from `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=info cargo run    # actor lifecycle, creates/updates, sent messages
//! RUST_LOG=debug cargo run   # every request with its payload, joins and deliveries
//! RUST_LOG=diner::chat=debug,info cargo run
//! ```
//!
//! A successful booking followed by a chat message looks like:
//!
//! ```text
//! INFO place_order:create_order: Sending create_order to actor caller=alice
//! INFO Created entity_type="Order" id=order_0190c7b4...
//! INFO place_order:create_order: Order placed order_id=order_0190c7b4...
//! INFO Message sent order_id=order_0190c7b4... message_id=msg_0190c7b5... receivers=1
//! ```
//!
//! Rejections are logged at `warn` with the reason, for example
//! `WARN on_create failed entity_type="Order" error=Time slot [...] conflicts with order ...`.
//! A chat message that could not be stored is logged at `error`.

/// Installs the global subscriber. Call once, at start-up.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // entity_type identifies the actor
        .compact()
        .init();
}
