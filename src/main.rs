//! # Diner demo
//!
//! Runs one evening in the restaurant against the in-memory store:
//! 1. the manager puts items on the menu;
//! 2. a customer books a slot and a second booking in the same slot is refused;
//! 3. customer and staff chat about the order;
//! 4. the kitchen works the order to completion, freeing the slot.
//!
//! Configuration is read from the file named by `DINER_CONFIG` when set.

use chrono::{Duration, Utc};
use diner::chat::{ClientEvent, ServerEvent};
use diner::config::PlatformConfig;
use diner::lifecycle::{setup_tracing, RestaurantSystem};
use diner::model::{
    Identity, MenuItemCreate, MessageDraft, OrderCreate, OrderItem, OrderStatus,
};
use std::error::Error;
use tracing::{error, info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_tracing();

    let config = PlatformConfig::from_env()?;
    info!(?config, "Starting restaurant system");
    let system = RestaurantSystem::in_memory(config);

    let manager = Identity::manager("max");
    let staff = Identity::staff("sam");
    let alice = Identity::customer("alice");
    let bob = Identity::customer("bob");

    let span = tracing::info_span!("menu_setup");
    let burger = async {
        info!("Creating menu");
        system
            .menu_client
            .create_item(&manager, MenuItemCreate::new("Burger", "Beef patty, brioche bun", 9.5))
            .await
    }
    .instrument(span)
    .await?;

    let slot = Utc::now() + Duration::hours(2);
    let booking = |who: &Identity, minutes_later: i64| OrderCreate {
        user: who.user_id.clone(),
        items: vec![OrderItem {
            menu_item: burger.id,
            quantity: 2,
        }],
        total_amount: 19.0,
        scheduled_time: Some(slot + Duration::minutes(minutes_later)),
        duration_minutes: Some(30),
    };

    let span = tracing::info_span!("place_order");
    let order = async {
        let order = system.order_client.create_order(&alice, booking(&alice, 0)).await?;
        info!(order_id = %order.id, until = ?order.expected_completion_time, "Alice booked");

        match system.order_client.create_order(&bob, booking(&bob, 15)).await {
            Ok(clash) => error!(order_id = %clash.id, "Overlapping order accepted"),
            Err(e) => warn!(error = %e, kind = %e.kind(), "Bob's booking refused"),
        }
        Ok::<_, diner::order_actor::OrderError>(order)
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("chat");
    async {
        let (customer, mut customer_inbox) = system.connect(alice.clone()).await?;
        let (kitchen, mut kitchen_inbox) = system.connect(staff.clone()).await?;

        customer
            .handle_json(&serde_json::to_string(&ClientEvent::JoinChat { order_id: order.id })?)
            .await?;
        kitchen.handle(ClientEvent::JoinChat { order_id: order.id }).await?;

        kitchen
            .handle(ClientEvent::SendMessage(MessageDraft::new(
                order.id,
                "Your burgers are on the grill",
            )))
            .await?;

        for _ in 0..2 {
            if let Some(event) = kitchen_inbox.recv().await {
                info!(event = %event.to_json()?, "Kitchen received");
            }
        }
        if let Some(ServerEvent::NewMessage { message }) = customer_inbox.recv().await {
            info!(from = %message.sender, content = %message.content, "Alice received");
        }

        let unread = system.chat_client.unread_count(&alice.user_id).await?;
        system.chat_client.mark_read(&alice, order.id).await?;
        info!(unread, "Alice read her messages");

        customer.disconnect().await?;
        kitchen.disconnect().await?;
        Ok::<_, Box<dyn Error>>(())
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("kitchen");
    async {
        for status in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Completed] {
            system.order_client.update_status(&staff, order.id, status).await?;
        }
        let freed = system
            .order_client
            .validate_schedule(order.scheduled_time, Some(order.duration_minutes))
            .await?;
        info!(slot = ?freed.slot, "Slot available again");
        Ok::<_, diner::order_actor::OrderError>(())
    }
    .instrument(span)
    .await?;

    system.shutdown().await;
    info!("Application completed successfully");
    Ok(())
}
