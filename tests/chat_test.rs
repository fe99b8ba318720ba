use chrono::{TimeZone, Utc};
use diner::chat::{ChatError, ChatSession, ClientEvent, ServerEvent};
use diner::config::PlatformConfig;
use diner::error::ErrorKind;
use diner::lifecycle::RestaurantSystem;
use diner::model::{
    Identity, MenuItem, MenuItemCreate, Message, MessageDraft, MessageId, Order, OrderCreate, OrderId,
    OrderItem, UserId,
};
use diner::store::MemoryStore;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// Chat tests run the whole system on a MemoryStore the test can switch
// offline or slow down.

const WAIT: Duration = Duration::from_millis(500);
const QUIET: Duration = Duration::from_millis(150);

struct Fixture {
    system: RestaurantSystem,
    store: Arc<MemoryStore>,
    burger: MenuItem,
}

impl Fixture {
    async fn start() -> Self {
        let config = PlatformConfig {
            persistence_timeout_ms: 100,
            history_page_size: 2,
            ..PlatformConfig::default()
        };
        let store = Arc::new(MemoryStore::new());
        let system = RestaurantSystem::new(config, store.clone());
        let burger = system
            .menu_client
            .create_item(
                &Identity::manager("max"),
                MenuItemCreate::new("Burger", "Beef patty", 9.5),
            )
            .await
            .unwrap();
        Self {
            system,
            store,
            burger,
        }
    }

    async fn order_for(&self, who: &Identity, hour: u32) -> Order {
        let params = OrderCreate {
            user: who.user_id.clone(),
            items: vec![OrderItem {
                menu_item: self.burger.id,
                quantity: 1,
            }],
            total_amount: self.burger.price,
            scheduled_time: Some(Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()),
            duration_minutes: None,
        };
        self.system.order_client.create_order(who, params).await.unwrap()
    }

    /// Connects `who` and joins the room of `order_id`.
    async fn joined(
        &self,
        who: &Identity,
        order_id: OrderId,
    ) -> (ChatSession, mpsc::Receiver<ServerEvent>) {
        let (session, inbox) = self.system.connect(who.clone()).await.unwrap();
        assert!(session.join(order_id).await.unwrap());
        (session, inbox)
    }

    async fn say(&self, who: &Identity, order_id: OrderId, text: &str) -> Message {
        self.system
            .chat_client
            .send_message(who, MessageDraft::new(order_id, text))
            .await
            .unwrap()
    }
}

async fn next(inbox: &mut mpsc::Receiver<ServerEvent>) -> ServerEvent {
    tokio::time::timeout(WAIT, inbox.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("outbox closed")
}

async fn assert_silent(inbox: &mut mpsc::Receiver<ServerEvent>) {
    if let Ok(event) = tokio::time::timeout(QUIET, inbox.recv()).await {
        panic!("expected no event, got {event:?}");
    }
}

/// The sender's ack and its own broadcast copy race; returns them sorted out.
async fn ack_and_echo(inbox: &mut mpsc::Receiver<ServerEvent>) -> (ServerEvent, Message) {
    let mut ack = None;
    let mut echo = None;
    for _ in 0..2 {
        match next(inbox).await {
            event @ ServerEvent::MessageAck { .. } => ack = Some(event),
            ServerEvent::NewMessage { message } => echo = Some(message),
            other => panic!("unexpected event {other:?}"),
        }
    }
    (ack.expect("no ack"), echo.expect("no echo"))
}

#[tokio::test]
async fn test_messages_stay_in_their_room() {
    let f = Fixture::start().await;
    let alice = Identity::customer("alice");
    let bob = Identity::customer("bob");
    let staff = Identity::staff("sam");
    let order_a = f.order_for(&alice, 10).await;
    let order_b = f.order_for(&bob, 11).await;

    let (s1, mut inbox1) = f.joined(&alice, order_a.id).await;
    let (_s2, mut inbox2) = f.joined(&staff, order_a.id).await;
    let (_s3, mut inbox3) = f.joined(&bob, order_b.id).await;

    s1.handle(ClientEvent::SendMessage(MessageDraft::new(order_a.id, "Is it ready?")))
        .await
        .unwrap();

    let (ack, echo) = ack_and_echo(&mut inbox1).await;
    assert_eq!(ack, ServerEvent::ack(&echo));
    assert_eq!(echo.sender, alice.user_id);
    assert_eq!(echo.receiver, None);

    match next(&mut inbox2).await {
        ServerEvent::NewMessage { message } => assert_eq!(message, echo),
        other => panic!("unexpected event {other:?}"),
    }
    assert_silent(&mut inbox3).await;

    let members = f.system.registry.members(order_a.id).await.unwrap();
    assert_eq!(members.len(), 2);

    f.system.shutdown().await;
}

#[tokio::test]
async fn test_left_and_disconnected_sessions_receive_nothing() {
    let f = Fixture::start().await;
    let alice = Identity::customer("alice");
    let staff = Identity::staff("sam");
    let order = f.order_for(&alice, 10).await;

    let (s1, mut inbox1) = f.joined(&alice, order.id).await;
    let (s2, mut inbox2) = f.joined(&staff, order.id).await;

    s1.handle(ClientEvent::LeaveChat { order_id: order.id })
        .await
        .unwrap();
    f.say(&staff, order.id, "Out of buns, fries instead?").await;
    assert!(matches!(next(&mut inbox2).await, ServerEvent::NewMessage { .. }));
    assert_silent(&mut inbox1).await;

    assert_eq!(s2.disconnect().await.unwrap(), 1);
    assert!(f.system.registry.members(order.id).await.unwrap().is_empty());

    f.system.shutdown().await;
}

#[tokio::test]
async fn test_dropped_session_leaves_its_rooms() {
    let f = Fixture::start().await;
    let alice = Identity::customer("alice");
    let staff = Identity::staff("sam");
    let lunch = f.order_for(&alice, 12).await;
    let dinner = f.order_for(&alice, 19).await;

    let (session, inbox) = f.joined(&alice, lunch.id).await;
    assert!(session.join(dinner.id).await.unwrap());
    let (_kitchen, mut kitchen_inbox) = f.joined(&staff, lunch.id).await;

    // The transport goes away without a disconnect.
    drop(session);
    drop(inbox);

    let members = f.system.registry.members(lunch.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert!(f.system.registry.members(dinner.id).await.unwrap().is_empty());

    f.say(&staff, lunch.id, "Still there?").await;
    assert!(matches!(next(&mut kitchen_inbox).await, ServerEvent::NewMessage { .. }));

    f.system.shutdown().await;
}

#[tokio::test]
async fn test_store_offline_fails_delivery_without_broadcast() {
    let f = Fixture::start().await;
    let alice = Identity::customer("alice");
    let staff = Identity::staff("sam");
    let order = f.order_for(&alice, 10).await;

    let (s1, mut inbox1) = f.joined(&alice, order.id).await;
    let (_s2, mut inbox2) = f.joined(&staff, order.id).await;

    f.store.set_offline(true);
    s1.handle(ClientEvent::SendMessage(MessageDraft::new(order.id, "Hello?")))
        .await
        .unwrap();

    match next(&mut inbox1).await {
        ServerEvent::DeliveryFailed {
            order_id,
            kind,
            retryable,
            ..
        } => {
            assert_eq!(order_id, order.id);
            assert_eq!(kind, ErrorKind::Persistence);
            assert!(retryable);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_silent(&mut inbox2).await;

    f.store.set_offline(false);
    assert!(f.system.chat_client.history(&alice, order.id).await.unwrap().is_empty());

    f.system.shutdown().await;
}

#[tokio::test]
async fn test_slow_store_write_times_out() {
    let f = Fixture::start().await;
    let alice = Identity::customer("alice");
    let staff = Identity::staff("sam");
    let order = f.order_for(&alice, 10).await;
    let (_s2, mut inbox2) = f.joined(&staff, order.id).await;

    f.store.set_write_delay(Duration::from_millis(400));
    let err = f
        .system
        .chat_client
        .send_message(&alice, MessageDraft::new(order.id, "Anyone there?"))
        .await
        .unwrap_err();
    assert_eq!(err, ChatError::Timeout(100));
    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert!(err.is_retryable());
    assert_silent(&mut inbox2).await;

    f.store.set_write_delay(Duration::ZERO);
    assert!(f.system.chat_client.history(&alice, order.id).await.unwrap().is_empty());

    f.system.shutdown().await;
}

#[tokio::test]
async fn test_receiver_is_inferred_from_the_order_owner() {
    let f = Fixture::start().await;
    let alice = Identity::customer("alice");
    let staff = Identity::staff("sam");
    let order = f.order_for(&alice, 10).await;

    let to_owner = f.say(&staff, order.id, "Five more minutes").await;
    assert_eq!(to_owner.receiver, Some(alice.user_id.clone()));

    let to_staff = f.say(&alice, order.id, "Thanks").await;
    assert_eq!(to_staff.receiver, None);

    let addressed = f
        .system
        .chat_client
        .send_message(&alice, MessageDraft::new(order.id, "Sam?").to("sam"))
        .await
        .unwrap();
    assert_eq!(addressed.receiver, Some(UserId::from("sam")));

    f.system.shutdown().await;
}

#[tokio::test]
async fn test_mark_read_is_idempotent() {
    let f = Fixture::start().await;
    let alice = Identity::customer("alice");
    let staff = Identity::staff("sam");
    let order = f.order_for(&alice, 10).await;

    for text in ["Grill is hot", "Patty on", "Almost there"] {
        f.say(&staff, order.id, text).await;
    }
    assert_eq!(f.system.chat_client.unread_count(&alice.user_id).await.unwrap(), 3);

    f.system.chat_client.mark_read(&alice, order.id).await.unwrap();
    assert_eq!(f.system.chat_client.unread_count(&alice.user_id).await.unwrap(), 0);
    let history = f.system.chat_client.history(&alice, order.id).await.unwrap();
    assert!(history.iter().all(|m| m.read));

    f.system.chat_client.mark_read(&alice, order.id).await.unwrap();
    assert_eq!(f.system.chat_client.unread_count(&alice.user_id).await.unwrap(), 0);
    assert_eq!(f.system.chat_client.history(&alice, order.id).await.unwrap(), history);

    f.system.shutdown().await;
}

#[tokio::test]
async fn test_unread_count_spans_orders() {
    let f = Fixture::start().await;
    let alice = Identity::customer("alice");
    let staff = Identity::staff("sam");
    let lunch = f.order_for(&alice, 12).await;
    let dinner = f.order_for(&alice, 19).await;

    f.say(&staff, lunch.id, "Lunch is up").await;
    f.say(&staff, lunch.id, "Table 4").await;
    f.say(&staff, dinner.id, "See you tonight").await;
    // Messages from the owner are not unread for anyone in particular.
    f.say(&alice, dinner.id, "Great").await;
    assert_eq!(f.system.chat_client.unread_count(&alice.user_id).await.unwrap(), 3);

    f.system.chat_client.mark_read(&alice, lunch.id).await.unwrap();
    assert_eq!(f.system.chat_client.unread_count(&alice.user_id).await.unwrap(), 1);

    f.system.shutdown().await;
}

#[tokio::test]
async fn test_history_is_ordered_and_paged() {
    let f = Fixture::start().await;
    let alice = Identity::customer("alice");
    let staff = Identity::staff("sam");
    let order = f.order_for(&alice, 10).await;

    let mut sent = Vec::new();
    for n in 0..5 {
        let who = if n % 2 == 0 { &alice } else { &staff };
        sent.push(f.say(who, order.id, &format!("message {n}")).await);
    }

    let history = f.system.chat_client.history(&staff, order.id).await.unwrap();
    assert_eq!(history, sent);
    assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));

    // The configured page size is 2.
    let first = f
        .system
        .chat_client
        .history_page(&alice, order.id, None, None)
        .await
        .unwrap();
    assert_eq!(first.messages, sent[..2].to_vec());
    let second = f
        .system
        .chat_client
        .history_page(&alice, order.id, first.next_cursor, Some(2))
        .await
        .unwrap();
    assert_eq!(second.messages, sent[2..4].to_vec());
    let last = f
        .system
        .chat_client
        .history_page(&alice, order.id, second.next_cursor, Some(2))
        .await
        .unwrap();
    assert_eq!(last.messages, sent[4..].to_vec());
    assert_eq!(last.next_cursor, None);

    let err = f
        .system
        .chat_client
        .history_page(&alice, order.id, Some(MessageId::generate()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Validation(_)), "got {err:?}");
    assert!(!err.is_retryable());

    f.system.shutdown().await;
}

#[tokio::test]
async fn test_join_unknown_order_reports_not_found() {
    let f = Fixture::start().await;
    let alice = Identity::customer("alice");
    let (session, mut inbox) = f.system.connect(alice).await.unwrap();

    let missing = OrderId::generate();
    session
        .handle(ClientEvent::JoinChat { order_id: missing })
        .await
        .unwrap();
    match next(&mut inbox).await {
        ServerEvent::Error { kind, .. } => assert_eq!(kind, ErrorKind::NotFound),
        other => panic!("unexpected event {other:?}"),
    }
    assert!(f.system.registry.members(missing).await.unwrap().is_empty());

    f.system.shutdown().await;
}

#[tokio::test]
async fn test_malformed_frames_are_answered_not_fatal() {
    let f = Fixture::start().await;
    let alice = Identity::customer("alice");
    let order = f.order_for(&alice, 10).await;
    let (session, mut inbox) = f.system.connect(alice).await.unwrap();

    session.handle_json("{not json").await.unwrap();
    match next(&mut inbox).await {
        ServerEvent::Error { kind, .. } => assert_eq!(kind, ErrorKind::Validation),
        other => panic!("unexpected event {other:?}"),
    }

    // The session keeps working afterwards.
    let frame = serde_json::json!({"type": "join_chat", "order_id": order.id}).to_string();
    session.handle_json(&frame).await.unwrap();
    assert_eq!(
        f.system.registry.members(order.id).await.unwrap(),
        vec![session.id()]
    );

    f.system.shutdown().await;
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let f = Fixture::start().await;
    let alice = Identity::customer("alice");
    let order = f.order_for(&alice, 10).await;
    let (session, mut inbox) = f.joined(&alice, order.id).await;

    session
        .handle(ClientEvent::SendMessage(MessageDraft::new(order.id, "   ")))
        .await
        .unwrap();
    match next(&mut inbox).await {
        ServerEvent::DeliveryFailed {
            kind, retryable, ..
        } => {
            assert_eq!(kind, ErrorKind::Validation);
            assert!(!retryable);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_silent(&mut inbox).await;

    f.system.shutdown().await;
}

#[tokio::test]
async fn test_customers_cannot_chat_about_other_orders() {
    let f = Fixture::start().await;
    let alice = Identity::customer("alice");
    let mallory = Identity::customer("mallory");
    let order = f.order_for(&alice, 10).await;

    let err = f
        .system
        .chat_client
        .send_message(&mallory, MessageDraft::new(order.id, "hi"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = f.system.chat_client.history(&mallory, order.id).await.unwrap_err();
    assert!(matches!(err, ChatError::Forbidden(_)));

    let (session, _inbox) = f.system.connect(mallory).await.unwrap();
    let err = session.join(order.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    f.system.shutdown().await;
}
