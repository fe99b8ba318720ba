//! Entity trait implementation for the Order domain type.
//!
//! This is where the order rules live. Because the hooks run inside the order
//! actor, the conflict check in `on_create` and the insert that follows it
//! cannot be interleaved with another booking.
//!
//! Creation runs in this order:
//! 1. `from_create_params`: items, quantities, total and duration are checked.
//! 2. `on_create`: the slot is checked against active orders, then every menu
//!    item is looked up through the menu actor.

use super::error::OrderError;
use crate::clients::{ActorClient, MenuClient};
use crate::config::TransitionPolicy;
use crate::framework::ActorEntity;
use crate::menu_actor::MenuError;
use crate::model::{Order, OrderCreate, OrderId, OrderItem, OrderUpdate, UserId};
use crate::schedule::{self, ScheduleOutcome, Scheduler};
use crate::store::Repository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Dependencies injected into the order actor at start-up.
#[derive(Clone)]
pub struct OrderContext {
    pub scheduler: Scheduler,
    pub menu: MenuClient,
    pub policy: TransitionPolicy,
}

/// Uninhabited: orders have no custom actions, every change is an update.
#[derive(Debug, Clone)]
pub enum OrderAction {}

/// Read-only questions answered by the order actor.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderQuery {
    /// Dry-run of the conflict check. Reserves nothing.
    ValidateSchedule {
        scheduled_time: Option<DateTime<Utc>>,
        duration_minutes: Option<u32>,
        exclude: Option<OrderId>,
    },
    /// Orders of one customer, or all orders when `owner` is `None`.
    List { owner: Option<UserId> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderQueryResult {
    Schedule(ScheduleOutcome),
    Orders(Vec<Order>),
}

fn check_items(items: &[OrderItem]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::Validation("an order needs at least one item".into()));
    }
    if let Some(line) = items.iter().find(|line| line.quantity == 0) {
        return Err(OrderError::Validation(format!(
            "quantity of {} must be at least 1",
            line.menu_item
        )));
    }
    Ok(())
}

fn check_total(total: f64) -> Result<(), OrderError> {
    if !total.is_finite() || total < 0.0 {
        return Err(OrderError::Validation(format!(
            "total amount must be a non-negative amount, got {total}"
        )));
    }
    Ok(())
}

impl Order {
    fn apply_schedule(&mut self, outcome: ScheduleOutcome) {
        self.scheduled_time = outcome.scheduled_time();
        self.duration_minutes = outcome.duration_minutes;
        self.expected_completion_time = outcome.expected_completion_time();
    }
}

#[async_trait]
impl ActorEntity for Order {
    type Id = OrderId;
    type Create = OrderCreate;
    type Update = OrderUpdate;
    type Action = OrderAction;
    type ActionResult = ();
    type Query = OrderQuery;
    type QueryResult = OrderQueryResult;
    type Context = OrderContext;
    type Error = OrderError;

    fn id(&self) -> &OrderId {
        &self.id
    }

    fn from_create_params(
        id: OrderId,
        params: OrderCreate,
        ctx: &OrderContext,
    ) -> Result<Self, OrderError> {
        check_items(&params.items)?;
        check_total(params.total_amount)?;
        let outcome = schedule::resolve(
            params.scheduled_time,
            params.duration_minutes,
            ctx.scheduler.default_duration(),
        )?;

        let now = Utc::now();
        let mut order = Self {
            id,
            user: params.user,
            items: params.items,
            total_amount: params.total_amount,
            status: Default::default(),
            scheduled_time: None,
            duration_minutes: outcome.duration_minutes,
            expected_completion_time: None,
            created_at: now,
            updated_at: now,
        };
        order.apply_schedule(outcome);
        Ok(order)
    }

    /// Claims the slot, then checks the menu.
    ///
    /// The conflict check comes first so a taken slot is reported even when the
    /// items would also have been rejected.
    async fn on_create(&mut self, ctx: &OrderContext) -> Result<(), OrderError> {
        let outcome = ctx
            .scheduler
            .validate(self.scheduled_time, Some(self.duration_minutes), None)
            .await?;
        self.apply_schedule(outcome);

        for line in &self.items {
            match ctx.menu.get(line.menu_item).await {
                Ok(Some(item)) if item.available => {}
                Ok(Some(_)) => return Err(OrderError::MenuItemUnavailable(line.menu_item)),
                Ok(None) => return Err(OrderError::InvalidMenuItem(line.menu_item)),
                Err(MenuError::Persistence(msg)) => return Err(OrderError::Persistence(msg)),
                Err(e) => return Err(OrderError::ActorCommunication(e.to_string())),
            }
        }
        Ok(())
    }

    /// Applies a status change and/or a reschedule.
    ///
    /// The slot is checked again (ignoring this order) when the schedule changes
    /// or when a finished order is brought back to an active status. Nothing is
    /// modified if any check fails.
    async fn on_update(&mut self, update: OrderUpdate, ctx: &OrderContext) -> Result<(), OrderError> {
        let next_status = update.status.unwrap_or(self.status);
        if !ctx.policy.allows(update.requested_by, self.status, next_status) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: next_status,
            });
        }

        let reviving = self.status.is_terminal() && !next_status.is_terminal();
        let (scheduled_time, duration) = match &update.schedule {
            Some(change) => (
                change.scheduled_time,
                change.duration_minutes.unwrap_or(self.duration_minutes),
            ),
            None => (self.scheduled_time, self.duration_minutes),
        };

        let outcome = if (update.schedule.is_some() || reviving) && !next_status.is_terminal() {
            debug!(order_id = %self.id, reviving, "Re-checking slot");
            Some(
                ctx.scheduler
                    .validate(scheduled_time, Some(duration), Some(&self.id))
                    .await?,
            )
        } else if update.schedule.is_some() {
            Some(schedule::resolve(
                scheduled_time,
                Some(duration),
                ctx.scheduler.default_duration(),
            )?)
        } else {
            None
        };

        if let Some(outcome) = outcome {
            self.apply_schedule(outcome);
        }
        self.status = next_status;
        self.updated_at = Utc::now();
        Ok(())
    }

    async fn handle_action(&mut self, action: OrderAction, _ctx: &OrderContext) -> Result<(), OrderError> {
        match action {}
    }

    async fn handle_query(
        query: OrderQuery,
        repository: &dyn Repository<Order>,
        ctx: &OrderContext,
    ) -> Result<OrderQueryResult, OrderError> {
        match query {
            OrderQuery::ValidateSchedule {
                scheduled_time,
                duration_minutes,
                exclude,
            } => ctx
                .scheduler
                .validate(scheduled_time, duration_minutes, exclude.as_ref())
                .await
                .map(OrderQueryResult::Schedule),
            OrderQuery::List { owner } => {
                let mut orders = repository.load_all().await?;
                if let Some(owner) = owner {
                    orders.retain(|order| order.user == owner);
                }
                Ok(OrderQueryResult::Orders(orders))
            }
        }
    }
}
