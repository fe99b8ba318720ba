//! # Order Client
//!
//! Provides a high-level API for interacting with the `Order` actor.
//! It wraps a `ResourceClient<Order>` and enforces who may do what; the order
//! rules themselves (slot conflicts, menu checks, status workflow) run inside the
//! actor's hooks.
use crate::clients::actor_client::ActorClient;
use crate::framework::{FrameworkError, ResourceClient};
use crate::model::{Identity, Order, OrderCreate, OrderId, OrderStatus, OrderUpdate, Role};
use crate::order_actor::{OrderError, OrderQuery, OrderQueryResult};
use crate::schedule::ScheduleOutcome;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

/// Client for interacting with the Order actor.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>) -> Self {
        Self { inner }
    }

    /// Places an order. Customers may only order for themselves.
    #[instrument(skip(self, identity, params), fields(caller = %identity.user_id))]
    pub async fn create_order(
        &self,
        identity: &Identity,
        params: OrderCreate,
    ) -> Result<Order, OrderError> {
        debug!(?params, "create_order called");
        if params.user != identity.user_id {
            identity.require(Role::Staff, "place orders for other users")?;
        }

        info!("Sending create_order to actor");
        let order = self.inner.create(params).await.map_err(Self::map_error)?;
        info!(order_id = %order.id, "Order placed");
        Ok(order)
    }

    /// Fetches one order. Customers can only see their own.
    #[instrument(skip(self, identity), fields(caller = %identity.user_id))]
    pub async fn get_order(&self, identity: &Identity, id: OrderId) -> Result<Order, OrderError> {
        let order = self
            .get(id)
            .await?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;
        if order.user != identity.user_id {
            identity.require(Role::Staff, "view other customers' orders")?;
        }
        Ok(order)
    }

    /// Customers see their own orders, staff and managers see all of them.
    #[instrument(skip(self, identity), fields(caller = %identity.user_id))]
    pub async fn list_orders(&self, identity: &Identity) -> Result<Vec<Order>, OrderError> {
        let owner = (!identity.is_staff()).then(|| identity.user_id.clone());
        match self.query(OrderQuery::List { owner }).await? {
            OrderQueryResult::Orders(orders) => Ok(orders),
            OrderQueryResult::Schedule(_) => unreachable!("List query must return Orders"),
        }
    }

    /// Applies a status change and/or reschedule. Staff and managers only.
    ///
    /// `update.requested_by` is overwritten with the caller's role.
    #[instrument(skip(self, identity), fields(caller = %identity.user_id))]
    pub async fn update_order(
        &self,
        identity: &Identity,
        id: OrderId,
        mut update: OrderUpdate,
    ) -> Result<Order, OrderError> {
        identity.require(Role::Staff, "update orders")?;
        update.requested_by = identity.role;
        let order = self.inner.update(id, update).await.map_err(Self::map_error)?;
        info!(order_id = %order.id, status = %order.status, "Order updated");
        Ok(order)
    }

    pub async fn update_status(
        &self,
        identity: &Identity,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, OrderError> {
        self.update_order(identity, id, OrderUpdate::status(identity.role, status))
            .await
    }

    /// Moves the order to a new slot; `scheduled_time: None` unschedules it and
    /// `duration_minutes: None` keeps the current duration.
    pub async fn reschedule(
        &self,
        identity: &Identity,
        id: OrderId,
        scheduled_time: Option<DateTime<Utc>>,
        duration_minutes: Option<u32>,
    ) -> Result<Order, OrderError> {
        let update = OrderUpdate::reschedule(identity.role, scheduled_time, duration_minutes);
        self.update_order(identity, id, update).await
    }

    /// Managers only.
    #[instrument(skip(self, identity), fields(caller = %identity.user_id))]
    pub async fn delete_order(&self, identity: &Identity, id: OrderId) -> Result<(), OrderError> {
        identity.require(Role::Manager, "delete orders")?;
        self.inner.delete(id).await.map_err(Self::map_error)?;
        info!(order_id = %id, "Order deleted");
        Ok(())
    }

    /// Checks whether a slot is free right now without reserving it.
    #[instrument(skip(self))]
    pub async fn validate_schedule(
        &self,
        scheduled_time: Option<DateTime<Utc>>,
        duration_minutes: Option<u32>,
    ) -> Result<ScheduleOutcome, OrderError> {
        let query = OrderQuery::ValidateSchedule {
            scheduled_time,
            duration_minutes,
            exclude: None,
        };
        match self.query(query).await? {
            OrderQueryResult::Schedule(outcome) => Ok(outcome),
            OrderQueryResult::Orders(_) => {
                unreachable!("ValidateSchedule query must return Schedule")
            }
        }
    }

    async fn query(&self, query: OrderQuery) -> Result<OrderQueryResult, OrderError> {
        self.inner.query(query).await.map_err(Self::map_error)
    }
}

#[async_trait]
impl ActorClient<Order> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        OrderError::from(e)
    }
}
