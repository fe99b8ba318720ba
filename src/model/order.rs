//! Customer orders.
//!
//! # Actor Framework
//! This struct implements the [`ActorEntity`](crate::framework::ActorEntity) trait,
//! allowing it to be managed by a [`ResourceActor`](crate::framework::ResourceActor).
//!
//! See [`impl ActorEntity for Order`](crate::order_actor::entity) for details on:
//! - Creation parameters ([`OrderCreate`])
//! - Update parameters ([`OrderUpdate`])
use crate::model::{MenuItemId, OrderId, Role, UserId};
use crate::schedule::TimeSlot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Statuses that release the order's slot.
    pub const TERMINAL: [OrderStatus; 2] = [OrderStatus::Completed, OrderStatus::Cancelled];

    pub fn is_terminal(self) -> bool {
        Self::TERMINAL.contains(&self)
    }

    /// The forward transitions of the kitchen workflow.
    ///
    /// `pending → preparing → ready → completed`, with `cancelled` reachable from
    /// any non-terminal status. Staying in the same status is always allowed.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        if self == next {
            return true;
        }
        match (self, next) {
            (Pending, Preparing) | (Preparing, Ready) | (Ready, Completed) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub menu_item: MenuItemId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub expected_completion_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The half-open interval this order claims, if it is scheduled.
    pub fn slot(&self) -> Option<TimeSlot> {
        match (self.scheduled_time, self.expected_completion_time) {
            (Some(start), Some(end)) => Some(TimeSlot { start, end }),
            _ => None,
        }
    }

    /// Whether the order currently blocks its slot for other bookings.
    pub fn occupies_slot(&self) -> bool {
        !self.status.is_terminal() && self.slot().is_some()
    }
}

/// Payload for creating a new order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreate {
    pub user: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    /// `None` places an unscheduled (as soon as possible) order.
    pub scheduled_time: Option<DateTime<Utc>>,
    /// Minutes; the configured default applies when absent.
    pub duration_minutes: Option<u32>,
}

/// A new schedule for an existing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleChange {
    pub scheduled_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
}

/// Payload for updating an existing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdate {
    /// Role of the caller, consulted by the status transition policy.
    pub requested_by: Role,
    pub status: Option<OrderStatus>,
    pub schedule: Option<ScheduleChange>,
}

impl OrderUpdate {
    pub fn status(requested_by: Role, status: OrderStatus) -> Self {
        Self {
            requested_by,
            status: Some(status),
            schedule: None,
        }
    }

    pub fn reschedule(
        requested_by: Role,
        scheduled_time: Option<DateTime<Utc>>,
        duration_minutes: Option<u32>,
    ) -> Self {
        Self {
            requested_by,
            status: None,
            schedule: Some(ScheduleChange {
                scheduled_time,
                duration_minutes,
            }),
        }
    }
}
