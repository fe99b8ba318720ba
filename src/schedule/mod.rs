//! # Scheduler / Conflict-Checker
//!
//! Decides whether a proposed order slot is free. The checks are split in two:
//!
//! - [`resolve`] is pure: it applies the default duration, rejects a zero
//!   duration and builds the proposed [`TimeSlot`].
//! - [`Scheduler::validate`] asks the [`OrderStore`] for active orders that
//!   intersect the slot and reports the first one as a conflict.
//!
//! The scheduler itself does not serialize anything. It is called from inside
//! the order actor, which is the only writer of orders, so a successful
//! validation followed by the insert cannot be interleaved with another booking.

pub mod slot;

pub use slot::TimeSlot;

use crate::model::{Order, OrderId, OrderStatus};
use crate::order_actor::OrderError;
use crate::store::OrderStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Duration used when an order does not specify one.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// The accepted schedule of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleOutcome {
    pub duration_minutes: u32,
    /// `None` for unscheduled (as soon as possible) orders.
    pub slot: Option<TimeSlot>,
}

impl ScheduleOutcome {
    pub fn scheduled_time(&self) -> Option<DateTime<Utc>> {
        self.slot.map(|s| s.start)
    }

    pub fn expected_completion_time(&self) -> Option<DateTime<Utc>> {
        self.slot.map(|s| s.end)
    }
}

/// Applies the default duration and builds the proposed slot.
pub fn resolve(
    scheduled_time: Option<DateTime<Utc>>,
    duration_minutes: Option<u32>,
    default_duration: u32,
) -> Result<ScheduleOutcome, OrderError> {
    let duration_minutes = duration_minutes.unwrap_or(default_duration);
    if duration_minutes == 0 {
        return Err(OrderError::Validation(
            "duration must be a positive number of minutes".into(),
        ));
    }
    let slot = scheduled_time
        .map(|start| {
            TimeSlot::from_start(start, duration_minutes)
                .ok_or_else(|| OrderError::Validation("scheduled time out of range".into()))
        })
        .transpose()?;
    Ok(ScheduleOutcome {
        duration_minutes,
        slot,
    })
}

/// Finds the first active order in `candidates` whose slot intersects `slot`.
///
/// `exclude` skips the order being rescheduled so it never conflicts with itself.
pub fn first_conflict<'a>(
    slot: &TimeSlot,
    candidates: &'a [Order],
    exclude: Option<&OrderId>,
) -> Option<(&'a Order, TimeSlot)> {
    candidates
        .iter()
        .filter(|order| Some(&order.id) != exclude && !order.status.is_terminal())
        .find_map(|order| {
            order
                .slot()
                .filter(|theirs| theirs.overlaps(slot))
                .map(|theirs| (order, theirs))
        })
}

/// Conflict checker backed by the order store.
#[derive(Clone)]
pub struct Scheduler {
    store: Arc<dyn OrderStore>,
    default_duration: u32,
}

impl Scheduler {
    pub fn new(store: Arc<dyn OrderStore>, default_duration: u32) -> Self {
        Self {
            store,
            default_duration,
        }
    }

    pub fn default_duration(&self) -> u32 {
        self.default_duration
    }

    /// Validates a proposed schedule against the persisted orders.
    ///
    /// Unscheduled requests pass through without touching the store.
    pub async fn validate(
        &self,
        scheduled_time: Option<DateTime<Utc>>,
        duration_minutes: Option<u32>,
        exclude: Option<&OrderId>,
    ) -> Result<ScheduleOutcome, OrderError> {
        let outcome = resolve(scheduled_time, duration_minutes, self.default_duration)?;
        let Some(requested) = outcome.slot else {
            debug!("Unscheduled order, no conflict check");
            return Ok(outcome);
        };

        let candidates = self
            .store
            .find_overlapping(&requested, &OrderStatus::TERMINAL)
            .await?;

        match first_conflict(&requested, &candidates, exclude) {
            Some((order, conflicting)) => {
                debug!(%requested, conflicting_order = %order.id, "Slot taken");
                Err(OrderError::Conflict {
                    requested,
                    conflicting_order: order.id,
                    conflicting,
                })
            }
            None => {
                debug!(%requested, "Slot free");
                Ok(outcome)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderItem, MenuItemId, UserId};
    use crate::store::{MemoryStore, Repository};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
    }

    fn order(start: DateTime<Utc>, minutes: u32, status: OrderStatus) -> Order {
        let slot = TimeSlot::from_start(start, minutes).unwrap();
        Order {
            id: OrderId::generate(),
            user: UserId::new("alice"),
            items: vec![OrderItem {
                menu_item: MenuItemId::generate(),
                quantity: 1,
            }],
            total_amount: 10.0,
            status,
            scheduled_time: Some(slot.start),
            duration_minutes: minutes,
            expected_completion_time: Some(slot.end),
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn test_resolve_applies_default_and_completion_time() {
        let outcome = resolve(Some(at(10, 0)), None, DEFAULT_DURATION_MINUTES).unwrap();
        assert_eq!(outcome.duration_minutes, 30);
        assert_eq!(outcome.expected_completion_time(), Some(at(10, 30)));
    }

    #[test]
    fn test_resolve_rejects_zero_duration() {
        let err = resolve(Some(at(10, 0)), Some(0), 30).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }

    #[test]
    fn test_resolve_rejects_slot_past_the_end_of_time() {
        let late = DateTime::<Utc>::MAX_UTC - chrono::TimeDelta::minutes(10);
        let err = resolve(Some(late), Some(30), 30).unwrap_err();
        assert_eq!(err, OrderError::Validation("scheduled time out of range".into()));
        assert!(resolve(Some(at(10, 0)), Some(u32::MAX), 30).is_ok());
    }

    #[test]
    fn test_resolve_unscheduled_has_no_slot() {
        let outcome = resolve(None, Some(45), 30).unwrap();
        assert_eq!(outcome.slot, None);
        assert_eq!(outcome.expected_completion_time(), None);
    }

    #[test]
    fn test_first_conflict_skips_terminal_and_excluded() {
        let wanted = TimeSlot::from_start(at(10, 15), 30).unwrap();
        let cancelled = order(at(10, 0), 30, OrderStatus::Cancelled);
        let itself = order(at(10, 0), 30, OrderStatus::Pending);
        let orders = vec![cancelled, itself.clone()];

        assert!(first_conflict(&wanted, &orders, Some(&itself.id)).is_none());
        let (hit, slot) = first_conflict(&wanted, &orders, None).unwrap();
        assert_eq!(hit.id, itself.id);
        assert_eq!(slot, TimeSlot::from_start(at(10, 0), 30).unwrap());
    }

    #[tokio::test]
    async fn test_validate_reports_conflicting_order() {
        let store = Arc::new(MemoryStore::new());
        let existing = order(at(10, 0), 30, OrderStatus::Pending);
        store.insert(&existing).await.unwrap();
        let scheduler = Scheduler::new(store, 30);

        let err = scheduler
            .validate(Some(at(10, 15)), Some(30), None)
            .await
            .unwrap_err();
        match err {
            OrderError::Conflict {
                conflicting_order,
                requested,
                ..
            } => {
                assert_eq!(conflicting_order, existing.id);
                assert_eq!(requested, TimeSlot::from_start(at(10, 15), 30).unwrap());
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        // Back-to-back is fine.
        let ok = scheduler.validate(Some(at(10, 30)), None, None).await.unwrap();
        assert_eq!(ok.expected_completion_time(), Some(at(11, 0)));
    }

    #[tokio::test]
    async fn test_validate_unscheduled_skips_store() {
        let store = Arc::new(MemoryStore::new());
        store.set_offline(true);
        let scheduler = Scheduler::new(store, 30);
        assert!(scheduler.validate(None, None, None).await.is_ok());
        assert!(matches!(
            scheduler.validate(Some(at(9, 0)), None, None).await,
            Err(OrderError::Persistence(_))
        ));
    }
}
