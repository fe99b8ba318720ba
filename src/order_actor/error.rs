//! Error types for the Order actor.

use crate::error::ErrorKind;
use crate::framework::FrameworkError;
use crate::model::{AccessError, MenuItemId, OrderId, OrderStatus};
use crate::schedule::TimeSlot;
use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// The order data provided is invalid.
    #[error("Order validation error: {0}")]
    Validation(String),

    /// The requested slot intersects the slot of an active order.
    #[error("Time slot {requested} conflicts with order {conflicting_order} at {conflicting}")]
    Conflict {
        requested: TimeSlot,
        conflicting_order: OrderId,
        conflicting: TimeSlot,
    },

    /// The requested order was not found.
    #[error("Order not found: {0}")]
    NotFound(String),

    /// The order references a menu item that does not exist.
    #[error("Invalid menu item: {0}")]
    InvalidMenuItem(MenuItemId),

    /// The order references a menu item that is switched off.
    #[error("Menu item unavailable: {0}")]
    MenuItemUnavailable(MenuItemId),

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Forbidden(#[from] AccessError),

    /// The backing store failed.
    #[error("Order persistence error: {0}")]
    Persistence(String),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunication(String),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::Validation(_)
            | OrderError::InvalidMenuItem(_)
            | OrderError::MenuItemUnavailable(_)
            | OrderError::InvalidTransition { .. } => ErrorKind::Validation,
            OrderError::Conflict { .. } => ErrorKind::Conflict,
            OrderError::NotFound(_) => ErrorKind::NotFound,
            OrderError::Forbidden(_) => ErrorKind::Forbidden,
            OrderError::Persistence(_) => ErrorKind::Persistence,
            OrderError::ActorCommunication(_) => ErrorKind::Unavailable,
        }
    }
}

impl From<StoreError> for OrderError {
    fn from(e: StoreError) -> Self {
        OrderError::Persistence(e.to_string())
    }
}

impl From<FrameworkError> for OrderError {
    /// Recovers the domain error raised inside the actor; anything else is a
    /// plumbing failure.
    fn from(e: FrameworkError) -> Self {
        match e.into_entity_error::<OrderError>() {
            Ok(domain) => domain,
            Err(FrameworkError::NotFound(id)) => OrderError::NotFound(id),
            Err(FrameworkError::Storage(store)) => store.into(),
            Err(other) => OrderError::ActorCommunication(other.to_string()),
        }
    }
}

impl From<String> for OrderError {
    fn from(msg: String) -> Self {
        OrderError::ActorCommunication(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_error_keeps_domain_conflict() {
        let slot = TimeSlot::from_start(chrono::Utc::now(), 30).unwrap();
        let conflict = OrderError::Conflict {
            requested: slot,
            conflicting_order: OrderId::generate(),
            conflicting: slot,
        };
        let wrapped = FrameworkError::EntityError(Box::new(conflict.clone()));
        let back = OrderError::from(wrapped);
        assert_eq!(back, conflict);
        assert_eq!(back.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_plumbing_errors_map_to_kinds() {
        assert_eq!(
            OrderError::from(FrameworkError::ActorClosed).kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            OrderError::from(FrameworkError::NotFound("order_x".into())).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            OrderError::from(FrameworkError::Storage(StoreError::Unavailable("down".into()))).kind(),
            ErrorKind::Persistence
        );
    }
}
