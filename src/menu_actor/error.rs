//! Error types for the Menu actor.

use crate::error::ErrorKind;
use crate::framework::FrameworkError;
use crate::model::AccessError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur during menu operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MenuError {
    /// The requested menu item was not found.
    #[error("Menu item not found: {0}")]
    NotFound(String),

    /// The menu item data provided is invalid.
    #[error("Menu item validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Forbidden(#[from] AccessError),

    /// The backing store failed.
    #[error("Menu persistence error: {0}")]
    Persistence(String),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunication(String),
}

impl MenuError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MenuError::NotFound(_) => ErrorKind::NotFound,
            MenuError::Validation(_) => ErrorKind::Validation,
            MenuError::Forbidden(_) => ErrorKind::Forbidden,
            MenuError::Persistence(_) => ErrorKind::Persistence,
            MenuError::ActorCommunication(_) => ErrorKind::Unavailable,
        }
    }
}

impl From<FrameworkError> for MenuError {
    fn from(e: FrameworkError) -> Self {
        match e.into_entity_error::<MenuError>() {
            Ok(domain) => domain,
            Err(FrameworkError::NotFound(id)) => MenuError::NotFound(id),
            Err(FrameworkError::Storage(store)) => MenuError::Persistence(store.to_string()),
            Err(other) => MenuError::ActorCommunication(other.to_string()),
        }
    }
}

impl From<StoreError> for MenuError {
    fn from(e: StoreError) -> Self {
        MenuError::Persistence(e.to_string())
    }
}

impl From<String> for MenuError {
    fn from(msg: String) -> Self {
        MenuError::ActorCommunication(msg)
    }
}
