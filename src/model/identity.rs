//! Caller identity handed to the core by the authentication collaborator.
//!
//! The core trusts this identity as-is; it only performs role checks.

use crate::model::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Staff,
    Manager,
}

impl Role {
    /// Whether this role satisfies a requirement for `required`.
    ///
    /// Roles are ranked Customer < Staff < Manager.
    pub fn satisfies(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    fn rank(self) -> u8 {
        match self {
            Role::Customer => 0,
            Role::Staff => 1,
            Role::Manager => 2,
        }
    }
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

/// Raised when the caller's role does not allow an operation.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{user} ({role:?}) is not allowed to {action}")]
pub struct AccessError {
    pub user: UserId,
    pub role: Role,
    pub action: String,
}

impl Identity {
    pub fn new(user_id: impl Into<UserId>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn customer(user_id: impl Into<UserId>) -> Self {
        Self::new(user_id, Role::Customer)
    }

    pub fn staff(user_id: impl Into<UserId>) -> Self {
        Self::new(user_id, Role::Staff)
    }

    pub fn manager(user_id: impl Into<UserId>) -> Self {
        Self::new(user_id, Role::Manager)
    }

    pub fn is_staff(&self) -> bool {
        self.role.satisfies(Role::Staff)
    }

    /// Checks that the caller holds at least `role`.
    pub fn require(&self, role: Role, action: &str) -> Result<(), AccessError> {
        if self.role.satisfies(role) {
            Ok(())
        } else {
            Err(AccessError {
                user: self.user_id.clone(),
                role: self.role,
                action: action.to_string(),
            })
        }
    }
}
