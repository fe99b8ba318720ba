//! Coarse error classification shared by every component.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// What kind of failure an error represents, independent of which component
/// raised it. Transports map this to their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Forbidden,
    Persistence,
    Unavailable,
}

impl ErrorKind {
    /// Whether the same request may succeed if sent again unchanged.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Persistence | ErrorKind::Unavailable)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Unavailable => "unavailable",
        };
        f.write_str(name)
    }
}
