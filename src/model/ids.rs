//! Type-safe identifiers.
//!
//! Orders, messages and menu items get UUID v7 identifiers so that ids sort by
//! creation time. User ids come from the authentication collaborator and are
//! treated as opaque strings.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Allocates a fresh, time-ordered identifier.
            pub fn generate() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0.simple())
            }
        }
    };
}

uuid_id!(
    /// Identifier of an [`Order`](crate::model::Order).
    OrderId,
    "order"
);
uuid_id!(
    /// Identifier of a chat [`Message`](crate::model::Message).
    MessageId,
    "msg"
);
uuid_id!(
    /// Identifier of a [`MenuItem`](crate::model::MenuItem).
    MenuItemId,
    "menu"
);

/// Identifier of a user, as issued by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_ids_serialize_as_plain_uuid() {
        let id = OrderId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));

        let back: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_display_carries_prefix() {
        let id = MessageId(Uuid::nil());
        assert_eq!(id.to_string(), "msg_00000000000000000000000000000000");
        assert_eq!(UserId::from("u-7").to_string(), "u-7");
    }
}
