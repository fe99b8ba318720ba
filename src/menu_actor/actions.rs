//! Custom actions and queries for the Menu actor.
//!
//! Actions mutate one [`MenuItem`](crate::model::MenuItem) beyond plain updates and
//! are handled by [`ActorEntity::handle_action`](crate::framework::ActorEntity::handle_action).
//! Queries read the whole menu.

/// Custom actions for menu items.
#[derive(Debug, Clone)]
pub enum MenuAction {
    /// Switches the item on or off without touching its other fields.
    SetAvailability(bool),
    /// Reports whether the item can currently be ordered.
    CheckAvailability,
}

/// Results from MenuActions - variants match 1:1 with MenuAction
#[derive(Debug, Clone, PartialEq)]
pub enum MenuActionResult {
    /// The availability before the change.
    SetAvailability(bool),
    CheckAvailability(bool),
}

/// Read-only questions about the menu.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuQuery {
    All,
    /// Items that can be ordered right now.
    Available,
}
