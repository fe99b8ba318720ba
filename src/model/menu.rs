//! Menu items that orders refer to.
//!
//! Only the pieces the order path needs live here: existence, price and
//! availability. Presentation of the menu belongs to the UI layer.

use crate::model::MenuItemId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub available: bool,
    /// Opaque image location, empty when the item has no picture.
    pub image: String,
}

/// Payload for creating a new menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemCreate {
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub image: String,
}

fn default_available() -> bool {
    true
}

impl MenuItemCreate {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price,
            available: true,
            image: String::new(),
        }
    }
}

/// Payload for updating an existing menu item. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub available: Option<bool>,
    pub image: Option<String>,
}
