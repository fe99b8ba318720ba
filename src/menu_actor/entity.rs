//! Entity trait implementation for the MenuItem domain type.
//!
//! Enables [`MenuItem`] to be managed by the generic
//! [`ResourceActor`](crate::framework::ResourceActor).

use super::actions::{MenuAction, MenuActionResult, MenuQuery};
use super::error::MenuError;
use crate::framework::ActorEntity;
use crate::model::{MenuItem, MenuItemCreate, MenuItemId, MenuItemUpdate};
use crate::store::Repository;
use async_trait::async_trait;
use tracing::debug;

fn check_text(field: &str, value: &str) -> Result<(), MenuError> {
    if value.trim().is_empty() {
        return Err(MenuError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn check_price(price: f64) -> Result<(), MenuError> {
    if !price.is_finite() || price < 0.0 {
        return Err(MenuError::Validation(format!(
            "price must be a non-negative amount, got {price}"
        )));
    }
    Ok(())
}

#[async_trait]
impl ActorEntity for MenuItem {
    type Id = MenuItemId;
    type Create = MenuItemCreate;
    type Update = MenuItemUpdate;
    type Action = MenuAction;
    type ActionResult = MenuActionResult;
    type Query = MenuQuery;
    type QueryResult = Vec<MenuItem>;
    type Context = ();
    type Error = MenuError;

    fn id(&self) -> &MenuItemId {
        &self.id
    }

    /// Creates a new MenuItem; name, description and price are required.
    fn from_create_params(
        id: MenuItemId,
        params: MenuItemCreate,
        _ctx: &(),
    ) -> Result<Self, MenuError> {
        check_text("name", &params.name)?;
        check_text("description", &params.description)?;
        check_price(params.price)?;
        Ok(Self {
            id,
            name: params.name,
            description: params.description,
            price: params.price,
            available: params.available,
            image: params.image,
        })
    }

    /// Applies the fields present in the update. Nothing changes if any of
    /// them is invalid.
    async fn on_update(&mut self, update: MenuItemUpdate, _ctx: &()) -> Result<(), MenuError> {
        if let Some(name) = &update.name {
            check_text("name", name)?;
        }
        if let Some(description) = &update.description {
            check_text("description", description)?;
        }
        if let Some(price) = update.price {
            check_price(price)?;
        }

        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(available) = update.available {
            self.available = available;
        }
        if let Some(image) = update.image {
            self.image = image;
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: MenuAction,
        _ctx: &(),
    ) -> Result<MenuActionResult, MenuError> {
        match action {
            MenuAction::SetAvailability(available) => {
                let before = self.available;
                self.available = available;
                debug!(menu_item = %self.id, before, available, "Availability set");
                Ok(MenuActionResult::SetAvailability(before))
            }
            MenuAction::CheckAvailability => Ok(MenuActionResult::CheckAvailability(self.available)),
        }
    }

    async fn handle_query(
        query: MenuQuery,
        repository: &dyn Repository<MenuItem>,
        _ctx: &(),
    ) -> Result<Vec<MenuItem>, MenuError> {
        let mut items = repository.load_all().await?;
        if query == MenuQuery::Available {
            items.retain(|item| item.available);
        }
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_every_field() {
        let id = MenuItemId::generate();
        let err = MenuItem::from_create_params(id, MenuItemCreate::new("", "Beef", 9.0), &())
            .unwrap_err();
        assert_eq!(err, MenuError::Validation("name is required".into()));

        let err = MenuItem::from_create_params(id, MenuItemCreate::new("Burger", "  ", 9.0), &())
            .unwrap_err();
        assert!(matches!(err, MenuError::Validation(_)));

        let err =
            MenuItem::from_create_params(id, MenuItemCreate::new("Burger", "Beef", f64::NAN), &())
                .unwrap_err();
        assert!(matches!(err, MenuError::Validation(_)));
    }

    #[tokio::test]
    async fn test_invalid_update_leaves_item_untouched() {
        let mut item = MenuItem::from_create_params(
            MenuItemId::generate(),
            MenuItemCreate::new("Burger", "Beef", 9.0),
            &(),
        )
        .unwrap();
        let update = MenuItemUpdate {
            name: Some("Cheeseburger".into()),
            price: Some(-1.0),
            ..Default::default()
        };
        assert!(item.on_update(update, &()).await.is_err());
        assert_eq!(item.name, "Burger");
        assert_eq!(item.price, 9.0);
    }

    #[tokio::test]
    async fn test_set_availability_returns_previous_value() {
        let mut item = MenuItem::from_create_params(
            MenuItemId::generate(),
            MenuItemCreate::new("Burger", "Beef", 9.0),
            &(),
        )
        .unwrap();
        let result = item
            .handle_action(MenuAction::SetAvailability(false), &())
            .await
            .unwrap();
        assert_eq!(result, MenuActionResult::SetAvailability(true));
        assert!(!item.available);
    }
}
