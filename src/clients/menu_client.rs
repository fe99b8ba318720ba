//! # Menu Client
//!
//! Provides a high-level API for interacting with the `MenuItem` actor.
//! Reads are open to everybody; every write is for managers.
use crate::clients::actor_client::ActorClient;
use crate::framework::{FrameworkError, ResourceClient};
use crate::menu_actor::{MenuAction, MenuActionResult, MenuError, MenuQuery};
use crate::model::{Identity, MenuItem, MenuItemCreate, MenuItemId, MenuItemUpdate, Role};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for interacting with the Menu actor.
#[derive(Clone)]
pub struct MenuClient {
    inner: ResourceClient<MenuItem>,
}

#[async_trait]
impl ActorClient<MenuItem> for MenuClient {
    type Error = MenuError;

    fn inner(&self) -> &ResourceClient<MenuItem> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        MenuError::from(e)
    }
}

impl MenuClient {
    pub fn new(inner: ResourceClient<MenuItem>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self, identity), fields(caller = %identity.user_id))]
    pub async fn create_item(
        &self,
        identity: &Identity,
        params: MenuItemCreate,
    ) -> Result<MenuItem, MenuError> {
        identity.require(Role::Manager, "edit the menu")?;
        debug!("Sending request");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    #[instrument(skip(self, identity), fields(caller = %identity.user_id))]
    pub async fn update_item(
        &self,
        identity: &Identity,
        id: MenuItemId,
        update: MenuItemUpdate,
    ) -> Result<MenuItem, MenuError> {
        identity.require(Role::Manager, "edit the menu")?;
        self.inner.update(id, update).await.map_err(Self::map_error)
    }

    #[instrument(skip(self, identity), fields(caller = %identity.user_id))]
    pub async fn delete_item(&self, identity: &Identity, id: MenuItemId) -> Result<(), MenuError> {
        identity.require(Role::Manager, "edit the menu")?;
        self.inner.delete(id).await.map_err(Self::map_error)
    }

    /// Switches an item on or off. Returns the previous availability.
    #[instrument(skip(self, identity), fields(caller = %identity.user_id))]
    pub async fn set_availability(
        &self,
        identity: &Identity,
        id: MenuItemId,
        available: bool,
    ) -> Result<bool, MenuError> {
        identity.require(Role::Manager, "edit the menu")?;
        match self
            .inner
            .perform_action(id, MenuAction::SetAvailability(available))
            .await
        {
            Ok(MenuActionResult::SetAvailability(before)) => Ok(before),
            Ok(_) => unreachable!("SetAvailability action must return SetAvailability result"),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn is_available(&self, id: MenuItemId) -> Result<bool, MenuError> {
        match self
            .inner
            .perform_action(id, MenuAction::CheckAvailability)
            .await
        {
            Ok(MenuActionResult::CheckAvailability(available)) => Ok(available),
            Ok(_) => unreachable!("CheckAvailability action must return CheckAvailability result"),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    /// The whole menu, sorted by name.
    pub async fn list_items(&self) -> Result<Vec<MenuItem>, MenuError> {
        self.inner
            .query(MenuQuery::All)
            .await
            .map_err(Self::map_error)
    }

    /// Items that can be ordered right now, sorted by name.
    pub async fn available_items(&self) -> Result<Vec<MenuItem>, MenuError> {
        self.inner
            .query(MenuQuery::Available)
            .await
            .map_err(Self::map_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::{create_mock_client, expect_action};

    #[tokio::test]
    async fn test_set_availability_returns_previous_value() {
        let (client, mut receiver) = create_mock_client::<MenuItem>(10);
        let menu_client = MenuClient::new(client);
        let id = MenuItemId::generate();

        let task = tokio::spawn(async move {
            menu_client
                .set_availability(&Identity::manager("max"), id, false)
                .await
        });

        let (got, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(got, id);
        assert!(matches!(action, MenuAction::SetAvailability(false)));
        responder
            .send(Ok(MenuActionResult::SetAvailability(true)))
            .unwrap();

        assert!(task.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn test_staff_cannot_edit_menu() {
        let (client, _receiver) = create_mock_client::<MenuItem>(10);
        let menu_client = MenuClient::new(client);

        let err = menu_client
            .create_item(&Identity::staff("sam"), MenuItemCreate::new("Soup", "Tomato", 4.0))
            .await
            .unwrap_err();
        assert!(matches!(err, MenuError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_missing_item_maps_to_not_found() {
        let (client, mut receiver) = create_mock_client::<MenuItem>(10);
        let menu_client = MenuClient::new(client);
        let id = MenuItemId::generate();

        let task = tokio::spawn(async move { menu_client.is_available(id).await });

        let (_, _, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        responder
            .send(Err(FrameworkError::NotFound(id.to_string())))
            .unwrap();

        assert!(matches!(task.await.unwrap(), Err(MenuError::NotFound(_))));
    }
}
