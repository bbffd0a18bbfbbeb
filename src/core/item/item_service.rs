//! A service for interacting with items.

use super::{
    item_model::{Item, ItemChanges, ItemId, ItemPatch, NewItem},
    item_repository::ItemStore,
};
use crate::infra::{
    config::UpdateMode,
    error::{ApiResult, ClientError, InternalError},
    validation::Valid,
};
use std::sync::Arc;
use tracing::instrument;

/// The item operations, on top of an injected store.
#[derive(Clone)]
pub struct ItemService {
    store: Arc<dyn ItemStore>,
    update_mode: UpdateMode,
}

impl ItemService {
    /// Creates a new service.
    pub fn new(store: Arc<dyn ItemStore>, update_mode: UpdateMode) -> Self {
        Self { store, update_mode }
    }

    /// Lists all items, newest first.
    #[instrument(skip(self))]
    pub async fn list_items(&self) -> ApiResult<Vec<Item>> {
        self.store.list_items().await
    }

    /// Reads an item.
    #[instrument(skip(self))]
    pub async fn read_item(&self, id: ItemId) -> ApiResult<Item> {
        let Some(id) = id.get() else {
            return Err(ClientError::NotFound.into());
        };
        let item = self.store.fetch_item(id).await?;
        Ok(item.ok_or(ClientError::NotFound)?)
    }

    /// Creates a new item and returns it as stored.
    #[instrument(skip(self))]
    pub async fn create_item(&self, new_item: NewItem) -> ApiResult<Item> {
        let new_item = Valid::new(new_item)?;
        let id = self
            .store
            .insert_item(new_item)
            .await?
            .ok_or_else(|| InternalError::Inconsistent("Insert failed".to_string()))?;
        let item = self.store.fetch_item(id).await?.ok_or_else(|| {
            InternalError::Inconsistent(format!("Created item {id} could not be read back"))
        })?;
        Ok(item)
    }

    /// Updates an item according to the configured [`UpdateMode`] and returns it as stored.
    #[instrument(skip(self))]
    pub async fn update_item(&self, id: ItemId, patch: ItemPatch) -> ApiResult<Item> {
        let changes = match self.update_mode {
            UpdateMode::Full => ItemChanges::replace(Valid::new(NewItem {
                title: patch.title.flatten(),
                description: patch.description.flatten(),
            })?),
            UpdateMode::Partial => ItemChanges::from_patch(patch)?,
        };
        let Some(id) = id.get() else {
            return Err(ClientError::NotFound.into());
        };
        let rows = self.store.update_item(id, changes).await?;
        tracing::debug!("Update matched {} rows", rows);
        let item = self.store.fetch_item(id).await?;
        Ok(item.ok_or(ClientError::NotFound)?)
    }

    /// Deletes an item. Deleting an item that does not exist is not an error.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: ItemId) -> ApiResult<()> {
        if let Some(id) = id.get() {
            let rows = self.store.delete_item(id).await?;
            tracing::debug!("Delete matched {} rows", rows);
        }
        Ok(())
    }
}
