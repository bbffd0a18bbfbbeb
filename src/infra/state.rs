//! Global application state.
//!
//! Handlers pull the parts they need out of it with [`axum::extract::State`].

use super::{config::ItemsConfig, database::DbPool};
use crate::core::item::{item_repository::SqliteItemRepository, item_service::ItemService};
use axum::extract::FromRef;
use std::sync::Arc;

/// Global application state.
#[derive(Clone, FromRef)]
pub struct AppState {
    items: ItemService,
}

impl AppState {
    /// Constructs a new [`AppState`] on top of a database pool.
    pub fn new(db: DbPool, config: &ItemsConfig) -> Self {
        let store = SqliteItemRepository::new(db, config.insert_id);
        Self {
            items: ItemService::new(Arc::new(store), config.update_mode),
        }
    }
}
