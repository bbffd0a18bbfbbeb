//! Types and functions for storing and loading items from the database.

use super::item_model::{FieldChange, Item, ItemChanges, NewItem};
use crate::infra::{
    config::InsertIdStrategy,
    database::DbPool,
    error::ApiResult,
    validation::Valid,
};
use sqlx::{QueryBuilder, Sqlite};
use tracing::{instrument, Instrument};

/// Anything that can store items.
///
/// Each method is a single parameterized statement,
/// apart from the insert which may need a follow-up on the same connection.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ItemStore: Send + Sync {
    /// Lists all items, newest first.
    async fn list_items(&self) -> ApiResult<Vec<Item>>;

    /// Fetches an item.
    async fn fetch_item(&self, id: i64) -> ApiResult<Option<Item>>;

    /// Inserts an item and returns the id the store assigned to it, if it reported one.
    async fn insert_item(&self, new_item: Valid<NewItem>) -> ApiResult<Option<i64>>;

    /// Applies changes to an item and returns the number of affected rows.
    async fn update_item(&self, id: i64, changes: ItemChanges) -> ApiResult<u64>;

    /// Deletes an item and returns the number of affected rows.
    async fn delete_item(&self, id: i64) -> ApiResult<u64>;
}

/// An item repository backed by SQLite.
#[derive(Clone, Debug)]
pub struct SqliteItemRepository {
    db: DbPool,
    insert_id: InsertIdStrategy,
}

impl SqliteItemRepository {
    /// Creates a new repository.
    pub fn new(db: DbPool, insert_id: InsertIdStrategy) -> Self {
        Self { db, insert_id }
    }
}

#[async_trait::async_trait]
impl ItemStore for SqliteItemRepository {
    #[instrument(skip(self))]
    async fn list_items(&self) -> ApiResult<Vec<Item>> {
        tracing::info!("Listing items");
        let items = sqlx::query_as::<_, Item>(
            r#"
                SELECT id, title, description FROM items
                ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.db)
        .instrument(tracing::info_span!("fetch_all"))
        .await?;
        tracing::info!("Listed {} items", items.len());
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn fetch_item(&self, id: i64) -> ApiResult<Option<Item>> {
        tracing::info!("Reading item");
        let item = sqlx::query_as::<_, Item>(
            r#"
                SELECT id, title, description FROM items
                WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .instrument(tracing::info_span!("fetch_optional"))
        .await?;
        tracing::info!("Found item: {:?}", item);
        Ok(item)
    }

    #[instrument(skip(self))]
    async fn insert_item(&self, new_item: Valid<NewItem>) -> ApiResult<Option<i64>> {
        let new_item = new_item.into_inner();
        tracing::info!("Creating item {:?}", new_item);
        let id = match self.insert_id {
            InsertIdStrategy::Returning => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                        INSERT INTO items (title, description)
                        VALUES (?, ?)
                        RETURNING id
                    "#,
                )
                .bind(new_item.title)
                .bind(new_item.description)
                .fetch_optional(&self.db)
                .await?
            }
            InsertIdStrategy::LastInsertRowid => {
                // last_insert_rowid() is per connection, so both statements must share one.
                let mut conn = self.db.acquire().await?;
                sqlx::query(
                    r#"
                        INSERT INTO items (title, description)
                        VALUES (?, ?)
                    "#,
                )
                .bind(new_item.title)
                .bind(new_item.description)
                .execute(&mut *conn)
                .await?;
                let id = sqlx::query_scalar::<_, i64>("SELECT last_insert_rowid()")
                    .fetch_one(&mut *conn)
                    .await?;
                // Zero means this connection has not inserted anything.
                (id != 0).then_some(id)
            }
        };
        tracing::info!("Created item with id {:?}", id);
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn update_item(&self, id: i64, changes: ItemChanges) -> ApiResult<u64> {
        tracing::info!("Updating item");
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE items SET ");
        let mut set = query.separated(", ");
        for change in changes.iter() {
            set.push(change.field().column());
            set.push_unseparated(" = ");
            match change {
                FieldChange::Title(title) => set.push_bind_unseparated(title.clone()),
                FieldChange::Description(description) => {
                    set.push_bind_unseparated(description.clone())
                }
            };
        }
        query.push(" WHERE id = ").push_bind(id);
        let rows = query.build().execute(&self.db).await?.rows_affected();
        tracing::info!("Updated {} rows", rows);
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn delete_item(&self, id: i64) -> ApiResult<u64> {
        tracing::info!("Deleting item");
        let rows = sqlx::query(
            r#"
                DELETE FROM items
                WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?
        .rows_affected();
        if rows == 0 {
            tracing::info!("Item did not exist");
        } else {
            tracing::info!("Deleted item");
        }
        Ok(rows)
    }
}
