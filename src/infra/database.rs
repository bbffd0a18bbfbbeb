//! For interacting with the database.

use super::config::DatabaseConfig;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    ConnectOptions,
};
use std::str::FromStr;
use tracing::log::LevelFilter;

/// A common database pool type.
pub type DbPool = SqlitePool;

/// The `items` table. Applied on start-up.
const SCHEMA: &str = include_str!("../../schema.sql");

/// Connects to the database based on some configuration.
///
/// Connections are opened lazily, so this only fails on a malformed url.
pub fn init_db(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let db_options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .log_statements(LevelFilter::Debug);
    let db = SqlitePoolOptions::new()
        .acquire_timeout(config.acquire_timeout)
        .min_connections(1)
        .max_connections(config.max_connections)
        .connect_lazy_with(db_options);
    Ok(db)
}

/// Creates the `items` table if it does not exist yet.
#[tracing::instrument(skip_all)]
pub async fn ensure_schema(db: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(db).await?;
    tracing::debug!("Schema ready");
    Ok(())
}

/// A single-connection in-memory database with the schema applied.
///
/// The connection is never recycled since that would drop the database.
#[cfg(test)]
pub(crate) async fn test_db() -> DbPool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
    let db = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    ensure_schema(&db).await.unwrap();
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_is_idempotent() {
        let db = test_db().await;
        ensure_schema(&db).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(0, count);
    }
}
