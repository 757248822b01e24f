use std::str::FromStr;

use shared::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

pub mod model;

#[derive(Clone)]
pub struct ConnectionPool(SqlitePool);

impl ConnectionPool {
    pub fn new(pool: SqlitePool) -> Self {
        Self(pool)
    }

    pub fn inner_ref(&self) -> &SqlitePool {
        &self.0
    }

    pub async fn begin(&self) -> AppResult<sqlx::Transaction<'_, sqlx::Sqlite>> {
        self.0.begin().await.map_err(AppError::TransactionError)
    }
}

/// Opens the database, enables WAL mode and foreign keys, and brings the
/// schema up to date before handing the pool out.
pub async fn connect_database_with(cfg: &DatabaseConfig) -> AppResult<ConnectionPool> {
    info!(path = %cfg.path, "connecting to sqlite database");

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", cfg.path))
        .map_err(AppError::SpecificOperationError)?
        .journal_mode(SqliteJournalMode::Wal)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(AppError::SpecificOperationError)?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| AppError::SpecificOperationError(e.into()))?;

    Ok(ConnectionPool(pool))
}

// A single-connection in-memory database; more connections would each see
// their own empty memory instance.
#[cfg(test)]
pub(crate) async fn connect_test_database() -> ConnectionPool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();

    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    ConnectionPool(pool)
}
