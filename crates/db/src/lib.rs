pub mod models;

use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Owns the connection pool and runs embedded migrations on startup.
#[derive(Debug, Clone)]
pub struct DBService {
    pub pool: SqlitePool,
}

impl DBService {
    /// Open (or create) the database at `database_url` and bring the schema
    /// up to date. `database_url` accepts `sqlite:path/to.db` or
    /// `sqlite::memory:`.
    pub async fn new(database_url: &str) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database ready at {database_url}");

        Ok(Self { pool })
    }

    /// Pool for an in-memory database, migrated. Test-only convenience.
    pub async fn new_in_memory() -> Result<Self, DbError> {
        // A single connection keeps the in-memory database alive and shared.
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}
