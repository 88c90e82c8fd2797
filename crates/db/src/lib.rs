//! SQLite persistence for chats and messages.
//!
//! The store is an append-mostly log: messages are inserted once and read
//! back in timestamp order; chats carry a `updated_at` watermark refreshed on
//! every exchange. Repository traits keep the server handlers testable
//! against in-memory fakes.

use std::time::Duration;

use analyst_core::config::DatabaseConfig;
use sqlx::sqlite::SqlitePoolOptions;

pub mod migrations;
pub mod repositories;

pub type DbPool = sqlx::SqlitePool;

pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&config.url, config.max_connections, config.timeout_secs).await
}

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}
