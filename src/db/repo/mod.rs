//! Repository layer for database operations.
//!
//! Reads go straight to the pool. Writes are free functions over a
//! `SqliteConnection` so a service call can group them in one transaction:
//! - `accounts.rs` - margin account records
//! - `issuers.rs` - issuer registry and its id counter
//! - `transfers.rs` - outbox of asset movements

pub mod accounts;
pub mod issuers;
pub mod transfers;

use sqlx::sqlite::{Sqlite, SqlitePool};
use sqlx::Transaction;

pub use transfers::TransferRow;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Start a write transaction. Dropping it without commit rolls back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Wrap a malformed column value as a decode error.
pub(crate) fn column_error<E>(column: &str, err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(err),
    }
}
