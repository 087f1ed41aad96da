//! Ledger database setup: pool, pragmas and the `schema.sql` migration.

use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use tracing::{debug, info};

const SCHEMA: &str = include_str!("schema.sql");

/// Open (creating if needed) the ledger database at `db_path` and bring its
/// schema up to date.
pub async fn init_db(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .after_connect(|conn, _meta| Box::pin(async move { configure_connection(conn).await }))
        .connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await?;

    apply_schema(&pool).await?;

    info!(path = %db_path, "Ledger database ready");
    Ok(pool)
}

/// Every statement in the schema is `IF NOT EXISTS`, so this is safe to rerun.
async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let statements = SCHEMA
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let mut applied = 0usize;
    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
        applied += 1;
    }

    debug!(statements = applied, "Ledger schema applied");
    Ok(())
}

/// The service is the single writer, so WAL with NORMAL sync is enough.
async fn configure_connection(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    for pragma in ["PRAGMA busy_timeout = 5000", "PRAGMA synchronous = NORMAL"] {
        sqlx::query(pragma).execute(&mut *conn).await?;
    }

    // journal_mode reports the mode actually in effect
    let journal_mode: String = sqlx::query("PRAGMA journal_mode = WAL")
        .fetch_one(&mut *conn)
        .await?
        .get(0);
    debug!(journal_mode = %journal_mode, "SQLite connection configured");
    Ok(())
}
