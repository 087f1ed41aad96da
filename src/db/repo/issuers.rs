//! Issuer registry persistence: the principal/id mapping plus the counter of
//! the last assigned id.

use crate::domain::{Address, IssuerId};
use crate::engine::IssuerRegistry;
use sqlx::sqlite::SqliteConnection;
use sqlx::Row;

use super::{column_error, Repository};

const LAST_ISSUER_ID: &str = "last_issuer_id";

impl Repository {
    /// Rebuild the in-memory registry from storage.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored id does not fit 16 bits.
    pub async fn issuer_registry(&self) -> Result<IssuerRegistry, sqlx::Error> {
        let rows = sqlx::query("SELECT issuer_id, principal FROM issuers ORDER BY issuer_id ASC")
            .fetch_all(&self.pool)
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let id = u16::try_from(row.get::<i64, _>("issuer_id"))
                .map_err(|e| column_error("issuer_id", e))?;
            entries.push((IssuerId(id), Address::new(row.get::<String, _>("principal"))));
        }

        let last_id = sqlx::query("SELECT value FROM registry_counters WHERE name = ?")
            .bind(LAST_ISSUER_ID)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| row.get::<i64, _>("value"))
            .unwrap_or(0);
        let last_id = u16::try_from(last_id).map_err(|e| column_error("value", e))?;

        Ok(IssuerRegistry::from_parts(last_id, entries))
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn issuer_principal(&self, id: IssuerId) -> Result<Option<Address>, sqlx::Error> {
        let row = sqlx::query("SELECT principal FROM issuers WHERE issuer_id = ?")
            .bind(i64::from(id.0))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Address::new(r.get::<String, _>("principal"))))
    }
}

/// Record a newly registered issuer and advance the id counter to it.
pub async fn store_issuer(
    conn: &mut SqliteConnection,
    id: IssuerId,
    principal: &Address,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO issuers (issuer_id, principal, registered_at) VALUES (?, ?, ?)")
        .bind(i64::from(id.0))
        .bind(principal.as_str())
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO registry_counters (name, value) VALUES (?, ?)
        ON CONFLICT(name) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(LAST_ISSUER_ID)
    .bind(i64::from(id.0))
    .execute(&mut *conn)
    .await?;
    Ok(())
}
