//! Outbox of asset movements emitted by committed ledger operations.

use crate::domain::Address;
use crate::engine::TransferInstruction;
use serde::Serialize;
use sqlx::sqlite::SqliteConnection;
use sqlx::Row;

use super::{column_error, Repository};

/// A persisted transfer instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRow {
    pub id: i64,
    pub operation: String,
    pub sub_account: Address,
    pub asset: Address,
    pub from: Address,
    pub to: Address,
    pub amount: String,
    pub created_at: i64,
}

impl Repository {
    /// Transfers with id greater than `after_id`, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_transfers(
        &self,
        sub_account: Option<&Address>,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<TransferRow>, sqlx::Error> {
        let rows = match sub_account {
            Some(sub_account) => {
                sqlx::query(
                    r#"
                    SELECT id, operation, sub_account, asset, from_address, to_address, amount, created_at
                    FROM transfers
                    WHERE sub_account = ? AND id > ?
                    ORDER BY id ASC
                    LIMIT ?
                    "#,
                )
                .bind(sub_account.as_str())
                .bind(after_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, operation, sub_account, asset, from_address, to_address, amount, created_at
                    FROM transfers
                    WHERE id > ?
                    ORDER BY id ASC
                    LIMIT ?
                    "#,
                )
                .bind(after_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter()
            .map(|row| -> Result<TransferRow, sqlx::Error> {
                let amount: String = row.get("amount");
                amount
                    .parse::<u128>()
                    .map_err(|e| column_error("amount", e))?;
                Ok(TransferRow {
                    id: row.get("id"),
                    operation: row.get("operation"),
                    sub_account: Address::new(row.get::<String, _>("sub_account")),
                    asset: Address::new(row.get::<String, _>("asset")),
                    from: Address::new(row.get::<String, _>("from_address")),
                    to: Address::new(row.get::<String, _>("to_address")),
                    amount,
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }
}

/// Append instructions produced by one operation, preserving their order.
pub async fn insert_transfers(
    conn: &mut SqliteConnection,
    operation: &str,
    sub_account: &Address,
    instructions: &[TransferInstruction],
) -> Result<(), sqlx::Error> {
    let created_at = chrono::Utc::now().timestamp_millis();
    for t in instructions {
        sqlx::query(
            r#"
            INSERT INTO transfers (
                operation, sub_account, asset, from_address, to_address, amount, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(operation)
        .bind(sub_account.as_str())
        .bind(t.asset.as_str())
        .bind(t.from.as_str())
        .bind(t.to.as_str())
        .bind(t.amount.to_string())
        .bind(created_at)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
