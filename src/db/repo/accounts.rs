//! Margin account records.

use crate::domain::{Address, AssetId, TokenId};
use crate::engine::FullMarginAccount;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

use super::{column_error, Repository};

impl Repository {
    /// Current record for `owner`, or an empty account if none was stored.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value is malformed.
    pub async fn account(&self, owner: &Address) -> Result<FullMarginAccount, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        fetch_account(&mut *conn, owner).await
    }
}

/// Load the record for `owner`; missing rows read as an empty account.
pub async fn fetch_account(
    conn: &mut SqliteConnection,
    owner: &Address,
) -> Result<FullMarginAccount, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT short_call_id, short_call_amount, short_put_id, short_put_amount,
               collateral_id, collateral_amount
        FROM accounts
        WHERE sub_account = ?
        "#,
    )
    .bind(owner.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => account_from_row(&row),
        None => Ok(FullMarginAccount::default()),
    }
}

/// Insert or replace the record for `owner`.
pub async fn store_account(
    conn: &mut SqliteConnection,
    owner: &Address,
    account: &FullMarginAccount,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO accounts (
            sub_account, short_call_id, short_call_amount, short_put_id,
            short_put_amount, collateral_id, collateral_amount, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(sub_account) DO UPDATE SET
            short_call_id = excluded.short_call_id,
            short_call_amount = excluded.short_call_amount,
            short_put_id = excluded.short_put_id,
            short_put_amount = excluded.short_put_amount,
            collateral_id = excluded.collateral_id,
            collateral_amount = excluded.collateral_amount,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(owner.as_str())
    .bind(account.short_call_id.to_hex())
    .bind(account.short_call_amount.to_string())
    .bind(account.short_put_id.to_hex())
    .bind(account.short_put_amount.to_string())
    .bind(i64::from(account.collateral_id.0))
    .bind(account.collateral_amount.to_string())
    .bind(chrono::Utc::now().timestamp_millis())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn account_from_row(row: &SqliteRow) -> Result<FullMarginAccount, sqlx::Error> {
    let token = |col: &str| {
        TokenId::from_str(&row.get::<String, _>(col)).map_err(|e| column_error(col, e))
    };
    let amount = |col: &str| {
        row.get::<String, _>(col)
            .parse::<u64>()
            .map_err(|e| column_error(col, e))
    };
    let collateral_id = u8::try_from(row.get::<i64, _>("collateral_id"))
        .map_err(|e| column_error("collateral_id", e))?;
    let collateral_amount = row
        .get::<String, _>("collateral_amount")
        .parse::<u128>()
        .map_err(|e| column_error("collateral_amount", e))?;

    Ok(FullMarginAccount {
        short_call_id: token("short_call_id")?,
        short_call_amount: amount("short_call_amount")?,
        short_put_id: token("short_put_id")?,
        short_put_amount: amount("short_put_amount")?,
        collateral_id: AssetId(collateral_id),
        collateral_amount,
    })
}
