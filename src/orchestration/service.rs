use crate::config::Config;
use crate::db::repo::{accounts, issuers, transfers};
use crate::db::Repository;
use crate::domain::{Address, AssetId, IssuerId, Settlement, TokenId};
use crate::engine::{
    AccountStore, AssetRegistry, AssetTransfer, EngineError, FullMarginAccount, MergeOutcome,
    PhysicalSettlement, SettlementReceipt, SplitOutcome, StaticAssetRegistry, TransferOutbox,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Transactional front of the engine.
///
/// Each call takes the writer lock, loads the records it touches, applies the
/// engine transition to a copy and persists the result together with any
/// transfer instructions in one SQLite transaction. An engine error drops the
/// transaction before anything is written.
pub struct MarginService {
    repo: Arc<Repository>,
    assets: StaticAssetRegistry,
    engine_id: u8,
    settlement: Mutex<PhysicalSettlement>,
}

impl MarginService {
    /// Build the service, restoring the issuer registry from storage.
    pub async fn load(repo: Arc<Repository>, config: &Config) -> Result<Self, ServiceError> {
        let issuers = repo.issuer_registry().await?;
        info!(
            issuers = issuers.len(),
            last_issuer_id = issuers.last_id(),
            "Issuer registry loaded"
        );
        let settlement = PhysicalSettlement::new(
            config.engine_address.clone(),
            config.settlement_driver.clone(),
        )
        .with_window(config.settlement_window_secs)
        .with_issuers(issuers);

        Ok(Self {
            repo,
            assets: config.asset_registry(),
            engine_id: config.engine_id,
            settlement: Mutex::new(settlement),
        })
    }

    pub fn engine_id(&self) -> u8 {
        self.engine_id
    }

    pub fn assets(&self) -> &StaticAssetRegistry {
        &self.assets
    }

    pub async fn account(&self, owner: &Address) -> Result<FullMarginAccount, ServiceError> {
        Ok(self.repo.account(owner).await?)
    }

    /// Deposit `amount` of `asset_id` pulled from `from`.
    pub async fn add_collateral(
        &self,
        owner: &Address,
        from: &Address,
        asset_id: AssetId,
        amount: u128,
    ) -> Result<FullMarginAccount, ServiceError> {
        let asset = self.assets.resolve_asset(asset_id)?;
        self.apply("add_collateral", owner, |account, outbox, engine| {
            account.add_collateral(asset_id, amount)?;
            if amount > 0 {
                outbox.transfer_from(&asset.address, from, engine, amount)?;
            }
            Ok(())
        })
        .await
        .map(|(_, account)| account)
    }

    /// Withdraw `amount` of `asset_id` to `to`.
    pub async fn remove_collateral(
        &self,
        owner: &Address,
        to: &Address,
        asset_id: AssetId,
        amount: u128,
    ) -> Result<FullMarginAccount, ServiceError> {
        self.apply("remove_collateral", owner, |account, outbox, _| {
            account.remove_collateral(asset_id, amount)?;
            if amount > 0 {
                let asset = self.assets.resolve_asset(asset_id)?;
                outbox.transfer(&asset.address, to, amount)?;
            }
            Ok(())
        })
        .await
        .map(|(_, account)| account)
    }

    pub async fn mint_option(
        &self,
        owner: &Address,
        token_id: TokenId,
        amount: u64,
    ) -> Result<FullMarginAccount, ServiceError> {
        self.check_engine(token_id)?;
        self.apply("mint_option", owner, |account, _, _| {
            account.mint_option(token_id, amount)
        })
        .await
        .map(|(_, account)| account)
    }

    pub async fn burn_option(
        &self,
        owner: &Address,
        token_id: TokenId,
        amount: u64,
    ) -> Result<FullMarginAccount, ServiceError> {
        self.apply("burn_option", owner, |account, _, _| {
            account.burn_option(token_id, amount)
        })
        .await
        .map(|(_, account)| account)
    }

    pub async fn merge(
        &self,
        owner: &Address,
        short_id: TokenId,
        long_id: TokenId,
        amount: u64,
    ) -> Result<(MergeOutcome, FullMarginAccount), ServiceError> {
        self.apply("merge", owner, |account, _, _| {
            account.merge(short_id, long_id, amount)
        })
        .await
    }

    pub async fn split(
        &self,
        owner: &Address,
        spread_id: TokenId,
        amount: u64,
    ) -> Result<(SplitOutcome, FullMarginAccount), ServiceError> {
        self.apply("split", owner, |account, _, _| account.split(spread_id, amount))
            .await
    }

    /// Apply the driver-computed net payout and clear both short sides.
    pub async fn settle_at_expiry(
        &self,
        owner: &Address,
        payout: i128,
    ) -> Result<FullMarginAccount, ServiceError> {
        self.apply("settle_at_expiry", owner, |account, _, _| {
            account.settle_at_expiry(payout)
        })
        .await
        .map(|(_, account)| account)
    }

    pub async fn register_issuer(&self, principal: Address) -> Result<IssuerId, ServiceError> {
        let mut settlement = self.settlement.lock().await;
        let mut next = settlement.clone();
        let id = next.register_issuer(principal.clone())?;

        let mut tx = self.repo.begin().await?;
        issuers::store_issuer(&mut *tx, id, &principal).await?;
        tx.commit().await?;

        *settlement = next;
        info!(issuer_id = %id, principal = %principal, "Issuer registered");
        Ok(id)
    }

    pub async fn issuer_principal(&self, id: IssuerId) -> Option<Address> {
        self.settlement.lock().await.issuers().principal(id).cloned()
    }

    /// Terms at `at` (unix seconds), defaulting to the current time.
    pub async fn settlement_terms(
        &self,
        token_id: TokenId,
        at: Option<u64>,
    ) -> Result<Settlement, ServiceError> {
        let now = match at {
            Some(at) => at,
            None => unix_secs(chrono::Utc::now().timestamp())?,
        };
        let settlement = self.settlement.lock().await;
        Ok(settlement.settlement_terms(token_id, now, &self.assets)?)
    }

    pub async fn settlement_terms_batch(
        &self,
        token_ids: &[TokenId],
        at: Option<u64>,
    ) -> Result<Vec<Settlement>, ServiceError> {
        let now = match at {
            Some(at) => at,
            None => unix_secs(chrono::Utc::now().timestamp())?,
        };
        let settlement = self.settlement.lock().await;
        Ok(settlement.settlement_terms_batch(token_ids, now, &self.assets)?)
    }

    pub async fn settle_physical(
        &self,
        caller: &Address,
        terms: &Settlement,
    ) -> Result<SettlementReceipt, ServiceError> {
        let settlement = self.settlement.lock().await;
        let mut tx = self.repo.begin().await?;

        let mut store: HashMap<Address, FullMarginAccount> = HashMap::new();
        if let Some(issuer) = settlement.issuers().principal(terms.token_id.issuer_id()) {
            let account = accounts::fetch_account(&mut *tx, issuer).await?;
            store.put_account(issuer, account);
        }

        let mut outbox = TransferOutbox::new(settlement.engine().clone());
        let receipt = settlement.settle_physical_option(
            caller,
            terms,
            &mut store,
            &mut outbox,
            &self.assets,
        )?;

        let account = store.account(&receipt.issuer);
        accounts::store_account(&mut *tx, &receipt.issuer, &account).await?;
        transfers::insert_transfers(
            &mut *tx,
            "settle_physical",
            &receipt.issuer,
            outbox.instructions(),
        )
        .await?;
        tx.commit().await?;

        info!(
            token_id = %terms.token_id,
            issuer = %receipt.issuer,
            amount = terms.token_amount,
            debt = %receipt.debt,
            payout = %receipt.payout,
            debt_to_account = receipt.debt_to_account,
            "Physical settlement committed"
        );
        Ok(receipt)
    }

    fn check_engine(&self, token_id: TokenId) -> Result<(), ServiceError> {
        let desc = token_id.decode().map_err(EngineError::from)?;
        let engine_id = desc.product_id.decode().engine_id;
        if engine_id != self.engine_id {
            return Err(ServiceError::ForeignEngine(engine_id));
        }
        Ok(())
    }

    async fn apply<T, F>(
        &self,
        operation: &str,
        owner: &Address,
        f: F,
    ) -> Result<(T, FullMarginAccount), ServiceError>
    where
        F: FnOnce(&mut FullMarginAccount, &mut TransferOutbox, &Address) -> Result<T, EngineError>,
    {
        let settlement = self.settlement.lock().await;
        let engine = settlement.engine();
        let mut tx = self.repo.begin().await?;

        let mut account = accounts::fetch_account(&mut *tx, owner).await?;
        let mut outbox = TransferOutbox::new(engine.clone());
        let out = f(&mut account, &mut outbox, engine).map_err(|e| {
            debug!(operation, sub_account = %owner, error = %e, "Ledger operation rejected");
            e
        })?;

        accounts::store_account(&mut *tx, owner, &account).await?;
        transfers::insert_transfers(&mut *tx, operation, owner, outbox.instructions()).await?;
        tx.commit().await?;

        info!(operation, sub_account = %owner, "Ledger operation committed");
        Ok((out, account))
    }
}

fn unix_secs(timestamp: i64) -> Result<u64, ServiceError> {
    u64::try_from(timestamp).map_err(|_| ServiceError::ClockBeforeEpoch(timestamp))
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("token belongs to engine {0}")]
    ForeignEngine(u8),
    #[error("system clock reads {0}, before the unix epoch")]
    ClockBeforeEpoch(i64),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
