//! Contracts the engine calls into: asset lookup, value movement and the
//! per-sub-account store. In-memory implementations live alongside.

use crate::domain::{Address, AssetId};
use std::collections::HashMap;

use super::{EngineError, FullMarginAccount};

/// Address and native precision of a registered asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    pub address: Address,
    pub decimals: u8,
}

pub trait AssetRegistry: Send + Sync {
    fn resolve_asset(&self, id: AssetId) -> Result<AssetInfo, EngineError>;
}

/// Moves value between principals. Amounts are in the asset's native units.
pub trait AssetTransfer {
    fn transfer_from(
        &mut self,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), EngineError>;

    /// Send `amount` held by the engine to `to`.
    fn transfer(&mut self, asset: &Address, to: &Address, amount: u128)
        -> Result<(), EngineError>;
}

/// Per-sub-account ledger records. Missing records read as empty accounts.
pub trait AccountStore {
    fn account(&self, owner: &Address) -> FullMarginAccount;
    fn put_account(&mut self, owner: &Address, account: FullMarginAccount);
}

impl AccountStore for HashMap<Address, FullMarginAccount> {
    fn account(&self, owner: &Address) -> FullMarginAccount {
        self.get(owner).cloned().unwrap_or_default()
    }

    fn put_account(&mut self, owner: &Address, account: FullMarginAccount) {
        self.insert(owner.clone(), account);
    }
}

/// Fixed asset table, typically loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticAssetRegistry {
    assets: HashMap<AssetId, AssetInfo>,
}

impl StaticAssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, id: AssetId, address: Address, decimals: u8) -> Self {
        self.assets.insert(id, AssetInfo { address, decimals });
        self
    }

    pub fn ids(&self) -> Vec<AssetId> {
        let mut ids: Vec<AssetId> = self.assets.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl AssetRegistry for StaticAssetRegistry {
    fn resolve_asset(&self, id: AssetId) -> Result<AssetInfo, EngineError> {
        self.assets
            .get(&id)
            .cloned()
            .ok_or(EngineError::UnknownAsset(id))
    }
}

/// One value movement emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferInstruction {
    pub asset: Address,
    pub from: Address,
    pub to: Address,
    pub amount: u128,
}

/// Records transfers instead of executing them; the caller persists or
/// forwards the instructions once the surrounding transaction commits.
#[derive(Debug, Clone)]
pub struct TransferOutbox {
    engine: Address,
    instructions: Vec<TransferInstruction>,
}

impl TransferOutbox {
    pub fn new(engine: Address) -> Self {
        Self {
            engine,
            instructions: Vec::new(),
        }
    }

    pub fn instructions(&self) -> &[TransferInstruction] {
        &self.instructions
    }

    pub fn into_instructions(self) -> Vec<TransferInstruction> {
        self.instructions
    }
}

impl AssetTransfer for TransferOutbox {
    fn transfer_from(
        &mut self,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), EngineError> {
        self.instructions.push(TransferInstruction {
            asset: asset.clone(),
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    fn transfer(
        &mut self,
        asset: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), EngineError> {
        let from = self.engine.clone();
        self.transfer_from(asset, &from, to, amount)
    }
}
