//! Physical settlement: issuer registry, per-token settlement terms and the
//! debt-collection / payout execution against the issuer's account.

use crate::domain::{
    convert_decimals, pow10, Address, AssetId, CodecError, IssuerId, Settlement, SettlementType,
    TokenDescriptor, TokenId, UNIT_DECIMALS,
};

use super::{AccountStore, AssetRegistry, AssetTransfer, EngineError, IssuerRegistry};

/// Grace period after expiry during which physical exercise is possible.
pub const DEFAULT_SETTLEMENT_WINDOW_SECS: u64 = 3600;

/// What a physical settlement did to the issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementReceipt {
    pub issuer: Address,
    /// Total debt collected, in native units of the debt asset.
    pub debt: u128,
    /// Total payout sent, in native units of the payout asset.
    pub payout: u128,
    /// True when the debt was credited to the issuer's margin account; false
    /// when the account's collateral asset differs and the debt went to the
    /// issuer directly.
    pub debt_to_account: bool,
}

#[derive(Debug, Clone)]
pub struct PhysicalSettlement {
    engine: Address,
    settlement_driver: Address,
    window_secs: u64,
    issuers: IssuerRegistry,
}

impl PhysicalSettlement {
    /// `engine` is the resolver's own principal; `settlement_driver` is the
    /// only caller allowed to settle.
    pub fn new(engine: Address, settlement_driver: Address) -> Self {
        Self {
            engine,
            settlement_driver,
            window_secs: DEFAULT_SETTLEMENT_WINDOW_SECS,
            issuers: IssuerRegistry::new(),
        }
    }

    pub fn with_window(mut self, window_secs: u64) -> Self {
        self.window_secs = window_secs;
        self
    }

    pub fn with_issuers(mut self, issuers: IssuerRegistry) -> Self {
        self.issuers = issuers;
        self
    }

    pub fn engine(&self) -> &Address {
        &self.engine
    }

    pub fn issuers(&self) -> &IssuerRegistry {
        &self.issuers
    }

    pub fn window_secs(&self) -> u64 {
        self.window_secs
    }

    pub fn register_issuer(&mut self, principal: Address) -> Result<IssuerId, EngineError> {
        self.issuers.register(principal)
    }

    /// `expiry <= now <= expiry + window`
    pub fn is_within_window(&self, expiry: u64, now: u64) -> bool {
        now >= expiry && now <= expiry.saturating_add(self.window_secs)
    }

    /// Per-token debt and payout of a physically-settled token at `now`.
    ///
    /// Calls owe the strike in the strike asset and receive one unit of the
    /// collateral; puts owe one unit of the underlying and receive the strike
    /// in the strike asset. Outside the window both amounts are zero.
    pub fn settlement_terms(
        &self,
        token_id: TokenId,
        now: u64,
        assets: &dyn AssetRegistry,
    ) -> Result<Settlement, EngineError> {
        let (desc, debt_asset_id, payout_asset_id) = Self::physical_legs(token_id)?;
        let is_call = desc.option_type.is_call_side();

        let mut settlement = Settlement {
            token_id,
            debt_asset_id,
            payout_asset_id,
            ..Settlement::default()
        };
        if !self.is_within_window(desc.expiry, now) {
            return Ok(settlement);
        }

        let debt_decimals = assets.resolve_asset(debt_asset_id)?.decimals;
        let payout_decimals = assets.resolve_asset(payout_asset_id)?.decimals;
        let strike = u128::from(desc.long_strike);
        if is_call {
            settlement.debt_per_token = convert_decimals(strike, UNIT_DECIMALS, debt_decimals)?;
            settlement.payout_per_token =
                pow10(payout_decimals).ok_or(CodecError::DecimalOverflow)?;
        } else {
            settlement.debt_per_token = pow10(debt_decimals).ok_or(CodecError::DecimalOverflow)?;
            settlement.payout_per_token =
                convert_decimals(strike, UNIT_DECIMALS, payout_decimals)?;
        }
        Ok(settlement)
    }

    /// Decode a physically-settled token and pick its debt and payout assets.
    fn physical_legs(
        token_id: TokenId,
    ) -> Result<(TokenDescriptor, AssetId, AssetId), EngineError> {
        let desc = token_id.decode()?;
        if desc.settlement_type != SettlementType::Physical {
            return Err(CodecError::InvalidSettlementType.into());
        }
        desc.check_strikes()?;

        let product = desc.product_id.decode();
        let (debt, payout) = if desc.option_type.is_call_side() {
            (product.strike_id, product.collateral_id)
        } else {
            (product.underlying_id, product.strike_id)
        };
        Ok((desc, debt, payout))
    }

    pub fn settlement_terms_batch(
        &self,
        token_ids: &[TokenId],
        now: u64,
        assets: &dyn AssetRegistry,
    ) -> Result<Vec<Settlement>, EngineError> {
        token_ids
            .iter()
            .map(|&id| self.settlement_terms(id, now, assets))
            .collect()
    }

    /// Execute a settlement against the issuer embedded in the token.
    ///
    /// The issuer's account is written before any transfer runs: incoming debt
    /// is pulled first, then the payout is pushed. If a transfer fails the
    /// previous account is restored.
    pub fn settle_physical_option(
        &self,
        caller: &Address,
        settlement: &Settlement,
        accounts: &mut dyn AccountStore,
        transfers: &mut dyn AssetTransfer,
        assets: &dyn AssetRegistry,
    ) -> Result<SettlementReceipt, EngineError> {
        if caller != &self.settlement_driver {
            return Err(EngineError::UnauthorizedSettlement);
        }
        let (_, debt_asset_id, payout_asset_id) = Self::physical_legs(settlement.token_id)?;
        if settlement.debt_asset_id != debt_asset_id
            || settlement.payout_asset_id != payout_asset_id
        {
            return Err(EngineError::SettlementAssetMismatch);
        }
        let issuer_id = settlement.token_id.issuer_id();
        let issuer = self
            .issuers
            .principal(issuer_id)
            .cloned()
            .ok_or(EngineError::UnknownIssuer(issuer_id))?;

        let debt = settlement.total_debt()?;
        let payout = settlement.total_payout()?;
        let debt_asset = match debt {
            0 => None,
            _ => Some(assets.resolve_asset(settlement.debt_asset_id)?.address),
        };
        let payout_asset = match payout {
            0 => None,
            _ => Some(assets.resolve_asset(settlement.payout_asset_id)?.address),
        };

        let before = accounts.account(&issuer);
        let mut after = before.clone();
        after.burn_option(settlement.token_id, settlement.token_amount)?;
        if payout > 0 {
            after.remove_collateral(settlement.payout_asset_id, payout)?;
        }
        let debt_to_account = debt > 0 && after.accepts_collateral(settlement.debt_asset_id);
        if debt_to_account {
            after.add_collateral(settlement.debt_asset_id, debt)?;
        }
        accounts.put_account(&issuer, after);

        let moved = self.move_assets(
            settlement,
            &issuer,
            debt_asset.as_ref().map(|a| (a, debt)),
            payout_asset.as_ref().map(|a| (a, payout)),
            debt_to_account,
            transfers,
        );
        if let Err(e) = moved {
            accounts.put_account(&issuer, before);
            return Err(e);
        }

        Ok(SettlementReceipt {
            issuer,
            debt,
            payout,
            debt_to_account,
        })
    }

    fn move_assets(
        &self,
        settlement: &Settlement,
        issuer: &Address,
        debt: Option<(&Address, u128)>,
        payout: Option<(&Address, u128)>,
        debt_to_account: bool,
        transfers: &mut dyn AssetTransfer,
    ) -> Result<(), EngineError> {
        if let Some((asset, amount)) = debt {
            let to = if debt_to_account { &self.engine } else { issuer };
            if settlement.debtor != self.engine {
                transfers.transfer_from(asset, &settlement.debtor, to, amount)?;
            } else if !debt_to_account {
                transfers.transfer(asset, issuer, amount)?;
            }
        }
        if let Some((asset, amount)) = payout {
            if settlement.creditor != self.engine {
                transfers.transfer(asset, &settlement.creditor, amount)?;
            }
        }
        Ok(())
    }
}
