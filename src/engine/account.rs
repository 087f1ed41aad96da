//! Full-margin account bookkeeping.
//!
//! An account holds at most one short call-side token, at most one short
//! put-side token and a single collateral asset. Every transition validates
//! first and mutates last, so a failed call leaves the account untouched.

use crate::domain::{AssetId, OptionType, SettlementType, TokenDescriptor, TokenId};

use super::EngineError;

/// Which short slot of the account a token lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionSide {
    Call,
    Put,
}

impl OptionSide {
    pub fn of(option_type: OptionType) -> Self {
        if option_type.is_call_side() {
            OptionSide::Call
        } else {
            OptionSide::Put
        }
    }
}

/// Result of merging a short single leg with a long leg into a spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub spread_id: TokenId,
    /// Long-leg tokens the caller must burn.
    pub long_id: TokenId,
    pub burn_amount: u64,
}

/// Result of splitting a spread back into its legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitOutcome {
    /// Single leg the account stays short.
    pub short_id: TokenId,
    /// Long-leg tokens the caller must mint to the recipient.
    pub long_id: TokenId,
    pub mint_amount: u64,
}

/// Margin record of one sub-account.
///
/// A side's token id is zero exactly when its amount is zero. The collateral
/// id is unset whenever the account holds no collateral and no shorts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FullMarginAccount {
    pub short_call_id: TokenId,
    pub short_call_amount: u64,
    pub short_put_id: TokenId,
    pub short_put_amount: u64,
    pub collateral_id: AssetId,
    pub collateral_amount: u128,
}

impl FullMarginAccount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.short_call_amount == 0 && self.short_put_amount == 0 && self.collateral_amount == 0
    }

    pub fn has_shorts(&self) -> bool {
        self.short_call_amount != 0 || self.short_put_amount != 0
    }

    /// Whether collateral of asset `id` can be added without a conflict.
    /// Any asset is accepted while the collateral balance is zero.
    pub fn accepts_collateral(&self, id: AssetId) -> bool {
        self.collateral_amount == 0 || self.collateral_id == id
    }

    pub fn side(&self, side: OptionSide) -> (TokenId, u64) {
        match side {
            OptionSide::Call => (self.short_call_id, self.short_call_amount),
            OptionSide::Put => (self.short_put_id, self.short_put_amount),
        }
    }

    /// Deposit collateral. An account with a zero balance adopts `id`.
    pub fn add_collateral(&mut self, id: AssetId, amount: u128) -> Result<(), EngineError> {
        if !self.accepts_collateral(id) {
            return Err(EngineError::WrongCollateralId);
        }
        let new_amount = self
            .collateral_amount
            .checked_add(amount)
            .ok_or(EngineError::Overflow)?;

        self.collateral_id = id;
        self.collateral_amount = new_amount;
        self.release_collateral_id();
        Ok(())
    }

    /// Withdraw collateral. `id` must match the stored id literally, so
    /// removing zero of `AssetId::NONE` from an empty account succeeds.
    pub fn remove_collateral(&mut self, id: AssetId, amount: u128) -> Result<(), EngineError> {
        if self.collateral_id != id {
            return Err(EngineError::WrongCollateralId);
        }
        let new_amount = self
            .collateral_amount
            .checked_sub(amount)
            .ok_or(EngineError::Underflow)?;

        self.collateral_amount = new_amount;
        if new_amount == 0 {
            self.collateral_id = AssetId::NONE;
        }
        Ok(())
    }

    /// Record `amount` more of `token_id` sold short by this account.
    pub fn mint_option(&mut self, token_id: TokenId, amount: u64) -> Result<(), EngineError> {
        let desc = token_id.decode()?;
        desc.check_strikes()?;
        let collateral_id = Self::mint_collateral(&desc)?;

        if !self.accepts_collateral(collateral_id) {
            return Err(EngineError::CollateralMismatch);
        }

        let side = OptionSide::of(desc.option_type);
        let (stored_id, held) = self.side(side);
        if !stored_id.is_zero() && stored_id != token_id {
            return Err(EngineError::InvalidToken);
        }
        let new_amount = held.checked_add(amount).ok_or(EngineError::Overflow)?;

        self.collateral_id = collateral_id;
        self.set_side(side, token_id, new_amount);
        self.release_collateral_id();
        Ok(())
    }

    /// Reduce the short position in `token_id` by `amount`.
    pub fn burn_option(&mut self, token_id: TokenId, amount: u64) -> Result<(), EngineError> {
        let desc = token_id.decode()?;
        let side = OptionSide::of(desc.option_type);
        let (stored_id, held) = self.side(side);
        if stored_id != token_id {
            return Err(EngineError::InvalidToken);
        }
        let new_amount = held.checked_sub(amount).ok_or(EngineError::Underflow)?;

        self.set_side(side, token_id, new_amount);
        self.release_collateral_id();
        Ok(())
    }

    /// Turn the stored short `short_id` into a spread by pairing it with
    /// `amount` long tokens of `long_id`. The whole short must be merged.
    pub fn merge(
        &mut self,
        short_id: TokenId,
        long_id: TokenId,
        amount: u64,
    ) -> Result<MergeOutcome, EngineError> {
        let short = short_id.decode()?;
        let long = long_id.decode()?;

        if short.settlement_type != SettlementType::Cash
            || long.settlement_type != SettlementType::Cash
        {
            return Err(crate::domain::CodecError::InvalidSettlementType.into());
        }
        if short.option_type != long.option_type || short.option_type.is_spread() {
            return Err(EngineError::MergeTypeMismatch);
        }
        if short.product_id != long.product_id {
            return Err(EngineError::MergeProductMismatch);
        }
        if short.expiry != long.expiry {
            return Err(EngineError::MergeExpiryMismatch);
        }
        if short.long_strike == long.long_strike {
            return Err(EngineError::MergeWithSameStrike);
        }
        long.check_strikes()?;

        let side = OptionSide::of(short.option_type);
        let (stored_id, held) = self.side(side);
        if stored_id != short_id || held == 0 {
            return Err(EngineError::InvalidToken);
        }
        if held != amount {
            return Err(EngineError::MergeAmountMismatch);
        }

        let spread = short.to_spread(long.long_strike);
        spread.check_strikes()?;
        let spread_id = spread.encode();

        self.set_side(side, spread_id, held);
        Ok(MergeOutcome {
            spread_id,
            long_id,
            burn_amount: amount,
        })
    }

    /// Break the stored spread `spread_id` back into a short single leg and a
    /// long leg for the caller. The whole spread must be split.
    pub fn split(&mut self, spread_id: TokenId, amount: u64) -> Result<SplitOutcome, EngineError> {
        let spread = spread_id.decode()?;
        if !spread.option_type.is_spread() {
            return Err(EngineError::CanOnlySplitSpread);
        }

        let side = OptionSide::of(spread.option_type);
        let (stored_id, held) = self.side(side);
        if stored_id != spread_id || held == 0 {
            return Err(EngineError::InvalidToken);
        }
        if held != amount {
            return Err(EngineError::SplitAmountMismatch);
        }

        let short_id = spread.to_single_leg().encode();
        let long_id = spread.short_leg().encode();

        self.set_side(side, short_id, held);
        Ok(SplitOutcome {
            short_id,
            long_id,
            mint_amount: amount,
        })
    }

    /// Apply the net expiry payout and close both sides.
    ///
    /// A positive `payout` leaves the account, a negative one is credited.
    pub fn settle_at_expiry(&mut self, payout: i128) -> Result<(), EngineError> {
        let collateral =
            i128::try_from(self.collateral_amount).map_err(|_| EngineError::Overflow)?;
        let remaining = collateral
            .checked_sub(payout)
            .ok_or(EngineError::Overflow)?;
        let remaining = u128::try_from(remaining).map_err(|_| EngineError::Underflow)?;

        self.set_side(OptionSide::Call, TokenId::default(), 0);
        self.set_side(OptionSide::Put, TokenId::default(), 0);
        self.collateral_amount = remaining;
        self.release_collateral_id();
        Ok(())
    }

    /// Collateral asset a token must be minted against.
    ///
    /// Calls need the underlying, puts the strike asset, spreads either one.
    fn mint_collateral(desc: &TokenDescriptor) -> Result<AssetId, EngineError> {
        let product = desc.product_id.decode();
        let collateral = product.collateral_id;
        let legal = match desc.option_type {
            OptionType::Call => collateral == product.underlying_id,
            OptionType::Put => collateral == product.strike_id,
            OptionType::CallSpread | OptionType::PutSpread => {
                collateral == product.underlying_id || collateral == product.strike_id
            }
        };
        if !legal {
            return Err(EngineError::CannotMintWithThisCollateral);
        }
        Ok(collateral)
    }

    fn set_side(&mut self, side: OptionSide, token_id: TokenId, amount: u64) {
        let token_id = if amount == 0 {
            TokenId::default()
        } else {
            token_id
        };
        match side {
            OptionSide::Call => {
                self.short_call_id = token_id;
                self.short_call_amount = amount;
            }
            OptionSide::Put => {
                self.short_put_id = token_id;
                self.short_put_amount = amount;
            }
        }
    }

    fn release_collateral_id(&mut self) {
        if self.collateral_amount == 0 && !self.has_shorts() {
            self.collateral_id = AssetId::NONE;
        }
    }
}
