//! Per-token physical settlement record.

use crate::domain::{Address, AssetId, CodecError, TokenId, UNIT};
use serde::{Deserialize, Serialize};

/// What a holder of `token_amount` units of `token_id` owes and receives.
///
/// Built fresh for each settlement and consumed by it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub token_id: TokenId,
    pub token_amount: u64,
    pub debt_asset_id: AssetId,
    /// Native units of the debt asset owed per whole token.
    pub debt_per_token: u128,
    pub payout_asset_id: AssetId,
    /// Native units of the payout asset received per whole token.
    pub payout_per_token: u128,
    pub debtor: Address,
    pub creditor: Address,
}

impl Settlement {
    /// Fill in who pays, who receives and how many tokens are settled.
    pub fn with_parties(mut self, debtor: Address, creditor: Address, token_amount: u64) -> Self {
        self.debtor = debtor;
        self.creditor = creditor;
        self.token_amount = token_amount;
        self
    }

    /// Total debt for `token_amount`, floored.
    pub fn total_debt(&self) -> Result<u128, CodecError> {
        scale_by_amount(self.debt_per_token, self.token_amount)
    }

    /// Total payout for `token_amount`, floored.
    pub fn total_payout(&self) -> Result<u128, CodecError> {
        scale_by_amount(self.payout_per_token, self.token_amount)
    }

    pub fn is_worthless(&self) -> bool {
        self.debt_per_token == 0 && self.payout_per_token == 0
    }
}

fn scale_by_amount(per_token: u128, token_amount: u64) -> Result<u128, CodecError> {
    per_token
        .checked_mul(u128::from(token_amount))
        .map(|v| v / u128::from(UNIT))
        .ok_or(CodecError::DecimalOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settlement(debt: u128, payout: u128, amount: u64) -> Settlement {
        Settlement {
            token_id: TokenId::default(),
            token_amount: 0,
            debt_asset_id: AssetId(2),
            debt_per_token: debt,
            payout_asset_id: AssetId(1),
            payout_per_token: payout,
            debtor: Address::new("0xdebtor"),
            creditor: Address::new("0xcreditor"),
        }
        .with_parties(Address::new("0xa"), Address::new("0xb"), amount)
    }

    #[test]
    fn test_totals_scale_by_token_amount() {
        // 2.5 tokens at 2000 USDC debt and 1 WETH payout per token.
        let s = settlement(2_000_000_000, 10u128.pow(18), 2_500_000);
        assert_eq!(s.total_debt(), Ok(5_000_000_000));
        assert_eq!(s.total_payout(), Ok(25 * 10u128.pow(17)));
        assert_eq!(s.debtor, Address::new("0xa"));
        assert_eq!(s.creditor, Address::new("0xb"));
    }

    #[test]
    fn test_totals_floor() {
        let s = settlement(3, 3, 1);
        assert_eq!(s.total_debt(), Ok(0));
        assert_eq!(s.total_payout(), Ok(0));
    }

    #[test]
    fn test_worthless() {
        assert!(settlement(0, 0, 1).is_worthless());
        assert!(!settlement(1, 0, 1).is_worthless());
    }
}
