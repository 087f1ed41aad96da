use marginbook::domain::{AssetId, OptionType, ProductDescriptor, SettlementType, TokenId};
use marginbook::engine::{EngineError, FullMarginAccount};
use proptest::prelude::*;

const WETH: AssetId = AssetId(1);
const USDC: AssetId = AssetId(2);
const EXPIRY: u64 = 1_767_225_600;

fn cash(option_type: OptionType, collateral: AssetId, long: u64, short: u64) -> TokenId {
    let product = ProductDescriptor::new(1, 1, WETH, USDC, collateral).encode();
    TokenId::encode(SettlementType::Cash, option_type, product, EXPIRY, long, short)
}

#[derive(Debug, Clone)]
enum CollateralOp {
    Add(u64),
    Remove(u64),
}

fn collateral_ops() -> impl Strategy<Value = Vec<CollateralOp>> {
    prop::collection::vec(
        prop_oneof![
            (0u64..1_000_000).prop_map(CollateralOp::Add),
            (0u64..1_000_000).prop_map(CollateralOp::Remove),
        ],
        0..40,
    )
}

proptest! {
    #[test]
    fn collateral_balance_tracks_net_sum(ops in collateral_ops()) {
        let mut account = FullMarginAccount::new();
        let mut expected: u128 = 0;

        for op in ops {
            match op {
                CollateralOp::Add(amount) => {
                    account.add_collateral(USDC, u128::from(amount)).unwrap();
                    expected += u128::from(amount);
                }
                CollateralOp::Remove(amount) => {
                    let amount = u128::from(amount);
                    let before = account.clone();
                    let id = account.collateral_id;
                    match account.remove_collateral(id, amount) {
                        Ok(()) => expected -= amount,
                        Err(e) => {
                            prop_assert!(amount > expected);
                            prop_assert_eq!(e, EngineError::Underflow);
                            prop_assert_eq!(&account, &before);
                        }
                    }
                }
            }
            prop_assert_eq!(account.collateral_amount, expected);
            prop_assert_eq!(account.collateral_id.is_none(), expected == 0);
        }
    }

    #[test]
    fn second_collateral_rejected_while_first_is_held(amount in 1u64..u64::MAX) {
        let mut account = FullMarginAccount::new();
        account.add_collateral(WETH, u128::from(amount)).unwrap();
        prop_assert_eq!(account.add_collateral(USDC, 1), Err(EngineError::WrongCollateralId));

        account.remove_collateral(WETH, u128::from(amount)).unwrap();
        prop_assert!(account.add_collateral(USDC, 1).is_ok());
        prop_assert_eq!(account.collateral_id, USDC);
    }

    #[test]
    fn mint_then_burn_restores_account(
        strike in 1u64..u64::MAX,
        amount in 1u64..u64::MAX,
        collateral in 0u128..u128::from(u64::MAX),
    ) {
        let mut account = FullMarginAccount::new();
        if collateral > 0 {
            account.add_collateral(USDC, collateral).unwrap();
        }
        let before = account.clone();

        let put = cash(OptionType::Put, USDC, strike, 0);
        account.mint_option(put, amount).unwrap();
        prop_assert_eq!(account.short_put_amount, amount);
        account.burn_option(put, amount).unwrap();

        prop_assert_eq!(account, before);
    }

    #[test]
    fn merge_then_split_is_identity(
        short_strike in 1u64..1_000_000_000_000,
        gap in 1u64..1_000_000_000,
        amount in 1u64..1_000_000_000_000,
        is_call in any::<bool>(),
    ) {
        let (option_type, collateral, long_strike) = if is_call {
            (OptionType::Call, WETH, short_strike + gap)
        } else {
            (OptionType::Put, USDC, short_strike.saturating_sub(gap).max(1))
        };
        prop_assume!(long_strike != short_strike);

        let short_id = cash(option_type, collateral, short_strike, 0);
        let long_id = cash(option_type, collateral, long_strike, 0);

        let mut account = FullMarginAccount::new();
        account.mint_option(short_id, amount).unwrap();
        let before = account.clone();

        let merged = account.merge(short_id, long_id, amount).unwrap();
        prop_assert_eq!(merged.burn_amount, amount);
        prop_assert_eq!(merged.long_id, long_id);

        let split = account.split(merged.spread_id, amount).unwrap();
        prop_assert_eq!(split.short_id, short_id);
        prop_assert_eq!(split.long_id, long_id);
        prop_assert_eq!(split.mint_amount, amount);
        prop_assert_eq!(account, before);
    }

    #[test]
    fn failed_operations_leave_account_untouched(amount in 1u64..1_000_000) {
        let call = cash(OptionType::Call, WETH, 2_000_000_000, 0);
        let other_call = cash(OptionType::Call, WETH, 2_500_000_000, 0);

        let mut account = FullMarginAccount::new();
        account.add_collateral(WETH, 10).unwrap();
        account.mint_option(call, amount).unwrap();
        let before = account.clone();

        prop_assert_eq!(account.mint_option(other_call, 1), Err(EngineError::InvalidToken));
        prop_assert_eq!(account.burn_option(call, amount + 1), Err(EngineError::Underflow));
        prop_assert_eq!(account.remove_collateral(USDC, 1), Err(EngineError::WrongCollateralId));
        prop_assert_eq!(
            account.merge(call, other_call, amount + 1),
            Err(EngineError::MergeAmountMismatch)
        );
        prop_assert_eq!(account.split(call, amount), Err(EngineError::CanOnlySplitSpread));
        prop_assert_eq!(&account, &before);
    }
}

#[test]
fn put_against_underlying_collateral_cannot_be_minted() {
    let put = cash(OptionType::Put, WETH, 1_500_000_000, 0);
    let mut account = FullMarginAccount::new();
    assert_eq!(
        account.mint_option(put, 1),
        Err(EngineError::CannotMintWithThisCollateral)
    );
    assert!(account.is_empty());
}

#[test]
fn call_into_usdc_account_is_a_collateral_mismatch() {
    let call = cash(OptionType::Call, WETH, 2_000_000_000, 0);
    let mut account = FullMarginAccount::new();
    account.add_collateral(USDC, 5_000_000_000).unwrap();
    assert_eq!(account.mint_option(call, 1), Err(EngineError::CollateralMismatch));
}

#[test]
fn one_token_per_side() {
    let call = cash(OptionType::Call, WETH, 2_000_000_000, 0);
    let spread = cash(OptionType::CallSpread, WETH, 2_000_000_000, 2_500_000_000);
    let put = cash(OptionType::Put, WETH, 1_500_000_000, 0);
    let put_spread = cash(OptionType::PutSpread, WETH, 1_500_000_000, 1_000_000_000);

    let mut account = FullMarginAccount::new();
    account.mint_option(call, 3).unwrap();
    assert_eq!(account.mint_option(spread, 1), Err(EngineError::InvalidToken));

    // Put side is independent; spreads may sit against the underlying.
    assert_eq!(
        account.mint_option(put, 1),
        Err(EngineError::CannotMintWithThisCollateral)
    );
    account.mint_option(put_spread, 2).unwrap();
    assert_eq!(account.short_call_amount, 3);
    assert_eq!(account.short_put_amount, 2);
    assert_eq!(account.short_put_id, put_spread);
}

#[test]
fn expiry_settlement_clears_positions() {
    let call = cash(OptionType::Call, WETH, 2_000_000_000, 0);
    let mut account = FullMarginAccount::new();
    account.add_collateral(WETH, 1_000).unwrap();
    account.mint_option(call, 7).unwrap();

    account.settle_at_expiry(400).unwrap();
    assert!(!account.has_shorts());
    assert_eq!(account.collateral_amount, 600);
    assert_eq!(account.collateral_id, WETH);

    account.settle_at_expiry(-400).unwrap();
    assert_eq!(account.collateral_amount, 1_000);

    assert_eq!(account.settle_at_expiry(1_001), Err(EngineError::Underflow));
    account.settle_at_expiry(1_000).unwrap();
    assert!(account.is_empty());
    assert!(account.collateral_id.is_none());
}

#[test]
fn removing_nothing_from_an_empty_account_succeeds() {
    let mut account = FullMarginAccount::new();
    assert!(account.remove_collateral(AssetId::NONE, 0).is_ok());
    assert_eq!(
        account.remove_collateral(USDC, 0),
        Err(EngineError::WrongCollateralId)
    );
}
