use crate::domain::{AssetId, CodecError, IssuerId};
use thiserror::Error;

/// Named failure conditions of the ledger, registry and settlement engine.
///
/// Every variant aborts the whole operation; no state is changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("wrong collateral id")]
    WrongCollateralId,
    #[error("collateral mismatch")]
    CollateralMismatch,
    #[error("cannot mint option with this collateral")]
    CannotMintWithThisCollateral,
    #[error("invalid token")]
    InvalidToken,
    #[error("arithmetic underflow")]
    Underflow,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("can only merge single-leg options of the same kind")]
    MergeTypeMismatch,
    #[error("cannot merge options on different products")]
    MergeProductMismatch,
    #[error("cannot merge options with different expiries")]
    MergeExpiryMismatch,
    #[error("cannot merge legs with the same strike")]
    MergeWithSameStrike,
    #[error("merge amount must equal the short amount")]
    MergeAmountMismatch,
    #[error("can only split spreads")]
    CanOnlySplitSpread,
    #[error("split amount must equal the spread amount")]
    SplitAmountMismatch,
    #[error("issuer already registered")]
    IssuerAlreadyRegistered,
    #[error("issuer id space exhausted")]
    IssuerIdsExhausted,
    #[error("caller is not the settlement driver")]
    UnauthorizedSettlement,
    #[error("settlement assets do not match the token's product")]
    SettlementAssetMismatch,
    #[error("unknown issuer {0}")]
    UnknownIssuer(IssuerId),
    #[error("unknown asset {0}")]
    UnknownAsset(AssetId),
    #[error("transfer failed: {0}")]
    Transfer(String),
}

impl EngineError {
    /// Shorthand for the codec's bad-strikes condition.
    pub fn is_bad_strikes(&self) -> bool {
        matches!(self, EngineError::Codec(CodecError::BadStrikes))
    }
}
