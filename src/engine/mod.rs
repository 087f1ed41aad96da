//! Pure state-transition engine: the per-account ledger, the issuer registry
//! and physical settlement. Nothing here touches storage or the clock.

pub mod account;
pub mod collaborators;
pub mod error;
pub mod issuer;
pub mod physical;

pub use account::{FullMarginAccount, MergeOutcome, OptionSide, SplitOutcome};
pub use collaborators::{
    AccountStore, AssetInfo, AssetRegistry, AssetTransfer, StaticAssetRegistry,
    TransferInstruction, TransferOutbox,
};
pub use error::EngineError;
pub use issuer::IssuerRegistry;
pub use physical::{PhysicalSettlement, SettlementReceipt, DEFAULT_SETTLEMENT_WINDOW_SECS};
