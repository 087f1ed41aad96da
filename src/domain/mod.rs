//! Domain types and identifier codec.
//!
//! This module provides:
//! - Domain primitives: Address, AssetId, IssuerId
//! - Product descriptor packing (40-bit product ids)
//! - Token id packing (256-bit token ids) and strike legality
//! - Fixed-point precision conversion and the per-token Settlement record

pub mod decimals;
pub mod primitives;
pub mod product;
pub mod settlement;
pub mod token_id;

pub use decimals::{convert_decimals, pow10, UNIT, UNIT_DECIMALS};
pub use primitives::{Address, AddressParseError, AssetId, IssuerId};
pub use product::{ProductDescriptor, ProductId, PRODUCT_MASK};
pub use settlement::Settlement;
pub use token_id::{CodecError, OptionType, SettlementType, TokenDescriptor, TokenId};
