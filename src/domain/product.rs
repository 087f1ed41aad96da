//! Product descriptor codec.
//!
//! A product packs five 8-bit identifiers into the low 40 bits of a `u64`:
//!
//! ```text
//! | engine (8) | oracle (8) | underlying (8) | strike (8) | collateral (8) |
//!   bit 32       bit 24       bit 16           bit 8        bit 0
//! ```

use crate::domain::AssetId;
use serde::{Deserialize, Serialize};

pub const PRODUCT_BITS: u32 = 40;
pub const PRODUCT_MASK: u64 = (1 << PRODUCT_BITS) - 1;

const ENGINE_OFFSET: u32 = 32;
const ORACLE_OFFSET: u32 = 24;
const UNDERLYING_OFFSET: u32 = 16;
const STRIKE_OFFSET: u32 = 8;

/// Packed 40-bit product identifier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProductId(pub u64);

/// Economic family of a derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDescriptor {
    pub engine_id: u8,
    pub oracle_id: u8,
    pub underlying_id: AssetId,
    pub strike_id: AssetId,
    pub collateral_id: AssetId,
}

impl ProductDescriptor {
    pub fn new(
        engine_id: u8,
        oracle_id: u8,
        underlying_id: AssetId,
        strike_id: AssetId,
        collateral_id: AssetId,
    ) -> Self {
        Self {
            engine_id,
            oracle_id,
            underlying_id,
            strike_id,
            collateral_id,
        }
    }

    /// Pack into a product id. No semantic validation happens here.
    pub fn encode(&self) -> ProductId {
        ProductId(
            (u64::from(self.engine_id) << ENGINE_OFFSET)
                | (u64::from(self.oracle_id) << ORACLE_OFFSET)
                | (u64::from(self.underlying_id.0) << UNDERLYING_OFFSET)
                | (u64::from(self.strike_id.0) << STRIKE_OFFSET)
                | u64::from(self.collateral_id.0),
        )
    }
}

impl ProductId {
    /// Unpack into its five fields. Bits above 40 are ignored.
    pub fn decode(self) -> ProductDescriptor {
        let byte = |offset: u32| (self.0 >> offset) as u8;
        ProductDescriptor {
            engine_id: byte(ENGINE_OFFSET),
            oracle_id: byte(ORACLE_OFFSET),
            underlying_id: AssetId(byte(UNDERLYING_OFFSET)),
            strike_id: AssetId(byte(STRIKE_OFFSET)),
            collateral_id: AssetId(byte(0)),
        }
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let product = ProductDescriptor::new(1, 2, AssetId(3), AssetId(4), AssetId(5)).encode();
        assert_eq!(product.0, 0x01_02_03_04_05);
        assert!(product.0 <= PRODUCT_MASK);
    }

    #[test]
    fn test_decode_is_inverse() {
        let desc = ProductDescriptor::new(255, 0, AssetId(17), AssetId(1), AssetId(17));
        assert_eq!(desc.encode().decode(), desc);
    }

    #[test]
    fn test_encode_does_not_validate() {
        // Same underlying and strike is packed without complaint.
        let desc = ProductDescriptor::new(1, 1, AssetId(9), AssetId(9), AssetId(200));
        assert_eq!(desc.encode().decode(), desc);
    }
}
