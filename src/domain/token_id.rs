//! Token identifier codec.
//!
//! A token id packs the full economic terms of one instrument into 256 bits:
//!
//! ```text
//! | reserved (8) | settlement (8) | option type (8) | product (40) | expiry (64) | long strike (64) | short strike (64) |
//!   bit 248        bit 240          bit 232           bit 192        bit 128       bit 64             bit 0
//! ```
//!
//! Physically-settled tokens are single-leg and carry their issuer id in the
//! low 16 bits of the short-strike slot.

use crate::domain::{IssuerId, ProductId, PRODUCT_MASK};
use ethereum_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SHORT_STRIKE_OFFSET: usize = 0;
const LONG_STRIKE_OFFSET: usize = 64;
const EXPIRY_OFFSET: usize = 128;
const PRODUCT_OFFSET: usize = 192;
const OPTION_TYPE_OFFSET: usize = 232;
const SETTLEMENT_OFFSET: usize = 240;
const RESERVED_OFFSET: usize = 248;

/// Errors raised while decoding identifiers or checking their legality.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("unknown option type {0}")]
    UnknownOptionType(u8),
    #[error("unknown settlement type {0}")]
    UnknownSettlementType(u8),
    #[error("reserved token id bits are set")]
    ReservedBits,
    #[error("bad strikes")]
    BadStrikes,
    #[error("invalid settlement type")]
    InvalidSettlementType,
    #[error("decimal conversion overflow")]
    DecimalOverflow,
    #[error("invalid token id: {0}")]
    Parse(String),
}

/// Option shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum OptionType {
    Call = 0,
    CallSpread = 1,
    Put = 2,
    PutSpread = 3,
}

impl OptionType {
    pub fn from_u8(v: u8) -> Result<Self, CodecError> {
        match v {
            0 => Ok(OptionType::Call),
            1 => Ok(OptionType::CallSpread),
            2 => Ok(OptionType::Put),
            3 => Ok(OptionType::PutSpread),
            other => Err(CodecError::UnknownOptionType(other)),
        }
    }

    /// Calls and call spreads share the account's call side.
    pub fn is_call_side(self) -> bool {
        matches!(self, OptionType::Call | OptionType::CallSpread)
    }

    pub fn is_spread(self) -> bool {
        matches!(self, OptionType::CallSpread | OptionType::PutSpread)
    }

    pub fn to_spread(self) -> Self {
        match self {
            OptionType::Call | OptionType::CallSpread => OptionType::CallSpread,
            OptionType::Put | OptionType::PutSpread => OptionType::PutSpread,
        }
    }

    pub fn to_single_leg(self) -> Self {
        match self {
            OptionType::Call | OptionType::CallSpread => OptionType::Call,
            OptionType::Put | OptionType::PutSpread => OptionType::Put,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum SettlementType {
    Cash = 0,
    Physical = 1,
}

impl SettlementType {
    pub fn from_u8(v: u8) -> Result<Self, CodecError> {
        match v {
            0 => Ok(SettlementType::Cash),
            1 => Ok(SettlementType::Physical),
            other => Err(CodecError::UnknownSettlementType(other)),
        }
    }
}

/// Decoded fields of a token id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDescriptor {
    pub settlement_type: SettlementType,
    pub option_type: OptionType,
    pub product_id: ProductId,
    /// Unix seconds.
    pub expiry: u64,
    pub long_strike: u64,
    pub short_strike: u64,
}

impl TokenDescriptor {
    pub fn encode(&self) -> TokenId {
        TokenId::encode(
            self.settlement_type,
            self.option_type,
            self.product_id,
            self.expiry,
            self.long_strike,
            self.short_strike,
        )
    }

    /// Check the strike layout is legal for the option shape.
    ///
    /// - call spread: `long < short`
    /// - put spread: `long > short`
    /// - cash single leg: `short == 0`
    /// - physical single leg: the short slot holds a nonzero 16-bit issuer id
    /// - physical spreads do not exist
    pub fn check_strikes(&self) -> Result<(), CodecError> {
        match (self.settlement_type, self.option_type) {
            (SettlementType::Physical, t) if t.is_spread() => {
                Err(CodecError::InvalidSettlementType)
            }
            (SettlementType::Physical, _) => {
                if self.short_strike == 0 || self.short_strike > u64::from(u16::MAX) {
                    return Err(CodecError::BadStrikes);
                }
                Ok(())
            }
            (SettlementType::Cash, OptionType::CallSpread) if self.long_strike >= self.short_strike => {
                Err(CodecError::BadStrikes)
            }
            (SettlementType::Cash, OptionType::PutSpread) if self.long_strike <= self.short_strike => {
                Err(CodecError::BadStrikes)
            }
            (SettlementType::Cash, OptionType::Call | OptionType::Put) if self.short_strike != 0 => {
                Err(CodecError::BadStrikes)
            }
            _ => Ok(()),
        }
    }

    /// Spread obtained by pairing this single-leg short with a long leg struck
    /// at `long_leg_strike`. The spread's short-strike slot holds that strike.
    pub fn to_spread(&self, long_leg_strike: u64) -> TokenDescriptor {
        TokenDescriptor {
            option_type: self.option_type.to_spread(),
            short_strike: long_leg_strike,
            ..*self
        }
    }

    /// Single leg at this token's long strike.
    pub fn to_single_leg(&self) -> TokenDescriptor {
        TokenDescriptor {
            option_type: self.option_type.to_single_leg(),
            short_strike: 0,
            ..*self
        }
    }

    /// The leg a spread holder is short, as a standalone single-leg token.
    pub fn short_leg(&self) -> TokenDescriptor {
        TokenDescriptor {
            option_type: self.option_type.to_single_leg(),
            long_strike: self.short_strike,
            short_strike: 0,
            ..*self
        }
    }
}

/// Packed 256-bit token identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenId(U256);

impl TokenId {
    pub fn encode(
        settlement_type: SettlementType,
        option_type: OptionType,
        product_id: ProductId,
        expiry: u64,
        long_strike: u64,
        short_strike: u64,
    ) -> TokenId {
        let raw = (U256::from(settlement_type as u8) << SETTLEMENT_OFFSET)
            | (U256::from(option_type as u8) << OPTION_TYPE_OFFSET)
            | (U256::from(product_id.0 & PRODUCT_MASK) << PRODUCT_OFFSET)
            | (U256::from(expiry) << EXPIRY_OFFSET)
            | (U256::from(long_strike) << LONG_STRIKE_OFFSET)
            | (U256::from(short_strike) << SHORT_STRIKE_OFFSET);
        TokenId(raw)
    }

    /// Physically-settled single-leg token issued by `issuer`.
    pub fn encode_physical(
        option_type: OptionType,
        product_id: ProductId,
        expiry: u64,
        strike: u64,
        issuer: IssuerId,
    ) -> TokenId {
        Self::encode(
            SettlementType::Physical,
            option_type,
            product_id,
            expiry,
            strike,
            u64::from(issuer.0),
        )
    }

    pub fn decode(&self) -> Result<TokenDescriptor, CodecError> {
        if self.field(RESERVED_OFFSET, 8) != 0 {
            return Err(CodecError::ReservedBits);
        }
        Ok(TokenDescriptor {
            settlement_type: SettlementType::from_u8(self.field(SETTLEMENT_OFFSET, 8) as u8)?,
            option_type: OptionType::from_u8(self.field(OPTION_TYPE_OFFSET, 8) as u8)?,
            product_id: ProductId(self.field(PRODUCT_OFFSET, 40)),
            expiry: self.field(EXPIRY_OFFSET, 64),
            long_strike: self.field(LONG_STRIKE_OFFSET, 64),
            short_strike: self.field(SHORT_STRIKE_OFFSET, 64),
        })
    }

    /// Issuer id of a physically-settled token: the low 16 bits, read
    /// without going through `decode`.
    pub fn issuer_id(&self) -> IssuerId {
        IssuerId(self.0.low_u64() as u16)
    }

    pub fn from_raw(raw: U256) -> Self {
        TokenId(raw)
    }

    pub fn raw(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Fixed-width `0x`-prefixed big-endian hex.
    pub fn to_hex(&self) -> String {
        let mut bytes = [0u8; 32];
        self.0.to_big_endian(&mut bytes);
        format!("0x{}", hex::encode(bytes))
    }

    fn field(&self, offset: usize, bits: u32) -> u64 {
        let v = (self.0 >> offset).low_u64();
        if bits >= 64 {
            v
        } else {
            v & ((1u64 << bits) - 1)
        }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Accepts `0x`-prefixed hex (up to 32 bytes) or a decimal string.
impl FromStr for TokenId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            let padded = if digits.len() % 2 == 1 {
                format!("0{}", digits)
            } else {
                digits.to_string()
            };
            let bytes = hex::decode(&padded).map_err(|e| CodecError::Parse(e.to_string()))?;
            if bytes.len() > 32 {
                return Err(CodecError::Parse("more than 32 bytes".to_string()));
            }
            return Ok(TokenId(U256::from_big_endian(&bytes)));
        }
        U256::from_dec_str(s)
            .map(TokenId)
            .map_err(|e| CodecError::Parse(format!("{:?}", e)))
    }
}

impl From<TokenId> for String {
    fn from(id: TokenId) -> String {
        id.to_hex()
    }
}

impl TryFrom<String> for TokenId {
    type Error = CodecError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        TokenId::from_str(&s)
    }
}
