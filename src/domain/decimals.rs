//! Fixed-point precision helpers.
//!
//! Strikes and option token amounts use `UNIT_DECIMALS`; asset balances use
//! each asset's native decimals.

use crate::domain::CodecError;

pub const UNIT_DECIMALS: u8 = 6;
pub const UNIT: u64 = 1_000_000;

/// `10^exp`, or `None` if it does not fit.
pub fn pow10(exp: u8) -> Option<u128> {
    10u128.checked_pow(u32::from(exp))
}

/// Rescale `amount` from `from` decimals to `to` decimals.
///
/// Scaling down floors; scaling up is exact or fails with overflow.
pub fn convert_decimals(amount: u128, from: u8, to: u8) -> Result<u128, CodecError> {
    if from == to {
        return Ok(amount);
    }
    if from > to {
        let factor = pow10(from - to).ok_or(CodecError::DecimalOverflow)?;
        Ok(amount / factor)
    } else {
        let factor = pow10(to - from).ok_or(CodecError::DecimalOverflow)?;
        amount
            .checked_mul(factor)
            .ok_or(CodecError::DecimalOverflow)
    }
}
