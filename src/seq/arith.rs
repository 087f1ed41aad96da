//! Element-wise checked arithmetic, reductions, builders and conversions.

use super::SeqError;
use num_traits::{NumCast, PrimInt, Signed, Unsigned};

fn map_checked<T, F>(x: &[T], f: F) -> Result<Vec<T>, SeqError>
where
    T: PrimInt,
    F: Fn(T) -> Option<T>,
{
    x.iter().map(|&v| f(v).ok_or(SeqError::Overflow)).collect()
}

/// Clamp every element from below: `y[i] = max(x[i], floor)`.
pub fn maximum<T: PrimInt>(x: &[T], floor: T) -> Vec<T> {
    x.iter().map(|&v| if v >= floor { v } else { floor }).collect()
}

/// Checked sum of all elements.
pub fn sum<T: PrimInt>(x: &[T]) -> Result<T, SeqError> {
    x.iter()
        .try_fold(T::zero(), |acc, &v| acc.checked_add(&v))
        .ok_or(SeqError::Overflow)
}

/// Checked dot product of two equal-length sequences.
pub fn dot<T: PrimInt>(x: &[T], y: &[T]) -> Result<T, SeqError> {
    if x.len() != y.len() {
        return Err(SeqError::LengthMismatch(x.len(), y.len()));
    }
    x.iter()
        .zip(y)
        .try_fold(T::zero(), |acc, (&a, &b)| {
            a.checked_mul(&b).and_then(|p| acc.checked_add(&p))
        })
        .ok_or(SeqError::Overflow)
}

/// `y[i] = x[i] + z`
pub fn add_each_by<T: PrimInt>(x: &[T], z: T) -> Result<Vec<T>, SeqError> {
    map_checked(x, |v| v.checked_add(&z))
}

/// `y[i] = z - x[i]`
pub fn sub_each_from<T: PrimInt>(x: &[T], z: T) -> Result<Vec<T>, SeqError> {
    map_checked(x, |v| z.checked_sub(&v))
}

/// `y[i] = x[i] - z`
pub fn sub_each_by<T: PrimInt>(x: &[T], z: T) -> Result<Vec<T>, SeqError> {
    map_checked(x, |v| v.checked_sub(&z))
}

/// `y[i] = x[i] * z`
pub fn each_mul<T: PrimInt>(x: &[T], z: T) -> Result<Vec<T>, SeqError> {
    map_checked(x, |v| v.checked_mul(&z))
}

/// `y[i] = x[i] / z`, truncating.
pub fn each_div<T: PrimInt>(x: &[T], z: T) -> Result<Vec<T>, SeqError> {
    if z.is_zero() {
        return Err(SeqError::DivisionByZero);
    }
    map_checked(x, |v| v.checked_div(&z))
}

/// `y[i] = floor(x[i] * z / d)`
pub fn each_mul_div_down<T: PrimInt>(x: &[T], z: T, d: T) -> Result<Vec<T>, SeqError> {
    if d.is_zero() {
        return Err(SeqError::DivisionByZero);
    }
    map_checked(x, |v| v.checked_mul(&z).and_then(|p| p.checked_div(&d)))
}

/// `y[i] = floor(x[i] * z / d) + 1`
///
/// This always adds one, even when the division is exact; it is not a ceiling.
pub fn each_mul_div_up<T: PrimInt>(x: &[T], z: T, d: T) -> Result<Vec<T>, SeqError> {
    if d.is_zero() {
        return Err(SeqError::DivisionByZero);
    }
    map_checked(x, |v| {
        v.checked_mul(&z)
            .and_then(|p| p.checked_div(&d))
            .and_then(|q| q.checked_add(&T::one()))
    })
}

pub fn append<T: Copy>(x: &[T], v: T) -> Vec<T> {
    let mut y = Vec::with_capacity(x.len() + 1);
    y.extend_from_slice(x);
    y.push(v);
    y
}

pub fn concat<T: Copy>(a: &[T], b: &[T]) -> Vec<T> {
    let mut y = Vec::with_capacity(a.len() + b.len());
    y.extend_from_slice(a);
    y.extend_from_slice(b);
    y
}

/// A sequence shaped like `x` with every element set to `v`.
pub fn fill<T: Copy>(x: &[T], v: T) -> Vec<T> {
    vec![v; x.len()]
}

/// Copy `src` into `dest` starting at `offset`.
pub fn populate<T: Copy>(dest: &mut [T], src: &[T], offset: usize) -> Result<(), SeqError> {
    let end = offset
        .checked_add(src.len())
        .ok_or(SeqError::IndexOutOfBounds)?;
    if end > dest.len() {
        return Err(SeqError::IndexOutOfBounds);
    }
    dest[offset..end].copy_from_slice(src);
    Ok(())
}

/// Convert signed elements to an unsigned type; any negative element fails.
pub fn to_unsigned<S, U>(x: &[S]) -> Result<Vec<U>, SeqError>
where
    S: PrimInt + Signed,
    U: PrimInt + Unsigned,
{
    x.iter()
        .map(|&v| {
            if v < S::zero() {
                return Err(SeqError::NegativeToUnsigned);
            }
            <U as NumCast>::from(v).ok_or(SeqError::Overflow)
        })
        .collect()
}

/// Convert unsigned elements to a signed type; values above the signed
/// maximum fail with overflow.
pub fn to_signed<U, S>(x: &[U]) -> Result<Vec<S>, SeqError>
where
    U: PrimInt + Unsigned,
    S: PrimInt + Signed,
{
    x.iter()
        .map(|&v| <S as NumCast>::from(v).ok_or(SeqError::Overflow))
        .collect()
}
