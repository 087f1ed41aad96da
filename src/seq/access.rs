//! Search and positional access.

use super::SeqError;

/// Smallest element. Empty input is out of bounds.
pub fn min<T: Ord + Copy>(x: &[T]) -> Result<T, SeqError> {
    x.iter().copied().min().ok_or(SeqError::IndexOutOfBounds)
}

/// Largest element. Empty input is out of bounds.
pub fn max<T: Ord + Copy>(x: &[T]) -> Result<T, SeqError> {
    x.iter().copied().max().ok_or(SeqError::IndexOutOfBounds)
}

/// Position of the first element equal to `v`.
pub fn index_of<T: PartialEq>(x: &[T], v: &T) -> Option<usize> {
    x.iter().position(|e| e == v)
}

/// Copy of `x` without the element at `i`.
///
/// An out-of-range `i` returns the input unchanged rather than failing.
pub fn remove<T: Copy>(x: &[T], i: usize) -> Vec<T> {
    if i >= x.len() {
        return x.to_vec();
    }
    x.iter()
        .enumerate()
        .filter(|(j, _)| *j != i)
        .map(|(_, v)| *v)
        .collect()
}

/// Signed accessor: non-negative `i` indexes from the front, negative `i`
/// counts back from the end (`-1` is the last element).
pub fn at<T: Copy>(x: &[T], i: isize) -> Result<T, SeqError> {
    let len = x.len() as isize;
    let idx = if i >= 0 {
        if i > len {
            return Err(SeqError::IndexOutOfBounds);
        }
        i
    } else {
        if i < -len {
            return Err(SeqError::IndexOutOfBounds);
        }
        len + i
    };
    // i == len passes the bound check above but still has no element.
    x.get(idx as usize).copied().ok_or(SeqError::IndexOutOfBounds)
}

/// Python-style slice `x[start..end]`.
///
/// A negative `start` counts from the end; an `end <= 0` counts from the end,
/// so `end == 0` means "through the last element". Returns an empty sequence
/// when the resolved end precedes the start.
pub fn slice<T: Copy>(x: &[T], start: isize, end: isize) -> Result<Vec<T>, SeqError> {
    let len = x.len() as isize;
    let start = if start < 0 { len + start } else { start };
    let end = if end <= 0 { len + end } else { end };
    if end < start {
        return Ok(Vec::new());
    }
    if start < 0 || end > len {
        return Err(SeqError::IndexOutOfBounds);
    }
    Ok(x[start as usize..end as usize].to_vec())
}
