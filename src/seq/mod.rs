//! Ordered-sequence primitives used by the margin computations.
//!
//! This module provides:
//! - Search and access: `min`, `max`, `index_of`, `at`, `slice`, `remove`
//! - Quicksort with index tracking: `sort`, `arg_sort`, `sort_by_indexes`
//! - Element-wise checked arithmetic and builders: `add_each_by`, `each_mul_div_up`, `concat`, ...
//!
//! Every function works on any primitive integer (`num_traits::PrimInt`) and
//! returns a fresh allocation unless it explicitly takes `&mut`.

pub mod access;
pub mod arith;
pub mod sort;

pub use access::{at, index_of, max, min, remove, slice};
pub use arith::{
    add_each_by, append, concat, dot, each_div, each_mul, each_mul_div_down, each_mul_div_up,
    fill, maximum, populate, sub_each_by, sub_each_from, sum, to_signed, to_unsigned,
};
pub use sort::{arg_sort, sort, sort_by_indexes};

use thiserror::Error;

/// Failure conditions for sequence operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SeqError {
    #[error("index out of bounds")]
    IndexOutOfBounds,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("division by zero")]
    DivisionByZero,
    #[error("negative value cannot be converted to unsigned")]
    NegativeToUnsigned,
    #[error("sequence lengths differ: {0} vs {1}")]
    LengthMismatch(usize, usize),
}
