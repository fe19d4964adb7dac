//! Vault risk index, the sort key of the vault list.
//!
//! index = floor(collateral * 1e9 / debt)
//!
//! The contract computes the same value with integer arithmetic, so this must
//! match it bit-for-bit or the predecessor search lands on the wrong node.
//!
//! The deposit ratio uses the same floor division with the currency rate in
//! place of the scale: ratio = floor(rate * collateral / debt).

use alloy::primitives::ruint::UintTryFrom;
use alloy::primitives::{U256, U512};
use thiserror::Error;

use fxdao_common::error::AppError;

/// Fixed-point scale of the index (9 decimals).
pub const INDEX_SCALE: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("Cannot compute a vault index with zero debt")]
    DivisionByZero,

    #[error("Vault index does not fit in 256 bits")]
    Overflow,
}

impl From<IndexError> for AppError {
    fn from(err: IndexError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Compute the index of a vault holding `collateral` against `debt`.
///
/// The product is formed in 512 bits, so it never overflows.
pub fn compute_index(collateral: U256, debt: U256) -> Result<U256, IndexError> {
    mul_div(collateral, U256::from(INDEX_SCALE), debt)
}

/// Collateral ratio of a position at `rate`, with the rate's own decimals.
pub fn compute_deposit_ratio(rate: U256, collateral: U256, debt: U256) -> Result<U256, IndexError> {
    mul_div(rate, collateral, debt)
}

fn mul_div(a: U256, b: U256, divisor: U256) -> Result<U256, IndexError> {
    if divisor.is_zero() {
        return Err(IndexError::DivisionByZero);
    }

    let quotient = U512::from(a) * U512::from(b) / U512::from(divisor);
    U256::uint_try_from(quotient).map_err(|_| IndexError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(collateral: u128, debt: u128) -> U256 {
        compute_index(U256::from(collateral), U256::from(debt)).unwrap()
    }

    #[test]
    fn test_equal_collateral_and_debt() {
        assert_eq!(idx(5000_0000000, 5000_0000000), U256::from(1_000_000_000u64));
    }

    #[test]
    fn test_overcollateralized() {
        assert_eq!(idx(3000_0000000, 100_0000000), U256::from(30_000_000_000u64));
    }

    #[test]
    fn test_undercollateralized_rounds_down() {
        assert_eq!(idx(100_0000000, 3000_0000000), U256::from(33_333_333u64));
        assert_eq!(idx(1_000_000_000, 29_999_999_999), U256::from(33_333_333u64));
    }

    #[test]
    fn test_large_ratio() {
        assert_eq!(idx(29_999_999_999, 1_000_000_000), U256::from(29_999_999_999u64));
    }

    #[test]
    fn test_zero_collateral() {
        assert_eq!(idx(0, 10), U256::ZERO);
    }

    #[test]
    fn test_zero_debt_rejected() {
        assert_eq!(
            compute_index(U256::from(10u64), U256::ZERO),
            Err(IndexError::DivisionByZero)
        );
    }

    #[test]
    fn test_u128_extremes_do_not_overflow() {
        let max = U256::from(u128::MAX);
        let expected = max * U256::from(INDEX_SCALE);
        assert_eq!(compute_index(max, U256::from(1u64)), Ok(expected));
        assert_eq!(compute_index(max, max), Ok(U256::from(INDEX_SCALE)));
    }

    #[test]
    fn test_product_beyond_256_bits_is_exact() {
        // collateral * 1e9 overflows U256, but the quotient fits.
        let collateral = U256::MAX;
        let debt = U256::from(INDEX_SCALE) * U256::from(4u64);
        assert_eq!(compute_index(collateral, debt), Ok(U256::MAX / U256::from(4u64)));
    }

    #[test]
    fn test_quotient_beyond_256_bits() {
        assert_eq!(
            compute_index(U256::MAX, U256::from(1u64)),
            Err(IndexError::Overflow)
        );
    }

    #[test]
    fn test_largest_index_fits() {
        let debt = U256::from(INDEX_SCALE);
        assert_eq!(compute_index(U256::MAX, debt), Ok(U256::MAX));
        assert_eq!(
            compute_index(U256::MAX, debt - U256::from(1u64)),
            Err(IndexError::Overflow)
        );
    }

    #[test]
    fn test_deposit_ratio() {
        // 1.1 at 7 decimals: 110 collateral at rate 0.1 against 10 debt.
        let ratio = compute_deposit_ratio(
            U256::from(1_000_000u64),
            U256::from(110u64),
            U256::from(10u64),
        );
        assert_eq!(ratio, Ok(U256::from(11_000_000u64)));
        assert_eq!(
            compute_deposit_ratio(U256::from(1u64), U256::from(1u64), U256::ZERO),
            Err(IndexError::DivisionByZero)
        );
    }

    #[test]
    fn test_deterministic() {
        let a = compute_index(U256::from(123_456_789u64), U256::from(987u64));
        let b = compute_index(U256::from(123_456_789u64), U256::from(987u64));
        assert_eq!(a, b);
    }
}
