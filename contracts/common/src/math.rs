//! Mathematical Utilities for optvault
//!
//! Checked fixed-point arithmetic. Every product that crosses scales goes
//! through `u128` with explicit overflow errors; nothing saturates silently.

use crate::constants::precision::DECIMAL_BASE;
use crate::errors::{OptionsError, OptionsResult};
use crate::types::Fixed;

/// Exact non-negative rational `num / den`, kept in lowest terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    pub num: u128,
    pub den: u128,
}

impl Ratio {
    /// Build a reduced ratio
    pub fn new(num: u128, den: u128) -> OptionsResult<Self> {
        if den == 0 {
            return Err(OptionsError::DivisionByZero);
        }
        let g = gcd(num, den);
        Ok(Self {
            num: num / g,
            den: den / g,
        })
    }

    /// Convert `value * 10^exponent` into a ratio
    pub fn from_fixed(fixed: Fixed) -> OptionsResult<Self> {
        let scale = pow10(fixed.exponent.unsigned_abs())?;
        if fixed.exponent >= 0 {
            let num = (fixed.value as u128)
                .checked_mul(scale)
                .ok_or(OptionsError::Overflow)?;
            Self::new(num, 1)
        } else {
            Self::new(fixed.value as u128, scale)
        }
    }

    /// `1 + self`
    pub fn one_plus(self) -> OptionsResult<Self> {
        let num = self.num.checked_add(self.den).ok_or(OptionsError::Overflow)?;
        Self::new(num, self.den)
    }

    /// `1 / self`
    pub fn inverse(self) -> OptionsResult<Self> {
        Self::new(self.den, self.num)
    }

    /// Checked product of two ratios
    pub fn mul(self, other: Ratio) -> OptionsResult<Self> {
        // Cross-reduce first so intermediate products stay small
        let g1 = gcd(self.num, other.den);
        let g2 = gcd(other.num, self.den);
        let num = (self.num / g1)
            .checked_mul(other.num / g2)
            .ok_or(OptionsError::Overflow)?;
        let den = (self.den / g2)
            .checked_mul(other.den / g1)
            .ok_or(OptionsError::Overflow)?;
        Self::new(num, den)
    }

    /// Multiply by `10^exponent` (exponent may be negative)
    pub fn scale_pow10(self, exponent: i32) -> OptionsResult<Self> {
        let scale = pow10(exponent.unsigned_abs())?;
        if exponent >= 0 {
            self.mul(Self::new(scale, 1)?)
        } else {
            self.mul(Self::new(1, scale)?)
        }
    }

    /// `floor(amount * self)`
    pub fn apply_floor(self, amount: u128) -> OptionsResult<u128> {
        mul_div_floor(amount, self.num, self.den)
    }
}

/// `10^exp` as u128
pub fn pow10(exp: u32) -> OptionsResult<u128> {
    DECIMAL_BASE.checked_pow(exp).ok_or(OptionsError::Overflow)
}

/// Greatest common divisor (gcd(0, 0) = 1 so it can always divide)
fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    if a == 0 {
        1
    } else {
        a
    }
}

/// `floor(a * b / c)` with overflow and zero checks
pub fn mul_div_floor(a: u128, b: u128, c: u128) -> OptionsResult<u128> {
    if c == 0 {
        return Err(OptionsError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(OptionsError::Overflow)?;
    Ok(product / c)
}

/// `ceil(a * b / c)` with overflow and zero checks
pub fn mul_div_ceil(a: u128, b: u128, c: u128) -> OptionsResult<u128> {
    if c == 0 {
        return Err(OptionsError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(OptionsError::Overflow)?;
    Ok(product.div_ceil(c))
}

/// Narrow a u128 result back to a token amount
pub fn to_amount(value: u128) -> OptionsResult<u64> {
    u64::try_from(value).map_err(|_| OptionsError::Overflow)
}

/// Safe addition with overflow check
pub fn safe_add(a: u64, b: u64) -> OptionsResult<u64> {
    a.checked_add(b).ok_or(OptionsError::Overflow)
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u64, b: u64) -> OptionsResult<u64> {
    a.checked_sub(b).ok_or(OptionsError::Underflow)
}

/// Maximum debt a given collateral can back
///
/// max_debt = floor(collateral * rate / collateralization_ratio)
///
/// # Arguments
/// * `collateral` - Collateral in collateral-asset units
/// * `rate` - Option-token units coverable per collateral unit
/// * `collateralization_ratio` - Minimum collateralization ratio
pub fn max_debt_for_collateral(
    collateral: u64,
    rate: Ratio,
    collateralization_ratio: Ratio,
) -> OptionsResult<u128> {
    let ratio = rate.mul(collateralization_ratio.inverse()?)?;
    ratio.apply_floor(collateral as u128)
}

/// Smallest collateral that backs `debt` at `rate`
///
/// min_collateral = ceil(debt * collateralization_ratio / rate)
pub fn min_collateral_for_debt(
    debt: u64,
    rate: Ratio,
    collateralization_ratio: Ratio,
) -> OptionsResult<u128> {
    let ratio = collateralization_ratio.mul(rate.inverse()?)?;
    mul_div_ceil(debt as u128, ratio.num, ratio.den)
}

/// Whether `debt` satisfies the collateralization inequality
///
/// `collateral * rate >= debt * collateralization_ratio`. Because debt is an
/// integer this is exactly `debt <= max_debt_for_collateral(..)`.
pub fn is_collateralized(
    collateral: u64,
    debt: u64,
    rate: Ratio,
    collateralization_ratio: Ratio,
) -> OptionsResult<bool> {
    if debt == 0 {
        return Ok(true);
    }
    let max_debt = max_debt_for_collateral(collateral, rate, collateralization_ratio)?;
    Ok(debt as u128 <= max_debt)
}
