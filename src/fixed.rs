// 2.0 fixed.rs: scaled integer math shared by odds, margins, fee shares and fractions.
// scale is 10^12. every operation rounds toward zero. products go through a 256 bit
// intermediate so token amounts with 18 decimals never overflow mid-calculation.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SCALE: u128 = 1_000_000_000_000;
const SCALE_DP: u32 = 12;
const LOW_MASK: u128 = u64::MAX as u128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("arithmetic overflow")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("negative value where unsigned expected")]
    Negative,
}

/// Fixed point number with 12 decimals. 1.0 is `Fixed::ONE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Fixed(u128);

impl Fixed {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(SCALE);

    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    pub const fn from_int(n: u64) -> Self {
        Self(n as u128 * SCALE)
    }

    pub const fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `num / den` as a fixed point fraction.
    pub fn from_ratio(num: u128, den: u128) -> Result<Self, MathError> {
        mul_div(num, SCALE, den).map(Self)
    }

    /// Truncates anything past 12 decimals.
    pub fn from_decimal(value: Decimal) -> Result<Self, MathError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(MathError::Negative);
        }
        let scaled = value
            .checked_mul(Decimal::from(SCALE as u64))
            .ok_or(MathError::Overflow)?;
        scaled.trunc().to_u128().map(Self).ok_or(MathError::Overflow)
    }

    pub fn to_decimal(&self) -> Decimal {
        i128::try_from(self.0)
            .ok()
            .and_then(|raw| Decimal::try_from_i128_with_scale(raw, SCALE_DP).ok())
            .unwrap_or(Decimal::MAX)
    }

    pub fn checked_add(self, other: Self) -> Result<Self, MathError> {
        self.0.checked_add(other.0).map(Self).ok_or(MathError::Overflow)
    }

    pub fn checked_sub(self, other: Self) -> Result<Self, MathError> {
        self.0.checked_sub(other.0).map(Self).ok_or(MathError::Overflow)
    }

    pub fn mul(self, other: Self) -> Result<Self, MathError> {
        mul_div(self.0, other.0, SCALE).map(Self)
    }

    pub fn div(self, other: Self) -> Result<Self, MathError> {
        mul_div(self.0, SCALE, other.0).map(Self)
    }

    /// 1 / self
    pub fn recip(self) -> Result<Self, MathError> {
        mul_div(SCALE, SCALE, self.0).map(Self)
    }

    /// Scales a raw token amount: `amount * self`.
    pub fn mul_amount(self, amount: u128) -> Result<u128, MathError> {
        mul_div(amount, self.0, SCALE)
    }

    pub fn div_int(self, n: u128) -> Result<Self, MathError> {
        if n == 0 {
            return Err(MathError::DivisionByZero);
        }
        Ok(Self(self.0 / n))
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

/// floor(a * b / d)
pub fn mul_div(a: u128, b: u128, d: u128) -> Result<u128, MathError> {
    if d == 0 {
        return Err(MathError::DivisionByZero);
    }
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / d);
    }
    let (hi, lo) = widening_mul(a, b);
    if hi >= d {
        return Err(MathError::Overflow);
    }
    // restoring long division of the 256 bit product, remainder stays below d
    let mut rem = hi;
    let mut quot: u128 = 0;
    for bit in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> bit) & 1);
        quot <<= 1;
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            quot |= 1;
        }
    }
    Ok(quot)
}

/// floor(sqrt(n)), Newton iteration from an upper bound.
pub fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let bits = 128 - n.leading_zeros();
    let mut x: u128 = 1 << bits.div_ceil(2);
    loop {
        let next = (x + n / x) / 2;
        if next >= x {
            return x;
        }
        x = next;
    }
}

fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    let (a1, a0) = (a >> 64, a & LOW_MASK);
    let (b1, b0) = (b >> 64, b & LOW_MASK);

    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;

    let mid = (p00 >> 64) + (p01 & LOW_MASK) + (p10 & LOW_MASK);
    let lo = (p00 & LOW_MASK) | (mid << 64);
    let hi = p11 + (p01 >> 64) + (p10 >> 64) + (mid >> 64);
    (hi, lo)
}
