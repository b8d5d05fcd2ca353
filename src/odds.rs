//! AMM odds engine.
//!
//! Prices every outcome of a condition from its virtual funds. Outcome `i` has
//! implied probability `f_i / Σf` and clean odds `Σf / f_i`. The margin scales every
//! outcome's net odds (`odds - 1`) by one common factor `y`, chosen so that
//! `Σ 1/odds = 1 + margin`. A binary market solves for `y` in closed form; wider
//! markets bisect for it. Ranking and ties are preserved because every outcome is
//! scaled alike.
//!
//! A bet is priced with its own stake already in the funds, so the quote depends on
//! the amount. Everything here is pure: no state, no allocation beyond the returned
//! vectors.

use crate::fixed::{isqrt, mul_div, Fixed, MathError, SCALE};
use crate::types::Amount;

/// Largest odds ever quoted. Higher odds are clamped down to this value.
pub const MAX_ODDS: Fixed = Fixed::from_int(100);

pub const MIN_OUTCOMES: usize = 2;
pub const MAX_OUTCOMES: usize = 32;

// clean odds past a million are priced as a million before the margin
const MAX_NET_RATIO: u128 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OddsError {
    #[error("Outcome {index} has zero funds")]
    ZeroOdds { index: usize },

    #[error("Outcome {index} would be priced at or below 1.0")]
    IncorrectOdds { index: usize },

    #[error("Target odds {odds} for outcome {index} outside (1, {max}]")]
    OddsOutOfRange { index: usize, odds: Fixed, max: Fixed },

    #[error("Margin {0} outside [0, 1]")]
    InvalidMargin(Fixed),

    #[error("Outcome count {0} outside [{min}, {max}]", min = MIN_OUTCOMES, max = MAX_OUTCOMES)]
    InvalidOutcomeCount(usize),

    #[error("Winning outcome count {winning} invalid for {outcomes} outcomes")]
    InvalidWinningCount { winning: usize, outcomes: usize },

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

pub fn validate_shape(outcomes: usize, winning: usize) -> Result<(), OddsError> {
    if !(MIN_OUTCOMES..=MAX_OUTCOMES).contains(&outcomes) {
        return Err(OddsError::InvalidOutcomeCount(outcomes));
    }
    if winning == 0 || winning >= outcomes {
        return Err(OddsError::InvalidWinningCount { winning, outcomes });
    }
    Ok(())
}

pub fn validate_margin(margin: Fixed) -> Result<(), OddsError> {
    if margin > Fixed::ONE {
        return Err(OddsError::InvalidMargin(margin));
    }
    Ok(())
}

/// Implied single-winner probabilities, `f_i / Σf` rounded down.
pub fn probabilities(funds: &[Amount]) -> Result<Vec<Fixed>, OddsError> {
    let total = fund_total(funds)?;
    funds
        .iter()
        .map(|f| Fixed::from_ratio(*f, total).map_err(OddsError::from))
        .collect()
}

/// Margin adjusted odds for every outcome.
///
/// With `winning > 1` every outcome is one of `winning` simultaneous winners, so its
/// odds are the single-winner odds divided by `winning`.
pub fn calc_odds(funds: &[Amount], margin: Fixed, winning: usize) -> Result<Vec<Fixed>, OddsError> {
    validate_shape(funds.len(), winning)?;
    validate_margin(margin)?;

    let net = net_odds(funds)?;
    let factor = margin_factor(&net, margin)?;

    net.iter()
        .enumerate()
        .map(|(index, d)| -> Result<Fixed, OddsError> {
            let single = SCALE
                .checked_add(mul_div(*d, factor, SCALE)?)
                .ok_or(MathError::Overflow)?;
            let odds = Fixed::from_raw(single).min(MAX_ODDS).div_int(winning as u128)?;
            if odds <= Fixed::ONE {
                return Err(OddsError::IncorrectOdds { index });
            }
            Ok(odds)
        })
        .collect()
}

/// Odds for a single outcome. same validation as `calc_odds`.
pub fn outcome_odds(
    funds: &[Amount],
    margin: Fixed,
    winning: usize,
    index: usize,
) -> Result<Fixed, OddsError> {
    let odds = calc_odds(funds, margin, winning)?;
    odds.get(index)
        .copied()
        .ok_or(OddsError::InvalidOutcomeCount(funds.len()))
}

/// Funds with a stake of `amount` added to outcome `index`.
pub fn funds_after_bet(funds: &[Amount], index: usize, amount: Amount) -> Result<Vec<Amount>, OddsError> {
    let mut after = funds.to_vec();
    let fund = after
        .get_mut(index)
        .ok_or(OddsError::InvalidOutcomeCount(funds.len()))?;
    *fund = fund.checked_add(amount).ok_or(MathError::Overflow)?;
    Ok(after)
}

/// Odds a bet of `amount` on outcome `index` is taken at.
///
/// The market is priced with the stake already on the outcome, so a larger stake
/// moves the price further against itself. An amount of zero gives the current odds.
pub fn bet_odds(
    funds: &[Amount],
    margin: Fixed,
    winning: usize,
    index: usize,
    amount: Amount,
) -> Result<Fixed, OddsError> {
    let after = funds_after_bet(funds, index, amount)?;
    outcome_odds(&after, margin, winning, index)
}

/// Binary margin in closed form: the margined odds of a side whose clean odds are
/// `clean`, the other side holding the complementary probability.
pub fn binary_margin(clean: Fixed, margin: Fixed) -> Result<Fixed, OddsError> {
    validate_margin(margin)?;
    if clean <= Fixed::ONE {
        return Err(OddsError::OddsOutOfRange {
            index: 0,
            odds: clean,
            max: MAX_ODDS,
        });
    }
    let net = clean.checked_sub(Fixed::ONE)?.raw();
    let other = Fixed::from_raw(net).recip()?.raw();
    let factor = binary_factor(net, other, margin.raw())?;
    Ok(Fixed::from_raw(SCALE + mul_div(net, factor, SCALE)?))
}

fn fund_total(funds: &[Amount]) -> Result<Amount, OddsError> {
    if let Some(index) = funds.iter().position(|f| *f == 0) {
        return Err(OddsError::ZeroOdds { index });
    }
    Ok(funds
        .iter()
        .try_fold(0u128, |acc, f| acc.checked_add(*f))
        .ok_or(MathError::Overflow)?)
}

/// Clean odds minus one, `(Σf - f_i) / f_i`, capped at `MAX_NET_RATIO`.
fn net_odds(funds: &[Amount]) -> Result<Vec<u128>, OddsError> {
    let total = fund_total(funds)?;
    funds
        .iter()
        .map(|f| -> Result<u128, OddsError> {
            let rest = total - f;
            if rest / f >= MAX_NET_RATIO {
                return Ok(MAX_NET_RATIO * SCALE);
            }
            Ok(mul_div(rest, SCALE, *f)?)
        })
        .collect()
}

/// Common factor applied to every net odds. One with no margin, zero at a margin
/// of one.
fn margin_factor(net: &[u128], margin: Fixed) -> Result<u128, OddsError> {
    if margin.is_zero() {
        return Ok(SCALE);
    }
    match net {
        [a, b] => binary_factor(*a, *b, margin.raw()),
        _ => solve_factor(net, margin.raw()),
    }
}

/// With net odds `d` and `1/d`, `Σ 1/(1 + d_i y) = 1 + m` reduces to
/// `(1 + m) y² + m s y - (1 - m) = 0` where `s = d + 1/d`. The positive root is
/// taken as `2 (1 - m) / (sqrt(m² s² + 4 (1 - m²)) + m s)`.
fn binary_factor(a: u128, b: u128, margin: u128) -> Result<u128, OddsError> {
    let s = a.checked_add(b).ok_or(MathError::Overflow)?;
    let ms = mul_div(margin, s, SCALE)?;
    let disc = ms
        .checked_mul(ms)
        .and_then(|sq| sq.checked_add(4 * (SCALE * SCALE - margin * margin)))
        .ok_or(MathError::Overflow)?;
    let root = isqrt(disc);
    Ok(mul_div(2 * (SCALE - margin), SCALE, root + ms)?)
}

/// Largest factor whose book still covers `1 + margin`. The book only falls as the
/// factor grows, from `n` at zero to at most 1 at one.
fn solve_factor(net: &[u128], margin: u128) -> Result<u128, OddsError> {
    let target = SCALE + margin;
    let (mut lo, mut hi) = (0u128, SCALE);
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if book_at(net, mid)? >= target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(lo)
}

fn book_at(net: &[u128], factor: u128) -> Result<u128, OddsError> {
    net.iter().try_fold(0u128, |acc, d| -> Result<u128, OddsError> {
        let odds = SCALE + mul_div(*d, factor, SCALE)?;
        Ok(acc + mul_div(SCALE, SCALE, odds)?)
    })
}

/// Splits `total` across outcomes so that their clean odds match `odds`.
///
/// Used on condition creation and admin re-pricing; the margin is applied on top
/// by `calc_odds`.
pub fn funds_from_odds(odds: &[Fixed], total: Amount) -> Result<Vec<Amount>, OddsError> {
    if !(MIN_OUTCOMES..=MAX_OUTCOMES).contains(&odds.len()) {
        return Err(OddsError::InvalidOutcomeCount(odds.len()));
    }

    let mut inverse = Vec::with_capacity(odds.len());
    for (index, o) in odds.iter().enumerate() {
        if *o <= Fixed::ONE || *o > MAX_ODDS {
            return Err(OddsError::OddsOutOfRange {
                index,
                odds: *o,
                max: MAX_ODDS,
            });
        }
        inverse.push(o.recip()?.raw());
    }
    let inverse_sum: u128 = inverse.iter().sum();

    inverse
        .iter()
        .enumerate()
        .map(|(index, inv)| -> Result<Amount, OddsError> {
            let fund = mul_div(total, *inv, inverse_sum)?;
            if fund == 0 {
                return Err(OddsError::ZeroOdds { index });
            }
            Ok(fund)
        })
        .collect()
}

/// `Σ 1/odds` as a fixed point value. `1 + margin` for unclamped single-winner odds.
pub fn overround(odds: &[Fixed]) -> Result<Fixed, OddsError> {
    odds.iter().try_fold(Fixed::ZERO, |acc, o| -> Result<Fixed, OddsError> {
        let inv = o.recip()?;
        Ok(acc.checked_add(inv)?)
    })
}
