// 5.0 reinforcement.rs: how much pool capital a condition may tie up.
// a condition locks its worst case loss: the w largest potential payouts minus
// the stakes already taken. the lock only ever grows through a capacity check.
// a growing lock is measured as the condition's own new lock, never a delta. it must
// stay within the condition's reinforcement and within ability * (pool total - what
// every other condition and express bet has locked). the condition's old lock is
// not counted against it, so a bet that grows the lock only competes with others.
// express bets lock their potential profit against ability * unlocked pool, the
// same share a new condition's reinforcement is gated by.

use crate::fixed::{Fixed, MathError};
use crate::types::Amount;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReinforcementError {
    #[error("Not enough liquidity: lock {required} above limit {limit}")]
    NotEnoughLiquidity { required: Amount, limit: Amount },

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

/// Worst case loss of a condition given its per-outcome payouts and net stakes.
pub fn worst_case_lock(payouts: &[Amount], stakes: Amount, winning: usize) -> Amount {
    let mut sorted = payouts.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let worst: Amount = sorted.iter().take(winning).sum();
    worst.saturating_sub(stakes)
}

/// Pool snapshot the checks run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    pub ability: Fixed,
    pub total: Amount,
    pub locked: Amount,
}

impl Capacity {
    /// Most a condition currently locking `own` may lock after the update.
    pub fn limit_for(&self, own: Amount) -> Result<Amount, MathError> {
        let others = self.locked.saturating_sub(own);
        self.ability.mul_amount(self.total.saturating_sub(others))
    }

    pub fn available(&self) -> Amount {
        self.total.saturating_sub(self.locked)
    }
}

/// Lock change for a bet. Bets that do not grow the lock always pass.
pub fn check_lock(
    capacity: &Capacity,
    old_lock: Amount,
    new_lock: Amount,
    reinforcement: Amount,
) -> Result<(), ReinforcementError> {
    if new_lock <= old_lock {
        return Ok(());
    }
    if new_lock > reinforcement {
        return Err(ReinforcementError::NotEnoughLiquidity {
            required: new_lock,
            limit: reinforcement,
        });
    }
    let limit = capacity.limit_for(old_lock)?;
    if new_lock > limit {
        return Err(ReinforcementError::NotEnoughLiquidity {
            required: new_lock,
            limit,
        });
    }
    Ok(())
}

/// A new condition's reinforcement must fit in the free share of the pool.
pub fn check_creation(capacity: &Capacity, reinforcement: Amount) -> Result<(), ReinforcementError> {
    within_free_share(capacity, reinforcement)
}

/// An express bet's potential profit must fit in the free share of the pool.
pub fn check_express(capacity: &Capacity, lock: Amount) -> Result<(), ReinforcementError> {
    within_free_share(capacity, lock)
}

fn within_free_share(capacity: &Capacity, required: Amount) -> Result<(), ReinforcementError> {
    let limit = capacity.ability.mul_amount(capacity.available())?;
    if required > limit {
        return Err(ReinforcementError::NotEnoughLiquidity { required, limit });
    }
    Ok(())
}
