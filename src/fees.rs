//! Profit split and claimable fee balances.
//!
//! On a profitable resolution the house, the condition's data provider and the
//! affiliates each take a configured share; whatever is left goes to liquidity
//! providers. Affiliate rewards are earned per condition but held back until
//! every condition the affiliate referred bets on has settled.

use crate::fixed::{mul_div, Fixed, MathError};
use crate::types::{AccountId, Amount, ConditionId};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeeError {
    #[error("Nothing to claim for {0:?}")]
    NothingToClaim(AccountId),

    #[error("Rewards of {account:?} locked until {open_conditions} conditions settle")]
    RewardsLocked { account: AccountId, open_conditions: usize },

    #[error("Fee shares sum to {0}, above 1")]
    InvalidShares(Fixed),

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

/// Fractions of condition profit. Sum never exceeds one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeShares {
    pub house: Fixed,
    pub data_provider: Fixed,
    pub affiliate: Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfitSplit {
    pub house: Amount,
    pub data_provider: Amount,
    pub affiliate: Amount,
    pub pool: Amount,
}

impl FeeShares {
    pub fn validate(&self) -> Result<(), FeeError> {
        let total = self
            .house
            .checked_add(self.data_provider)?
            .checked_add(self.affiliate)?;
        if total > Fixed::ONE {
            return Err(FeeError::InvalidShares(total));
        }
        Ok(())
    }

    pub fn split(&self, profit: Amount) -> Result<ProfitSplit, MathError> {
        let house = self.house.mul_amount(profit)?;
        let data_provider = self.data_provider.mul_amount(profit)?;
        let affiliate = self.affiliate.mul_amount(profit)?;
        // rounding dust stays with the pool
        let pool = profit - house - data_provider - affiliate;
        Ok(ProfitSplit {
            house,
            data_provider,
            affiliate,
            pool,
        })
    }
}

/// Claimable balances for house and data provider accounts.
#[derive(Debug, Clone, Default)]
pub struct FeeBook {
    balances: HashMap<AccountId, Amount>,
    outstanding: Amount,
    claimed: Amount,
}

impl FeeBook {
    pub fn credit(&mut self, account: AccountId, amount: Amount) {
        if amount == 0 {
            return;
        }
        *self.balances.entry(account).or_default() += amount;
        self.outstanding += amount;
    }

    pub fn balance(&self, account: AccountId) -> Amount {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    pub fn take(&mut self, account: AccountId) -> Amount {
        let amount = self.balances.remove(&account).unwrap_or(0);
        self.outstanding -= amount;
        self.claimed += amount;
        amount
    }

    /// Credited and not yet claimed.
    pub fn outstanding(&self) -> Amount {
        self.outstanding
    }

    pub fn claimed(&self) -> Amount {
        self.claimed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Referral {
    stakes: Amount,
    payouts: Vec<Amount>,
}

/// Per (affiliate, condition) bet totals and the rewards they earned.
#[derive(Debug, Clone, Default)]
pub struct AffiliateLedger {
    referrals: HashMap<(AccountId, ConditionId), Referral>,
    by_condition: HashMap<ConditionId, BTreeSet<AccountId>>,
    open: HashMap<AccountId, BTreeSet<ConditionId>>,
    pending: BTreeMap<AccountId, Amount>,
    outstanding: Amount,
    claimed: Amount,
}

impl AffiliateLedger {
    pub fn record_bet(
        &mut self,
        affiliate: AccountId,
        condition: ConditionId,
        outcomes: usize,
        outcome_index: usize,
        stake: Amount,
        payout: Amount,
    ) {
        let referral = self
            .referrals
            .entry((affiliate, condition))
            .or_insert_with(|| Referral {
                stakes: 0,
                payouts: vec![0; outcomes],
            });
        referral.stakes += stake;
        referral.payouts[outcome_index] += payout;

        self.by_condition.entry(condition).or_default().insert(affiliate);
        self.open.entry(affiliate).or_default().insert(condition);
    }

    /// Splits `pool` between the condition's affiliates by the profit their
    /// referred bets made. Nothing is written; see [`AffiliateLedger::settle`].
    pub fn rewards(
        &self,
        condition: ConditionId,
        winning: &[usize],
        pool: Amount,
    ) -> Result<Vec<(AccountId, Amount)>, MathError> {
        let Some(affiliates) = self.by_condition.get(&condition) else {
            return Ok(Vec::new());
        };

        let mut profits = Vec::with_capacity(affiliates.len());
        for affiliate in affiliates {
            let Some(referral) = self.referrals.get(&(*affiliate, condition)) else {
                continue;
            };
            let paid: Amount = winning.iter().map(|i| referral.payouts[*i]).sum();
            let profit = referral.stakes.saturating_sub(paid);
            if profit > 0 {
                profits.push((*affiliate, profit));
            }
        }

        let total: Amount = profits.iter().map(|(_, p)| *p).sum();
        if pool == 0 || total == 0 {
            return Ok(Vec::new());
        }
        profits
            .into_iter()
            .map(|(affiliate, profit)| -> Result<(AccountId, Amount), MathError> {
                Ok((affiliate, mul_div(pool, profit, total)?))
            })
            .collect()
    }

    /// Credits rewards and closes the condition for its affiliates.
    pub fn settle(&mut self, condition: ConditionId, rewards: &[(AccountId, Amount)]) {
        for (affiliate, reward) in rewards {
            if *reward > 0 {
                *self.pending.entry(*affiliate).or_default() += *reward;
                self.outstanding += *reward;
            }
        }
        self.drop_condition(condition);
    }

    /// Forgets a condition without rewards. used on cancel.
    pub fn drop_condition(&mut self, condition: ConditionId) {
        let Some(affiliates) = self.by_condition.remove(&condition) else {
            return;
        };
        for affiliate in affiliates {
            self.referrals.remove(&(affiliate, condition));
            if let Some(open) = self.open.get_mut(&affiliate) {
                open.remove(&condition);
                if open.is_empty() {
                    self.open.remove(&affiliate);
                }
            }
        }
    }

    pub fn pending(&self, affiliate: AccountId) -> Amount {
        self.pending.get(&affiliate).copied().unwrap_or(0)
    }

    pub fn open_conditions(&self, affiliate: AccountId) -> usize {
        self.open.get(&affiliate).map_or(0, |open| open.len())
    }

    /// Pending rewards, but only once the affiliate has no open referrals.
    pub fn take_released(&mut self, affiliate: AccountId) -> Amount {
        if self.open_conditions(affiliate) > 0 {
            return 0;
        }
        let amount = self.pending.remove(&affiliate).unwrap_or(0);
        self.outstanding -= amount;
        self.claimed += amount;
        amount
    }

    pub fn outstanding(&self) -> Amount {
        self.outstanding
    }

    pub fn claimed(&self) -> Amount {
        self.claimed
    }
}
