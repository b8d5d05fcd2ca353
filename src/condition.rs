//! Condition ledger.
//!
//! A condition is one market on a game: a fixed set of outcomes, virtual funds per
//! outcome that the odds are derived from, and the bookkeeping needed to settle it
//! (potential payout per outcome, net stakes, locked reserve). The ledger is the
//! only code that writes condition state; engine operations first build a
//! [`BetPlan`] or validate a transition, then commit.

use crate::fixed::{Fixed, MathError};
use crate::odds::{self, OddsError};
use crate::types::{AccountId, Amount, ConditionId, GameId, OutcomeId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionState {
    Created,
    Resolved,
    Canceled,
    Paused,
}

impl ConditionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConditionState::Resolved | ConditionState::Canceled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    #[error("Condition {0} is not accepting bets")]
    ConditionNotRunning(ConditionId),

    #[error("Condition {0} is already settled")]
    ActionNotAllowed(ConditionId),

    #[error("Condition {0} already has this pause flag")]
    CantChangeFlag(ConditionId),

    #[error("Outcome {0:?} does not exist")]
    OutcomeNotExists(OutcomeId),

    #[error("Outcome {0:?} listed twice")]
    DuplicateOutcome(OutcomeId),

    #[error("{outcomes} outcomes but {odds} odds")]
    OddsLengthMismatch { outcomes: usize, odds: usize },

    #[error("Amount must be positive")]
    ZeroAmount,

    #[error("Bet of {amount} would price outcome {outcome:?} at or below 1.0")]
    BetTooLarge { amount: Amount, outcome: OutcomeId },

    #[error("Expected {expected} distinct winning outcomes")]
    IncorrectWinningOutcomes { expected: usize },

    #[error("Reinforcement {requested} below locked {locked}")]
    ReinforcementBelowLocked { requested: Amount, locked: Amount },

    #[error("Odds error: {0}")]
    Odds(#[from] OddsError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

/// Everything needed to open a condition. Initial virtual funds are the
/// reinforcement split by the target odds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionParams {
    pub condition_id: ConditionId,
    pub game_id: GameId,
    pub outcomes: Vec<OutcomeId>,
    pub odds: Vec<Fixed>,
    pub margin: Fixed,
    pub reinforcement: Amount,
    pub winning_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: ConditionId,
    pub game_id: GameId,
    /// Data provider credited with its fee share on profit.
    pub oracle: AccountId,
    pub outcomes: Vec<OutcomeId>,
    pub virtual_funds: Vec<Amount>,
    pub margin: Fixed,
    pub reinforcement: Amount,
    pub winning_count: usize,
    pub state: ConditionState,
    /// Potential payout per outcome if it wins.
    pub payouts: Vec<Amount>,
    pub total_stakes: Amount,
    pub locked: Amount,
    pub winning_outcomes: Vec<OutcomeId>,
    pub created_at: Timestamp,
    pub settled_at: Option<Timestamp>,
}

/// A priced bet not yet applied. Committing it is infallible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetPlan {
    pub outcome_index: usize,
    pub odds: Fixed,
    pub payout: Amount,
    pub funds: Vec<Amount>,
    pub payouts: Vec<Amount>,
    pub total_stakes: Amount,
}

impl Condition {
    pub fn new(params: ConditionParams, oracle: AccountId, now: Timestamp) -> Result<Self, ConditionError> {
        let ConditionParams {
            condition_id,
            game_id,
            outcomes,
            odds: target,
            margin,
            reinforcement,
            winning_count,
        } = params;

        odds::validate_shape(outcomes.len(), winning_count)?;
        odds::validate_margin(margin)?;
        if outcomes.len() != target.len() {
            return Err(ConditionError::OddsLengthMismatch {
                outcomes: outcomes.len(),
                odds: target.len(),
            });
        }
        for (i, outcome) in outcomes.iter().enumerate() {
            if outcomes[..i].contains(outcome) {
                return Err(ConditionError::DuplicateOutcome(*outcome));
            }
        }
        if reinforcement == 0 {
            return Err(ConditionError::ZeroAmount);
        }

        let virtual_funds = odds::funds_from_odds(&target, reinforcement)?;
        odds::calc_odds(&virtual_funds, margin, winning_count)?;

        let n = outcomes.len();
        Ok(Self {
            id: condition_id,
            game_id,
            oracle,
            outcomes,
            virtual_funds,
            margin,
            reinforcement,
            winning_count,
            state: ConditionState::Created,
            payouts: vec![0; n],
            total_stakes: 0,
            locked: 0,
            winning_outcomes: Vec::new(),
            created_at: now,
            settled_at: None,
        })
    }

    pub fn is_running(&self) -> bool {
        self.state == ConditionState::Created
    }

    pub fn is_settled(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn outcome_index(&self, outcome: OutcomeId) -> Result<usize, ConditionError> {
        self.outcomes
            .iter()
            .position(|o| *o == outcome)
            .ok_or(ConditionError::OutcomeNotExists(outcome))
    }

    /// Margin adjusted odds for every outcome at the current funds.
    pub fn odds(&self) -> Result<Vec<Fixed>, ConditionError> {
        Ok(odds::calc_odds(&self.virtual_funds, self.margin, self.winning_count)?)
    }

    /// Odds a bet of `amount` on `outcome` would be taken at.
    pub fn quote(&self, outcome: OutcomeId, amount: Amount) -> Result<Fixed, ConditionError> {
        Ok(self.plan_bet(outcome, amount)?.odds)
    }

    /// Prices a bet and works out the funds it leaves behind.
    ///
    /// The stake joins the chosen outcome first and the bet is priced on those funds.
    /// Solving `odds_i = Σf / f_i` back from the price it was taken at returns the
    /// same funds, so they are what the condition keeps: the chosen outcome grows by
    /// `a`, every other outcome keeps its funds and drifts longer as the total grows.
    /// The next bet on the same outcome starts from the price this one paid.
    pub fn plan_bet(&self, outcome: OutcomeId, amount: Amount) -> Result<BetPlan, ConditionError> {
        if !self.is_running() {
            return Err(ConditionError::ConditionNotRunning(self.id));
        }
        if amount == 0 {
            return Err(ConditionError::ZeroAmount);
        }
        let index = self.outcome_index(outcome)?;
        let funds = odds::funds_after_bet(&self.virtual_funds, index, amount)?;
        let price = match odds::outcome_odds(&funds, self.margin, self.winning_count, index) {
            Err(OddsError::IncorrectOdds { .. }) => {
                return Err(ConditionError::BetTooLarge { amount, outcome });
            }
            other => other?,
        };
        let payout = price.mul_amount(amount)?;

        let mut payouts = self.payouts.clone();
        payouts[index] = payouts[index].checked_add(payout).ok_or(MathError::Overflow)?;
        let total_stakes = self.total_stakes.checked_add(amount).ok_or(MathError::Overflow)?;

        Ok(BetPlan {
            outcome_index: index,
            odds: price,
            payout,
            funds,
            payouts,
            total_stakes,
        })
    }

    pub fn apply_bet(&mut self, plan: BetPlan, locked: Amount) {
        self.virtual_funds = plan.funds;
        self.payouts = plan.payouts;
        self.total_stakes = plan.total_stakes;
        self.locked = locked;
    }

    /// Re-prices from target clean odds, keeping the current fund total.
    pub fn change_odds(&mut self, target: &[Fixed]) -> Result<(), ConditionError> {
        self.ensure_active()?;
        if target.len() != self.outcomes.len() {
            return Err(ConditionError::OddsLengthMismatch {
                outcomes: self.outcomes.len(),
                odds: target.len(),
            });
        }
        let total: Amount = self.virtual_funds.iter().sum();
        let funds = odds::funds_from_odds(target, total)?;
        odds::calc_odds(&funds, self.margin, self.winning_count)?;
        self.virtual_funds = funds;
        Ok(())
    }

    pub fn change_margin(&mut self, margin: Fixed) -> Result<(), ConditionError> {
        self.ensure_active()?;
        odds::calc_odds(&self.virtual_funds, margin, self.winning_count)?;
        self.margin = margin;
        Ok(())
    }

    pub fn change_reinforcement(&mut self, reinforcement: Amount) -> Result<(), ConditionError> {
        self.ensure_active()?;
        if reinforcement == 0 {
            return Err(ConditionError::ZeroAmount);
        }
        if reinforcement < self.locked {
            return Err(ConditionError::ReinforcementBelowLocked {
                requested: reinforcement,
                locked: self.locked,
            });
        }
        self.reinforcement = reinforcement;
        Ok(())
    }

    pub fn set_paused(&mut self, paused: bool) -> Result<(), ConditionError> {
        self.ensure_active()?;
        let current = self.state == ConditionState::Paused;
        if current == paused {
            return Err(ConditionError::CantChangeFlag(self.id));
        }
        self.state = if paused {
            ConditionState::Paused
        } else {
            ConditionState::Created
        };
        Ok(())
    }

    /// Validates a winning set without touching state. Returns outcome indices.
    pub fn winning_indices(&self, winning: &[OutcomeId]) -> Result<Vec<usize>, ConditionError> {
        self.ensure_active()?;
        if winning.len() != self.winning_count {
            return Err(ConditionError::IncorrectWinningOutcomes {
                expected: self.winning_count,
            });
        }
        let mut indices = Vec::with_capacity(winning.len());
        for outcome in winning {
            let index = self.outcome_index(*outcome)?;
            if indices.contains(&index) {
                return Err(ConditionError::IncorrectWinningOutcomes {
                    expected: self.winning_count,
                });
            }
            indices.push(index);
        }
        Ok(indices)
    }

    /// Sum of potential payouts over the given winning outcomes.
    pub fn payout_for(&self, indices: &[usize]) -> Amount {
        indices.iter().map(|i| self.payouts[*i]).sum()
    }

    pub fn mark_resolved(&mut self, winning: &[OutcomeId], now: Timestamp) -> Result<(), ConditionError> {
        self.winning_indices(winning)?;
        self.state = ConditionState::Resolved;
        self.winning_outcomes = winning.to_vec();
        self.locked = 0;
        self.settled_at = Some(now);
        Ok(())
    }

    pub fn mark_canceled(&mut self, now: Timestamp) -> Result<(), ConditionError> {
        self.ensure_active()?;
        self.state = ConditionState::Canceled;
        self.locked = 0;
        self.settled_at = Some(now);
        Ok(())
    }

    pub fn is_winner(&self, outcome: OutcomeId) -> bool {
        self.winning_outcomes.contains(&outcome)
    }

    fn ensure_active(&self) -> Result<(), ConditionError> {
        if self.state.is_terminal() {
            return Err(ConditionError::ActionNotAllowed(self.id));
        }
        Ok(())
    }
}
