// 6.1 bet.rs: accepted bets. odds and potential payout are fixed at acceptance,
// what the bettor finally gets depends only on how the condition settled.
// 6.2 express bets: one stake across several conditions of different games, paid
// at the product of the leg odds only if no leg loses.

use crate::condition::{Condition, ConditionState};
use crate::fixed::{Fixed, MathError};
use crate::types::{AccountId, Amount, BetId, ConditionId, OutcomeId, Timestamp};
use serde::{Deserialize, Serialize};

/// What a bettor asks for. `min_odds` and `deadline` guard against the price
/// moving or the request arriving late.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetRequest {
    pub bettor: AccountId,
    pub condition_id: ConditionId,
    pub outcome_id: OutcomeId,
    pub amount: Amount,
    pub min_odds: Fixed,
    pub deadline: Timestamp,
    pub affiliate: Option<AccountId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub bettor: AccountId,
    pub condition_id: ConditionId,
    pub outcome_id: OutcomeId,
    pub amount: Amount,
    pub odds: Fixed,
    pub payout: Amount,
    pub affiliate: AccountId,
    pub placed_at: Timestamp,
    pub paid: bool,
}

impl Bet {
    pub fn status(&self, condition: &Condition) -> BetStatus {
        match condition.state {
            ConditionState::Created | ConditionState::Paused => BetStatus::Pending,
            ConditionState::Canceled => BetStatus::Refunded,
            ConditionState::Resolved if condition.is_winner(self.outcome_id) => BetStatus::Won,
            ConditionState::Resolved => BetStatus::Lost,
        }
    }

    /// Amount owed once the condition settled. `None` while it is still open.
    pub fn settlement_amount(&self, condition: &Condition) -> Option<Amount> {
        match self.status(condition) {
            BetStatus::Pending => None,
            BetStatus::Won => Some(self.payout),
            BetStatus::Lost => Some(0),
            BetStatus::Refunded => Some(self.amount),
        }
    }
}

pub const MIN_EXPRESS_LEGS: usize = 2;
pub const MAX_EXPRESS_LEGS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressLeg {
    pub condition_id: ConditionId,
    pub outcome_id: OutcomeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressRequest {
    pub bettor: AccountId,
    pub legs: Vec<ExpressLeg>,
    pub amount: Amount,
    pub min_odds: Fixed,
    pub deadline: Timestamp,
    pub affiliate: Option<AccountId>,
}

/// A leg with the odds it was taken at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLeg {
    pub condition_id: ConditionId,
    pub outcome_id: OutcomeId,
    pub odds: Fixed,
}

/// Product of the leg odds, multiplied in leg order.
pub fn combined_odds<'a>(odds: impl IntoIterator<Item = &'a Fixed>) -> Result<Fixed, MathError> {
    odds.into_iter().try_fold(Fixed::ONE, |acc, o| acc.mul(*o))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressBet {
    pub id: BetId,
    pub bettor: AccountId,
    pub legs: Vec<PricedLeg>,
    pub amount: Amount,
    pub odds: Fixed,
    pub payout: Amount,
    pub affiliate: AccountId,
    pub placed_at: Timestamp,
    /// Pool liquidity held for the bet until it settles.
    pub locked: Amount,
    /// Amount owed, fixed when the last open leg settles or any leg loses.
    pub settled: Option<Amount>,
    pub paid: bool,
}

impl ExpressBet {
    /// Lost as soon as one leg loses. Refunded only if every leg was canceled.
    pub fn status<'a, F>(&self, condition: F) -> BetStatus
    where
        F: Fn(ConditionId) -> Option<&'a Condition>,
    {
        let mut open = false;
        let mut canceled = 0;
        for leg in &self.legs {
            match condition(leg.condition_id).map(|c| (c.state, c.is_winner(leg.outcome_id))) {
                Some((ConditionState::Resolved, false)) => return BetStatus::Lost,
                Some((ConditionState::Resolved, true)) => {}
                Some((ConditionState::Canceled, _)) => canceled += 1,
                Some((ConditionState::Created | ConditionState::Paused, _)) | None => open = true,
            }
        }
        if open {
            BetStatus::Pending
        } else if canceled == self.legs.len() {
            BetStatus::Refunded
        } else {
            BetStatus::Won
        }
    }

    /// Amount owed given the legs' conditions. a canceled leg counts at odds 1.
    pub fn settlement_amount<'a, F>(&self, condition: F) -> Result<Option<Amount>, MathError>
    where
        F: Fn(ConditionId) -> Option<&'a Condition>,
    {
        match self.status(&condition) {
            BetStatus::Pending => Ok(None),
            BetStatus::Lost => Ok(Some(0)),
            BetStatus::Refunded => Ok(Some(self.amount)),
            BetStatus::Won => {
                let won = self.legs.iter().filter(|leg| {
                    condition(leg.condition_id).is_some_and(|c| c.state == ConditionState::Resolved)
                });
                let odds = combined_odds(won.map(|leg| &leg.odds))?;
                Ok(Some(odds.mul_amount(self.amount)?))
            }
        }
    }
}
