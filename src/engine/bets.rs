// 8.4: bet acceptance and payout withdrawal.
// a bet is priced, checked against the pool's capacity, and only then committed:
// condition funds, locked liquidity and the bet record change together or not at all.

use super::core::Engine;
use super::results::{BetReceipt, EngineError};
use crate::bet::{Bet, BetRequest};
use crate::events::{BetAcceptedEvent, BetRejectedEvent, EventPayload, PayoutWithdrawnEvent};
use crate::fixed::{Fixed, MathError};
use crate::reinforcement::{self, worst_case_lock};
use crate::types::{AccountId, Amount, BetId, ConditionId, OutcomeId};
use tracing::{debug, warn};

impl Engine {
    /// Odds a bet of `amount` on `outcome` would get right now. Does not check
    /// pool capacity.
    pub fn quote(&self, condition_id: ConditionId, outcome_id: OutcomeId, amount: Amount) -> Result<Fixed, EngineError> {
        let condition = self.condition_ref(condition_id)?;
        let game = self.game_ref(condition.game_id)?;
        if game.has_started(self.current_time) {
            return Err(EngineError::GameStarted(game.id));
        }
        Ok(condition.quote(outcome_id, amount)?)
    }

    pub fn accept_bet(&mut self, request: BetRequest) -> Result<BetReceipt, EngineError> {
        let now = self.current_time;
        if now > request.deadline {
            return Err(EngineError::BetExpired {
                deadline: request.deadline,
                now,
            });
        }

        let condition = self.condition_ref(request.condition_id)?;
        let game = self.game_ref(condition.game_id)?;
        if game.has_started(now) {
            return Err(EngineError::GameStarted(game.id));
        }
        let plan = condition.plan_bet(request.outcome_id, request.amount)?;
        if plan.odds < request.min_odds {
            return Err(EngineError::SmallOdds {
                quoted: plan.odds,
                min: request.min_odds,
            });
        }

        let old_lock = condition.locked;
        let new_lock = worst_case_lock(&plan.payouts, plan.total_stakes, condition.winning_count);
        let cap = condition.reinforcement;
        let outcomes = condition.outcomes.len();
        if let Err(e) = reinforcement::check_lock(&self.capacity(), old_lock, new_lock, cap) {
            warn!(condition_id = %request.condition_id, amount = request.amount, error = %e, "bet rejected");
            self.emit_event(EventPayload::BetRejected(BetRejectedEvent {
                bettor: request.bettor,
                condition_id: request.condition_id,
                amount: request.amount,
                reason: e.to_string(),
            }));
            return Err(e.into());
        }
        let payout_reserve = self
            .payout_reserve
            .checked_add(request.amount)
            .ok_or(MathError::Overflow)?;
        let total_stakes = self
            .total_stakes
            .checked_add(request.amount)
            .ok_or(MathError::Overflow)?;

        // the only fallible step of the commit runs first
        if new_lock > old_lock {
            self.pool.lock(new_lock - old_lock)?;
        } else {
            self.pool.unlock(old_lock - new_lock)?;
        }

        let bet_id = BetId(self.next_bet_id);
        self.next_bet_id += 1;
        let affiliate = request.affiliate.unwrap_or(self.config.fees.default_affiliate);
        let outcome_index = plan.outcome_index;
        let odds = plan.odds;
        let payout = plan.payout;
        let funds = plan.funds.clone();

        self.condition_mut(request.condition_id)?.apply_bet(plan, new_lock);
        self.affiliates.record_bet(
            affiliate,
            request.condition_id,
            outcomes,
            outcome_index,
            request.amount,
            payout,
        );
        self.payout_reserve = payout_reserve;
        self.total_stakes = total_stakes;
        self.bets.insert(
            bet_id,
            Bet {
                id: bet_id,
                bettor: request.bettor,
                condition_id: request.condition_id,
                outcome_id: request.outcome_id,
                amount: request.amount,
                odds,
                payout,
                affiliate,
                placed_at: now,
                paid: false,
            },
        );

        debug!(?bet_id, condition_id = %request.condition_id, amount = request.amount, %odds, locked = new_lock, "bet accepted");
        self.emit_event(EventPayload::BetAccepted(BetAcceptedEvent {
            bet_id,
            bettor: request.bettor,
            condition_id: request.condition_id,
            outcome_id: request.outcome_id,
            amount: request.amount,
            odds,
            affiliate,
            funds,
        }));

        Ok(BetReceipt {
            bet_id,
            odds,
            payout,
            locked: new_lock,
        })
    }

    /// Pays out a settled bet: winnings, the refund of a canceled condition, or
    /// zero for a loss. Each bet pays once. Express bets pay what they settled at.
    pub fn withdraw_payout(&mut self, caller: AccountId, bet_id: BetId) -> Result<Amount, EngineError> {
        if self.express_bets.contains_key(&bet_id) {
            return self.withdraw_express(caller, bet_id);
        }
        let bet = self.bets.get(&bet_id).ok_or(EngineError::BetNotFound(bet_id))?;
        if bet.bettor != caller {
            return Err(EngineError::NotBetOwner { bet: bet_id, caller });
        }
        if bet.paid {
            return Err(EngineError::AlreadyPaid(bet_id));
        }
        let condition = self.condition_ref(bet.condition_id)?;
        let amount = bet
            .settlement_amount(condition)
            .ok_or(EngineError::ConditionNotSettled(bet.condition_id))?;
        let payout_reserve = self
            .payout_reserve
            .checked_sub(amount)
            .ok_or(MathError::Overflow)?;

        self.payout_reserve = payout_reserve;
        self.payouts_paid += amount;
        if let Some(bet) = self.bets.get_mut(&bet_id) {
            bet.paid = true;
        }

        debug!(?bet_id, ?caller, amount, "payout withdrawn");
        self.emit_event(EventPayload::PayoutWithdrawn(PayoutWithdrawnEvent {
            bet_id,
            bettor: caller,
            amount,
        }));
        Ok(amount)
    }
}
