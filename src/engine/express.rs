// 8.6: express bets. every leg is priced by its own condition at the stake and the
// odds multiply. legs do not move condition funds. the potential profit is locked
// in the pool until the bet settles, which happens as soon as one leg loses or the
// last open leg settles.

use super::core::Engine;
use super::results::{BetReceipt, EngineError};
use crate::bet::{combined_odds, ExpressBet, ExpressLeg, ExpressRequest, PricedLeg, MAX_EXPRESS_LEGS, MIN_EXPRESS_LEGS};
use crate::events::{BetRejectedEvent, EventPayload, ExpressAcceptedEvent, ExpressSettledEvent, PayoutWithdrawnEvent};
use crate::fees::ProfitSplit;
use crate::fixed::{Fixed, MathError};
use crate::liquidity_tree::TreeError;
use crate::pool::PoolError;
use crate::reinforcement;
use crate::types::{AccountId, Amount, BetId, ConditionId, GameId};
use tracing::{debug, info, warn};

impl Engine {
    /// Combined odds an express of `amount` would get right now.
    pub fn quote_express(&self, legs: &[ExpressLeg], amount: Amount) -> Result<Fixed, EngineError> {
        let priced = self.price_legs(legs, amount)?;
        Ok(combined_odds(priced.iter().map(|leg| &leg.odds))?)
    }

    pub fn accept_express(&mut self, request: ExpressRequest) -> Result<BetReceipt, EngineError> {
        let now = self.current_time;
        if now > request.deadline {
            return Err(EngineError::BetExpired {
                deadline: request.deadline,
                now,
            });
        }

        let legs = self.price_legs(&request.legs, request.amount)?;
        let odds = combined_odds(legs.iter().map(|leg| &leg.odds))?;
        if odds < request.min_odds {
            return Err(EngineError::SmallOdds {
                quoted: odds,
                min: request.min_odds,
            });
        }
        let payout = odds.mul_amount(request.amount)?;
        let lock = payout.saturating_sub(request.amount);

        if let Err(e) = reinforcement::check_express(&self.capacity(), lock) {
            warn!(legs = legs.len(), amount = request.amount, error = %e, "express rejected");
            if let Some(first) = legs.first() {
                self.emit_event(EventPayload::BetRejected(BetRejectedEvent {
                    bettor: request.bettor,
                    condition_id: first.condition_id,
                    amount: request.amount,
                    reason: e.to_string(),
                }));
            }
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
        let express_locked = self.express_locked.checked_add(lock).ok_or(MathError::Overflow)?;

        self.pool.lock(lock)?;

        let bet_id = BetId(self.next_bet_id);
        self.next_bet_id += 1;
        let affiliate = request.affiliate.unwrap_or(self.config.fees.default_affiliate);
        for leg in &legs {
            self.express_by_condition
                .entry(leg.condition_id)
                .or_default()
                .push(bet_id);
        }
        self.payout_reserve = payout_reserve;
        self.total_stakes = total_stakes;
        self.express_locked = express_locked;
        self.express_bets.insert(
            bet_id,
            ExpressBet {
                id: bet_id,
                bettor: request.bettor,
                legs: legs.clone(),
                amount: request.amount,
                odds,
                payout,
                affiliate,
                placed_at: now,
                locked: lock,
                settled: None,
                paid: false,
            },
        );

        debug!(?bet_id, legs = legs.len(), amount = request.amount, %odds, locked = lock, "express accepted");
        self.emit_event(EventPayload::ExpressAccepted(ExpressAcceptedEvent {
            bet_id,
            bettor: request.bettor,
            legs,
            amount: request.amount,
            odds,
            locked: lock,
        }));

        Ok(BetReceipt {
            bet_id,
            odds,
            payout,
            locked: lock,
        })
    }

    /// Validates the legs and prices each one on its own condition.
    fn price_legs(&self, legs: &[ExpressLeg], amount: Amount) -> Result<Vec<PricedLeg>, EngineError> {
        if !(MIN_EXPRESS_LEGS..=MAX_EXPRESS_LEGS).contains(&legs.len()) {
            return Err(EngineError::ExpressLegs(legs.len()));
        }
        let mut games: Vec<GameId> = Vec::with_capacity(legs.len());
        let mut priced = Vec::with_capacity(legs.len());
        for leg in legs {
            let condition = self.condition_ref(leg.condition_id)?;
            let game = self.game_ref(condition.game_id)?;
            if game.has_started(self.current_time) {
                return Err(EngineError::GameStarted(game.id));
            }
            if games.contains(&game.id) {
                return Err(EngineError::ExpressSameGame(game.id));
            }
            games.push(game.id);
            priced.push(PricedLeg {
                condition_id: leg.condition_id,
                outcome_id: leg.outcome_id,
                odds: condition.quote(leg.outcome_id, amount)?,
            });
        }
        Ok(priced)
    }

    /// Settles every open express with a leg on `condition_id` that the new state
    /// decides. Runs after the condition itself settled.
    pub(super) fn settle_expresses(&mut self, condition_id: ConditionId) -> Result<(), EngineError> {
        let Some(waiting) = self.express_by_condition.remove(&condition_id) else {
            return Ok(());
        };
        let oracle = self.condition_ref(condition_id)?.oracle;

        for bet_id in waiting {
            let Some(express) = self.express_bets.get(&bet_id) else {
                continue;
            };
            if express.settled.is_some() {
                continue;
            }
            let Some(owed) = express.settlement_amount(|id| self.conditions.get(&id))? else {
                continue;
            };
            let (amount, unlocked) = (express.amount, express.locked);
            let profit = amount.saturating_sub(owed);
            let loss = owed.saturating_sub(amount);
            let split = if profit > 0 {
                self.fee_shares.split(profit)?
            } else {
                ProfitSplit::default()
            };
            let payout_reserve = self
                .payout_reserve
                .checked_sub(amount)
                .and_then(|r| r.checked_add(owed))
                .ok_or(MathError::Overflow)?;
            let pool_total = self.pool.total();
            if loss > pool_total {
                return Err(PoolError::Tree(TreeError::LossExceedsTotal {
                    loss,
                    total: pool_total,
                })
                .into());
            }

            self.pool.unlock(unlocked)?;
            if loss > 0 {
                self.pool.charge_loss(loss)?;
            } else {
                // no express affiliate ledger: the affiliate share stays with the pool
                self.pool.add_profit(split.pool + split.affiliate)?;
            }
            self.fees.credit(self.config.fees.house_account, split.house);
            self.fees.credit(oracle, split.data_provider);
            self.payout_reserve = payout_reserve;
            self.express_locked -= unlocked;
            if let Some(express) = self.express_bets.get_mut(&bet_id) {
                express.settled = Some(owed);
            }

            info!(?bet_id, %condition_id, owed, profit, loss, unlocked, "express settled");
            self.emit_event(EventPayload::ExpressSettled(ExpressSettledEvent {
                bet_id,
                settled_by: condition_id,
                owed,
                unlocked,
            }));
        }
        Ok(())
    }

    pub(super) fn withdraw_express(&mut self, caller: AccountId, bet_id: BetId) -> Result<Amount, EngineError> {
        let express = self
            .express_bets
            .get(&bet_id)
            .ok_or(EngineError::BetNotFound(bet_id))?;
        if express.bettor != caller {
            return Err(EngineError::NotBetOwner { bet: bet_id, caller });
        }
        if express.paid {
            return Err(EngineError::AlreadyPaid(bet_id));
        }
        let amount = express.settled.ok_or(EngineError::ExpressNotSettled(bet_id))?;
        let payout_reserve = self
            .payout_reserve
            .checked_sub(amount)
            .ok_or(MathError::Overflow)?;

        self.payout_reserve = payout_reserve;
        self.payouts_paid += amount;
        if let Some(express) = self.express_bets.get_mut(&bet_id) {
            express.paid = true;
        }

        debug!(?bet_id, ?caller, amount, "express payout withdrawn");
        self.emit_event(EventPayload::PayoutWithdrawn(PayoutWithdrawnEvent {
            bet_id,
            bettor: caller,
            amount,
        }));
        Ok(amount)
    }
}
