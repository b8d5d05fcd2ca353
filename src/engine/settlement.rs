// 8.5: resolve, cancel and fee claims.
// resolve moves the condition's net result into the pool in one step: the lock is
// released, a loss is charged to every node, a profit is split between fee accounts
// and the pool. cancel only releases the lock; every stake is refunded. express bets
// with a leg on the condition settle right after it.

use super::core::Engine;
use super::results::{EngineError, SettlementResult};
use crate::access::Role;
use crate::condition::ConditionError;
use crate::events::{ConditionCanceledEvent, ConditionResolvedEvent, EventPayload, FeesClaimedEvent};
use crate::fees::{FeeError, ProfitSplit};
use crate::fixed::MathError;
use crate::liquidity_tree::TreeError;
use crate::pool::PoolError;
use crate::types::{AccountId, Amount, ConditionId, OutcomeId};
use tracing::info;

impl Engine {
    pub fn resolve_condition(
        &mut self,
        caller: AccountId,
        condition_id: ConditionId,
        winning: &[OutcomeId],
    ) -> Result<SettlementResult, EngineError> {
        self.require_role(caller, Role::Oracle)?;
        let now = self.current_time;
        let condition = self.condition_ref(condition_id)?;
        let indices = condition.winning_indices(winning)?;
        let game = self.game_ref(condition.game_id)?;
        if !game.has_started(now) {
            return Err(EngineError::ResolveTooEarly {
                condition: condition_id,
                starts_at: game.start_time,
            });
        }

        let total_stakes = condition.total_stakes;
        let total_payout = condition.payout_for(&indices);
        let unlocked = condition.locked;
        let oracle = condition.oracle;
        let profit = total_stakes.saturating_sub(total_payout);
        let loss = total_payout.saturating_sub(total_stakes);

        let split = if profit > 0 {
            self.fee_shares.split(profit)?
        } else {
            ProfitSplit::default()
        };
        let rewards = self.affiliates.rewards(condition_id, &indices, split.affiliate)?;
        let rewarded: Amount = rewards.iter().map(|(_, r)| *r).sum();
        let pool_profit = split.pool + (split.affiliate - rewarded);

        let payout_reserve = self
            .payout_reserve
            .checked_sub(total_stakes)
            .and_then(|r| r.checked_add(total_payout))
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
            self.pool.add_profit(pool_profit)?;
        }
        self.fees.credit(self.config.fees.house_account, split.house);
        self.fees.credit(oracle, split.data_provider);
        self.affiliates.settle(condition_id, &rewards);
        self.payout_reserve = payout_reserve;
        self.condition_mut(condition_id)?.mark_resolved(winning, now)?;

        info!(
            %condition_id,
            ?winning,
            profit,
            loss,
            unlocked,
            pool_total = self.pool.total(),
            "condition resolved"
        );
        self.emit_event(EventPayload::ConditionResolved(ConditionResolvedEvent {
            condition_id,
            winning_outcomes: winning.to_vec(),
            profit,
            loss,
            unlocked,
        }));
        self.settle_expresses(condition_id)?;

        Ok(SettlementResult {
            condition_id,
            winning_outcomes: winning.to_vec(),
            total_stakes,
            total_payout,
            profit,
            loss,
            unlocked,
            house_fee: split.house,
            data_provider_fee: split.data_provider,
            affiliate_rewards: rewarded,
            pool_profit: if loss > 0 { 0 } else { pool_profit },
        })
    }

    /// Voids a condition. Returns the total stakes now refundable.
    pub fn cancel_condition(&mut self, caller: AccountId, condition_id: ConditionId) -> Result<Amount, EngineError> {
        self.require_role(caller, Role::Oracle)?;
        self.cancel_open_condition(condition_id)
    }

    pub(super) fn cancel_open_condition(&mut self, condition_id: ConditionId) -> Result<Amount, EngineError> {
        let now = self.current_time;
        let condition = self.condition_ref(condition_id)?;
        if condition.is_settled() {
            return Err(ConditionError::ActionNotAllowed(condition_id).into());
        }
        let unlocked = condition.locked;
        let refunds = condition.total_stakes;

        self.pool.unlock(unlocked)?;
        self.condition_mut(condition_id)?.mark_canceled(now)?;
        self.affiliates.drop_condition(condition_id);

        info!(%condition_id, unlocked, refunds, "condition canceled");
        self.emit_event(EventPayload::ConditionCanceled(ConditionCanceledEvent {
            condition_id,
            unlocked,
        }));
        self.settle_expresses(condition_id)?;
        Ok(refunds)
    }

    /// Claims house, data provider and released affiliate balances of `account`.
    pub fn claim_fees(&mut self, account: AccountId) -> Result<Amount, EngineError> {
        let balance = self.fees.balance(account);
        if balance == 0 {
            if self.affiliates.pending(account) == 0 {
                return Err(FeeError::NothingToClaim(account).into());
            }
            let open_conditions = self.affiliates.open_conditions(account);
            if open_conditions > 0 {
                return Err(FeeError::RewardsLocked {
                    account,
                    open_conditions,
                }
                .into());
            }
        }

        let amount = self.fees.take(account) + self.affiliates.take_released(account);

        info!(?account, amount, "fees claimed");
        self.emit_event(EventPayload::FeesClaimed(FeesClaimedEvent { account, amount }));
        Ok(amount)
    }
}
