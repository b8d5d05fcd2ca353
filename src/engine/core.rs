// 8.0 engine/core.rs: main engine. holds the pool, games, conditions, bets and fee books.

use super::config::EngineConfig;
use super::results::{ConservationReport, EngineError};
use crate::access::{Authorizer, Role, RoleRegistry};
use crate::bet::{Bet, ExpressBet};
use crate::condition::Condition;
use crate::config::ConfigError;
use crate::events::{Event, EventId, EventPayload};
use crate::fees::{AffiliateLedger, FeeBook, FeeShares};
use crate::game::Game;
use crate::pool::LiquidityPool;
use crate::reinforcement::Capacity;
use crate::types::{AccountId, Amount, BetId, ConditionId, GameId, Timestamp};
use std::collections::HashMap;
use tracing::trace;

/** 8.1: main engine struct. all state lives here */
#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) access: Box<dyn Authorizer>,
    pub(super) pool: LiquidityPool,
    pub(super) fee_shares: FeeShares,
    pub(super) fees: FeeBook,
    pub(super) affiliates: AffiliateLedger,
    pub(super) games: HashMap<GameId, Game>,
    pub(super) conditions: HashMap<ConditionId, Condition>,
    pub(super) bets: HashMap<BetId, Bet>,
    pub(super) express_bets: HashMap<BetId, ExpressBet>,
    // open express bets by the conditions they have legs on
    pub(super) express_by_condition: HashMap<ConditionId, Vec<BetId>>,
    pub(super) express_locked: Amount,
    // stakes of open conditions plus unpaid winnings and refunds of settled ones
    pub(super) payout_reserve: Amount,
    pub(super) total_stakes: Amount,
    pub(super) payouts_paid: Amount,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) next_bet_id: u64,
    pub(super) current_time: Timestamp,
}

impl Engine {
    /// Engine with the default role registry: `config.owner` holds every role.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let access = Box::new(RoleRegistry::new(config.owner));
        Self::with_access(config, access)
    }

    pub fn with_access(config: EngineConfig, access: Box<dyn Authorizer>) -> Result<Self, ConfigError> {
        config.validate()?;
        let params = config.pool.params()?;
        let fee_shares = config.fees.shares()?;

        Ok(Self {
            config,
            access,
            pool: LiquidityPool::new(params),
            fee_shares,
            fees: FeeBook::default(),
            affiliates: AffiliateLedger::default(),
            games: HashMap::new(),
            conditions: HashMap::new(),
            bets: HashMap::new(),
            express_bets: HashMap::new(),
            express_by_condition: HashMap::new(),
            express_locked: 0,
            payout_reserve: 0,
            total_stakes: 0,
            payouts_paid: 0,
            events: Vec::new(),
            next_event_id: 1,
            next_bet_id: 1,
            current_time: Timestamp::from_millis(0),
        })
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = self.current_time.plus_millis(millis);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pool(&self) -> &LiquidityPool {
        &self.pool
    }

    pub fn total_liquidity(&self) -> Amount {
        self.pool.total()
    }

    pub fn locked_liquidity(&self) -> Amount {
        self.pool.locked()
    }

    pub fn payout_reserve(&self) -> Amount {
        self.payout_reserve
    }

    pub fn get_game(&self, game_id: GameId) -> Option<&Game> {
        self.games.get(&game_id)
    }

    pub fn get_condition(&self, condition_id: ConditionId) -> Option<&Condition> {
        self.conditions.get(&condition_id)
    }

    pub fn conditions_iter(&self) -> impl Iterator<Item = (&ConditionId, &Condition)> {
        self.conditions.iter()
    }

    pub fn get_bet(&self, bet_id: BetId) -> Option<&Bet> {
        self.bets.get(&bet_id)
    }

    pub fn get_express(&self, bet_id: BetId) -> Option<&ExpressBet> {
        self.express_bets.get(&bet_id)
    }

    /// Pool liquidity held for open express bets.
    pub fn express_locked(&self) -> Amount {
        self.express_locked
    }

    /// House or data provider balance waiting to be claimed.
    pub fn fee_balance(&self, account: AccountId) -> Amount {
        self.fees.balance(account)
    }

    /// Affiliate rewards earned, released or not.
    pub fn affiliate_rewards(&self, affiliate: AccountId) -> Amount {
        self.affiliates.pending(affiliate)
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Tokens held against tokens that came in and went out.
    pub fn conservation(&self) -> ConservationReport {
        ConservationReport {
            pool_total: self.pool.total(),
            payout_reserve: self.payout_reserve,
            unclaimed_fees: self.fees.outstanding() + self.affiliates.outstanding(),
            deposited: self.pool.total_deposited(),
            withdrawn: self.pool.total_withdrawn(),
            stakes: self.total_stakes,
            payouts_paid: self.payouts_paid,
            fees_claimed: self.fees.claimed() + self.affiliates.claimed(),
        }
    }

    pub(super) fn capacity(&self) -> Capacity {
        Capacity {
            ability: self.pool.params().reinforcement_ability,
            total: self.pool.total(),
            locked: self.pool.locked(),
        }
    }

    pub(super) fn require_role(&self, account: AccountId, role: Role) -> Result<(), EngineError> {
        if !self.access.is_authorized(account, role) {
            return Err(EngineError::Unauthorized { account, role });
        }
        Ok(())
    }

    pub(super) fn condition_ref(&self, condition_id: ConditionId) -> Result<&Condition, EngineError> {
        self.conditions
            .get(&condition_id)
            .ok_or(EngineError::ConditionNotExists(condition_id))
    }

    pub(super) fn condition_mut(&mut self, condition_id: ConditionId) -> Result<&mut Condition, EngineError> {
        self.conditions
            .get_mut(&condition_id)
            .ok_or(EngineError::ConditionNotExists(condition_id))
    }

    pub(super) fn game_ref(&self, game_id: GameId) -> Result<&Game, EngineError> {
        self.games.get(&game_id).ok_or(EngineError::GameNotExists(game_id))
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        trace!(id = event.id.0, payload = ?event.payload, "event");

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}
