// 8.0.2: result types and errors for engine operations.

use crate::access::Role;
use crate::bet::{MAX_EXPRESS_LEGS, MIN_EXPRESS_LEGS};
use crate::condition::ConditionError;
use crate::config::ConfigError;
use crate::fees::FeeError;
use crate::fixed::{Fixed, MathError};
use crate::odds::OddsError;
use crate::pool::PoolError;
use crate::reinforcement::ReinforcementError;
use crate::types::{AccountId, Amount, BetId, ConditionId, GameId, OutcomeId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetReceipt {
    pub bet_id: BetId,
    pub odds: Fixed,
    pub payout: Amount,
    pub locked: Amount, // condition lock after the bet
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementResult {
    pub condition_id: ConditionId,
    pub winning_outcomes: Vec<OutcomeId>,
    pub total_stakes: Amount,
    pub total_payout: Amount,
    pub profit: Amount,
    pub loss: Amount,
    pub unlocked: Amount,
    pub house_fee: Amount,
    pub data_provider_fee: Amount,
    pub affiliate_rewards: Amount,
    pub pool_profit: Amount, // remainder plus affiliate dust
}

/// Every token the engine accounts for, split by where it sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConservationReport {
    pub pool_total: Amount,
    pub payout_reserve: Amount,
    pub unclaimed_fees: Amount,
    pub deposited: Amount,
    pub withdrawn: Amount,
    pub stakes: Amount,
    pub payouts_paid: Amount,
    pub fees_claimed: Amount,
}

impl ConservationReport {
    pub fn held(&self) -> Amount {
        self.pool_total + self.payout_reserve + self.unclaimed_fees
    }

    pub fn inflow(&self) -> Amount {
        (self.deposited + self.stakes).saturating_sub(self.withdrawn + self.payouts_paid + self.fees_claimed)
    }

    pub fn balanced(&self) -> bool {
        self.held() == self.inflow()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Game {0:?} not found")]
    GameNotExists(GameId),

    #[error("Game {0:?} already exists")]
    GameAlreadyExists(GameId),

    #[error("Game {0:?} has already started")]
    GameStarted(GameId),

    #[error("Game {0:?} is canceled")]
    GameCanceled(GameId),

    #[error("Start time {start} is not after {now}")]
    StartInPast { start: Timestamp, now: Timestamp },

    #[error("Condition {0} not found")]
    ConditionNotExists(ConditionId),

    #[error("Condition {0} already exists")]
    ConditionAlreadyExists(ConditionId),

    #[error("Condition {0} is not settled yet")]
    ConditionNotSettled(ConditionId),

    #[error("Condition {condition} cannot resolve before {starts_at}")]
    ResolveTooEarly { condition: ConditionId, starts_at: Timestamp },

    #[error("Bet {0:?} not found")]
    BetNotFound(BetId),

    #[error("Bet {bet:?} does not belong to {caller:?}")]
    NotBetOwner { bet: BetId, caller: AccountId },

    #[error("Bet {0:?} already paid")]
    AlreadyPaid(BetId),

    #[error("Express bet needs {min} to {max} legs, got {0}", min = MIN_EXPRESS_LEGS, max = MAX_EXPRESS_LEGS)]
    ExpressLegs(usize),

    #[error("Express bet has two legs on game {0:?}")]
    ExpressSameGame(GameId),

    #[error("Express bet {0:?} still has open legs")]
    ExpressNotSettled(BetId),

    #[error("Odds {quoted} below requested minimum {min}")]
    SmallOdds { quoted: Fixed, min: Fixed },

    #[error("Bet deadline {deadline} passed at {now}")]
    BetExpired { deadline: Timestamp, now: Timestamp },

    #[error("{account:?} lacks the {role} role")]
    Unauthorized { account: AccountId, role: Role },

    #[error("Condition error: {0}")]
    Condition(#[from] ConditionError),

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Reinforcement error: {0}")]
    Reinforcement(#[from] ReinforcementError),

    #[error("Fee error: {0}")]
    Fee(#[from] FeeError),

    #[error("Odds error: {0}")]
    Odds(#[from] OddsError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}
