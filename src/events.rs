// 11.0: every state change produces an event. used for audit trails and notifying
// external systems (receipt issuance, token transfers). the EventPayload enum lists all
// event types.

use crate::bet::PricedLeg;
use crate::fixed::Fixed;
use crate::types::{AccountId, Amount, BetId, ConditionId, GameId, NodeId, OutcomeId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Game events
    GameCreated(GameCreatedEvent),
    GameShifted(GameShiftedEvent),
    GameCanceled(GameCanceledEvent),

    // Condition events
    ConditionCreated(ConditionCreatedEvent),
    OddsChanged(OddsChangedEvent),
    MarginChanged(MarginChangedEvent),
    ReinforcementChanged(ReinforcementChangedEvent),
    ConditionPaused(ConditionPausedEvent),
    ConditionResolved(ConditionResolvedEvent),
    ConditionCanceled(ConditionCanceledEvent),

    // Bet events
    BetAccepted(BetAcceptedEvent),
    BetRejected(BetRejectedEvent),
    PayoutWithdrawn(PayoutWithdrawnEvent),
    ExpressAccepted(ExpressAcceptedEvent),
    ExpressSettled(ExpressSettledEvent),

    // Liquidity events
    LiquidityAdded(LiquidityAddedEvent),
    LiquidityRemoved(LiquidityRemovedEvent),
    NodeTransferred(NodeTransferredEvent),

    // Fee events
    FeesClaimed(FeesClaimedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameCreatedEvent {
    pub game_id: GameId,
    pub start_time: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameShiftedEvent {
    pub game_id: GameId,
    pub start_time: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameCanceledEvent {
    pub game_id: GameId,
    pub canceled_conditions: Vec<ConditionId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionCreatedEvent {
    pub condition_id: ConditionId,
    pub game_id: GameId,
    pub oracle: AccountId,
    pub outcomes: Vec<OutcomeId>,
    pub funds: Vec<Amount>,
    pub margin: Fixed,
    pub reinforcement: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsChangedEvent {
    pub condition_id: ConditionId,
    pub funds: Vec<Amount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginChangedEvent {
    pub condition_id: ConditionId,
    pub margin: Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReinforcementChangedEvent {
    pub condition_id: ConditionId,
    pub reinforcement: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionPausedEvent {
    pub condition_id: ConditionId,
    pub paused: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionResolvedEvent {
    pub condition_id: ConditionId,
    pub winning_outcomes: Vec<OutcomeId>,
    pub profit: Amount,
    pub loss: Amount,
    pub unlocked: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionCanceledEvent {
    pub condition_id: ConditionId,
    pub unlocked: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetAcceptedEvent {
    pub bet_id: BetId,
    pub bettor: AccountId,
    pub condition_id: ConditionId,
    pub outcome_id: OutcomeId,
    pub amount: Amount,
    pub odds: Fixed,
    pub affiliate: AccountId,
    pub funds: Vec<Amount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetRejectedEvent {
    pub bettor: AccountId,
    pub condition_id: ConditionId,
    pub amount: Amount,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutWithdrawnEvent {
    pub bet_id: BetId,
    pub bettor: AccountId,
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressAcceptedEvent {
    pub bet_id: BetId,
    pub bettor: AccountId,
    pub legs: Vec<PricedLeg>,
    pub amount: Amount,
    pub odds: Fixed,
    pub locked: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressSettledEvent {
    pub bet_id: BetId,
    pub settled_by: ConditionId,
    pub owed: Amount,
    pub unlocked: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityAddedEvent {
    pub node_id: NodeId,
    pub owner: AccountId,
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityRemovedEvent {
    pub node_id: NodeId,
    pub owner: AccountId,
    pub fraction: Fixed,
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTransferredEvent {
    pub node_id: NodeId,
    pub from: AccountId,
    pub to: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeesClaimedEvent {
    pub account: AccountId,
    pub amount: Amount,
}
