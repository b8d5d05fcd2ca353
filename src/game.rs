// 3.0 game.rs: the sporting event conditions hang off. only the start time matters here:
// conditions are created and bet on before it, resolved after it.

use crate::types::{ConditionId, GameId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub start_time: Timestamp,
    pub canceled: bool,
    pub conditions: Vec<ConditionId>,
}

impl Game {
    pub fn new(id: GameId, start_time: Timestamp) -> Self {
        Self {
            id,
            start_time,
            canceled: false,
            conditions: Vec::new(),
        }
    }

    pub fn has_started(&self, now: Timestamp) -> bool {
        now >= self.start_time
    }

    /// Open for new conditions and bets.
    pub fn is_open(&self, now: Timestamp) -> bool {
        !self.canceled && !self.has_started(now)
    }

    pub fn shift(&mut self, start_time: Timestamp) {
        self.start_time = start_time;
    }
}
