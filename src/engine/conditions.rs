// 8.3: game and condition administration. every call here needs a role from the
// authorizer. odds, margin and reinforcement can change until the condition settles.

use super::core::Engine;
use super::results::EngineError;
use crate::access::Role;
use crate::condition::{Condition, ConditionParams};
use crate::events::{
    ConditionCreatedEvent, ConditionPausedEvent, EventPayload, GameCanceledEvent, GameCreatedEvent,
    GameShiftedEvent, MarginChangedEvent, OddsChangedEvent, ReinforcementChangedEvent,
};
use crate::fixed::Fixed;
use crate::game::Game;
use crate::reinforcement;
use crate::types::{AccountId, Amount, ConditionId, GameId, Timestamp};
use tracing::info;

impl Engine {
    pub fn create_game(&mut self, caller: AccountId, game_id: GameId, start_time: Timestamp) -> Result<(), EngineError> {
        self.require_role(caller, Role::Oracle)?;
        if self.games.contains_key(&game_id) {
            return Err(EngineError::GameAlreadyExists(game_id));
        }
        if start_time <= self.current_time {
            return Err(EngineError::StartInPast {
                start: start_time,
                now: self.current_time,
            });
        }

        self.games.insert(game_id, Game::new(game_id, start_time));
        info!(?game_id, %start_time, "game created");
        self.emit_event(EventPayload::GameCreated(GameCreatedEvent { game_id, start_time }));
        Ok(())
    }

    /// Reschedules a game. a started game can be pushed back into the future.
    pub fn shift_game(&mut self, caller: AccountId, game_id: GameId, start_time: Timestamp) -> Result<(), EngineError> {
        self.require_role(caller, Role::Oracle)?;
        let now = self.current_time;
        let game = self
            .games
            .get_mut(&game_id)
            .ok_or(EngineError::GameNotExists(game_id))?;
        if game.canceled {
            return Err(EngineError::GameCanceled(game_id));
        }
        if start_time <= now {
            return Err(EngineError::StartInPast { start: start_time, now });
        }

        game.shift(start_time);
        info!(?game_id, %start_time, "game shifted");
        self.emit_event(EventPayload::GameShifted(GameShiftedEvent { game_id, start_time }));
        Ok(())
    }

    /// Cancels a game and every condition on it that is not settled yet.
    pub fn cancel_game(&mut self, caller: AccountId, game_id: GameId) -> Result<Vec<ConditionId>, EngineError> {
        self.require_role(caller, Role::Oracle)?;
        let game = self.game_ref(game_id)?;
        if game.canceled {
            return Err(EngineError::GameCanceled(game_id));
        }

        let open: Vec<ConditionId> = game
            .conditions
            .iter()
            .filter(|id| self.conditions.get(*id).is_some_and(|c| !c.is_settled()))
            .copied()
            .collect();
        for condition_id in &open {
            self.cancel_open_condition(*condition_id)?;
        }
        if let Some(game) = self.games.get_mut(&game_id) {
            game.canceled = true;
        }

        info!(?game_id, canceled = open.len(), "game canceled");
        self.emit_event(EventPayload::GameCanceled(GameCanceledEvent {
            game_id,
            canceled_conditions: open.clone(),
        }));
        Ok(open)
    }

    /// Opens a condition. the caller becomes its data provider.
    pub fn create_condition(&mut self, caller: AccountId, params: ConditionParams) -> Result<ConditionId, EngineError> {
        self.require_role(caller, Role::Oracle)?;
        let condition_id = params.condition_id;
        if self.conditions.contains_key(&condition_id) {
            return Err(EngineError::ConditionAlreadyExists(condition_id));
        }
        let game = self.game_ref(params.game_id)?;
        if game.canceled {
            return Err(EngineError::GameCanceled(game.id));
        }
        if game.has_started(self.current_time) {
            return Err(EngineError::GameStarted(game.id));
        }
        reinforcement::check_creation(&self.capacity(), params.reinforcement)?;

        let condition = Condition::new(params, caller, self.current_time)?;
        let event = ConditionCreatedEvent {
            condition_id,
            game_id: condition.game_id,
            oracle: caller,
            outcomes: condition.outcomes.clone(),
            funds: condition.virtual_funds.clone(),
            margin: condition.margin,
            reinforcement: condition.reinforcement,
        };
        if let Some(game) = self.games.get_mut(&condition.game_id) {
            game.conditions.push(condition_id);
        }
        self.conditions.insert(condition_id, condition);

        info!(%condition_id, game_id = ?event.game_id, reinforcement = event.reinforcement, "condition created");
        self.emit_event(EventPayload::ConditionCreated(event));
        Ok(condition_id)
    }

    /// Re-prices a condition from target clean odds.
    pub fn change_odds(&mut self, caller: AccountId, condition_id: ConditionId, odds: &[Fixed]) -> Result<(), EngineError> {
        self.require_role(caller, Role::Oracle)?;
        let condition = self.condition_mut(condition_id)?;
        condition.change_odds(odds)?;
        let funds = condition.virtual_funds.clone();

        info!(%condition_id, ?funds, "odds changed");
        self.emit_event(EventPayload::OddsChanged(OddsChangedEvent { condition_id, funds }));
        Ok(())
    }

    pub fn change_margin(&mut self, caller: AccountId, condition_id: ConditionId, margin: Fixed) -> Result<(), EngineError> {
        self.require_role(caller, Role::Oracle)?;
        self.condition_mut(condition_id)?.change_margin(margin)?;

        info!(%condition_id, %margin, "margin changed");
        self.emit_event(EventPayload::MarginChanged(MarginChangedEvent { condition_id, margin }));
        Ok(())
    }

    pub fn change_reinforcement(
        &mut self,
        caller: AccountId,
        condition_id: ConditionId,
        reinforcement: Amount,
    ) -> Result<(), EngineError> {
        self.require_role(caller, Role::Oracle)?;
        self.condition_mut(condition_id)?.change_reinforcement(reinforcement)?;

        info!(%condition_id, reinforcement, "reinforcement changed");
        self.emit_event(EventPayload::ReinforcementChanged(ReinforcementChangedEvent {
            condition_id,
            reinforcement,
        }));
        Ok(())
    }

    pub fn pause_condition(&mut self, caller: AccountId, condition_id: ConditionId, paused: bool) -> Result<(), EngineError> {
        self.require_role(caller, Role::Maintainer)?;
        self.condition_mut(condition_id)?.set_paused(paused)?;

        info!(%condition_id, paused, "pause flag changed");
        self.emit_event(EventPayload::ConditionPaused(ConditionPausedEvent { condition_id, paused }));
        Ok(())
    }

    /// Current odds for every outcome.
    pub fn condition_odds(&self, condition_id: ConditionId) -> Result<Vec<Fixed>, EngineError> {
        Ok(self.condition_ref(condition_id)?.odds()?)
    }
}
