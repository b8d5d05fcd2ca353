// 8.2: liquidity provider operations. deposits append a node, withdrawals take a
// fraction of its current value and can never touch locked liquidity.

use super::core::Engine;
use super::results::EngineError;
use crate::events::{EventPayload, LiquidityAddedEvent, LiquidityRemovedEvent, NodeTransferredEvent};
use crate::fixed::Fixed;
use crate::types::{AccountId, Amount, NodeId};
use tracing::info;

impl Engine {
    pub fn deposit(&mut self, owner: AccountId, amount: Amount) -> Result<NodeId, EngineError> {
        let node_id = self.pool.deposit(owner, amount, self.current_time)?;

        info!(%node_id, ?owner, amount, total = self.pool.total(), "liquidity added");
        self.emit_event(EventPayload::LiquidityAdded(LiquidityAddedEvent {
            node_id,
            owner,
            amount,
        }));
        Ok(node_id)
    }

    pub fn withdraw(&mut self, caller: AccountId, node_id: NodeId, fraction: Fixed) -> Result<Amount, EngineError> {
        let amount = self.pool.withdraw(caller, node_id, fraction, self.current_time)?;

        info!(%node_id, ?caller, %fraction, amount, "liquidity removed");
        self.emit_event(EventPayload::LiquidityRemoved(LiquidityRemovedEvent {
            node_id,
            owner: caller,
            fraction,
            amount,
        }));
        Ok(amount)
    }

    pub fn transfer_node(&mut self, caller: AccountId, node_id: NodeId, to: AccountId) -> Result<(), EngineError> {
        self.pool.transfer_node(caller, node_id, to, self.current_time)?;

        info!(%node_id, from = ?caller, ?to, "node transferred");
        self.emit_event(EventPayload::NodeTransferred(NodeTransferredEvent {
            node_id,
            from: caller,
            to,
        }));
        Ok(())
    }

    pub fn node_value(&self, node_id: NodeId) -> Result<Amount, EngineError> {
        Ok(self.pool.node_value(node_id)?)
    }
}
