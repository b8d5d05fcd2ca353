//! Liquidity pool: deposits, withdrawals and locked capital.
//!
//! Every deposit becomes a node, i.e. a leaf in the [`LiquidityTree`]. A node's
//! value is never stored; it is read from the tree, so it always reflects every
//! profit and loss the pool took since the deposit. Locked liquidity is a single
//! scalar owned by the pool and moved by the reinforcement checks.

use crate::fixed::{Fixed, MathError};
use crate::liquidity_tree::{LiquidityTree, TreeError};
use crate::types::{AccountId, Amount, NodeId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolParams {
    pub min_deposit: Amount,
    pub withdraw_timeout_ms: i64,
    pub reinforcement_ability: Fixed,
    pub initial_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityNode {
    pub id: NodeId,
    pub owner: AccountId,
    pub deposited: Amount,
    pub withdrawn: Amount,
    pub created_at: Timestamp,
    // restarts on ownership transfer
    pub timer_start: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("Deposit {amount} below minimum {min}")]
    SmallDepo { amount: Amount, min: Amount },

    #[error("Node {node} locked until {available_at}")]
    WithdrawalTimeout { node: NodeId, available_at: Timestamp },

    #[error("Withdrawal {requested} exceeds unlocked liquidity {available}")]
    LiquidityIsLocked { requested: Amount, available: Amount },

    #[error("Node {0} holds no liquidity")]
    NoLiquidity(NodeId),

    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Node {node} not owned by {caller:?}")]
    NotNodeOwner { node: NodeId, caller: AccountId },

    #[error("Withdraw fraction {0} outside (0, 1]")]
    InvalidFraction(Fixed),

    #[error("Lock {requested} exceeds pool value {total}")]
    LockExceedsTotal { requested: Amount, total: Amount },

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

#[derive(Debug, Clone)]
pub struct LiquidityPool {
    params: PoolParams,
    tree: LiquidityTree,
    nodes: Vec<LiquidityNode>,
    locked: Amount,
    total_deposited: Amount,
    total_withdrawn: Amount,
}

impl LiquidityPool {
    pub fn new(params: PoolParams) -> Self {
        Self {
            params,
            tree: LiquidityTree::with_capacity(params.initial_capacity),
            nodes: Vec::new(),
            locked: 0,
            total_deposited: 0,
            total_withdrawn: 0,
        }
    }

    pub fn params(&self) -> &PoolParams {
        &self.params
    }

    /// Pool value including locked liquidity.
    pub fn total(&self) -> Amount {
        self.tree.total()
    }

    pub fn locked(&self) -> Amount {
        self.locked
    }

    pub fn available(&self) -> Amount {
        self.tree.total().saturating_sub(self.locked)
    }

    pub fn total_deposited(&self) -> Amount {
        self.total_deposited
    }

    pub fn total_withdrawn(&self) -> Amount {
        self.total_withdrawn
    }

    pub fn tree(&self) -> &LiquidityTree {
        &self.tree
    }

    pub fn node(&self, id: NodeId) -> Result<&LiquidityNode, PoolError> {
        self.nodes.get(id.0 as usize).ok_or(PoolError::NodeNotFound(id))
    }

    pub fn nodes(&self) -> &[LiquidityNode] {
        &self.nodes
    }

    /// Current withdrawable value of a node.
    pub fn node_value(&self, id: NodeId) -> Result<Amount, PoolError> {
        self.node(id)?;
        Ok(self.tree.leaf_value(id.0 as usize)?)
    }

    pub fn deposit(&mut self, owner: AccountId, amount: Amount, now: Timestamp) -> Result<NodeId, PoolError> {
        if amount < self.params.min_deposit {
            return Err(PoolError::SmallDepo {
                amount,
                min: self.params.min_deposit,
            });
        }
        let total_deposited = self.total_deposited.checked_add(amount).ok_or(MathError::Overflow)?;

        let leaf = self.tree.push_leaf(amount)?;
        let id = NodeId(leaf as u64);
        self.nodes.push(LiquidityNode {
            id,
            owner,
            deposited: amount,
            withdrawn: 0,
            created_at: now,
            timer_start: now,
        });
        self.total_deposited = total_deposited;
        Ok(id)
    }

    /// Withdraws `fraction` of the node's current value. Nothing changes on error.
    pub fn withdraw(
        &mut self,
        caller: AccountId,
        id: NodeId,
        fraction: Fixed,
        now: Timestamp,
    ) -> Result<Amount, PoolError> {
        let node = self.node(id)?;
        if node.owner != caller {
            return Err(PoolError::NotNodeOwner { node: id, caller });
        }
        if fraction.is_zero() || fraction > Fixed::ONE {
            return Err(PoolError::InvalidFraction(fraction));
        }
        let available_at = node.timer_start.plus_millis(self.params.withdraw_timeout_ms);
        if now < available_at {
            return Err(PoolError::WithdrawalTimeout { node: id, available_at });
        }

        let value = self.tree.leaf_value(id.0 as usize)?;
        if value == 0 {
            return Err(PoolError::NoLiquidity(id));
        }
        let requested = fraction.mul_amount(value)?;
        let available = self.available();
        if requested > available {
            return Err(PoolError::LiquidityIsLocked { requested, available });
        }

        let amount = self.tree.withdraw(id.0 as usize, fraction)?;
        debug_assert_eq!(amount, requested);
        let node = &mut self.nodes[id.0 as usize];
        node.withdrawn = node.withdrawn.saturating_add(amount);
        self.total_withdrawn = self.total_withdrawn.saturating_add(amount);
        Ok(amount)
    }

    /// Hands a node to a new owner. The withdrawal timer restarts.
    pub fn transfer_node(
        &mut self,
        caller: AccountId,
        id: NodeId,
        to: AccountId,
        now: Timestamp,
    ) -> Result<(), PoolError> {
        let node = self
            .nodes
            .get_mut(id.0 as usize)
            .ok_or(PoolError::NodeNotFound(id))?;
        if node.owner != caller {
            return Err(PoolError::NotNodeOwner { node: id, caller });
        }
        node.owner = to;
        node.timer_start = now;
        Ok(())
    }

    pub fn lock(&mut self, amount: Amount) -> Result<(), PoolError> {
        let requested = self.locked.checked_add(amount).ok_or(MathError::Overflow)?;
        let total = self.tree.total();
        if requested > total {
            return Err(PoolError::LockExceedsTotal { requested, total });
        }
        self.locked = requested;
        Ok(())
    }

    pub fn unlock(&mut self, amount: Amount) -> Result<(), PoolError> {
        self.locked = self.locked.checked_sub(amount).ok_or(MathError::Overflow)?;
        Ok(())
    }

    /// Profit is shared by every node in proportion to its current value.
    pub fn add_profit(&mut self, amount: Amount) -> Result<(), PoolError> {
        Ok(self.tree.add_to_all(amount)?)
    }

    /// Loss is charged to every node proportionally, even when nothing is available.
    pub fn charge_loss(&mut self, amount: Amount) -> Result<(), PoolError> {
        Ok(self.tree.remove_from_all(amount)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LP: AccountId = AccountId(10);

    fn params() -> PoolParams {
        PoolParams {
            min_deposit: 100,
            withdraw_timeout_ms: 1_000,
            reinforcement_ability: Fixed::ONE,
            initial_capacity: 4,
        }
    }

    fn t(ms: i64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn deposit_creates_node() {
        let mut pool = LiquidityPool::new(params());
        let id = pool.deposit(LP, 1_000, t(0)).unwrap();
        assert_eq!(id, NodeId(0));
        assert_eq!(pool.node_value(id).unwrap(), 1_000);
        assert_eq!(pool.node(id).unwrap().owner, LP);
        assert_eq!(pool.total(), 1_000);
    }

    #[test]
    fn small_deposit_rejected() {
        let mut pool = LiquidityPool::new(params());
        let result = pool.deposit(LP, 99, t(0));
        assert_eq!(result, Err(PoolError::SmallDepo { amount: 99, min: 100 }));
        assert!(pool.nodes().is_empty());
    }

    #[test]
    fn withdraw_waits_for_timeout() {
        let mut pool = LiquidityPool::new(params());
        let id = pool.deposit(LP, 1_000, t(0)).unwrap();

        let result = pool.withdraw(LP, id, Fixed::ONE, t(999));
        assert!(matches!(result, Err(PoolError::WithdrawalTimeout { .. })));

        assert_eq!(pool.withdraw(LP, id, Fixed::ONE, t(1_000)).unwrap(), 1_000);
        assert_eq!(pool.total(), 0);
        assert_eq!(pool.node(id).unwrap().withdrawn, 1_000);
    }

    #[test]
    fn withdraw_limited_by_locked() {
        let mut pool = LiquidityPool::new(params());
        let id = pool.deposit(LP, 1_000, t(0)).unwrap();
        pool.lock(600).unwrap();

        let result = pool.withdraw(LP, id, Fixed::ONE, t(1_000));
        assert_eq!(
            result,
            Err(PoolError::LiquidityIsLocked { requested: 1_000, available: 400 })
        );
        assert_eq!(pool.node_value(id).unwrap(), 1_000);

        let part = Fixed::from_ratio(2, 5).unwrap();
        assert_eq!(pool.withdraw(LP, id, part, t(1_000)).unwrap(), 400);
    }

    #[test]
    fn emptied_node_has_no_liquidity() {
        let mut pool = LiquidityPool::new(params());
        let id = pool.deposit(LP, 1_000, t(0)).unwrap();
        pool.withdraw(LP, id, Fixed::ONE, t(1_000)).unwrap();
        assert_eq!(
            pool.withdraw(LP, id, Fixed::ONE, t(1_000)),
            Err(PoolError::NoLiquidity(id))
        );
    }

    #[test]
    fn transfer_restarts_timer() {
        let mut pool = LiquidityPool::new(params());
        let id = pool.deposit(LP, 1_000, t(0)).unwrap();
        let buyer = AccountId(11);

        assert_eq!(
            pool.transfer_node(buyer, id, buyer, t(500)),
            Err(PoolError::NotNodeOwner { node: id, caller: buyer })
        );
        pool.transfer_node(LP, id, buyer, t(2_000)).unwrap();

        assert!(matches!(
            pool.withdraw(LP, id, Fixed::ONE, t(3_000)),
            Err(PoolError::NotNodeOwner { .. })
        ));
        assert!(matches!(
            pool.withdraw(buyer, id, Fixed::ONE, t(2_500)),
            Err(PoolError::WithdrawalTimeout { .. })
        ));
        assert_eq!(pool.withdraw(buyer, id, Fixed::ONE, t(3_000)).unwrap(), 1_000);
    }

    #[test]
    fn loss_charged_with_everything_locked() {
        let mut pool = LiquidityPool::new(params());
        let a = pool.deposit(LP, 3_000, t(0)).unwrap();
        let b = pool.deposit(LP, 1_000, t(0)).unwrap();
        pool.lock(4_000).unwrap();
        assert_eq!(pool.available(), 0);

        pool.unlock(4_000).unwrap();
        pool.charge_loss(2_000).unwrap();
        assert_eq!(pool.node_value(a).unwrap(), 1_500);
        assert_eq!(pool.node_value(b).unwrap(), 500);
    }

    #[test]
    fn lock_bounded_by_total() {
        let mut pool = LiquidityPool::new(params());
        pool.deposit(LP, 1_000, t(0)).unwrap();
        assert_eq!(
            pool.lock(1_001),
            Err(PoolError::LockExceedsTotal { requested: 1_001, total: 1_000 })
        );
        assert!(pool.unlock(1).is_err());
    }
}
