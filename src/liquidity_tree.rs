//! Proportional ownership tree over liquidity deposits.
//!
//! Heap-indexed segment tree kept in a flat `Vec`: the root lives at index 1 and
//! leaves at `[capacity, 2 * capacity)`, one leaf per deposit in creation order.
//! Every node stores the value of its subtree. Pool-wide profit or loss only
//! touches the root; the change reaches the leaves lazily, by proportional
//! scaling of the two children whenever a root-to-leaf path is walked:
//!
//! ```text
//! left'  = left * value / (left + right)
//! right' = value - left'
//! ```
//!
//! Leaves appended later start from zero at the moment they are added, so they
//! never pick up earlier deltas. Withdrawn value leaves the tree, so it never
//! picks up later ones.

use crate::fixed::{mul_div, Fixed, MathError, SCALE};
use crate::types::Amount;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("Leaf {0} does not exist")]
    LeafNotFound(usize),

    #[error("Loss {loss} exceeds tree value {total}")]
    LossExceedsTotal { loss: Amount, total: Amount },

    #[error("Fraction {0} outside (0, 1]")]
    InvalidFraction(Fixed),

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

#[derive(Debug, Clone)]
pub struct LiquidityTree {
    nodes: Vec<Amount>,
    capacity: usize,
    leaves: usize,
}

impl Default for LiquidityTree {
    fn default() -> Self {
        Self::with_capacity(16)
    }
}

impl LiquidityTree {
    /// Capacity is rounded up to a power of two and grows on demand.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        Self {
            nodes: vec![0; 2 * capacity],
            capacity,
            leaves: 0,
        }
    }

    pub fn total(&self) -> Amount {
        self.nodes[1]
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tree height. every walk visits `depth + 1` nodes.
    pub fn depth(&self) -> u32 {
        self.capacity.trailing_zeros()
    }

    /// Appends a leaf holding `amount`. returns its index.
    pub fn push_leaf(&mut self, amount: Amount) -> Result<usize, TreeError> {
        if self.leaves == self.capacity {
            self.grow();
        }
        let leaf = self.leaves;
        // settle pending deltas first so the new value is not scaled by them
        self.push_path(leaf)?;

        let mut k = self.capacity + leaf;
        while k >= 1 {
            self.nodes[k] = self.nodes[k].checked_add(amount).ok_or(MathError::Overflow)?;
            k >>= 1;
        }
        self.leaves += 1;
        Ok(leaf)
    }

    /// Spreads a profit over every existing leaf, proportionally to value.
    pub fn add_to_all(&mut self, profit: Amount) -> Result<(), TreeError> {
        self.nodes[1] = self.nodes[1].checked_add(profit).ok_or(MathError::Overflow)?;
        Ok(())
    }

    /// Charges a loss to every existing leaf, proportionally to value.
    pub fn remove_from_all(&mut self, loss: Amount) -> Result<(), TreeError> {
        let total = self.nodes[1];
        if loss > total {
            return Err(TreeError::LossExceedsTotal { loss, total });
        }
        self.nodes[1] = total - loss;
        Ok(())
    }

    /// Current value of a leaf without touching the tree.
    pub fn leaf_value(&self, leaf: usize) -> Result<Amount, TreeError> {
        if leaf >= self.leaves {
            return Err(TreeError::LeafNotFound(leaf));
        }
        let depth = self.depth();
        let mut k = 1;
        let mut value = self.nodes[1];
        for level in (0..depth).rev() {
            let (left, right) = (self.nodes[2 * k], self.nodes[2 * k + 1]);
            let sum = left + right;
            if sum == 0 {
                return Ok(0);
            }
            let left_value = mul_div(left, value, sum)?;
            if (leaf >> level) & 1 == 0 {
                value = left_value;
                k = 2 * k;
            } else {
                value -= left_value;
                k = 2 * k + 1;
            }
        }
        Ok(value)
    }

    /// Removes `fraction` of the leaf's current value. returns the amount removed.
    pub fn withdraw(&mut self, leaf: usize, fraction: Fixed) -> Result<Amount, TreeError> {
        if leaf >= self.leaves {
            return Err(TreeError::LeafNotFound(leaf));
        }
        if fraction.is_zero() || fraction > Fixed::ONE {
            return Err(TreeError::InvalidFraction(fraction));
        }
        self.push_path(leaf)?;

        let mut k = self.capacity + leaf;
        let amount = mul_div(self.nodes[k], fraction.raw(), SCALE)?;
        while k >= 1 {
            self.nodes[k] -= amount;
            k >>= 1;
        }
        Ok(amount)
    }

    /// Sum of every leaf value, read one by one. O(n log n), for audits and tests.
    pub fn leaf_sum(&self) -> Result<Amount, TreeError> {
        (0..self.leaves).try_fold(0u128, |acc, leaf| Ok(acc + self.leaf_value(leaf)?))
    }

    // walks root -> leaf settling every node on the way, so the stored leaf value is exact
    fn push_path(&mut self, leaf: usize) -> Result<(), TreeError> {
        let depth = self.depth();
        let mut k = 1;
        for level in (0..depth).rev() {
            self.push(k)?;
            k = 2 * k + ((leaf >> level) & 1);
        }
        Ok(())
    }

    fn push(&mut self, k: usize) -> Result<(), TreeError> {
        let value = self.nodes[k];
        let (left, right) = (self.nodes[2 * k], self.nodes[2 * k + 1]);
        let sum = left + right;
        if sum == value {
            return Ok(());
        }
        if sum == 0 {
            debug_assert_eq!(value, 0, "value without leaves under node {k}");
            return Ok(());
        }
        let left_value = mul_div(left, value, sum)?;
        self.nodes[2 * k] = left_value;
        self.nodes[2 * k + 1] = value - left_value;
        Ok(())
    }

    // the old root becomes the left child of a new root. a node at heap index k on
    // level l keeps its position within the level, so it moves to k + 2^l.
    fn grow(&mut self) {
        let capacity = self.capacity * 2;
        let mut nodes = vec![0; 2 * capacity];
        for (k, value) in self.nodes.iter().enumerate().skip(1) {
            let level = usize::BITS - 1 - k.leading_zeros();
            nodes[k + (1 << level)] = *value;
        }
        nodes[1] = self.nodes[1];
        debug!(from = self.capacity, to = capacity, "liquidity tree grown");
        self.nodes = nodes;
        self.capacity = capacity;
    }
}
