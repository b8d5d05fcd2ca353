// betpool-core: liquidity and pricing core for a sports betting protocol.
// one shared pool backs every market: bets are priced by an AMM over virtual funds,
// pool capital is locked against each market's worst case, and results flow back
// to liquidity providers in proportion to their stake.
// all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: ids, Amount, Timestamp
//   2.x  fixed.rs: 12 decimal fixed point, wide mul_div
//   2.1  odds.rs: amount priced odds with a shared margin factor, funds from target odds
//   3.x  game.rs: game start time and cancel flag
//   3.1  condition.rs: condition ledger, bet rebalance, lifecycle
//   4.x  liquidity_tree.rs: lazy proportional segment tree
//   4.1  pool.rs: deposits, withdrawals, locked liquidity
//   5.x  reinforcement.rs: worst case lock and capacity checks
//   6.x  fees.rs: profit split, fee book, affiliate rewards
//   6.1  bet.rs: single and express bets and their settlement amount
//   7.x  config.rs: pool and fee config, env presets
//   8.x  engine/: core engine: liquidity, conditions, bets, express bets, settlement
//   9.x  access.rs: roles and the authorizer seam
//   11.x events.rs: state transition events for audit

// pricing and ledger modules
pub mod condition;
pub mod fixed;
pub mod game;
pub mod odds;
pub mod types;

// liquidity modules
pub mod liquidity_tree;
pub mod pool;
pub mod reinforcement;

// settlement modules
pub mod bet;
pub mod fees;

// integration modules
pub mod access;
pub mod config;
pub mod engine;
pub mod events;

// re exports for convenience
pub use access::{Authorizer, Role, RoleRegistry};
pub use bet::*;
pub use condition::*;
pub use config::{ConfigError, Environment, FeeConfig, PoolConfig, TOKEN};
pub use engine::*;
pub use events::*;
pub use fees::{AffiliateLedger, FeeBook, FeeError, FeeShares, ProfitSplit};
pub use fixed::{mul_div, Fixed, MathError, SCALE};
pub use game::*;
pub use liquidity_tree::{LiquidityTree, TreeError};
pub use odds::*;
pub use pool::*;
pub use reinforcement::*;
pub use types::*;
