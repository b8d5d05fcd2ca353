// 8.0: core betting engine. coordinates liquidity, condition administration, bet
// acceptance and settlement. deterministic and event-driven with no external I/O.

mod bets;
mod conditions;
mod config;
mod core;
mod express;
mod liquidity;
mod results;
mod settlement;

pub use config::EngineConfig;
pub use core::Engine;
pub use results::{BetReceipt, ConservationReport, EngineError, SettlementResult};
