//! Betting Pool Core Simulation.
//!
//! Walks the engine through the main lifecycles: liquidity in, markets opened,
//! bets priced and locked against the pool, results settled back to providers.

use betpool_core::*;
use rust_decimal_macros::dec;
use std::error::Error;

const OWNER: AccountId = AccountId(1);
const HOUSE: AccountId = AccountId(2);
const ALICE: AccountId = AccountId(10);
const BOB: AccountId = AccountId(11);
const LP_A: AccountId = AccountId(20);
const LP_B: AccountId = AccountId(21);
const AFFILIATE: AccountId = AccountId(30);

const KICKOFF: i64 = 3_600_000;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    println!("Betting Pool Core Simulation");
    println!("Shared Liquidity, AMM Odds, Full Lifecycle\n");

    scenario_1_single_bet()?;
    scenario_2_provider_shares()?;
    scenario_3_capacity_limits()?;
    scenario_4_double_chance()?;
    scenario_5_game_cancel_and_fees()?;
    scenario_6_express()?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

fn tokens(n: u128) -> Amount {
    n * TOKEN
}

fn fmt_tokens(amount: Amount) -> String {
    Fixed::from_raw(amount / 1_000_000).to_string()
}

fn engine() -> Result<Engine, ConfigError> {
    let mut config = EngineConfig::default();
    config.owner = OWNER;
    config.fees.house_account = HOUSE;
    config.fees.default_affiliate = HOUSE;
    Engine::new(config)
}

fn binary_condition(id: u64, reinforcement: Amount) -> ConditionParams {
    ConditionParams {
        condition_id: ConditionId(id),
        game_id: GameId(1),
        outcomes: vec![OutcomeId(1), OutcomeId(2)],
        odds: vec![Fixed::from_int(2), Fixed::from_int(2)],
        margin: Fixed::from_decimal(dec!(0.05)).unwrap_or(Fixed::ZERO),
        reinforcement,
        winning_count: 1,
    }
}

fn bet(bettor: AccountId, condition: u64, outcome: u64, amount: Amount) -> BetRequest {
    BetRequest {
        bettor,
        condition_id: ConditionId(condition),
        outcome_id: OutcomeId(outcome),
        amount,
        min_odds: Fixed::ONE,
        deadline: Timestamp::from_millis(KICKOFF),
        affiliate: None,
    }
}

/// One bet on an even market, won by the bettor.
fn scenario_1_single_bet() -> Result<(), Box<dyn Error>> {
    println!("Scenario 1: Single Bet, Bettor Wins\n");

    let mut engine = engine()?;
    engine.deposit(LP_A, tokens(20_000_000))?;
    engine.create_game(OWNER, GameId(1), Timestamp::from_millis(KICKOFF))?;
    engine.create_condition(OWNER, binary_condition(1, tokens(10_000_000)))?;

    let odds = engine.condition_odds(ConditionId(1))?;
    println!("  Even market, 5% margin: odds {} / {}", odds[0], odds[1]);

    let receipt = engine.accept_bet(bet(ALICE, 1, 1, tokens(100)))?;
    println!("  Alice bets 100 on outcome 1 at {}", receipt.odds);
    println!("  Potential payout {}, pool locks {}", fmt_tokens(receipt.payout), fmt_tokens(receipt.locked));

    engine.set_time(Timestamp::from_millis(KICKOFF));
    let result = engine.resolve_condition(OWNER, ConditionId(1), &[OutcomeId(1)])?;
    println!("  Outcome 1 wins. pool loss {}", fmt_tokens(result.loss));

    let paid = engine.withdraw_payout(ALICE, receipt.bet_id)?;
    println!("  Alice withdraws {}", fmt_tokens(paid));
    println!("  Pool value now {}\n", fmt_tokens(engine.total_liquidity()));
    Ok(())
}

/// Two providers share a profit in proportion to their deposits.
fn scenario_2_provider_shares() -> Result<(), Box<dyn Error>> {
    println!("Scenario 2: Provider Shares\n");

    let mut engine = engine()?;
    let node_a = engine.deposit(LP_A, tokens(120_000))?;
    let node_b = engine.deposit(LP_B, tokens(10_000))?;
    println!("  A deposits 120,000, B deposits 10,000");

    engine.create_game(OWNER, GameId(1), Timestamp::from_millis(KICKOFF))?;
    engine.create_condition(OWNER, binary_condition(1, tokens(20_000)))?;
    engine.accept_bet(bet(ALICE, 1, 1, tokens(1_000)))?;
    engine.accept_bet(bet(BOB, 1, 2, tokens(1_500)))?;

    engine.set_time(Timestamp::from_millis(KICKOFF));
    let result = engine.resolve_condition(OWNER, ConditionId(1), &[OutcomeId(1)])?;
    println!("  Condition profit {}, pool keeps {}", fmt_tokens(result.profit), fmt_tokens(result.pool_profit));

    let a = engine.withdraw(LP_A, node_a, Fixed::ONE)?;
    let b = engine.withdraw(LP_B, node_b, Fixed::ONE)?;
    println!("  A withdraws {}", fmt_tokens(a));
    println!("  B withdraws {}\n", fmt_tokens(b));
    Ok(())
}

/// After providers pull liquidity, a bet that would lock too much is rejected untouched.
fn scenario_3_capacity_limits() -> Result<(), Box<dyn Error>> {
    println!("Scenario 3: Capacity Limits\n");

    let mut engine = engine()?;
    let node = engine.deposit(LP_A, tokens(10_000))?;
    engine.create_game(OWNER, GameId(1), Timestamp::from_millis(KICKOFF))?;
    engine.create_condition(OWNER, binary_condition(1, tokens(5_000)))?;

    let pulled = engine.withdraw(LP_A, node, Fixed::from_decimal(dec!(0.9))?)?;
    println!("  Provider pulls {}, pool left {}", fmt_tokens(pulled), fmt_tokens(engine.total_liquidity()));

    match engine.accept_bet(bet(BOB, 1, 1, tokens(1_000))) {
        Ok(_) => println!("  1,000 accepted"),
        Err(e) => println!("  1,000 rejected: {}", e),
    }
    println!("  Locked still {}", fmt_tokens(engine.locked_liquidity()));

    let ok = engine.accept_bet(bet(ALICE, 1, 1, tokens(500)))?;
    println!("  500 accepted, locked {}", fmt_tokens(ok.locked));

    let refunds = engine.cancel_condition(OWNER, ConditionId(1))?;
    println!("  Condition canceled, {} refundable", fmt_tokens(refunds));
    let refund = engine.withdraw_payout(ALICE, ok.bet_id)?;
    println!("  Alice gets back {}\n", fmt_tokens(refund));
    Ok(())
}

/// Two of three outcomes win: odds are half the single winner odds.
fn scenario_4_double_chance() -> Result<(), Box<dyn Error>> {
    println!("Scenario 4: Double Chance\n");

    let mut engine = engine()?;
    engine.deposit(LP_A, tokens(100_000))?;
    engine.create_game(OWNER, GameId(1), Timestamp::from_millis(KICKOFF))?;

    let mut params = binary_condition(1, tokens(30_000));
    params.outcomes = vec![OutcomeId(1), OutcomeId(2), OutcomeId(3)];
    params.odds = vec![Fixed::from_int(6), Fixed::from_int(6), Fixed::from_int(6)];
    params.winning_count = 2;
    engine.create_condition(OWNER, params)?;

    let odds = engine.condition_odds(ConditionId(1))?;
    println!("  Odds for any two of three: {} / {} / {}", odds[0], odds[1], odds[2]);

    let receipt = engine.accept_bet(bet(ALICE, 1, 3, tokens(300)))?;
    engine.set_time(Timestamp::from_millis(KICKOFF));
    engine.resolve_condition(OWNER, ConditionId(1), &[OutcomeId(1), OutcomeId(3)])?;
    let paid = engine.withdraw_payout(ALICE, receipt.bet_id)?;
    println!("  Alice wins {}\n", fmt_tokens(paid));
    Ok(())
}

/// Game cancel voids open markets. fees wait for the affiliate's last market.
fn scenario_5_game_cancel_and_fees() -> Result<(), Box<dyn Error>> {
    println!("Scenario 5: Game Cancel and Fees\n");

    let mut engine = engine()?;
    engine.deposit(LP_A, tokens(100_000))?;
    engine.create_game(OWNER, GameId(1), Timestamp::from_millis(KICKOFF))?;
    engine.create_game(OWNER, GameId(2), Timestamp::from_millis(KICKOFF * 2))?;
    engine.create_condition(OWNER, binary_condition(1, tokens(10_000)))?;
    let mut second = binary_condition(2, tokens(10_000));
    second.game_id = GameId(2);
    engine.create_condition(OWNER, second)?;

    let mut referred = bet(ALICE, 1, 2, tokens(2_000));
    referred.affiliate = Some(AFFILIATE);
    engine.accept_bet(referred)?;
    let mut referred = bet(BOB, 2, 1, tokens(500));
    referred.affiliate = Some(AFFILIATE);
    referred.deadline = Timestamp::from_millis(KICKOFF * 2);
    engine.accept_bet(referred)?;

    engine.set_time(Timestamp::from_millis(KICKOFF));
    let result = engine.resolve_condition(OWNER, ConditionId(1), &[OutcomeId(1)])?;
    println!("  Game 1 resolved, affiliate earns {}", fmt_tokens(result.affiliate_rewards));

    match engine.claim_fees(AFFILIATE) {
        Ok(amount) => println!("  Affiliate claims {}", fmt_tokens(amount)),
        Err(e) => println!("  Affiliate claim refused: {}", e),
    }

    let canceled = engine.cancel_game(OWNER, GameId(2))?;
    println!("  Game 2 canceled, voided {:?}", canceled);
    println!("  Affiliate claims {}", fmt_tokens(engine.claim_fees(AFFILIATE)?));
    println!("  House claims {}", fmt_tokens(engine.claim_fees(HOUSE)?));
    println!("  Data provider claims {}", fmt_tokens(engine.claim_fees(OWNER)?));

    let report = engine.conservation();
    println!("  Books balanced: {}\n", report.balanced());
    Ok(())
}

/// An express across two games; the second leg's game is canceled.
fn scenario_6_express() -> Result<(), Box<dyn Error>> {
    println!("Scenario 6: Express Bet\n");

    let mut engine = engine()?;
    engine.deposit(LP_A, tokens(100_000))?;
    engine.create_game(OWNER, GameId(1), Timestamp::from_millis(KICKOFF))?;
    engine.create_game(OWNER, GameId(2), Timestamp::from_millis(KICKOFF * 2))?;
    engine.create_condition(OWNER, binary_condition(1, tokens(10_000)))?;
    let mut second = binary_condition(2, tokens(10_000));
    second.game_id = GameId(2);
    engine.create_condition(OWNER, second)?;

    let legs = vec![
        ExpressLeg { condition_id: ConditionId(1), outcome_id: OutcomeId(1) },
        ExpressLeg { condition_id: ConditionId(2), outcome_id: OutcomeId(2) },
    ];
    let receipt = engine.accept_express(ExpressRequest {
        bettor: ALICE,
        legs,
        amount: tokens(100),
        min_odds: Fixed::ONE,
        deadline: Timestamp::from_millis(KICKOFF),
        affiliate: None,
    })?;
    println!("  Alice takes a two leg express of 100 at {}", receipt.odds);
    println!("  Potential payout {}, pool locks {}", fmt_tokens(receipt.payout), fmt_tokens(receipt.locked));

    engine.set_time(Timestamp::from_millis(KICKOFF));
    engine.resolve_condition(OWNER, ConditionId(1), &[OutcomeId(1)])?;
    println!("  Leg 1 won, express still open");
    engine.cancel_game(OWNER, GameId(2))?;
    println!("  Game 2 canceled, its leg counts at odds 1");

    let paid = engine.withdraw_payout(ALICE, receipt.bet_id)?;
    println!("  Alice withdraws {}", fmt_tokens(paid));
    println!("  Books balanced: {}", engine.conservation().balanced());
    Ok(())
}
