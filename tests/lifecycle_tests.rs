//! Game and condition lifecycle tests.
//!
//! Settled conditions are final, bets and payouts follow the condition state,
//! and admin operations are gated by role.

use betpool_core::*;
use rust_decimal_macros::dec;

const OWNER: AccountId = AccountId(1);
const HOUSE: AccountId = AccountId(2);
const ALICE: AccountId = AccountId(10);
const BOB: AccountId = AccountId(11);
const LP: AccountId = AccountId(20);
const AFFILIATE: AccountId = AccountId(30);
const STRANGER: AccountId = AccountId(99);
const KICKOFF: i64 = 1_000_000;

fn tokens(n: u128) -> Amount {
    n * TOKEN
}

fn config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.owner = OWNER;
    config.fees.house_account = HOUSE;
    config.fees.default_affiliate = HOUSE;
    config
}

fn binary(id: u64, game: u64) -> ConditionParams {
    ConditionParams {
        condition_id: ConditionId(id),
        game_id: GameId(game),
        outcomes: vec![OutcomeId(1), OutcomeId(2)],
        odds: vec![Fixed::from_int(2), Fixed::from_int(2)],
        margin: Fixed::from_decimal(dec!(0.05)).unwrap(),
        reinforcement: tokens(10_000),
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
        deadline: Timestamp::from_millis(KICKOFF * 10),
        affiliate: None,
    }
}

/// Pool of 100k, game 1 at KICKOFF with a binary condition 1.
fn market() -> Engine {
    let mut engine = Engine::new(config()).unwrap();
    engine.deposit(LP, tokens(100_000)).unwrap();
    engine
        .create_game(OWNER, GameId(1), Timestamp::from_millis(KICKOFF))
        .unwrap();
    engine.create_condition(OWNER, binary(1, 1)).unwrap();
    engine
}

fn kickoff(engine: &mut Engine) {
    engine.set_time(Timestamp::from_millis(KICKOFF));
}

mod terminal_states {
    use super::*;

    #[test]
    fn resolved_condition_cannot_resolve_again() {
        let mut engine = market();
        kickoff(&mut engine);
        engine
            .resolve_condition(OWNER, ConditionId(1), &[OutcomeId(1)])
            .unwrap();
        let total = engine.total_liquidity();

        let err = engine
            .resolve_condition(OWNER, ConditionId(1), &[OutcomeId(2)])
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Condition(ConditionError::ActionNotAllowed(ConditionId(1)))
        );
        let err = engine.cancel_condition(OWNER, ConditionId(1)).unwrap_err();
        assert_eq!(
            err,
            EngineError::Condition(ConditionError::ActionNotAllowed(ConditionId(1)))
        );

        let condition = engine.get_condition(ConditionId(1)).unwrap();
        assert_eq!(condition.state, ConditionState::Resolved);
        assert!(condition.is_winner(OutcomeId(1)));
        assert_eq!(engine.total_liquidity(), total);
    }

    #[test]
    fn canceled_condition_cannot_resolve() {
        let mut engine = market();
        engine.cancel_condition(OWNER, ConditionId(1)).unwrap();
        kickoff(&mut engine);

        assert!(engine
            .resolve_condition(OWNER, ConditionId(1), &[OutcomeId(1)])
            .is_err());
        assert!(engine.cancel_condition(OWNER, ConditionId(1)).is_err());
        assert_eq!(
            engine.get_condition(ConditionId(1)).unwrap().state,
            ConditionState::Canceled
        );
    }

    #[test]
    fn settled_condition_rejects_admin_changes() {
        let mut engine = market();
        engine.cancel_condition(OWNER, ConditionId(1)).unwrap();

        assert!(engine.change_margin(OWNER, ConditionId(1), Fixed::ZERO).is_err());
        assert!(engine.change_reinforcement(OWNER, ConditionId(1), tokens(1)).is_err());
        assert!(engine.pause_condition(OWNER, ConditionId(1), true).is_err());
        assert!(matches!(
            engine.accept_bet(bet(ALICE, 1, 1, tokens(10))),
            Err(EngineError::Condition(ConditionError::ConditionNotRunning(_)))
        ));
    }

    #[test]
    fn resolved_condition_survives_game_cancel() {
        let mut engine = market();
        engine.create_condition(OWNER, binary(2, 1)).unwrap();
        kickoff(&mut engine);
        engine
            .resolve_condition(OWNER, ConditionId(1), &[OutcomeId(2)])
            .unwrap();

        let canceled = engine.cancel_game(OWNER, GameId(1)).unwrap();
        assert_eq!(canceled, vec![ConditionId(2)]);
        assert_eq!(
            engine.get_condition(ConditionId(1)).unwrap().state,
            ConditionState::Resolved
        );
        assert_eq!(
            engine.get_condition(ConditionId(2)).unwrap().state,
            ConditionState::Canceled
        );
        assert_eq!(
            engine.cancel_game(OWNER, GameId(1)),
            Err(EngineError::GameCanceled(GameId(1)))
        );
    }

    #[test]
    fn wrong_winner_count_rejected() {
        let mut engine = market();
        kickoff(&mut engine);
        assert_eq!(
            engine.resolve_condition(OWNER, ConditionId(1), &[OutcomeId(1), OutcomeId(2)]),
            Err(EngineError::Condition(ConditionError::IncorrectWinningOutcomes {
                expected: 1
            }))
        );
        assert_eq!(
            engine.resolve_condition(OWNER, ConditionId(1), &[OutcomeId(7)]),
            Err(EngineError::Condition(ConditionError::OutcomeNotExists(OutcomeId(7))))
        );
        assert!(engine.get_condition(ConditionId(1)).unwrap().is_running());
    }
}

mod pause_flag {
    use super::*;

    #[test]
    fn paused_condition_takes_no_bets() {
        let mut engine = market();
        engine.pause_condition(OWNER, ConditionId(1), true).unwrap();

        assert!(matches!(
            engine.accept_bet(bet(ALICE, 1, 1, tokens(10))),
            Err(EngineError::Condition(ConditionError::ConditionNotRunning(_)))
        ));

        engine.pause_condition(OWNER, ConditionId(1), false).unwrap();
        assert!(engine.accept_bet(bet(ALICE, 1, 1, tokens(10))).is_ok());
    }

    #[test]
    fn setting_the_same_flag_fails() {
        let mut engine = market();
        assert_eq!(
            engine.pause_condition(OWNER, ConditionId(1), false),
            Err(EngineError::Condition(ConditionError::CantChangeFlag(ConditionId(1))))
        );
        engine.pause_condition(OWNER, ConditionId(1), true).unwrap();
        assert_eq!(
            engine.pause_condition(OWNER, ConditionId(1), true),
            Err(EngineError::Condition(ConditionError::CantChangeFlag(ConditionId(1))))
        );
    }

    #[test]
    fn paused_condition_can_still_resolve() {
        let mut engine = market();
        engine.accept_bet(bet(ALICE, 1, 1, tokens(100))).unwrap();
        engine.pause_condition(OWNER, ConditionId(1), true).unwrap();
        kickoff(&mut engine);

        engine
            .resolve_condition(OWNER, ConditionId(1), &[OutcomeId(2)])
            .unwrap();
        assert_eq!(engine.locked_liquidity(), 0);
    }
}

mod bets_and_payouts {
    use super::*;

    #[test]
    fn payout_waits_for_settlement() {
        let mut engine = market();
        let receipt = engine.accept_bet(bet(ALICE, 1, 1, tokens(100))).unwrap();

        assert_eq!(
            engine.withdraw_payout(ALICE, receipt.bet_id),
            Err(EngineError::ConditionNotSettled(ConditionId(1)))
        );
        let status = engine
            .get_bet(receipt.bet_id)
            .unwrap()
            .status(engine.get_condition(ConditionId(1)).unwrap());
        assert_eq!(status, BetStatus::Pending);
    }

    #[test]
    fn each_bet_pays_once() {
        let mut engine = market();
        let receipt = engine.accept_bet(bet(ALICE, 1, 1, tokens(100))).unwrap();
        kickoff(&mut engine);
        engine
            .resolve_condition(OWNER, ConditionId(1), &[OutcomeId(1)])
            .unwrap();

        assert_eq!(
            engine.withdraw_payout(BOB, receipt.bet_id),
            Err(EngineError::NotBetOwner {
                bet: receipt.bet_id,
                caller: BOB
            })
        );
        assert_eq!(engine.withdraw_payout(ALICE, receipt.bet_id).unwrap(), receipt.payout);
        assert_eq!(
            engine.withdraw_payout(ALICE, receipt.bet_id),
            Err(EngineError::AlreadyPaid(receipt.bet_id))
        );
        assert_eq!(
            engine.withdraw_payout(ALICE, BetId(42)),
            Err(EngineError::BetNotFound(BetId(42)))
        );
    }

    #[test]
    fn canceled_condition_refunds_stakes() {
        let mut engine = market();
        let a = engine.accept_bet(bet(ALICE, 1, 1, tokens(100))).unwrap();
        let b = engine.accept_bet(bet(BOB, 1, 2, tokens(250))).unwrap();
        let refunds = engine.cancel_condition(OWNER, ConditionId(1)).unwrap();

        assert_eq!(refunds, tokens(350));
        assert_eq!(engine.locked_liquidity(), 0);
        assert_eq!(engine.total_liquidity(), tokens(100_000));
        assert_eq!(engine.withdraw_payout(ALICE, a.bet_id).unwrap(), tokens(100));
        assert_eq!(engine.withdraw_payout(BOB, b.bet_id).unwrap(), tokens(250));
        assert_eq!(engine.payout_reserve(), 0);
    }

    #[test]
    fn no_bets_once_the_game_starts() {
        let mut engine = market();
        kickoff(&mut engine);

        assert_eq!(
            engine.accept_bet(bet(ALICE, 1, 1, tokens(10))),
            Err(EngineError::GameStarted(GameId(1)))
        );
        assert_eq!(
            engine.quote(ConditionId(1), OutcomeId(1), tokens(10)),
            Err(EngineError::GameStarted(GameId(1)))
        );

        // pushing the game back reopens the market
        engine
            .shift_game(OWNER, GameId(1), Timestamp::from_millis(KICKOFF * 2))
            .unwrap();
        assert!(engine.accept_bet(bet(ALICE, 1, 1, tokens(10))).is_ok());
    }

    #[test]
    fn resolve_waits_for_the_game() {
        let mut engine = market();
        engine.advance_time(KICKOFF - 1);

        assert_eq!(
            engine.resolve_condition(OWNER, ConditionId(1), &[OutcomeId(1)]),
            Err(EngineError::ResolveTooEarly {
                condition: ConditionId(1),
                starts_at: Timestamp::from_millis(KICKOFF)
            })
        );
        engine.advance_time(1);
        assert!(engine
            .resolve_condition(OWNER, ConditionId(1), &[OutcomeId(1)])
            .is_ok());
    }

    #[test]
    fn stale_or_underpriced_requests_rejected() {
        let mut engine = market();

        let mut late = bet(ALICE, 1, 1, tokens(10));
        late.deadline = Timestamp::from_millis(0);
        engine.set_time(Timestamp::from_millis(1));
        assert_eq!(
            engine.accept_bet(late),
            Err(EngineError::BetExpired {
                deadline: Timestamp::from_millis(0),
                now: Timestamp::from_millis(1)
            })
        );

        let mut greedy = bet(ALICE, 1, 1, tokens(10));
        greedy.min_odds = Fixed::from_int(2);
        assert!(matches!(
            engine.accept_bet(greedy),
            Err(EngineError::SmallOdds { .. })
        ));

        let mut on_time = bet(ALICE, 1, 1, tokens(10));
        on_time.deadline = Timestamp::from_millis(1);
        assert!(engine.accept_bet(on_time).is_ok());
    }

    #[test]
    fn odds_move_after_a_bet() {
        let mut engine = market();
        let before = engine.condition_odds(ConditionId(1)).unwrap();
        engine.accept_bet(bet(ALICE, 1, 1, tokens(1_000))).unwrap();
        let after = engine.condition_odds(ConditionId(1)).unwrap();

        assert!(after[0] < before[0]);
        assert!(after[1] > before[1]);
    }

    #[test]
    fn double_chance_pays_both_winners() {
        let mut engine = market();
        let mut params = binary(2, 1);
        params.outcomes = vec![OutcomeId(1), OutcomeId(2), OutcomeId(3)];
        params.odds = vec![Fixed::from_int(6); 3];
        params.winning_count = 2;
        engine.create_condition(OWNER, params).unwrap();

        let a = engine.accept_bet(bet(ALICE, 2, 1, tokens(100))).unwrap();
        let b = engine.accept_bet(bet(BOB, 2, 2, tokens(100))).unwrap();
        kickoff(&mut engine);
        let result = engine
            .resolve_condition(OWNER, ConditionId(2), &[OutcomeId(1), OutcomeId(3)])
            .unwrap();

        assert_eq!(result.total_payout, a.payout);
        assert_eq!(engine.withdraw_payout(ALICE, a.bet_id).unwrap(), a.payout);
        assert_eq!(engine.withdraw_payout(BOB, b.bet_id).unwrap(), 0);
        assert!(engine.conservation().balanced());
    }
}

mod administration {
    use super::*;

    #[test]
    fn strangers_cannot_administer() {
        let mut engine = market();
        assert_eq!(
            engine.create_game(STRANGER, GameId(2), Timestamp::from_millis(KICKOFF)),
            Err(EngineError::Unauthorized {
                account: STRANGER,
                role: Role::Oracle
            })
        );
        assert!(engine.create_condition(STRANGER, binary(2, 1)).is_err());
        assert!(engine.cancel_condition(STRANGER, ConditionId(1)).is_err());
        assert_eq!(
            engine.pause_condition(STRANGER, ConditionId(1), true),
            Err(EngineError::Unauthorized {
                account: STRANGER,
                role: Role::Maintainer
            })
        );
    }

    #[test]
    fn granted_roles_are_separate() {
        let maintainer = AccountId(5);
        let oracle = AccountId(6);
        let registry = RoleRegistry::new(OWNER)
            .grant(maintainer, Role::Maintainer)
            .grant(oracle, Role::Oracle);
        let mut engine = Engine::with_access(config(), Box::new(registry)).unwrap();
        engine.deposit(LP, tokens(100_000)).unwrap();

        engine
            .create_game(oracle, GameId(1), Timestamp::from_millis(KICKOFF))
            .unwrap();
        engine.create_condition(oracle, binary(1, 1)).unwrap();
        assert!(engine.create_condition(maintainer, binary(2, 1)).is_err());
        engine.pause_condition(maintainer, ConditionId(1), true).unwrap();
        assert!(engine.pause_condition(oracle, ConditionId(1), false).is_err());

        // the creating oracle is the condition's data provider
        assert_eq!(engine.get_condition(ConditionId(1)).unwrap().oracle, oracle);
    }

    #[test]
    fn games_need_a_future_start() {
        let mut engine = market();
        engine.set_time(Timestamp::from_millis(500));
        assert!(matches!(
            engine.create_game(OWNER, GameId(2), Timestamp::from_millis(500)),
            Err(EngineError::StartInPast { .. })
        ));
        assert_eq!(
            engine.create_game(OWNER, GameId(1), Timestamp::from_millis(KICKOFF)),
            Err(EngineError::GameAlreadyExists(GameId(1)))
        );
        assert_eq!(
            engine.create_condition(OWNER, binary(1, 1)),
            Err(EngineError::ConditionAlreadyExists(ConditionId(1)))
        );
        assert_eq!(
            engine.create_condition(OWNER, binary(2, 9)),
            Err(EngineError::GameNotExists(GameId(9)))
        );
    }

    #[test]
    fn canceled_game_takes_no_conditions() {
        let mut engine = market();
        engine.cancel_game(OWNER, GameId(1)).unwrap();
        assert_eq!(
            engine.create_condition(OWNER, binary(2, 1)),
            Err(EngineError::GameCanceled(GameId(1)))
        );
        assert_eq!(
            engine.shift_game(OWNER, GameId(1), Timestamp::from_millis(KICKOFF * 2)),
            Err(EngineError::GameCanceled(GameId(1)))
        );
    }

    #[test]
    fn change_odds_reprices_the_market() {
        let mut engine = market();
        let target = [Fixed::from_int(4), Fixed::from_ratio(4, 3).unwrap()];
        engine.change_odds(OWNER, ConditionId(1), &target).unwrap();

        let c = engine.get_condition(ConditionId(1)).unwrap();
        let total: Amount = c.virtual_funds.iter().sum();
        assert!(total.abs_diff(tokens(10_000)) <= 1);
        assert!(c.virtual_funds[0] < c.virtual_funds[1]);

        let odds = engine.condition_odds(ConditionId(1)).unwrap();
        assert!(odds[0] > odds[1]);
        assert!(engine
            .change_odds(OWNER, ConditionId(1), &[Fixed::from_int(2)])
            .is_err());
    }

    #[test]
    fn reinforcement_cannot_drop_below_lock() {
        let mut engine = market();
        let receipt = engine.accept_bet(bet(ALICE, 1, 1, tokens(1_000))).unwrap();
        assert!(matches!(
            engine.change_reinforcement(OWNER, ConditionId(1), receipt.locked - 1),
            Err(EngineError::Condition(ConditionError::ReinforcementBelowLocked { .. }))
        ));
        engine
            .change_reinforcement(OWNER, ConditionId(1), receipt.locked)
            .unwrap();
        assert_eq!(
            engine.get_condition(ConditionId(1)).unwrap().reinforcement,
            receipt.locked
        );
    }

    #[test]
    fn event_log_is_bounded() {
        let mut config = config();
        config.max_events = 3;
        let mut engine = Engine::new(config).unwrap();
        for _ in 0..5 {
            engine.deposit(LP, tokens(1)).unwrap();
        }
        assert_eq!(engine.events().len(), 3);
        assert_eq!(engine.events()[0].id, EventId(3));
        assert_eq!(engine.recent_events(1)[0].id, EventId(5));
    }

    #[test]
    fn presets_validate() {
        for env in [Environment::Development, Environment::Testnet, Environment::Mainnet] {
            assert!(env.config().validate().is_ok());
        }
        let mut config = config();
        config.fees.house_fee = dec!(0.9);
        assert!(matches!(Engine::new(config), Err(ConfigError::InvalidFees { .. })));
    }
}

mod fee_claims {
    use super::*;

    fn referred(bettor: AccountId, condition: u64, outcome: u64, amount: Amount) -> BetRequest {
        let mut request = bet(bettor, condition, outcome, amount);
        request.affiliate = Some(AFFILIATE);
        request
    }

    #[test]
    fn affiliate_rewards_wait_for_every_condition() {
        let mut engine = market();
        engine
            .create_game(OWNER, GameId(2), Timestamp::from_millis(KICKOFF * 2))
            .unwrap();
        engine.create_condition(OWNER, binary(2, 2)).unwrap();
        engine.accept_bet(referred(ALICE, 1, 2, tokens(2_000))).unwrap();
        engine.accept_bet(referred(BOB, 2, 1, tokens(500))).unwrap();

        kickoff(&mut engine);
        let result = engine
            .resolve_condition(OWNER, ConditionId(1), &[OutcomeId(1)])
            .unwrap();
        assert_eq!(result.affiliate_rewards, tokens(200));
        assert_eq!(engine.affiliate_rewards(AFFILIATE), tokens(200));

        assert_eq!(
            engine.claim_fees(AFFILIATE),
            Err(EngineError::Fee(FeeError::RewardsLocked {
                account: AFFILIATE,
                open_conditions: 1
            }))
        );

        engine.cancel_game(OWNER, GameId(2)).unwrap();
        assert_eq!(engine.claim_fees(AFFILIATE).unwrap(), tokens(200));
        assert_eq!(
            engine.claim_fees(AFFILIATE),
            Err(EngineError::Fee(FeeError::NothingToClaim(AFFILIATE)))
        );
    }

    #[test]
    fn house_and_data_provider_claim_their_share() {
        let mut engine = market();
        engine.accept_bet(bet(ALICE, 1, 2, tokens(1_000))).unwrap();
        kickoff(&mut engine);
        engine
            .resolve_condition(OWNER, ConditionId(1), &[OutcomeId(1)])
            .unwrap();

        // house is also the default affiliate here
        assert_eq!(engine.claim_fees(HOUSE).unwrap(), tokens(50) + tokens(100));
        assert_eq!(engine.claim_fees(OWNER).unwrap(), tokens(50));
        assert_eq!(engine.conservation().unclaimed_fees, 0);
        assert!(engine.conservation().balanced());
    }

    #[test]
    fn losing_condition_earns_no_fees() {
        let mut engine = market();
        engine.accept_bet(referred(ALICE, 1, 1, tokens(1_000))).unwrap();
        kickoff(&mut engine);
        let result = engine
            .resolve_condition(OWNER, ConditionId(1), &[OutcomeId(1)])
            .unwrap();

        assert!(result.loss > 0);
        assert_eq!(result.house_fee, 0);
        assert_eq!(engine.affiliate_rewards(AFFILIATE), 0);
        assert_eq!(
            engine.claim_fees(AFFILIATE),
            Err(EngineError::Fee(FeeError::NothingToClaim(AFFILIATE)))
        );
    }
}

mod express_bets {
    use super::*;

    const SECOND_KICKOFF: i64 = KICKOFF * 2;

    fn leg(condition: u64, outcome: u64) -> ExpressLeg {
        ExpressLeg {
            condition_id: ConditionId(condition),
            outcome_id: OutcomeId(outcome),
        }
    }

    fn express(legs: Vec<ExpressLeg>, amount: Amount) -> ExpressRequest {
        ExpressRequest {
            bettor: ALICE,
            legs,
            amount,
            min_odds: Fixed::ONE,
            deadline: Timestamp::from_millis(KICKOFF * 10),
            affiliate: None,
        }
    }

    /// Condition 1 on game 1 and condition 2 on game 2, which starts later.
    fn two_games() -> Engine {
        let mut engine = market();
        engine
            .create_game(OWNER, GameId(2), Timestamp::from_millis(SECOND_KICKOFF))
            .unwrap();
        engine.create_condition(OWNER, binary(2, 2)).unwrap();
        engine
    }

    #[test]
    fn odds_are_the_product_of_leg_quotes() {
        let mut engine = two_games();
        let amount = tokens(100);
        let first = engine.quote(ConditionId(1), OutcomeId(1), amount).unwrap();
        let second = engine.quote(ConditionId(2), OutcomeId(2), amount).unwrap();
        let funds_before = engine.get_condition(ConditionId(1)).unwrap().virtual_funds.clone();

        let legs = vec![leg(1, 1), leg(2, 2)];
        let quoted = engine.quote_express(&legs, amount).unwrap();
        assert_eq!(quoted, first.mul(second).unwrap());

        let receipt = engine.accept_express(express(legs, amount)).unwrap();
        assert_eq!(receipt.odds, quoted);
        assert_eq!(receipt.payout, quoted.mul_amount(amount).unwrap());
        assert_eq!(receipt.locked, receipt.payout - amount);
        assert!(receipt.locked > 0);
        assert_eq!(engine.express_locked(), receipt.locked);
        assert_eq!(engine.locked_liquidity(), receipt.locked);

        // legs do not move the market
        assert_eq!(engine.get_condition(ConditionId(1)).unwrap().virtual_funds, funds_before);
        let record = engine.get_express(receipt.bet_id).unwrap();
        assert_eq!(record.legs[0].odds, first);
        assert_eq!(record.legs[1].odds, second);
        assert!(engine.conservation().balanced());
    }

    #[test]
    fn legs_must_cover_distinct_games() {
        let mut engine = two_games();
        engine.create_condition(OWNER, binary(3, 1)).unwrap();

        assert_eq!(
            engine.accept_express(express(vec![leg(1, 1), leg(3, 2)], tokens(10))),
            Err(EngineError::ExpressSameGame(GameId(1)))
        );
        assert_eq!(
            engine.accept_express(express(vec![leg(1, 1)], tokens(10))),
            Err(EngineError::ExpressLegs(1))
        );
        assert_eq!(engine.express_locked(), 0);
    }

    #[test]
    fn started_game_closes_the_express() {
        let mut engine = two_games();
        kickoff(&mut engine);
        assert_eq!(
            engine.accept_express(express(vec![leg(1, 1), leg(2, 1)], tokens(10))),
            Err(EngineError::GameStarted(GameId(1)))
        );
    }

    #[test]
    fn every_leg_won_pays_stake_times_odds() {
        let mut engine = two_games();
        let amount = tokens(100);
        let receipt = engine
            .accept_express(express(vec![leg(1, 1), leg(2, 2)], amount))
            .unwrap();
        let liquidity = engine.total_liquidity();

        kickoff(&mut engine);
        engine
            .resolve_condition(OWNER, ConditionId(1), &[OutcomeId(1)])
            .unwrap();
        assert_eq!(
            engine.withdraw_payout(ALICE, receipt.bet_id),
            Err(EngineError::ExpressNotSettled(receipt.bet_id))
        );
        assert_eq!(engine.express_locked(), receipt.locked);

        engine.set_time(Timestamp::from_millis(SECOND_KICKOFF));
        engine
            .resolve_condition(OWNER, ConditionId(2), &[OutcomeId(2)])
            .unwrap();
        assert_eq!(engine.express_locked(), 0);
        assert_eq!(engine.locked_liquidity(), 0);
        assert_eq!(engine.total_liquidity(), liquidity - receipt.locked);

        assert_eq!(
            engine.withdraw_payout(BOB, receipt.bet_id),
            Err(EngineError::NotBetOwner {
                bet: receipt.bet_id,
                caller: BOB
            })
        );
        assert_eq!(engine.withdraw_payout(ALICE, receipt.bet_id).unwrap(), receipt.payout);
        assert_eq!(
            engine.withdraw_payout(ALICE, receipt.bet_id),
            Err(EngineError::AlreadyPaid(receipt.bet_id))
        );
        assert!(engine.conservation().balanced());
    }

    #[test]
    fn one_lost_leg_settles_at_once() {
        let mut engine = two_games();
        let receipt = engine
            .accept_express(express(vec![leg(1, 1), leg(2, 2)], tokens(100)))
            .unwrap();
        let liquidity = engine.total_liquidity();

        kickoff(&mut engine);
        engine
            .resolve_condition(OWNER, ConditionId(1), &[OutcomeId(2)])
            .unwrap();
        assert_eq!(engine.express_locked(), 0);
        // 5% house and 5% data provider, the affiliate share stays in the pool
        assert_eq!(engine.total_liquidity(), liquidity + tokens(90));
        assert_eq!(engine.fee_balance(HOUSE), tokens(5));
        assert_eq!(engine.fee_balance(OWNER), tokens(5));
        assert!(engine.events().iter().any(|event| matches!(
            &event.payload,
            EventPayload::ExpressSettled(settled)
                if settled.bet_id == receipt.bet_id && settled.owed == 0
        )));

        // the open leg resolving later changes nothing
        engine.set_time(Timestamp::from_millis(SECOND_KICKOFF));
        engine
            .resolve_condition(OWNER, ConditionId(2), &[OutcomeId(2)])
            .unwrap();
        assert_eq!(engine.total_liquidity(), liquidity + tokens(90));
        assert_eq!(engine.withdraw_payout(ALICE, receipt.bet_id).unwrap(), 0);
        assert!(engine.conservation().balanced());
    }

    #[test]
    fn canceled_leg_counts_as_even_odds() {
        let mut engine = two_games();
        let amount = tokens(100);
        let receipt = engine
            .accept_express(express(vec![leg(1, 1), leg(2, 2)], amount))
            .unwrap();
        let second = engine.get_express(receipt.bet_id).unwrap().legs[1].odds;

        engine.cancel_game(OWNER, GameId(1)).unwrap();
        assert_eq!(engine.express_locked(), receipt.locked);

        engine.set_time(Timestamp::from_millis(SECOND_KICKOFF));
        engine
            .resolve_condition(OWNER, ConditionId(2), &[OutcomeId(2)])
            .unwrap();
        let owed = second.mul_amount(amount).unwrap();
        assert!(owed < receipt.payout);
        assert_eq!(engine.express_locked(), 0);
        assert_eq!(engine.withdraw_payout(ALICE, receipt.bet_id).unwrap(), owed);
        assert!(engine.conservation().balanced());
    }

    #[test]
    fn every_leg_canceled_refunds_the_stake() {
        let mut engine = two_games();
        let receipt = engine
            .accept_express(express(vec![leg(1, 2), leg(2, 1)], tokens(40)))
            .unwrap();
        let liquidity = engine.total_liquidity();

        engine.cancel_condition(OWNER, ConditionId(1)).unwrap();
        engine.cancel_condition(OWNER, ConditionId(2)).unwrap();
        assert_eq!(engine.total_liquidity(), liquidity);
        assert_eq!(engine.locked_liquidity(), 0);
        assert_eq!(engine.withdraw_payout(ALICE, receipt.bet_id).unwrap(), tokens(40));
        assert!(engine.conservation().balanced());
    }
}
