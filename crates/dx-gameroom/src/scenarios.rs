//! End-to-end hand scenarios driven straight through the runtime's
//! command surface, no store attached.

use super::*;
use dx_database::Scene;
use dx_database::TableRow;
use dx_settle::PlayerResult;
use serde_json::json;

fn scene(bobo: bool) -> Scene {
    Scene {
        id: 10,
        name: "chexuan".into(),
        seat_count: 2,
        min_in: 100,
        max_in: 0,
        base_pi: 10,
        min_unit_pi: 2,
        mango_enabled: true,
        bobo_enabled: bobo,
        distance_threshold_m: 0,
        status: "enabled".into(),
        rake_rule_id: 0,
    }
}

fn table() -> TableRow {
    TableRow {
        id: 77,
        scene_id: 10,
        status: "waiting".into(),
        seat_count: 2,
        mango_streak: 0,
        players: json!({
            "1": {"userId": 101, "alias": "alice", "chips": 500},
            "2": {"userId": 102, "alias": "bob", "chips": 500},
        }),
    }
}

fn runtime(bobo: bool) -> (TableRuntime, RuntimeHandle) {
    TableRuntime::new(None, &table(), &scene(bobo), 0, None)
}

fn net(results: &[PlayerResult], user: i64) -> i64 {
    results
        .iter()
        .find(|r| r.user_id == user)
        .map(|r| r.net_points)
        .expect("result for user")
}

async fn ready_both(rt: &mut TableRuntime) {
    rt.apply(101, Action::Ready).await.unwrap();
    rt.apply(102, Action::Ready).await.unwrap();
}

#[tokio::test]
async fn ready_up_collects_antes_and_opens_round_one() {
    let (mut rt, _handle) = runtime(false);
    assert_eq!(rt.phase, Phase::Waiting);
    ready_both(&mut rt).await;
    assert_eq!(rt.phase, Phase::Playing);
    assert_eq!(rt.round, 1);
    assert_eq!(rt.pot, 20);
    assert_eq!(rt.last_raise, 10);
    // banker is seat 1, so seat 2 opens
    assert_eq!(rt.turn_seat, 2);
    for seat in &rt.seats {
        assert_eq!(seat.chips, 490);
        assert_eq!(seat.contributed, 10);
        assert_eq!(seat.cards.len(), 2);
    }
}

#[tokio::test]
async fn wrong_turn_is_rejected_without_mutation() {
    let (mut rt, _handle) = runtime(false);
    ready_both(&mut rt).await;
    let before: Vec<_> = rt.seats.iter().map(|s| (s.chips, s.bet)).collect();
    // seat 1 (user 101) tries to act out of turn
    assert_eq!(rt.apply(101, Action::Call).await, Err(GameError::NotYourTurn));
    assert_eq!(rt.apply(999, Action::Call).await, Err(GameError::AccessDenied));
    let after: Vec<_> = rt.seats.iter().map(|s| (s.chips, s.bet)).collect();
    assert_eq!(before, after);
    assert_eq!(rt.phase, Phase::Playing);
}

#[tokio::test]
async fn opening_actor_cannot_raise_and_calls_double_ante() {
    let (mut rt, _handle) = runtime(false);
    ready_both(&mut rt).await;
    assert!(!rt.allowed_actions(102).contains(&"raise".to_string()));
    // opening raise must be exactly twice the ante
    assert_eq!(
        rt.apply(102, Action::Raise(50)).await,
        Err(GameError::FirstBetMustBeDouble)
    );
    rt.apply(102, Action::Call).await.unwrap();
    let opener = rt.find_seat(2).unwrap();
    assert_eq!(opener.bet, 20);
    assert_eq!(rt.last_raise, 20);
    assert!(rt.round1_bet);
}

#[tokio::test]
async fn liu_ju_refunds_and_bumps_streak() {
    let (mut rt, _handle) = runtime(false);
    ready_both(&mut rt).await;
    // round 1: opener calls to 20, seat 1 raises to 30, opener calls
    rt.apply(102, Action::Call).await.unwrap();
    rt.apply(101, Action::Raise(30)).await.unwrap();
    rt.apply(102, Action::Call).await.unwrap();
    assert_eq!(rt.round, 2);
    assert!(rt.seats.iter().all(|s| s.cards.len() == 3));
    // round 2: both pass
    rt.apply(102, Action::Pass).await.unwrap();
    rt.apply(101, Action::Pass).await.unwrap();

    assert_eq!(rt.phase, Phase::Ended);
    assert_eq!(rt.mango_streak, 1);
    let results = rt.results.clone().unwrap();
    assert!(results.iter().all(|r| r.net_points == 0));
    // every chip returned
    assert!(rt.seats.iter().all(|s| s.chips == 500));
}

#[tokio::test]
async fn streak_caps_at_three() {
    let (mut rt, _handle) = runtime(false);
    rt.mango_streak = 3;
    ready_both(&mut rt).await;
    rt.apply(102, Action::Call).await.unwrap();
    rt.apply(101, Action::Raise(30)).await.unwrap();
    rt.apply(102, Action::Call).await.unwrap();
    rt.apply(102, Action::Pass).await.unwrap();
    rt.apply(101, Action::Pass).await.unwrap();
    assert_eq!(rt.phase, Phase::Ended);
    assert_eq!(rt.mango_streak, 3);
}

#[tokio::test]
async fn timeout_auto_folds_and_settles_by_fold() {
    let (mut rt, _handle) = runtime(false);
    ready_both(&mut rt).await;
    rt.apply(102, Action::Call).await.unwrap();
    assert_eq!(rt.turn_seat, 1);
    // seat 1 owes 10 more with chips behind: timeout folds it
    rt.on_turn_timeout().await;
    assert_eq!(rt.find_seat(1).unwrap().status, SeatStatus::Folded);
    assert_eq!(rt.phase, Phase::Ended);
    let results = rt.results.clone().unwrap();
    assert_eq!(net(&results, 102), 10);
    assert_eq!(net(&results, 101), -10);
    assert_eq!(rt.mango_streak, 0);
}

#[tokio::test]
async fn timeout_auto_passes_when_bet_is_matched() {
    let (mut rt, _handle) = runtime(false);
    ready_both(&mut rt).await;
    rt.apply(102, Action::Call).await.unwrap();
    rt.apply(101, Action::Call).await.unwrap();
    // round 2, nothing owed: timeout passes instead of folding
    assert_eq!(rt.round, 2);
    let turn = rt.turn_seat;
    rt.on_turn_timeout().await;
    assert!(rt.find_seat(turn).unwrap().status.is_active());
}

#[tokio::test]
async fn matched_bet_allows_pass_and_call_is_noop() {
    let (mut rt, _handle) = runtime(false);
    ready_both(&mut rt).await;
    rt.apply(102, Action::Call).await.unwrap();
    rt.apply(101, Action::Call).await.unwrap();
    // round 2: seat 2 already matches lastRaise
    assert!(rt.can_pass(2));
    let chips_before = rt.find_seat(2).unwrap().chips;
    rt.apply(102, Action::Call).await.unwrap();
    assert_eq!(rt.find_seat(2).unwrap().chips, chips_before);
}

#[tokio::test]
async fn knock_shoves_and_fold_awards_tail_big() {
    let (mut rt, _handle) = runtime(true);
    ready_both(&mut rt).await;
    rt.apply(102, Action::Call).await.unwrap();
    rt.apply(101, Action::Call).await.unwrap();
    assert_eq!(rt.round, 2);
    // a raise in round 2 of a bobo scene coerces to the knock
    rt.apply(102, Action::Raise(5)).await.unwrap();
    assert!(rt.round2_knock);
    assert_eq!(rt.find_seat(2).unwrap().chips, 0);
    rt.apply(101, Action::Fold).await.unwrap();

    assert_eq!(rt.phase, Phase::Ended);
    let results = rt.results.clone().unwrap();
    // the aggressor collects the folder's whole contribution
    assert_eq!(net(&results, 102), 20);
    assert_eq!(net(&results, 101), -20);
    assert_eq!(rt.mango_streak, 0);
}

#[tokio::test]
async fn full_showdown_is_conservative_and_resets_streak() {
    let (mut rt, _handle) = runtime(false);
    rt.mango_streak = 2;
    ready_both(&mut rt).await;
    rt.apply(102, Action::Call).await.unwrap();
    rt.apply(101, Action::Call).await.unwrap();
    // round 2 betting forces a real showdown
    rt.apply(102, Action::Raise(30)).await.unwrap();
    rt.apply(101, Action::Call).await.unwrap();

    assert_eq!(rt.phase, Phase::Ended);
    assert_eq!(rt.round, 3);
    assert!(rt.seats.iter().all(|s| s.cards.len() == 4));
    let results = rt.results.clone().unwrap();
    assert_eq!(results.iter().map(|r| r.net_points).sum::<i64>(), 0);
    assert_eq!(rt.mango_streak, 0);
}

#[tokio::test]
async fn round_three_allows_only_fold() {
    let (mut rt, _handle) = runtime(false);
    ready_both(&mut rt).await;
    rt.round = 3;
    rt.turn_seat = 2;
    assert_eq!(rt.allowed_actions(102), vec!["fold".to_string()]);
}

#[tokio::test]
async fn subscriber_seqs_strictly_increase() {
    let (rt, handle) = runtime(false);
    tokio::spawn(rt.run());
    let mut rx = handle.subscribe(101).await.unwrap();
    handle.action(101, Action::Ready).await.unwrap();
    handle.action(102, Action::Ready).await.unwrap();
    handle.action(101, Action::Ping).await.unwrap();
    handle.stop().await;

    let mut seqs = Vec::new();
    while let Some(frame) = rx.recv().await {
        seqs.push(frame.seq);
    }
    assert!(seqs.len() >= 3);
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn rejoin_replays_state_to_caller_only() {
    let (rt, handle) = runtime(false);
    tokio::spawn(rt.run());
    let mut rx1 = handle.subscribe(101).await.unwrap();
    let mut rx2 = handle.subscribe(102).await.unwrap();
    // drain the subscribe snapshots
    let _ = rx1.recv().await;
    let _ = rx2.recv().await;
    handle.action(101, Action::Rejoin).await.unwrap();
    handle.stop().await;
    let got1 = rx1.recv().await;
    let got2 = rx2.recv().await;
    assert!(got1.is_some());
    assert!(got2.is_none());
}

#[tokio::test]
async fn stopped_runtime_cancels_pending_commands() {
    let (rt, handle) = runtime(false);
    tokio::spawn(rt.run());
    handle.stop().await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(matches!(
        handle.action(101, Action::Ping).await,
        Err(GameError::Cancelled)
    ));
}
