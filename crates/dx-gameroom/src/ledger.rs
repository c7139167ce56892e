use super::*;
use dx_cards::compare;
use dx_cards::best_split;
use dx_cards::Code;
use dx_cards::Contender;
use dx_core::Points;
use dx_core::UserId;
use dx_settle::PlayerResult;
use std::collections::HashMap;

/// One seat entering the showdown: its evaluated hand plus the hand
/// contribution it is playing for.
#[derive(Debug, Clone)]
pub struct Participant {
    pub seat: usize,
    pub user: UserId,
    /// Total chips this seat moved into the pot this hand.
    pub bet: Points,
    pub contender: Contender,
}

/// Sorts for settlement: live hands first, valid before daoba, then head
/// score, head max rank, tail score, all descending.
pub fn sort_participants(participants: &mut [Participant]) {
    participants.sort_by(|a, b| {
        let ca = &a.contender;
        let cb = &b.contender;
        ca.folded
            .cmp(&cb.folded)
            .then(ca.invalid.cmp(&cb.invalid))
            .then(cb.head_score.cmp(&ca.head_score))
            .then(cb.head_max.cmp(&ca.head_max))
            .then(cb.tail_score.cmp(&ca.tail_score))
    });
}

/// Pairwise settlement: for every non-tied pair the loser pays
/// `min(bet_a, bet_b)` to the winner.
pub fn pairwise_ledger(participants: &[Participant]) -> HashMap<UserId, Points> {
    let mut ledger: HashMap<UserId, Points> =
        participants.iter().map(|p| (p.user, 0)).collect();
    for i in 0..participants.len() {
        for j in (i + 1)..participants.len() {
            let a = &participants[i];
            let b = &participants[j];
            let outcome = compare(&a.contender, &b.contender);
            if outcome == 0 {
                continue;
            }
            let amount = a.bet.min(b.bet);
            if amount <= 0 {
                continue;
            }
            let (winner, loser) = if outcome > 0 { (a, b) } else { (b, a) };
            *ledger.entry(winner.user).or_insert(0) += amount;
            *ledger.entry(loser.user).or_insert(0) -= amount;
        }
    }
    ledger
}

/// Head-big protection: the top-sorted live participant never loses more
/// than `floor` (a negative bound). The shortfall is recovered from
/// positive entries in participant order, so the ledger stays
/// conservative.
pub fn protect_head_big(
    participants: &[Participant],
    ledger: &mut HashMap<UserId, Points>,
    floor: Points,
) {
    let Some(top) = participants.first() else {
        return;
    };
    if top.contender.folded || top.contender.invalid {
        return;
    }
    let net = ledger.get(&top.user).copied().unwrap_or(0);
    if net >= floor {
        return;
    }
    let mut shortfall = floor - net;
    ledger.insert(top.user, floor);
    for p in participants.iter().skip(1) {
        if shortfall == 0 {
            break;
        }
        let entry = ledger.entry(p.user).or_insert(0);
        if *entry <= 0 {
            continue;
        }
        let take = (*entry).min(shortfall);
        *entry -= take;
        shortfall -= take;
    }
}

/// Mango payout rider: the winner (largest net) additionally collects
/// `value`, funded pro-rata from the other entries with the integer
/// remainder taken from the first loser.
pub fn apply_mango_rider(results: &mut [PlayerResult], value: Points, streak_pre: i32) {
    if value <= 0 || results.len() < 2 {
        return;
    }
    let winner = results
        .iter()
        .enumerate()
        .max_by_key(|(_, r)| r.net_points)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let losers: Vec<usize> = (0..results.len()).filter(|&i| i != winner).collect();
    let share = value / losers.len() as Points;
    let remainder = value - share * losers.len() as Points;
    for (pos, &i) in losers.iter().enumerate() {
        results[i].net_points -= share;
        if pos == 0 {
            results[i].net_points -= remainder;
        }
    }
    results[winner].net_points += value;
    let meta = ensure_meta(&mut results[winner]);
    meta.insert("mangoValue".into(), serde_json::json!(value));
    meta.insert("mangoStreak".into(), serde_json::json!(streak_pre));
}

fn ensure_meta(result: &mut PlayerResult) -> &mut serde_json::Map<String, serde_json::Value> {
    if !result.meta.is_object() {
        result.meta = serde_json::Value::Object(serde_json::Map::new());
    }
    result.meta.as_object_mut().expect("meta is an object")
}

impl TableRuntime {
    /// Produces the hand ledger once the phase reaches `settling`.
    pub(crate) async fn settle_hand(&mut self) {
        if self.chexuan_mode {
            self.settle_chexuan().await;
        } else {
            self.settle_simple().await;
        }
    }

    /// Chexuan settlement: evaluate splits, run the pairwise showdown with
    /// the tail-big override and head-big protection, then the mango rider.
    pub(crate) async fn settle_chexuan(&mut self) {
        let mut participants: Vec<Participant> = Vec::with_capacity(self.seats.len());
        for i in 0..self.seats.len() {
            let seat = &self.seats[i];
            if seat.status == SeatStatus::Eliminated || seat.user == 0 {
                continue;
            }
            let participant = if seat.status == SeatStatus::Folded {
                Participant {
                    seat: seat.index,
                    user: seat.user,
                    bet: seat.contributed,
                    contender: Contender::folded(),
                }
            } else {
                let codes = parse_codes(&seat.cards);
                let contender = Contender::evaluate(&codes);
                let split_view = match contender.sanhua {
                    true => None,
                    false => best_split(&codes).map(|split| SplitView {
                        head: split.head.iter().map(|c| c.poker_code().into()).collect(),
                        tail: split.tail.iter().map(|c| c.poker_code().into()).collect(),
                        is_daoba: !split.valid,
                    }),
                };
                let participant = Participant {
                    seat: seat.index,
                    user: seat.user,
                    bet: seat.contributed,
                    contender,
                };
                self.seats[i].split = split_view;
                participant
            };
            participants.push(participant);
        }
        if participants.is_empty() {
            self.finish(Vec::new()).await;
            return;
        }
        sort_participants(&mut participants);

        // tail big eats skin: the round-2 aggressor collects every other
        // seat's full contribution, bypassing the showdown
        if self.tail_big_win && self.last_agg_seat != 0 {
            if let Some(winner) = self.find_seat(self.last_agg_seat).map(|s| s.user) {
                let mut ledger: HashMap<UserId, Points> =
                    participants.iter().map(|p| (p.user, 0)).collect();
                let mut total = 0;
                for seat in &self.seats {
                    if seat.user == 0 || seat.user == winner {
                        continue;
                    }
                    ledger.insert(seat.user, -seat.contributed);
                    total += seat.contributed;
                }
                ledger.insert(winner, total);
                let mut results = results_from_ledger(&participants, &ledger);
                self.apply_mango(&mut results);
                self.apply_chip_updates(&results);
                self.finish(results).await;
                return;
            }
        }

        let mut ledger = pairwise_ledger(&participants);
        let floor = -(self.mango_streak as Points * 2 * self.base_pi + self.base_pi);
        protect_head_big(&participants, &mut ledger, floor);

        let mut results = results_from_ledger(&participants, &ledger);
        self.apply_mango(&mut results);
        self.apply_chip_updates(&results);
        self.finish(results).await;
    }

    /// Non-Chexuan settlement: fold-win or highest simple score collects
    /// every other contribution.
    pub(crate) async fn settle_simple(&mut self) {
        let active = self.active_seats();
        if active.is_empty() {
            self.finish(Vec::new()).await;
            return;
        }
        let mut results = Vec::new();
        if active.len() == 1 {
            let winner_idx = active[0];
            let Some(winner) = self.find_seat(winner_idx).map(|s| s.user) else {
                self.finish(Vec::new()).await;
                return;
            };
            let mut won = 0;
            for seat in &self.seats {
                if seat.index == winner_idx || seat.user == 0 {
                    continue;
                }
                if seat.contributed > 0 {
                    results.push(PlayerResult::new(seat.user, -seat.contributed));
                    won += seat.contributed;
                }
            }
            let mut record = PlayerResult::new(winner, won);
            record.meta = serde_json::json!({"winType": "fold_win"});
            results.push(record);
        } else {
            let mut scored: Vec<(usize, UserId, i64, Points)> = active
                .iter()
                .filter_map(|&idx| self.find_seat(idx))
                .map(|seat| {
                    (
                        seat.index,
                        seat.user,
                        dx_cards::poker::evaluate(&seat.cards),
                        seat.contributed,
                    )
                })
                .collect();
            scored.sort_by(|a, b| b.2.cmp(&a.2));
            let (winner_idx, winner, winner_score, _) = scored[0];
            let mut won = 0;
            for &(_, user, score, contributed) in scored.iter().skip(1) {
                let mut record = PlayerResult::new(user, -contributed);
                record.meta = serde_json::json!({"score": score});
                results.push(record);
                won += contributed;
            }
            for seat in &self.seats {
                if seat.status == SeatStatus::Folded && seat.contributed > 0 && seat.user != 0 {
                    results.push(PlayerResult::new(seat.user, -seat.contributed));
                    won += seat.contributed;
                }
            }
            let mut record = PlayerResult::new(winner, won);
            record.meta = serde_json::json!({
                "score": winner_score,
                "winType": "showdown",
                "seat": winner_idx,
            });
            results.push(record);
        }
        self.apply_mango(&mut results);
        self.apply_chip_updates(&results);
        self.finish(results).await;
    }

    /// Liu-ju: round 1 saw betting but round 2 stayed quiet. No winner,
    /// every contribution refunds, and the streak advances (capped at 3).
    pub(crate) async fn settle_mango(&mut self) {
        let mut results = Vec::new();
        for seat in &self.seats {
            if seat.user == 0 {
                continue;
            }
            let mut record = PlayerResult::new(seat.user, 0);
            if seat.contributed > 0 {
                record.meta = serde_json::json!({"reason": "mango_refund"});
            }
            results.push(record);
        }
        self.mango_streak = (self.mango_streak + 1).min(3);
        if let Some(first) = results.first_mut() {
            let meta = ensure_meta(first);
            meta.insert("mangoEvent".into(), serde_json::json!("liuju"));
            meta.insert("mangoStreak".into(), serde_json::json!(self.mango_streak));
        }
        self.append_log("hand voided, bets refunded".into());
        self.apply_chip_updates(&results);
        self.finish(results).await;
    }

    /// Mango rider plus the streak reset shared by every normal (non
    /// liu-ju) settlement path.
    pub(crate) fn apply_mango(&mut self, results: &mut Vec<PlayerResult>) {
        let pre = self.mango_streak;
        let bet_happened = self.round1_bet
            || self.raised_round1
            || self.round2_bet
            || self.raised_round2
            || self.round2_knock;
        if self.base_pi > 0 && bet_happened {
            let value = pre as Points * 2 * self.base_pi;
            apply_mango_rider(results, value, pre);
        }
        self.mango_streak = 0;
    }

    /// Replays ledger outcomes onto the in-memory stacks for display:
    /// each seat gets back its contribution plus its net.
    pub(crate) fn apply_chip_updates(&mut self, results: &[PlayerResult]) {
        for result in results {
            if result.user_id == 0 {
                continue;
            }
            if let Some(seat) = self.seats.iter_mut().find(|s| s.user == result.user_id) {
                let returned = seat.contributed + result.net_points;
                if returned > 0 {
                    seat.chips += returned;
                }
            }
        }
    }

    /// Latches the runtime to `ended`, broadcasts the final state, and
    /// hands the ledger to the registry's finisher exactly once.
    pub(crate) async fn finish(&mut self, results: Vec<PlayerResult>) {
        self.phase = Phase::Ended;
        self.turn_seat = 0;
        self.timer.clear();
        self.results = Some(results.clone());
        self.broadcast_state();
        if let Some(finish) = self.on_finish.take() {
            let _ = finish.send(FinishReport {
                table_id: self.table_id,
                match_id: self.match_id,
                scene_id: self.scene_id,
                mango_streak: self.mango_streak,
                results,
            });
        }
    }
}

fn parse_codes(cards: &[String]) -> Vec<Code> {
    cards
        .iter()
        .filter_map(|raw| Code::try_from(raw.as_str()).ok())
        .collect()
}

/// Ledger entries in participant order, so result rows are deterministic.
fn results_from_ledger(
    participants: &[Participant],
    ledger: &HashMap<UserId, Points>,
) -> Vec<PlayerResult> {
    participants
        .iter()
        .map(|p| PlayerResult::new(p.user, ledger.get(&p.user).copied().unwrap_or(0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(user: UserId, bet: Points, head: i64, tail: i64) -> Participant {
        Participant {
            seat: user as usize,
            user,
            bet,
            contender: Contender {
                head_score: head,
                tail_score: tail,
                head_max: head % 1000,
                ..Contender::default()
            },
        }
    }

    #[test]
    fn pairwise_transfers_min_bet() {
        let participants = vec![live(1, 100, 900, 500), live(2, 60, 800, 400)];
        let ledger = pairwise_ledger(&participants);
        assert_eq!(ledger[&1], 60);
        assert_eq!(ledger[&2], -60);
    }

    #[test]
    fn pairwise_is_conservative() {
        let mut participants = vec![
            live(1, 100, 900, 500),
            live(2, 80, 850, 450),
            live(3, 60, 800, 400),
        ];
        sort_participants(&mut participants);
        let ledger = pairwise_ledger(&participants);
        assert_eq!(ledger.values().sum::<Points>(), 0);
    }

    #[test]
    fn ties_move_nothing() {
        let participants = vec![live(1, 100, 900, 400), live(2, 100, 800, 500)];
        let ledger = pairwise_ledger(&participants);
        assert_eq!(ledger[&1], 0);
        assert_eq!(ledger[&2], 0);
    }

    #[test]
    fn sort_puts_folded_and_daoba_last() {
        let folded = Participant {
            seat: 3,
            user: 3,
            bet: 10,
            contender: Contender::folded(),
        };
        let daoba = Participant {
            seat: 2,
            user: 2,
            bet: 10,
            contender: Contender {
                invalid: true,
                head_score: 9_999,
                ..Contender::default()
            },
        };
        let mut participants = vec![folded, daoba, live(1, 10, 100, 50)];
        sort_participants(&mut participants);
        assert_eq!(participants[0].user, 1);
        assert_eq!(participants[1].user, 2);
        assert_eq!(participants[2].user, 3);
    }

    #[test]
    fn head_big_floor_holds_and_conserves() {
        let mut participants = vec![
            live(1, 300, 900, 100),
            live(2, 300, 850, 450),
            live(3, 300, 800, 400),
        ];
        sort_participants(&mut participants);
        let mut ledger = HashMap::from([(1, -200), (2, 150), (3, 50)]);
        // streak 1, basePi 10: floor = -(1*2*10 + 10) = -30
        protect_head_big(&participants, &mut ledger, -30);
        assert_eq!(ledger[&1], -30);
        assert_eq!(ledger.values().sum::<Points>(), 0);
        assert!(ledger[&2] >= 0 && ledger[&3] >= 0);
    }

    #[test]
    fn head_big_skips_daoba_top() {
        let daoba = Participant {
            seat: 1,
            user: 1,
            bet: 100,
            contender: Contender {
                invalid: true,
                ..Contender::default()
            },
        };
        let participants = vec![daoba];
        let mut ledger = HashMap::from([(1, -500)]);
        protect_head_big(&participants, &mut ledger, -30);
        assert_eq!(ledger[&1], -500);
    }

    #[test]
    fn mango_rider_pro_rata_with_remainder() {
        let mut results = vec![
            PlayerResult::new(1, 100),
            PlayerResult::new(2, -40),
            PlayerResult::new(3, -60),
        ];
        // streak 2, basePi 10 -> value 40; 40/2=20 each, no remainder
        apply_mango_rider(&mut results, 40, 2);
        assert_eq!(results[0].net_points, 140);
        assert_eq!(results[1].net_points, -60);
        assert_eq!(results[2].net_points, -80);
        assert_eq!(results.iter().map(|r| r.net_points).sum::<Points>(), 0);
        assert_eq!(results[0].meta["mangoValue"], 40);

        let mut odd = vec![
            PlayerResult::new(1, 90),
            PlayerResult::new(2, -30),
            PlayerResult::new(3, -30),
            PlayerResult::new(4, -30),
        ];
        // value 50 across 3 losers: 16 each, remainder 2 on the first
        apply_mango_rider(&mut odd, 50, 1);
        assert_eq!(odd[0].net_points, 140);
        assert_eq!(odd[1].net_points, -48);
        assert_eq!(odd[2].net_points, -46);
        assert_eq!(odd[3].net_points, -46);
        assert_eq!(odd.iter().map(|r| r.net_points).sum::<Points>(), 0);
    }
}
