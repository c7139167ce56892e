use super::*;
use rand::seq::SliceRandom;

impl TableRuntime {
    /// Enters `playing`, resets the hand bookkeeping, collects antes, and
    /// advances into round 1 (which deals the two hole cards).
    pub(crate) async fn start_hand(&mut self) {
        self.phase = Phase::Playing;
        self.round = 0;
        self.pot = 0;
        self.last_raise = 0;
        self.round_acted.clear();
        self.first_raise_done = false;
        self.raised_round1 = false;
        self.raised_round2 = false;
        self.round1_bet = false;
        self.round2_bet = false;
        self.round2_knock = false;
        self.last_agg_seat = 0;
        self.tail_big_win = false;
        self.results = None;
        for seat in &mut self.seats {
            seat.bet = 0;
            seat.contributed = 0;
            seat.split = None;
            if seat.status != SeatStatus::Eliminated {
                seat.status = SeatStatus::Playing;
            }
        }
        self.init_deck();
        self.apply_antes();
        if self.banker_seat == 0 {
            self.banker_seat = self.first_active_seat();
        }
        self.append_log("hand starts".into());
        self.advance_round().await;
    }

    /// Every live seat antes `basePi`, clamped to its stack.
    pub(crate) fn apply_antes(&mut self) {
        if self.base_pi <= 0 {
            return;
        }
        let mut collected = 0;
        for seat in &mut self.seats {
            if !seat.status.is_active() {
                continue;
            }
            let ante = self.base_pi.min(seat.chips);
            if ante <= 0 {
                continue;
            }
            seat.chips -= ante;
            seat.bet += ante;
            seat.contributed += ante;
            collected += ante;
        }
        self.pot += collected;
        if self.last_raise < self.base_pi {
            self.last_raise = self.base_pi;
        }
    }

    pub(crate) fn init_deck(&mut self) {
        if self.chexuan_mode {
            self.deck = dx_cards::deck().iter().map(|c| c.to_string()).collect();
            return;
        }
        let mut deck = Vec::with_capacity(52);
        for suit in ["s", "h", "d", "c"] {
            for rank in [
                "2", "3", "4", "5", "6", "7", "8", "9", "T", "J", "Q", "K", "A",
            ] {
                deck.push(format!("{}{}", rank, suit));
            }
        }
        deck.shuffle(&mut rand::rng());
        self.deck = deck;
    }

    /// Two cards at the initial deal; one more per active seat in Chexuan
    /// mode when leaving rounds 1 and 2.
    pub(crate) fn should_deal(&self) -> bool {
        self.round == 0 || (self.chexuan_mode && (self.round == 1 || self.round == 2))
    }

    /// Deals in ascending seat order, one card per pass.
    pub(crate) fn deal_cards(&mut self) {
        let count = match self.round {
            0 => {
                for seat in &mut self.seats {
                    seat.cards.clear();
                }
                2
            }
            1 | 2 if self.chexuan_mode => 1,
            _ => return,
        };
        let active = self.active_seats();
        for _ in 0..count {
            for &index in &active {
                let Some(card) = self.deck.first().cloned() else {
                    return;
                };
                self.deck.remove(0);
                if let Some(seat) = self.find_seat_mut(index) {
                    seat.cards.push(card);
                }
            }
        }
    }

    /// Closes the current round and opens the next: deal, detect liu-ju on
    /// the 2→3 transition, settle at round 3, otherwise hand the turn to
    /// the first actor and arm the timer.
    pub(crate) async fn advance_round(&mut self) {
        if self.phase == Phase::Playing && self.should_deal() {
            self.deal_cards();
        }
        self.round += 1;
        self.round_acted.clear();
        if self.phase != Phase::Playing {
            return;
        }

        if self.chexuan_mode && self.round == 3 && self.round1_bet && !self.round2_bet {
            // liu-ju: round 1 saw chips but round 2 stayed quiet
            self.phase = Phase::Settling;
            self.settle_mango().await;
            return;
        }

        if self.round >= 3 {
            self.phase = Phase::Settling;
            self.turn_seat = 0;
            self.settle_hand().await;
            return;
        }

        self.turn_seat = self.first_actor_seat();
        if self.turn_seat == 0 {
            self.phase = Phase::Settling;
            self.settle_hand().await;
            return;
        }
        if self.round == 1 && self.last_raise == 0 && self.base_pi > 0 {
            self.last_raise = self.base_pi;
        }
        self.persist_round_start().await;
        self.timer.start_turn();
    }
}
