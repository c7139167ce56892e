use super::*;
use dx_core::Points;
use dx_core::UserId;

impl TableRuntime {
    pub(crate) async fn handle_ready(
        &mut self,
        seat_idx: usize,
        user: UserId,
    ) -> Result<(), GameError> {
        if self.phase != Phase::Waiting && self.phase != Phase::Playing {
            return Err(GameError::InvalidPhase);
        }
        let Some(seat) = self.find_seat_mut(seat_idx) else {
            return Err(GameError::InvalidSeat);
        };
        if !seat.ready {
            seat.ready = true;
            self.log_action(seat_idx, "is ready");
            log::debug!("[table {}] user {} ready", self.table_id, user);
        }
        if self.all_ready() {
            self.start_hand().await;
        }
        self.broadcast_state();
        Ok(())
    }

    pub(crate) async fn handle_turn_action(
        &mut self,
        seat_idx: usize,
        action: Action,
    ) -> Result<(), GameError> {
        if self.phase != Phase::Playing {
            return Err(GameError::InvalidPhase);
        }
        if self.turn_seat != seat_idx {
            return Err(GameError::NotYourTurn);
        }
        if self.timer.expired() {
            return Err(GameError::TurnExpired);
        }
        let Some(seat) = self.find_seat(seat_idx) else {
            return Err(GameError::InvalidSeat);
        };
        if !seat.status.is_active() {
            return Err(GameError::InvalidSeat);
        }

        match action {
            Action::Fold => {
                self.fold_seat(seat_idx);
                self.persist_action(entry(seat_idx, "fold", None)).await;
            }
            Action::Pass => {
                if !self.can_pass(seat_idx) {
                    return Err(GameError::CannotPass);
                }
                self.mark_acted(seat_idx);
                self.log_action(seat_idx, "passes");
                self.persist_action(entry(seat_idx, "pass", None)).await;
            }
            Action::Call => {
                self.handle_call(seat_idx)?;
                self.persist_action(entry(seat_idx, "call", None)).await;
            }
            Action::Raise(amount) => {
                self.handle_raise(seat_idx, amount).await?;
                self.persist_action(entry(seat_idx, "raise", Some(amount)))
                    .await;
            }
            Action::KnockBobo => {
                self.handle_knock(seat_idx, "manual_knock").await?;
            }
            _ => return Err(GameError::UnsupportedAction(action.name().into())),
        }

        self.progress().await;
        Ok(())
    }

    /// The progression ladder evaluated after every state change:
    /// settle-by-fold, then round advancement, then turn rotation.
    pub(crate) async fn progress(&mut self) {
        if self.should_settle_by_fold() {
            if self.round == 2 && self.round2_bet {
                self.tail_big_win = true;
            }
            self.phase = Phase::Settling;
            self.settle_hand().await;
            return;
        }
        if self.should_advance_round() {
            self.advance_round().await;
            if self.phase != Phase::Settling && self.phase != Phase::Ended {
                self.broadcast_state();
            }
            return;
        }
        self.move_to_next_turn();
        if self.phase == Phase::Playing {
            self.broadcast_state();
        }
    }

    pub(crate) fn fold_seat(&mut self, seat_idx: usize) {
        if let Some(seat) = self.find_seat_mut(seat_idx) {
            seat.status = SeatStatus::Folded;
        }
        self.mark_acted(seat_idx);
        self.log_action(seat_idx, "folds");
    }

    pub(crate) fn handle_call(&mut self, seat_idx: usize) -> Result<(), GameError> {
        let target = self.required_call(seat_idx).max(self.last_raise);
        let round = self.round;
        let Some(seat) = self.find_seat_mut(seat_idx) else {
            return Err(GameError::InvalidSeat);
        };
        let diff = (target - seat.bet).clamp(0, seat.chips);
        seat.chips -= diff;
        seat.bet += diff;
        seat.contributed += diff;
        let bet = seat.bet;
        self.pot += diff;
        if diff > 0 {
            match round {
                1 => self.round1_bet = true,
                2 => self.round2_bet = true,
                _ => {}
            }
        }
        if bet > self.last_raise {
            self.last_raise = bet;
        }
        self.mark_acted(seat_idx);
        self.log_action(seat_idx, &format!("calls to {}", bet));
        Ok(())
    }

    pub(crate) async fn handle_raise(
        &mut self,
        seat_idx: usize,
        amount: Points,
    ) -> Result<(), GameError> {
        // a raise in round 2 of a bobo scene is the knock
        if self.round == 2 && self.bobo_enabled && !self.round2_knock {
            return self.handle_knock(seat_idx, "raise_in_round2").await;
        }
        if amount <= 0 {
            if self.bobo_enabled {
                return self.handle_knock(seat_idx, "invalid_raise").await;
            }
            return Err(GameError::AmountRequired);
        }
        if self.round == 1 {
            let threshold = match self.min_unit_pi * 5 {
                0 => self.base_pi * 5,
                t => t,
            };
            if amount < threshold {
                return Err(GameError::RaiseBelowMinimum);
            }
            if self.round_acted.is_empty() && seat_idx == self.first_actor_seat() {
                let expect = self.base_pi * 2;
                if expect > 0 && amount != expect {
                    return Err(GameError::FirstBetMustBeDouble);
                }
            }
        }
        if amount < self.min_raise() {
            if self.bobo_enabled {
                return self.handle_knock(seat_idx, "invalid_raise").await;
            }
            return Err(GameError::RaiseBelowMinimum);
        }
        let round = self.round;
        let Some(seat) = self.find_seat_mut(seat_idx) else {
            return Err(GameError::InvalidSeat);
        };
        let diff = amount - seat.bet;
        if diff <= 0 {
            if self.bobo_enabled {
                return self.handle_knock(seat_idx, "invalid_raise").await;
            }
            return Err(GameError::RaiseMustIncrease);
        }
        if seat.chips < diff {
            return Err(GameError::InsufficientChips);
        }
        seat.chips -= diff;
        seat.bet = amount;
        seat.contributed += diff;
        self.pot += diff;
        self.last_raise = amount;
        self.last_agg_seat = seat_idx;
        self.first_raise_done = true;
        match round {
            1 => {
                self.raised_round1 = true;
                self.round1_bet = true;
            }
            2 => {
                self.raised_round2 = true;
                self.round2_bet = true;
            }
            _ => {}
        }
        self.reset_round_acted(seat_idx);
        self.log_action(seat_idx, &format!("raises to {}", amount));
        Ok(())
    }

    /// The knock: shove every remaining chip. Treated as a maximal raise,
    /// so everyone else must respond again.
    pub(crate) async fn handle_knock(
        &mut self,
        seat_idx: usize,
        reason: &str,
    ) -> Result<(), GameError> {
        if !self.bobo_enabled {
            return Err(GameError::KnockDisabled);
        }
        let Some(seat) = self.find_seat_mut(seat_idx) else {
            return Err(GameError::InvalidSeat);
        };
        let diff = seat.chips;
        if diff > 0 {
            seat.chips = 0;
            seat.bet += diff;
            seat.contributed += diff;
            self.pot += diff;
        }
        let bet = self.find_seat(seat_idx).map(|s| s.bet).unwrap_or(0);
        self.last_raise = bet;
        self.last_agg_seat = seat_idx;
        self.round2_knock = true;
        self.round2_bet = true;
        self.raised_round2 = true;
        self.reset_round_acted(seat_idx);
        self.log_action(seat_idx, "knocks bobo");
        self.persist_action(entry_with_meta(
            seat_idx,
            "knock_bobo",
            None,
            serde_json::json!({"reason": reason}),
        ))
        .await;
        Ok(())
    }

    pub(crate) fn move_to_next_turn(&mut self) {
        let next = self.next_active_after(self.turn_seat);
        if next == 0 {
            return;
        }
        self.turn_seat = next;
        self.timer.start_turn();
    }

    /// Turn expiry: auto-pass when legal, else auto-fold, then re-run the
    /// progression ladder.
    pub(crate) async fn on_turn_timeout(&mut self) {
        self.timer.clear();
        if self.phase != Phase::Playing {
            return;
        }
        log::warn!(
            "[table {}] turn timeout on seat {}",
            self.table_id,
            self.turn_seat
        );
        let seat_idx = self.turn_seat;
        if self.can_pass(seat_idx) {
            self.mark_acted(seat_idx);
            self.log_action(seat_idx, "passes (timeout)");
            self.persist_action(entry(seat_idx, "auto_pass", None)).await;
        } else {
            if let Some(seat) = self.find_seat_mut(seat_idx) {
                seat.status = SeatStatus::Folded;
            }
            self.mark_acted(seat_idx);
            self.log_action(seat_idx, "folds (timeout)");
            self.persist_action(entry(seat_idx, "auto_fold", None)).await;
        }
        self.progress().await;
    }
}

fn entry(seat: usize, action: &str, amount: Option<Points>) -> RoundLogEntry {
    RoundLogEntry {
        seq: 0,
        ts: 0,
        action: action.to_string(),
        seat,
        amount,
        meta: None,
    }
}

fn entry_with_meta(
    seat: usize,
    action: &str,
    amount: Option<Points>,
    meta: serde_json::Value,
) -> RoundLogEntry {
    RoundLogEntry {
        seq: 0,
        ts: 0,
        action: action.to_string(),
        seat,
        amount,
        meta: Some(meta),
    }
}
