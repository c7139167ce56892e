use super::*;
use dx_core::Points;
use dx_core::UserId;

impl TableRuntime {
    pub(crate) fn find_seat(&self, index: usize) -> Option<&SeatState> {
        self.seats.iter().find(|s| s.index == index)
    }

    pub(crate) fn find_seat_mut(&mut self, index: usize) -> Option<&mut SeatState> {
        self.seats.iter_mut().find(|s| s.index == index)
    }

    /// Non-folded, non-eliminated seat indices, ascending.
    pub(crate) fn active_seats(&self) -> Vec<usize> {
        self.seats
            .iter()
            .filter(|s| s.status.is_active())
            .map(|s| s.index)
            .collect()
    }

    pub(crate) fn first_active_seat(&self) -> usize {
        self.active_seats().first().copied().unwrap_or(0)
    }

    /// Next active seat after `index`, cyclic. 0 when nobody is active.
    pub(crate) fn next_active_after(&self, index: usize) -> usize {
        let active = self.active_seats();
        if active.is_empty() {
            return 0;
        }
        if index == 0 {
            return active[0];
        }
        match active.iter().position(|&s| s == index) {
            Some(pos) => active[(pos + 1) % active.len()],
            None => active[0],
        }
    }

    /// First actor of each round: the active seat after the banker.
    pub(crate) fn first_actor_seat(&self) -> usize {
        let start = match self.banker_seat {
            0 => self.first_active_seat(),
            banker => banker,
        };
        self.next_active_after(start)
    }

    pub(crate) fn all_ready(&self) -> bool {
        !self.seats.is_empty() && self.seats.iter().all(|s| s.ready)
    }

    /// A seat may pass when its bet already matches the raise level or it
    /// has no chips left. Round 3 closes betting entirely.
    pub(crate) fn can_pass(&self, index: usize) -> bool {
        if self.round >= 3 {
            return false;
        }
        self.find_seat(index)
            .map(|seat| seat.bet >= self.last_raise || seat.chips == 0)
            .unwrap_or(false)
    }

    /// Amount a call must bring the seat's bet to. The opening actor of
    /// round 1 owes twice the ante.
    pub(crate) fn required_call(&self, index: usize) -> Points {
        let mut amount = self.last_raise;
        if self.round == 1 && self.round_acted.is_empty() && index == self.first_actor_seat() {
            amount = amount.max(self.base_pi * 2);
        }
        amount
    }

    /// Minimum legal raise target: the raise unit above the current level,
    /// with an opening-raise floor in round 1.
    pub(crate) fn min_raise(&self) -> Points {
        let mut min = self.last_raise + self.min_unit_pi;
        let threshold = match self.min_unit_pi * 5 {
            0 => self.base_pi * 5,
            t => t,
        };
        if self.round == 1 && !self.first_raise_done && threshold > min {
            min = threshold;
        }
        if self.min_unit_pi > 0 && min < self.min_unit_pi {
            min = self.min_unit_pi;
        }
        min
    }

    pub(crate) fn mark_acted(&mut self, index: usize) {
        self.round_acted.insert(index);
    }

    /// After a raise everyone else must respond again; the raiser has
    /// already acted.
    pub(crate) fn reset_round_acted(&mut self, raiser: usize) {
        self.round_acted.clear();
        if raiser != 0 {
            self.round_acted.insert(raiser);
        }
    }

    /// A round ends once every active seat has acted and either matches
    /// the raise level or is out of chips.
    pub(crate) fn should_advance_round(&self) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        if self.round >= 3 {
            return true;
        }
        let active = self.active_seats();
        if active.len() <= 1 {
            return true;
        }
        active.iter().all(|&index| {
            let Some(seat) = self.find_seat(index) else {
                return true;
            };
            (seat.bet >= self.last_raise || seat.chips == 0) && self.round_acted.contains(&index)
        })
    }

    pub(crate) fn should_settle_by_fold(&self) -> bool {
        self.active_seats().len() == 1
    }

    /// Actions this viewer may submit right now. Empty when it is not
    /// their turn (or not their table).
    pub(crate) fn allowed_actions(&self, user: UserId) -> Vec<String> {
        let Some(&index) = self.seat_by_user.get(&user) else {
            return Vec::new();
        };
        match self.phase {
            Phase::Waiting => {
                match self.find_seat(index).map(|s| s.ready).unwrap_or(true) {
                    true => Vec::new(),
                    false => vec!["ready".into()],
                }
            }
            Phase::Playing => {
                if self.turn_seat != index {
                    return Vec::new();
                }
                let Some(seat) = self.find_seat(index) else {
                    return Vec::new();
                };
                if !seat.status.is_active() {
                    return Vec::new();
                }
                if self.round >= 3 {
                    return vec!["fold".into()];
                }
                if self.round2_knock {
                    return vec!["fold".into(), "call".into()];
                }
                let mut actions = vec!["fold".to_string()];
                if self.can_pass(index) {
                    actions.push("pass".into());
                } else {
                    actions.push("call".into());
                }
                let first_actor = self.round == 1
                    && self.round_acted.is_empty()
                    && index == self.first_actor_seat();
                if self.round == 1 && seat.chips > 0 && !first_actor {
                    actions.push("raise".into());
                }
                if self.round == 2 {
                    if self.bobo_enabled {
                        actions.push("knock_bobo".into());
                    } else if seat.chips > 0 {
                        actions.push("raise".into());
                    }
                } else if self.round == 1 && self.bobo_enabled {
                    actions.push("knock_bobo".into());
                }
                actions
            }
            Phase::Settling | Phase::Ended => Vec::new(),
        }
    }
}
