use super::*;
use dx_core::Points;
use dx_core::UserId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatStatus {
    Waiting,
    Playing,
    Folded,
    Eliminated,
}

impl SeatStatus {
    /// Still competing for the pot this hand.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Waiting | Self::Playing)
    }
    pub fn name(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::Folded => "folded",
            Self::Eliminated => "eliminated",
        }
    }
}

/// Runtime seat state, owned exclusively by the table actor.
///
/// `bet` is the level matched against `lastRaise` within the hand;
/// `contributed` is the monotone total of chips moved into the pot this
/// hand (antes included) and is what every settlement ledger reads.
#[derive(Debug, Clone)]
pub struct SeatState {
    pub index: usize,
    pub user: UserId,
    pub alias: String,
    pub chips: Points,
    pub bet: Points,
    pub contributed: Points,
    pub status: SeatStatus,
    pub ready: bool,
    pub cards: Vec<String>,
    pub split: Option<SplitView>,
}

impl SeatState {
    pub fn new(index: usize, user: UserId, alias: String, chips: Points) -> Self {
        Self {
            index,
            user,
            alias,
            chips,
            bet: 0,
            contributed: 0,
            status: SeatStatus::Waiting,
            ready: false,
            cards: Vec::new(),
            split: None,
        }
    }
    pub fn view(&self) -> SeatView {
        SeatView {
            seat_index: self.index,
            user_id: self.user,
            alias: self.alias.clone(),
            chips: self.chips,
            bet: self.bet,
            status: self.status.name().into(),
            split: self.split.clone(),
        }
    }
}

/// Parses a table row's `playersJson` (`{"1": {"userId", "alias",
/// "chips"}}`) into seats sorted by index plus the user-to-seat map.
/// Malformed entries and zero user ids are skipped.
pub fn parse_players(
    players: &serde_json::Value,
) -> (Vec<SeatState>, HashMap<UserId, usize>) {
    let mut seats = Vec::new();
    let mut by_user = HashMap::new();
    let Some(map) = players.as_object() else {
        return (seats, by_user);
    };
    for (key, data) in map {
        let Ok(index) = key.parse::<usize>() else {
            continue;
        };
        let Some(user) = data.get("userId").and_then(id_of) else {
            continue;
        };
        if user == 0 {
            continue;
        }
        let alias = data
            .get("alias")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("player{}", index));
        let chips = data.get("chips").and_then(id_of).unwrap_or(0);
        seats.push(SeatState::new(index, user, alias, chips));
        by_user.insert(user, index);
    }
    seats.sort_by_key(|s| s.index);
    (seats, by_user)
}

fn id_of(value: &serde_json::Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_and_sorts_seats() {
        let players = json!({
            "2": {"userId": 20, "alias": "bob", "chips": 500},
            "1": {"userId": "10", "chips": 300},
        });
        let (seats, by_user) = parse_players(&players);
        assert_eq!(seats.len(), 2);
        assert_eq!(seats[0].index, 1);
        assert_eq!(seats[0].user, 10);
        assert_eq!(seats[0].alias, "player1");
        assert_eq!(seats[0].chips, 300);
        assert_eq!(seats[1].alias, "bob");
        assert_eq!(by_user[&20], 2);
    }

    #[test]
    fn skips_empty_and_malformed_entries() {
        let players = json!({
            "1": {"userId": 0},
            "x": {"userId": 5},
            "2": {"alias": "ghost"},
            "3": {"userId": 7, "chips": 100},
        });
        let (seats, by_user) = parse_players(&players);
        assert_eq!(seats.len(), 1);
        assert_eq!(seats[0].user, 7);
        assert_eq!(by_user.len(), 1);
    }
}
