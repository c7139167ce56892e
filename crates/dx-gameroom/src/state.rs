use serde::Serialize;

/// Table lifecycle. `Ended` is terminal; the runtime latches there as soon
/// as the hand ledger is produced, with settlement following out-of-band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Waiting,
    Playing,
    Settling,
    Ended,
}

/// A seat as shown to viewers. Cards never appear here; the receiver's own
/// hand travels in `myCards`, and `split` is populated only once the hand
/// reaches settlement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub seat_index: usize,
    pub user_id: i64,
    pub alias: String,
    pub chips: i64,
    pub bet: i64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitView>,
}

/// Head/tail split revealed during settling/ended in Chexuan mode.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitView {
    pub head: Vec<String>,
    pub tail: Vec<String>,
    pub is_daoba: bool,
}

/// One line of the human-readable table log.
#[derive(Debug, Clone, Serialize)]
pub struct LogItem {
    pub id: String,
    pub timestamp: i64,
    pub content: String,
}

/// The authoritative per-viewer snapshot broadcast after every
/// state-changing command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableState {
    pub table_id: i64,
    pub phase: Phase,
    pub round: i32,
    pub turn_seat: usize,
    pub last_raise: i64,
    pub pot: i64,
    pub mango_streak: i32,
    pub countdown: i64,
    pub allowed_actions: Vec<String>,
    pub seats: Vec<SeatView>,
    pub my_cards: Vec<String>,
    pub logs: Vec<LogItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}
