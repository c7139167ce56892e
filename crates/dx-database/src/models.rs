use chrono::DateTime;
use chrono::Utc;
use dx_core::MatchId;
use dx_core::Points;
use dx_core::SceneId;
use dx_core::TableId;
use dx_core::UserId;
use tokio_postgres::Row;

/// A registered player. `agent_path` is the canonical ancestor chain
/// (root to direct, joined by `>`); `bind_agent_id` is only a fallback for
/// rows created before paths existed. Both are immutable after first bind.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub phone: String,
    pub nickname: String,
    pub invite_code: String,
    pub bind_agent_id: Option<UserId>,
    pub agent_path: String,
    pub status: String,
}

impl From<&Row> for User {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            phone: row.get("phone"),
            nickname: row.get("nickname"),
            invite_code: row.get("invite_code"),
            bind_agent_id: row.get("bind_agent_id"),
            agent_path: row.get("agent_path"),
            status: row.get("status"),
        }
    }
}

/// One wallet per user. Individual fields stay non-negative at rest; the
/// settlement transaction is the only writer.
#[derive(Debug, Clone, Default)]
pub struct Wallet {
    pub user_id: UserId,
    pub balance_total: Points,
    pub balance_available: Points,
    pub balance_frozen: Points,
    pub total_win: Points,
    pub total_consume: Points,
    pub total_rake: Points,
}

impl Wallet {
    /// A fresh zero wallet for a user without one yet.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }
}

impl From<&Row> for Wallet {
    fn from(row: &Row) -> Self {
        Self {
            user_id: row.get("user_id"),
            balance_total: row.get("balance_total"),
            balance_available: row.get("balance_available"),
            balance_frozen: row.get("balance_frozen"),
            total_win: row.get("total_win"),
            total_consume: row.get("total_consume"),
            total_rake: row.get("total_rake"),
        }
    }
}

/// Game template. `max_in = 0` means no buy-in ceiling;
/// `distance_threshold_m = 0` disables the geo check.
#[derive(Debug, Clone)]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
    pub seat_count: i32,
    pub min_in: Points,
    pub max_in: Points,
    pub base_pi: Points,
    pub min_unit_pi: Points,
    pub mango_enabled: bool,
    pub bobo_enabled: bool,
    pub distance_threshold_m: i32,
    pub status: String,
    pub rake_rule_id: i64,
}

impl Scene {
    pub fn enabled(&self) -> bool {
        self.status == "enabled"
    }
    /// Chexuan rules apply when either table option is on or the scene is
    /// named for the variant.
    pub fn chexuan(&self) -> bool {
        self.bobo_enabled
            || self.mango_enabled
            || self.name.to_lowercase().contains("chexuan")
            || self.name.contains("扯旋")
    }
}

impl From<&Row> for Scene {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            name: row.get("name"),
            seat_count: row.get("seat_count"),
            min_in: row.get("min_in"),
            max_in: row.get("max_in"),
            base_pi: row.get("base_pi"),
            min_unit_pi: row.get("min_unit_pi"),
            mango_enabled: row.get("mango_enabled"),
            bobo_enabled: row.get("bobo_enabled"),
            distance_threshold_m: row.get("distance_threshold_m"),
            status: row.get("status"),
            rake_rule_id: row.get("rake_rule_id"),
        }
    }
}

/// Raw rake rule row; `config` interpretation lives with the settlement
/// engine so config drift never fails a load.
#[derive(Debug, Clone)]
pub struct RakeRuleRow {
    pub id: i64,
    pub kind: String,
    pub config: serde_json::Value,
}

impl From<&Row> for RakeRuleRow {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            kind: row.get("kind"),
            config: row.get("config_json"),
        }
    }
}

/// Agent profit-sharing rule; `level_ratios` maps `L{k}` to a fraction.
#[derive(Debug, Clone)]
pub struct AgentRuleRow {
    pub id: i64,
    pub max_level: i32,
    pub level_ratios: serde_json::Value,
    pub base_platform_ratio: f64,
}

impl From<&Row> for AgentRuleRow {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            max_level: row.get("max_level"),
            level_ratios: row.get("level_ratios_json"),
            base_platform_ratio: row.get("base_platform_ratio"),
        }
    }
}

/// A seated table. `players` maps seat index to
/// `{userId, alias, chips, status}`; chips live in runtime memory after
/// creation, and the row is only touched again by the streak persist and
/// the settlement finalizer.
#[derive(Debug, Clone)]
pub struct TableRow {
    pub id: TableId,
    pub scene_id: SceneId,
    pub status: String,
    pub seat_count: i32,
    pub mango_streak: i32,
    pub players: serde_json::Value,
}

impl From<&Row> for TableRow {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            scene_id: row.get("scene_id"),
            status: row.get("status"),
            seat_count: row.get("seat_count"),
            mango_streak: row.get("mango_streak"),
            players: row.get("players_json"),
        }
    }
}

/// One hand. `ended_at` is written exactly once, by settlement.
#[derive(Debug, Clone)]
pub struct MatchRow {
    pub id: MatchId,
    pub table_id: TableId,
    pub scene_id: SceneId,
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<&Row> for MatchRow {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            table_id: row.get("table_id"),
            scene_id: row.get("scene_id"),
            ended_at: row.get("ended_at"),
        }
    }
}

/// One wallet delta, appended inside the settlement transaction.
/// `balance_after` reflects the post-write available balance.
#[derive(Debug, Clone)]
pub struct BillingLog {
    pub user_id: UserId,
    pub kind: String,
    pub delta: Points,
    pub balance_after: Points,
    pub match_id: Option<MatchId>,
    pub meta: serde_json::Value,
}

/// One agent share audit row.
#[derive(Debug, Clone)]
pub struct AgentProfitLog {
    pub agent_id: UserId,
    pub from_user_id: UserId,
    pub match_id: MatchId,
    pub level: i32,
    pub rake_amount: Points,
    pub profit_amount: Points,
}
