use dx_core::MatchId;
use dx_core::Points;
use dx_core::SceneId;
use dx_core::TableId;
use dx_core::UserId;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

/// Matchmaker tunables; defaults mirror the platform-wide constants.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub queue_lock_ttl: Duration,
    pub queue_member_ttl: Duration,
    pub queue_timeout: Duration,
    pub matched_lock_ttl: Duration,
    pub matched_notify_ttl: Duration,
    pub matcher_interval: Duration,
    pub candidate_multiplier: usize,
    /// Fleet-wide escape hatch for the geo check (test environments).
    pub skip_location_validation: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            queue_lock_ttl: Duration::from_secs(dx_core::QUEUE_LOCK_TTL_SECS),
            queue_member_ttl: Duration::from_secs(dx_core::QUEUE_MEMBER_TTL_SECS),
            queue_timeout: Duration::from_secs(dx_core::QUEUE_TIMEOUT_SECS),
            matched_lock_ttl: Duration::from_secs(dx_core::MATCHED_LOCK_TTL_SECS),
            matched_notify_ttl: Duration::from_secs(dx_core::MATCHED_NOTIFY_TTL_SECS),
            matcher_interval: Duration::from_millis(dx_core::MATCHER_INTERVAL_MS),
            candidate_multiplier: dx_core::CANDIDATE_MULTIPLIER,
            skip_location_validation: false,
        }
    }
}

impl MatchConfig {
    pub fn from_env() -> Self {
        Self {
            skip_location_validation: std::env::var("SKIP_LOCATION_VALIDATION")
                .map_or(false, |v| v == "1"),
            ..Self::default()
        }
    }
}

/// A join request as received from the HTTP layer.
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub user_id: UserId,
    pub scene_id: SceneId,
    pub buy_in: Points,
    pub gps_lat: f64,
    pub gps_lng: f64,
    pub ip: String,
}

/// Snapshot stored beside a queue entry; everything the composer needs to
/// seat the player without another lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMember {
    pub user_id: UserId,
    pub scene_id: SceneId,
    pub buy_in: Points,
    pub gps_lat: f64,
    pub gps_lng: f64,
    pub ip: String,
    pub balance_snapshot: Points,
    pub joined_at_ms: i64,
}

/// Payload of a `match:pending:{userId}` notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchNotice {
    pub scene_id: SceneId,
    pub table_id: TableId,
    pub match_id: MatchId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Idle,
    Queued,
    Matched,
}

/// Answer to a status poll; `matched` wins over `queued`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResult {
    pub status: QueueStatus,
    pub scene_id: SceneId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<TableId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<MatchId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<i64>,
}

pub fn queue_key(scene: SceneId) -> String {
    format!("queue:{}", scene)
}

pub fn member_key(scene: SceneId, user: UserId) -> String {
    format!("queue:member:{}:{}", scene, user)
}

pub fn lock_key(user: UserId) -> String {
    format!("queue:lock:{}", user)
}

pub fn notify_key(user: UserId) -> String {
    format!("match:pending:{}", user)
}
