//! Settlement engine.
//!
//! Invoked once per finished hand with the per-player net points. Inside a
//! single transaction it computes rake, distributes agent shares, writes
//! the billing and audit rows, persists the match result, and transitions
//! the table to ended. Replays bounce off the `ended_at` idempotence gate.
//!
//! The money arithmetic lives in [`plan`], a pure function of the loaded
//! context, so the conservation invariants are testable without a store.

mod agents;
mod engine;
mod plan;
mod rake;

pub use agents::*;
pub use engine::*;
pub use plan::*;
pub use rake::*;

use dx_core::MatchId;
use dx_core::Points;
use dx_core::SceneId;
use dx_core::UserId;

/// Per-player outcome of a hand. Net points across a request sum to zero.
#[derive(Debug, Clone)]
pub struct PlayerResult {
    pub user_id: UserId,
    pub net_points: Points,
    pub meta: serde_json::Value,
}

impl PlayerResult {
    pub fn new(user_id: UserId, net_points: Points) -> Self {
        Self {
            user_id,
            net_points,
            meta: serde_json::Value::Null,
        }
    }
}

/// A finished hand handed over by the table runtime.
#[derive(Debug, Clone)]
pub struct SettleRequest {
    pub match_id: MatchId,
    /// 0 skips the scene consistency check.
    pub scene_id: SceneId,
    pub results: Vec<PlayerResult>,
}

impl SettleRequest {
    /// Rejects empty or non-conservative requests before any write.
    pub fn validate(&self) -> Result<(), SettleError> {
        if self.match_id == 0 || self.results.is_empty() {
            return Err(SettleError::Validation("empty settlement".into()));
        }
        if self.results.iter().any(|r| r.user_id == 0) {
            return Err(SettleError::Validation("result without user".into()));
        }
        let sum: Points = self.results.iter().map(|r| r.net_points).sum();
        if sum != 0 {
            return Err(SettleError::Validation(format!(
                "net points must sum to zero, got {}",
                sum
            )));
        }
        Ok(())
    }
}

/// Errors raised by settlement. `MatchAlreadySettled` is the idempotence
/// signal and is never externally retried.
#[derive(Debug)]
pub enum SettleError {
    Validation(String),
    MatchNotFound(MatchId),
    MatchAlreadySettled(MatchId),
    SceneMismatch { expected: SceneId, found: SceneId },
    SceneNotFound(SceneId),
    Store(dx_database::PgErr),
}

impl std::fmt::Display for SettleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "settlement validation: {}", msg),
            Self::MatchNotFound(id) => write!(f, "match {} not found", id),
            Self::MatchAlreadySettled(id) => write!(f, "match {} already settled", id),
            Self::SceneMismatch { expected, found } => {
                write!(f, "scene mismatch: expected {}, found {}", expected, found)
            }
            Self::SceneNotFound(id) => write!(f, "scene {} not found", id),
            Self::Store(e) => write!(f, "store error: {}", e),
        }
    }
}

impl std::error::Error for SettleError {}

impl From<dx_database::PgErr> for SettleError {
    fn from(e: dx_database::PgErr) -> Self {
        Self::Store(e)
    }
}
