//! Matchmaker.
//!
//! Players queue per scene; one composer task per scene drains the queue
//! head on a fixed tick and atomically moves a full table's worth of
//! compatible players into a fresh table + match, enforcing balance,
//! geo-distance, and /24 anti-collusion constraints.
//!
//! The queue mechanics ([`queue`]) and the selection filters are functions
//! of the ephemeral store and the scene, so they test against the
//! in-memory store; [`MatchService`] is the shell wiring them to the
//! record store.

mod composer;
pub mod queue;
mod service;
mod types;

pub use composer::*;
pub use service::*;
pub use types::*;

use dx_core::SceneId;
use dx_core::TableId;
use dx_ephemeral::StoreError;

/// Matchmaker errors, mapped onto the player HTTP surface by the server.
#[derive(Debug)]
pub enum MatchError {
    SceneNotFound(SceneId),
    InvalidBuyIn,
    InsufficientBalance,
    AlreadyInQueue,
    /// A concurrent join holds this user's queue lock.
    QueueProcessing,
    TableNotFound(TableId),
    TableAccessDenied,
    Unauthorized,
    Store(StoreError),
    Db(dx_database::PgErr),
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SceneNotFound(id) => write!(f, "scene {} not found", id),
            Self::InvalidBuyIn => write!(f, "buy-in outside scene limits"),
            Self::InsufficientBalance => write!(f, "insufficient balance"),
            Self::AlreadyInQueue => write!(f, "already in queue"),
            Self::QueueProcessing => write!(f, "queue operation in progress"),
            Self::TableNotFound(id) => write!(f, "table {} not found", id),
            Self::TableAccessDenied => write!(f, "not seated at this table"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Store(e) => write!(f, "{}", e),
            Self::Db(e) => write!(f, "record store: {}", e),
        }
    }
}

impl std::error::Error for MatchError {}

impl From<StoreError> for MatchError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<dx_database::PgErr> for MatchError {
    fn from(e: dx_database::PgErr) -> Self {
        Self::Db(e)
    }
}
