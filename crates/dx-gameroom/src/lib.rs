//! Table runtime.
//!
//! One authoritative actor per active table owns every piece of mutable
//! state: seats, deck, turn timer, and the subscriber set. Gateways post
//! `subscribe` / `unsubscribe` / `action` commands onto a bounded queue and
//! await a completion signal; a single `select!` unifies the queue with the
//! turn timer so timeouts can never race action delivery.
//!
//! ## Modules
//!
//! - [`command`] — Command envelope and the cloneable runtime handle
//! - [`message`] — Wire frames and the parsed [`Action`] enum
//! - [`state`] — Per-viewer authoritative state snapshots
//! - [`seat`] — Seat state and `playersJson` parsing
//! - [`timer`] — Reschedulable turn deadline
//! - [`runtime`] — The actor: loop, dispatch, fan-out
//! - [`rules`] — Betting legality: pass/call/raise bounds, turn order
//! - [`actions`] — Command application and the progression ladder
//! - [`deal`] — Hand start, antes, dealing, round advancement
//! - [`ledger`] — Hand settlement: pairwise transfers, tail-big, head-big
//!   protection, mango streak and rider
//! - [`roundlog`] — Append-only action log with per-viewer card encryption
//! - [`registry`] — Lazy runtime spawning and the settlement hand-off

mod actions;
mod command;
#[cfg(test)]
mod scenarios;
mod deal;
mod ledger;
mod message;
mod registry;
mod roundlog;
mod rules;
mod runtime;
mod seat;
mod state;
mod timer;

pub use command::*;
pub use ledger::*;
pub use message::*;
pub use registry::*;
pub use roundlog::*;
pub use runtime::*;
pub use seat::*;
pub use state::*;
pub use timer::*;

use dx_core::TableId;

/// Errors surfaced to a single submitter; the table state never mutates on
/// an error path and nothing is broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    TableNotFound(TableId),
    SceneNotFound(dx_core::SceneId),
    AccessDenied,
    InvalidPhase,
    NotYourTurn,
    TurnExpired,
    InvalidSeat,
    CannotPass,
    AmountRequired,
    RaiseBelowMinimum,
    FirstBetMustBeDouble,
    RaiseMustIncrease,
    InsufficientChips,
    KnockDisabled,
    UnsupportedAction(String),
    /// The runtime shut down before the command was served.
    Cancelled,
    Store(String),
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TableNotFound(id) => write!(f, "table {} not found", id),
            Self::SceneNotFound(id) => write!(f, "scene {} not found", id),
            Self::AccessDenied => write!(f, "not seated at this table"),
            Self::InvalidPhase => write!(f, "action not allowed in this phase"),
            Self::NotYourTurn => write!(f, "not your turn"),
            Self::TurnExpired => write!(f, "turn timer expired"),
            Self::InvalidSeat => write!(f, "seat cannot act"),
            Self::CannotPass => write!(f, "cannot pass, must call or fold"),
            Self::AmountRequired => write!(f, "raise amount required"),
            Self::RaiseBelowMinimum => write!(f, "raise below minimum"),
            Self::FirstBetMustBeDouble => write!(f, "opening bet must be twice the ante"),
            Self::RaiseMustIncrease => write!(f, "raise must increase the bet"),
            Self::InsufficientChips => write!(f, "insufficient chips"),
            Self::KnockDisabled => write!(f, "knock is disabled for this scene"),
            Self::UnsupportedAction(a) => write!(f, "unsupported action: {}", a),
            Self::Cancelled => write!(f, "table runtime stopped"),
            Self::Store(e) => write!(f, "record store: {}", e),
        }
    }
}

impl std::error::Error for GameError {}

impl From<dx_database::PgErr> for GameError {
    fn from(e: dx_database::PgErr) -> Self {
        Self::Store(e.to_string())
    }
}
