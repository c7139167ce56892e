//! Core type aliases, constants, and small shared utilities for the
//! daxuan game platform.

pub mod geo;
pub mod net;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Chips, bets, wallet balances, and settlement deltas.
pub type Points = i64;
/// Database identity of a player (0 is reserved for the platform).
pub type UserId = i64;
/// Database identity of a scene (game template).
pub type SceneId = i64;
/// Database identity of a table.
pub type TableId = i64;
/// Database identity of a match (one hand).
pub type MatchId = i64;
/// 1-based seat index around a table. 0 is the wire sentinel for "none".
pub type Seat = usize;

// ============================================================================
// TABLE RUNTIME PARAMETERS
// ============================================================================
/// Seconds a player has to act before the auto-action fires.
pub const TURN_SECONDS: u64 = 15;
/// Capacity of a table runtime's command queue.
pub const COMMAND_BUFFER: usize = 16;
/// Capacity of one subscriber's outgoing buffer; full buffers drop.
pub const SUBSCRIBER_BUFFER: usize = 8;

// ============================================================================
// MATCHMAKER PARAMETERS
// ============================================================================
/// Composer wake-up interval.
pub const MATCHER_INTERVAL_MS: u64 = 500;
/// Queue-head candidates examined per tick = seat count x this.
pub const CANDIDATE_MULTIPLIER: usize = 3;
/// TTL of a queue member snapshot.
pub const QUEUE_MEMBER_TTL_SECS: u64 = 3 * 60;
/// A queue entry older than this is cancelled with reason "timeout".
pub const QUEUE_TIMEOUT_SECS: u64 = 3 * 60;
/// TTL of the short join lock taken while enqueuing.
pub const QUEUE_LOCK_TTL_SECS: u64 = 10;
/// TTL of the longer hold lock taken right after composition.
pub const MATCHED_LOCK_TTL_SECS: u64 = 60;
/// TTL of the match-ready notice consumed by status polling.
pub const MATCHED_NOTIFY_TTL_SECS: u64 = 5 * 60;

/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Current wall-clock time in unix milliseconds.
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_millis() as i64
}
