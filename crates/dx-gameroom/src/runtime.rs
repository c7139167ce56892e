use super::*;
use dx_core::MatchId;
use dx_core::Points;
use dx_core::SceneId;
use dx_core::TableId;
use dx_core::UserId;
use dx_database::Scene;
use dx_database::TableRow;
use dx_settle::PlayerResult;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_postgres::Client;

/// The ledger a finished hand hands to the registry: streak to persist and
/// results for the settlement engine.
#[derive(Debug)]
pub struct FinishReport {
    pub table_id: TableId,
    pub match_id: MatchId,
    pub scene_id: SceneId,
    pub mango_streak: i32,
    pub results: Vec<PlayerResult>,
}

/// Authoritative state machine for one table. All fields are owned by the
/// actor task; nothing outside ever reads or writes them.
pub struct TableRuntime {
    pub(crate) table_id: TableId,
    pub(crate) match_id: MatchId,
    pub(crate) scene_id: SceneId,
    pub(crate) base_pi: Points,
    pub(crate) min_unit_pi: Points,
    pub(crate) bobo_enabled: bool,
    pub(crate) chexuan_mode: bool,
    pub(crate) db: Option<Arc<Client>>,

    pub(crate) phase: Phase,
    pub(crate) round: i32,
    /// 1-based seat whose turn it is; 0 when no turn is running.
    pub(crate) turn_seat: usize,
    pub(crate) last_raise: Points,
    pub(crate) pot: Points,
    pub(crate) mango_streak: i32,
    pub(crate) banker_seat: usize,

    pub(crate) round1_bet: bool,
    pub(crate) round2_bet: bool,
    pub(crate) round2_knock: bool,
    pub(crate) raised_round1: bool,
    pub(crate) raised_round2: bool,
    pub(crate) first_raise_done: bool,
    pub(crate) last_agg_seat: usize,
    pub(crate) tail_big_win: bool,

    pub(crate) seats: Vec<SeatState>,
    pub(crate) seat_by_user: HashMap<UserId, usize>,
    pub(crate) round_acted: HashSet<usize>,
    pub(crate) deck: Vec<String>,

    pub(crate) logs: Vec<LogItem>,
    pub(crate) seq: i64,
    pub(crate) subscribers: HashMap<UserId, mpsc::Sender<Outgoing>>,
    pub(crate) timer: TurnTimer,

    pub(crate) commands: mpsc::Receiver<Command>,
    pub(crate) quit: mpsc::Receiver<()>,
    pub(crate) on_finish: Option<mpsc::UnboundedSender<FinishReport>>,
    pub(crate) results: Option<Vec<PlayerResult>>,
}

impl TableRuntime {
    /// Builds a runtime from a table row and its scene. The actor is not
    /// running yet; callers either `spawn` it or drive it directly in
    /// tests.
    pub fn new(
        db: Option<Arc<Client>>,
        table: &TableRow,
        scene: &Scene,
        match_id: MatchId,
        finish: Option<mpsc::UnboundedSender<FinishReport>>,
    ) -> (Self, RuntimeHandle) {
        let (seats, seat_by_user) = parse_players(&table.players);
        let banker_seat = seats.first().map(|s| s.index).unwrap_or(0);
        let (cmd_tx, cmd_rx) = mpsc::channel(dx_core::COMMAND_BUFFER);
        let (quit_tx, quit_rx) = mpsc::channel(1);
        let runtime = Self {
            table_id: table.id,
            match_id,
            scene_id: scene.id,
            base_pi: scene.base_pi,
            min_unit_pi: scene.min_unit_pi,
            bobo_enabled: scene.bobo_enabled,
            chexuan_mode: scene.chexuan(),
            db,
            phase: Phase::Waiting,
            round: 0,
            turn_seat: 0,
            last_raise: 0,
            pot: 0,
            mango_streak: table.mango_streak,
            banker_seat,
            round1_bet: false,
            round2_bet: false,
            round2_knock: false,
            raised_round1: false,
            raised_round2: false,
            first_raise_done: false,
            last_agg_seat: 0,
            tail_big_win: false,
            seats,
            seat_by_user,
            round_acted: HashSet::new(),
            deck: Vec::new(),
            logs: Vec::new(),
            seq: 0,
            subscribers: HashMap::new(),
            timer: TurnTimer::with_defaults(),
            commands: cmd_rx,
            quit: quit_rx,
            on_finish: finish,
            results: None,
        };
        let handle = RuntimeHandle {
            commands: cmd_tx,
            quit: quit_tx,
        };
        (runtime, handle)
    }

    /// Spawns the actor task and returns its handle.
    pub fn spawn(
        db: Option<Arc<Client>>,
        table: &TableRow,
        scene: &Scene,
        match_id: MatchId,
        finish: Option<mpsc::UnboundedSender<FinishReport>>,
    ) -> RuntimeHandle {
        let (runtime, handle) = Self::new(db, table, scene, match_id, finish);
        tokio::spawn(runtime.run());
        handle
    }

    /// The actor loop: one selection point over the quit signal, the
    /// command queue, and the turn deadline, in that priority.
    pub async fn run(mut self) {
        log::debug!("[table {}] actor started", self.table_id);
        loop {
            let deadline = self.timer.deadline();
            tokio::select! {
                biased;
                _ = self.quit.recv() => break,
                command = self.commands.recv() => match command {
                    Some(command) => self.serve(command).await,
                    None => break,
                },
                _ = TurnTimer::expiry(deadline) => self.on_turn_timeout().await,
            }
        }
        self.commands.close();
        while let Ok(command) = self.commands.try_recv() {
            match command {
                Command::Subscribe { done, .. } => {
                    let _ = done.send(Err(GameError::Cancelled));
                }
                Command::Action { done, .. } => {
                    let _ = done.send(Err(GameError::Cancelled));
                }
                Command::Unsubscribe { done, .. } => {
                    let _ = done.send(());
                }
            }
        }
        log::debug!("[table {}] actor stopped", self.table_id);
    }

    pub(crate) async fn serve(&mut self, command: Command) {
        match command {
            Command::Subscribe { user, sender, done } => {
                self.subscribers.insert(user, sender);
                self.push_state(user);
                let _ = done.send(Ok(()));
            }
            Command::Unsubscribe { user, done } => {
                self.subscribers.remove(&user);
                let _ = done.send(());
            }
            Command::Action { user, action, done } => {
                let result = self.apply(user, action).await;
                let _ = done.send(result);
            }
        }
    }

    /// Validates and applies a single action from a viewer.
    pub(crate) async fn apply(&mut self, user: UserId, action: Action) -> Result<(), GameError> {
        let seat = self.seat_by_user.get(&user).copied();
        if seat.is_none() && action != Action::Rejoin {
            return Err(GameError::AccessDenied);
        }
        match action {
            Action::Ready => self.handle_ready(seat.unwrap_or(0), user).await,
            Action::Pass | Action::Call | Action::Raise(_) | Action::Fold | Action::KnockBobo => {
                self.handle_turn_action(seat.unwrap_or(0), action).await
            }
            Action::Rejoin => {
                self.push_state(user);
                Ok(())
            }
            Action::Ping => {
                let seq = self.next_seq();
                self.push_message(user, Outgoing::pong(seq));
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // fan-out
    // ------------------------------------------------------------------

    pub(crate) fn next_seq(&mut self) -> i64 {
        self.seq += 1;
        self.seq
    }

    pub(crate) fn push_state(&mut self, user: UserId) {
        let seq = self.next_seq();
        let state = self.export_state(user);
        self.push_message(user, Outgoing::state(seq, &state));
    }

    /// Per-viewer state messages carrying one shared seq. Full buffers
    /// drop; viewers recover through `rejoin`.
    pub(crate) fn broadcast_state(&mut self) {
        let seq = self.next_seq();
        let viewers: Vec<UserId> = self.subscribers.keys().copied().collect();
        for user in viewers {
            let state = self.export_state(user);
            self.push_message(user, Outgoing::state(seq, &state));
        }
    }

    pub(crate) fn push_message(&self, user: UserId, message: Outgoing) {
        if let Some(sender) = self.subscribers.get(&user) {
            if sender.try_send(message).is_err() {
                log::warn!(
                    "[table {}] subscriber buffer full, dropping frame for user {}",
                    self.table_id,
                    user
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // state export
    // ------------------------------------------------------------------

    pub(crate) fn export_state(&self, user: UserId) -> TableState {
        let my_cards = self
            .seat_by_user
            .get(&user)
            .and_then(|idx| self.seats.iter().find(|s| s.index == *idx))
            .map(|seat| self.display_cards(&seat.cards))
            .unwrap_or_default();
        TableState {
            table_id: self.table_id,
            phase: self.phase,
            round: self.round,
            turn_seat: self.turn_seat,
            last_raise: self.last_raise,
            pot: self.pot,
            mango_streak: self.mango_streak,
            countdown: self.timer.countdown_secs(),
            allowed_actions: self.allowed_actions(user),
            seats: self.seats.iter().map(SeatState::view).collect(),
            my_cards,
            logs: self.logs.clone(),
            result: match self.phase {
                Phase::Ended => self
                    .results
                    .as_ref()
                    .map(|results| results_json(results)),
                _ => None,
            },
        }
    }

    /// Chexuan codes render as poker-style codes on the wire.
    pub(crate) fn display_cards(&self, cards: &[String]) -> Vec<String> {
        if !self.chexuan_mode {
            return cards.to_vec();
        }
        cards
            .iter()
            .map(|raw| {
                dx_cards::Code::try_from(raw.as_str())
                    .map(|c| c.poker_code().to_string())
                    .unwrap_or_else(|_| raw.clone())
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // table log
    // ------------------------------------------------------------------

    pub(crate) fn append_log(&mut self, content: String) {
        self.logs.push(LogItem {
            id: format!("{}-{}", dx_core::now_ms(), self.logs.len() + 1),
            timestamp: dx_core::now_ms(),
            content,
        });
    }

    pub(crate) fn log_action(&mut self, seat_idx: usize, description: &str) {
        let alias = self
            .seats
            .iter()
            .find(|s| s.index == seat_idx)
            .map(|s| s.alias.clone())
            .unwrap_or_else(|| format!("seat{}", seat_idx));
        self.append_log(format!("{} {}", alias, description));
    }
}

/// Result records exposed in the ended-state frame.
pub(crate) fn results_json(results: &[PlayerResult]) -> serde_json::Value {
    serde_json::Value::Array(
        results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "userId": r.user_id,
                    "netPoints": r.net_points,
                    "meta": r.meta,
                })
            })
            .collect(),
    )
}
