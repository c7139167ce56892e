use std::time::Duration;
use tokio::time::Instant;

/// The table's single reschedulable turn timer.
///
/// The deadline is owned by the actor and only consulted inside its
/// `select!`, so a timeout can never race an action that was delivered
/// first.
#[derive(Debug)]
pub struct TurnTimer {
    turn: Duration,
    deadline: Option<Instant>,
}

impl TurnTimer {
    pub fn new(turn: Duration) -> Self {
        Self {
            turn,
            deadline: None,
        }
    }
    pub fn with_defaults() -> Self {
        Self::new(Duration::from_secs(dx_core::TURN_SECONDS))
    }
    pub fn start_turn(&mut self) {
        self.deadline = Some(Instant::now() + self.turn);
    }
    pub fn clear(&mut self) {
        self.deadline = None;
    }
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
    pub fn expired(&self) -> bool {
        self.deadline.map(|d| Instant::now() >= d).unwrap_or(false)
    }
    /// Whole seconds remaining, for the client countdown.
    pub fn countdown_secs(&self) -> i64 {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()).as_secs() as i64)
            .unwrap_or(0)
    }
    /// Resolves at the deadline, or never when no turn is running.
    pub async fn expiry(deadline: Option<Instant>) {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn starts_cleared() {
        let timer = TurnTimer::with_defaults();
        assert!(timer.deadline().is_none());
        assert!(!timer.expired());
        assert_eq!(timer.countdown_secs(), 0);
    }
    #[test]
    fn sets_and_clears_deadline() {
        let mut timer = TurnTimer::with_defaults();
        timer.start_turn();
        assert!(timer.deadline().is_some());
        assert!(timer.countdown_secs() > 10);
        timer.clear();
        assert!(timer.deadline().is_none());
    }
}
