use super::*;
use dx_core::UserId;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

/// Commands served by the table actor. Every variant carries a completion
/// signal so callers can await application.
pub enum Command {
    Subscribe {
        user: UserId,
        sender: mpsc::Sender<Outgoing>,
        done: oneshot::Sender<Result<(), GameError>>,
    },
    Unsubscribe {
        user: UserId,
        done: oneshot::Sender<()>,
    },
    Action {
        user: UserId,
        action: Action,
        done: oneshot::Sender<Result<(), GameError>>,
    },
}

/// Cloneable handle to a running table actor.
#[derive(Clone)]
pub struct RuntimeHandle {
    pub(crate) commands: mpsc::Sender<Command>,
    pub(crate) quit: mpsc::Sender<()>,
}

impl RuntimeHandle {
    /// Registers a viewer and receives their bounded outgoing buffer.
    /// The current state is pushed immediately.
    pub async fn subscribe(&self, user: UserId) -> Result<mpsc::Receiver<Outgoing>, GameError> {
        let (tx, rx) = mpsc::channel(dx_core::SUBSCRIBER_BUFFER);
        let (done, wait) = oneshot::channel();
        self.commands
            .send(Command::Subscribe {
                user,
                sender: tx,
                done,
            })
            .await
            .map_err(|_| GameError::Cancelled)?;
        wait.await.map_err(|_| GameError::Cancelled)??;
        Ok(rx)
    }

    pub async fn unsubscribe(&self, user: UserId) {
        let (done, wait) = oneshot::channel();
        if self
            .commands
            .send(Command::Unsubscribe { user, done })
            .await
            .is_ok()
        {
            let _ = wait.await;
        }
    }

    /// Submits a player action and awaits its validation result.
    pub async fn action(&self, user: UserId, action: Action) -> Result<(), GameError> {
        let (done, wait) = oneshot::channel();
        self.commands
            .send(Command::Action { user, action, done })
            .await
            .map_err(|_| GameError::Cancelled)?;
        wait.await.map_err(|_| GameError::Cancelled)?
    }

    /// Stops the actor; pending commands receive a cancellation error.
    pub async fn stop(&self) {
        let _ = self.quit.send(()).await;
    }
}
