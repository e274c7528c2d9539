use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};

use super::types::{Command, CommandSource};
use super::Outcome;

/// A command in flight, with an optional channel for its outcome
pub struct Envelope {
    pub command: Command,
    pub source: CommandSource,
    pub reply: Option<Sender<Outcome>>,
}

impl Envelope {
    /// Deliver the outcome if the sender is waiting for one
    pub fn respond(&self, outcome: Outcome) {
        if let Some(reply) = &self.reply {
            let _ = reply.send(outcome);
        }
    }
}

/// Central command bus; the editor host is the only consumer
pub struct CommandBus {
    tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
}

impl CommandBus {
    pub fn new() -> Self {
        let (tx, rx) = bounded(256);
        Self { tx, rx }
    }

    /// Get a sender that can be cloned and shared
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            tx: self.tx.clone(),
        }
    }

    pub fn receiver(&self) -> CommandReceiver {
        CommandReceiver {
            rx: self.rx.clone(),
        }
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable sender for dispatching commands
#[derive(Clone)]
pub struct CommandSender {
    tx: Sender<Envelope>,
}

impl CommandSender {
    /// Send a command and wait for the editor to apply it
    pub fn request(&self, cmd: Command, source: CommandSource, timeout: Duration) -> Outcome {
        let (reply_tx, reply_rx) = bounded(1);
        let envelope = Envelope {
            command: cmd,
            source,
            reply: Some(reply_tx),
        };
        match self.tx.try_send(envelope) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::warn!("command buffer full, dropping command");
                return Err("Editor is busy, try again".to_string());
            }
            Err(TrySendError::Disconnected(_)) => return Err("Editor is not running".to_string()),
        }
        match reply_rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => Err("Timed out waiting for the editor".to_string()),
            Err(RecvTimeoutError::Disconnected) => Err("Editor dropped the command".to_string()),
        }
    }
}

/// Receiver for consuming commands
#[derive(Clone)]
pub struct CommandReceiver {
    rx: Receiver<Envelope>,
}

impl CommandReceiver {
    /// Try to receive a command (non-blocking)
    pub fn try_recv(&self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next command
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Envelope> {
        self.rx.recv_timeout(timeout).ok()
    }
}
