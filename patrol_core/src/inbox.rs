//! Single-slot handoff of decoded commands into the control loop.
//!
//! The slot holds one command. A transport thread calling
//! [`CommandSender::submit`] blocks until the loop has drained the previous
//! command at the top of a tick.
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::command::{CommandError, PatrolCommand, decode_line};
use crate::error::PatrolError;

#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<PatrolCommand>,
}

#[derive(Debug)]
pub struct CommandInbox {
    rx: Receiver<PatrolCommand>,
}

pub fn command_inbox() -> (CommandSender, CommandInbox) {
    let (tx, rx) = bounded(1);
    (CommandSender { tx }, CommandInbox { rx })
}

impl CommandSender {
    /// Block until the slot is free. Fails once the loop has gone away.
    pub fn submit(&self, cmd: PatrolCommand) -> Result<(), PatrolError> {
        self.tx
            .send(cmd)
            .map_err(|_| PatrolError::State("patrol loop has stopped".into()))
    }

    /// Non-blocking variant. Returns the command back when the slot is full.
    pub fn try_submit(&self, cmd: PatrolCommand) -> Result<(), PatrolCommand> {
        match self.tx.try_send(cmd) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(c) | TrySendError::Disconnected(c)) => Err(c),
        }
    }

    /// Decode one transport line and submit it, blocking on a full slot.
    ///
    /// Lines that carry nothing to apply and plain text are logged and
    /// accepted. Malformed JSON is logged and reported as
    /// [`PatrolError::Command`] without touching the slot.
    pub fn submit_line(&self, line: &str) -> Result<(), PatrolError> {
        match decode_line(line) {
            Ok(cmd) if cmd.is_empty() => {
                tracing::debug!("command line carried nothing to apply");
                Ok(())
            }
            Ok(cmd) => self.submit(cmd),
            Err(CommandError::UnrecognizedText(text)) => {
                tracing::info!(text, "unrecognized data string received");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping command line");
                Err(PatrolError::Command(e.to_string()))
            }
        }
    }
}

impl CommandInbox {
    /// Take the pending command, if any.
    pub fn drain(&self) -> Option<PatrolCommand> {
        self.rx.try_recv().ok()
    }
}
