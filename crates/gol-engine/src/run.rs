//! A run on a background thread, driven through channels.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use gol_core::{Command, Event};

use crate::backend::TurnBackend;
use crate::config::ConfigError;
use crate::coordinator::{RunError, RunReport, TurnCoordinator};

/// Capacity of the command channel. Commands are human keypresses, so
/// this never fills in practice; a full channel blocks the sender.
const COMMAND_CAPACITY: usize = 64;

/// Handle to a [`TurnCoordinator`] running on its own thread.
///
/// Commands go in through [`send`](Self::send) (or a cloned
/// [`commands`](Self::commands) sender), events come out of
/// [`events`](Self::events) in emission order. The event channel is
/// unbounded, so the run never stalls on a slow consumer.
///
/// Dropping the handle without [`join`](Self::join) quits the run and
/// waits for it.
pub struct RunHandle {
    commands: Sender<Command>,
    events: Receiver<Event>,
    thread: Option<JoinHandle<Result<RunReport, RunError>>>,
}

impl RunHandle {
    /// Start `coordinator` on a thread named `gol-coordinator`.
    pub fn spawn<B>(coordinator: TurnCoordinator<B>) -> Result<Self, ConfigError>
    where
        B: TurnBackend + 'static,
    {
        let (cmd_tx, cmd_rx) = crossbeam_channel::bounded(COMMAND_CAPACITY);
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let thread = thread::Builder::new()
            .name("gol-coordinator".into())
            .spawn(move || coordinator.run(cmd_rx, event_tx))
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("coordinator: {e}"),
            })?;
        Ok(Self {
            commands: cmd_tx,
            events: event_rx,
            thread: Some(thread),
        })
    }

    /// Send a command. Returns `false` if the run has already stopped.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    /// A sender for commands, e.g. for a keyboard thread.
    pub fn commands(&self) -> Sender<Command> {
        self.commands.clone()
    }

    /// The event stream. Disconnects once the run has stopped.
    pub fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    /// Wait for the run to finish.
    pub fn join(mut self) -> Result<RunReport, RunError> {
        match self.thread.take() {
            Some(handle) => handle.join().unwrap_or(Err(RunError::Panicked)),
            None => Err(RunError::Panicked),
        }
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = self.commands.send(Command::Quit);
            let _ = handle.join();
        }
    }
}
