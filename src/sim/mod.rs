//! Save-interval run loop around a [`DiffusionSolver`](crate::diffusion_solver::DiffusionSolver).
//!
//! The runner is a plain state machine fed by a [`CommandSource`] and reporting
//! to a [`NotificationSink`]. [`SimulationRunner::spawn`] wires both ends to
//! `mpsc` channels and drives the loop on a worker thread.

pub mod sim_op;
mod simulation;
mod worker;

pub use simulation::{RunOutcome, SimulationRunner};
pub use worker::RunnerHandle;

use log::debug;
use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Running,
    Paused,
    Stopped,
    Completed,
    Failed,
}

impl RunnerState {
    pub fn is_finished(&self) -> bool {
        matches!(self, RunnerState::Stopped | RunnerState::Completed | RunnerState::Failed)
    }
}

/// Control messages honoured before every solver sub-step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Percent complete after a save point
    Progress(u8),
    /// Domain-center temperature after a save point (°C)
    Temperature(f64),
    /// Every recorded time, initial state included
    Completed(Vec<f64>),
    Failed { message: String, times: Vec<f64> },
}

/// Where a run is when it polls for commands: sub-step `sub_step` of the
/// interval that ends at save point `save_point`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct StepPosition {
    pub save_point: usize,
    pub sub_step: usize,
}

impl StepPosition {
    pub fn new(save_point: usize, sub_step: usize) -> Self {
        Self { save_point, sub_step }
    }
}

pub trait CommandSource {
    /// Next pending command at `position`, without blocking
    fn try_next(&mut self, position: StepPosition) -> Option<Command>;

    /// Blocks until a command arrives. `None` means no command can ever arrive.
    fn wait(&mut self, position: StepPosition) -> Option<Command>;
}

pub trait NotificationSink {
    fn notify(&mut self, notification: Notification);
}

/// Source that never delivers anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCommands;

impl CommandSource for NoCommands {
    fn try_next(&mut self, _position: StepPosition) -> Option<Command> {
        None
    }

    fn wait(&mut self, _position: StepPosition) -> Option<Command> {
        None
    }
}

/// Commands delivered at fixed step positions, for driving a run
/// deterministically without a thread
#[derive(Debug, Clone, Default)]
pub struct ScriptedCommands {
    script: VecDeque<(StepPosition, Command)>,
}

impl ScriptedCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `command` before the first sub-step toward save point `index`
    pub fn at(self, index: usize, command: Command) -> Self {
        self.at_step(index, 0, command)
    }

    /// Delivers `command` before sub-step `sub_step` toward save point `index`
    pub fn at_step(mut self, index: usize, sub_step: usize, command: Command) -> Self {
        let position = StepPosition::new(index, sub_step);
        let pos = self
            .script
            .iter()
            .position(|&(p, _)| p > position)
            .unwrap_or(self.script.len());
        self.script.insert(pos, (position, command));
        self
    }
}

impl CommandSource for ScriptedCommands {
    fn try_next(&mut self, position: StepPosition) -> Option<Command> {
        match self.script.front() {
            Some(&(at, _)) if at <= position => self.script.pop_front().map(|(_, c)| c),
            _ => None,
        }
    }

    fn wait(&mut self, _position: StepPosition) -> Option<Command> {
        self.script.pop_front().map(|(_, c)| c)
    }
}

impl CommandSource for Receiver<Command> {
    fn try_next(&mut self, _position: StepPosition) -> Option<Command> {
        self.try_recv().ok()
    }

    fn wait(&mut self, _position: StepPosition) -> Option<Command> {
        self.recv().ok()
    }
}

impl NotificationSink for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

impl NotificationSink for Sender<Notification> {
    fn notify(&mut self, notification: Notification) {
        if self.send(notification).is_err() {
            debug!("notification dropped, receiver is gone");
        }
    }
}
