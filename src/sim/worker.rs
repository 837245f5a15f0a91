use crate::error::{GeothermError, GeothermResult};
use crate::sim::{Command, Notification, RunOutcome, SimulationRunner};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Caller side of a runner moved onto a worker thread
pub struct RunnerHandle {
    commands: Sender<Command>,
    notifications: Receiver<Notification>,
    worker: JoinHandle<RunOutcome>,
}

impl SimulationRunner {
    /// Moves the runner onto its own thread. The worker is the only owner of
    /// the solver until [`RunnerHandle::join`] returns the outcome.
    pub fn spawn(self) -> GeothermResult<RunnerHandle> {
        let (command_tx, command_rx) = mpsc::channel();
        let (notification_tx, notification_rx) = mpsc::channel();

        let mut runner = self;
        let worker = thread::Builder::new()
            .name("geotherm-runner".to_string())
            .spawn(move || {
                let mut commands = command_rx;
                let mut sink = notification_tx;
                runner.run(&mut commands, &mut sink)
            })
            .map_err(|e| GeothermError::Worker(format!("failed to start runner thread: {}", e)))?;

        Ok(RunnerHandle {
            commands: command_tx,
            notifications: notification_rx,
            worker,
        })
    }
}

impl RunnerHandle {
    pub fn pause(&self) -> GeothermResult<()> {
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> GeothermResult<()> {
        self.send(Command::Resume)
    }

    pub fn stop(&self) -> GeothermResult<()> {
        self.send(Command::Stop)
    }

    fn send(&self, command: Command) -> GeothermResult<()> {
        self.commands
            .send(command)
            .map_err(|_| GeothermError::Worker(format!("runner already finished, {:?} ignored", command)))
    }

    /// Progress, temperature and completion messages in emission order
    pub fn notifications(&self) -> &Receiver<Notification> {
        &self.notifications
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Waits for the worker. Closing the command channel first means a paused
    /// run stops instead of waiting forever.
    pub fn join(self) -> GeothermResult<RunOutcome> {
        let RunnerHandle { commands, worker, .. } = self;
        drop(commands);
        worker
            .join()
            .map_err(|_| GeothermError::Worker("runner thread panicked".to_string()))
    }
}
