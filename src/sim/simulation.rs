use crate::config::{SimulationConfig, TimeControl};
use crate::diffusion_solver::DiffusionSolver;
use crate::error::GeothermResult;
use crate::history::HistoryPoint;
use crate::sim::sim_op::{SavePoint, SimOp, SimOpHandle};
use crate::sim::{Command, CommandSource, Notification, NotificationSink, RunnerState, StepPosition};
use log::{debug, error, info, warn};
use ndarray::Array3;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Everything recorded by a run, kept even when it was stopped or failed
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub state: RunnerState,
    /// Initial time followed by every save point reached
    pub time_points: Vec<f64>,
    /// Temperature field at each entry of `time_points`
    pub snapshots: Vec<Array3<f64>>,
    pub history: Vec<HistoryPoint>,
    pub error: Option<String>,
}

pub struct SimulationRunner {
    solver: DiffusionSolver,
    time: TimeControl,
    ops: Vec<Box<dyn SimOp>>,
    state: RunnerState,
}

impl SimulationRunner {
    pub fn new(solver: DiffusionSolver, time: TimeControl) -> Self {
        Self {
            solver,
            time,
            ops: Vec::new(),
            state: RunnerState::Idle,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> GeothermResult<Self> {
        Ok(Self::new(config.build_solver()?, config.time))
    }

    pub fn with_op(mut self, handle: SimOpHandle) -> Self {
        self.ops.push(handle.op);
        self
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn solver(&self) -> &DiffusionSolver {
        &self.solver
    }

    pub fn into_solver(self) -> DiffusionSolver {
        self.solver
    }

    /// Runs `⌊duration / save_interval⌋` save intervals. Commands are honoured
    /// before every solver sub-step, so a stop never waits for the rest of an
    /// interval. Exactly one `Completed` or `Failed` notification ends the run;
    /// a panic inside the loop or an operator fails the run instead of
    /// unwinding past it.
    pub fn run<C, S>(&mut self, commands: &mut C, sink: &mut S) -> RunOutcome
    where
        C: CommandSource + ?Sized,
        S: NotificationSink + ?Sized,
    {
        let total = self.time.save_points();
        let start = self.solver.current_time();
        info!(
            "run started: {} save points every {:.3e} s from t = {:.3e} s",
            total, self.time.save_interval, start
        );

        self.state = RunnerState::Running;
        let mut time_points = vec![start];
        let mut snapshots = vec![self.solver.temperature().clone()];
        let mut failure = None;

        let init = panic::catch_unwind(AssertUnwindSafe(|| {
            for op in &mut self.ops {
                op.init_sim(&self.solver);
            }
        }));
        if let Err(payload) = init {
            failure = Some(self.fail(format!("operator panicked during init: {}", panic_message(&*payload))));
        }

        for index in 0..total {
            if self.state != RunnerState::Running {
                break;
            }
            let target = start + (index + 1) as f64 * self.time.save_interval;

            let interval = panic::catch_unwind(AssertUnwindSafe(|| -> GeothermResult<bool> {
                if !self.advance_interval(index, target, &mut *commands)? {
                    return Ok(false);
                }
                self.solver.check_finite()?;

                let point = SavePoint {
                    index,
                    total,
                    time: self.solver.current_time(),
                    progress: ((index + 1) * 100 / total) as u8,
                };
                time_points.push(point.time);
                snapshots.push(self.solver.temperature().clone());
                sink.notify(Notification::Progress(point.progress));
                sink.notify(Notification::Temperature(self.solver.center_temperature()));
                for op in &mut self.ops {
                    op.update_sim(&self.solver, &point);
                }
                debug!("save point {}/{} at t = {:.3e} s", index + 1, total, point.time);
                Ok(true)
            }));

            let message = match interval {
                Ok(Ok(true)) => continue,
                Ok(Ok(false)) => break,
                Ok(Err(e)) => e.to_string(),
                Err(payload) => format!("runner panicked: {}", panic_message(&*payload)),
            };
            error!("run failed before save point {}: {}", index + 1, message);
            failure = Some(self.fail(message));
            break;
        }

        match self.state {
            RunnerState::Running => self.state = RunnerState::Completed,
            RunnerState::Stopped => self.solver.mark_stopped(),
            _ => {}
        }
        let state = self.state;
        for op in &mut self.ops {
            let solver = &self.solver;
            if panic::catch_unwind(AssertUnwindSafe(|| op.after_sim(solver, state))).is_err() {
                error!("operator {} panicked while finishing the run", op.name());
            }
        }

        match &failure {
            Some(message) => sink.notify(Notification::Failed {
                message: message.clone(),
                times: time_points.clone(),
            }),
            None => sink.notify(Notification::Completed(time_points.clone())),
        }
        info!(
            "run finished: {:?} at t = {:.3e} s after {} save points",
            self.state,
            self.solver.current_time(),
            time_points.len() - 1
        );

        RunOutcome {
            state: self.state,
            time_points,
            snapshots,
            history: self.solver.history().to_vec(),
            error: failure,
        }
    }

    // sub-steps toward `target`; false when a stop arrived first
    fn advance_interval<C>(&mut self, index: usize, target: f64, commands: &mut C) -> GeothermResult<bool>
    where
        C: CommandSource + ?Sized,
    {
        let plan = self.solver.plan_to(target)?;
        for sub_step in 0..plan.steps {
            self.drain_commands(commands, StepPosition::new(index, sub_step));
            if self.state == RunnerState::Stopped {
                debug!(
                    "stopped before sub-step {}/{} of save interval {}",
                    sub_step + 1,
                    plan.steps,
                    index + 1
                );
                return Ok(false);
            }
            self.solver.take_planned_step(&plan, sub_step)?;
        }
        Ok(true)
    }

    fn fail(&mut self, message: String) -> String {
        self.state = RunnerState::Failed;
        self.solver.mark_stopped();
        message
    }

    // applies pending commands; blocks while paused
    fn drain_commands<C>(&mut self, commands: &mut C, position: StepPosition)
    where
        C: CommandSource + ?Sized,
    {
        loop {
            let next = if self.state == RunnerState::Paused {
                commands.wait(position)
            } else {
                commands.try_next(position)
            };
            let Some(command) = next else {
                if self.state == RunnerState::Paused {
                    warn!("command source closed while paused, stopping run");
                    self.state = RunnerState::Stopped;
                }
                return;
            };
            self.state = match (self.state, command) {
                (_, Command::Stop) => RunnerState::Stopped,
                (RunnerState::Running, Command::Pause) => RunnerState::Paused,
                (RunnerState::Paused, Command::Resume) => RunnerState::Running,
                (state, _) => state,
            };
            debug!("command {:?} -> {:?}", command, self.state);
            if self.state == RunnerState::Stopped {
                return;
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
