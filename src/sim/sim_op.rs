mod console_reporter_op;
mod slice_recorder_op;

pub use console_reporter_op::ConsoleReporterOp;
pub use slice_recorder_op::{SliceFrame, SliceFrames, SliceRecorderOp};

use crate::diffusion_solver::DiffusionSolver;
use crate::sim::RunnerState;

/// Position of the run when an operator is called
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavePoint {
    /// Zero-based save point index
    pub index: usize,
    /// Save points planned for the run
    pub total: usize,
    /// Simulation time reached (s)
    pub time: f64,
    /// Percent complete, 0..=100
    pub progress: u8,
}

/// Observer plugged into a run. Operators only see the solver between save
/// points, never mid-step.
pub trait SimOp: Send {
    /// The name of this operator (for identification and lookup)
    fn name(&self) -> &str;

    /// Called once before the first save interval
    fn init_sim(&mut self, _solver: &DiffusionSolver) {
        // Default implementation does nothing
    }

    /// Called after every save point
    fn update_sim(&mut self, _solver: &DiffusionSolver, _point: &SavePoint) {
        // Default implementation does nothing
    }

    /// Called once when the run ends, whatever the outcome
    fn after_sim(&mut self, _solver: &DiffusionSolver, _state: RunnerState) {
        // Default implementation does nothing
    }
}

pub struct SimOpHandle {
    pub op: Box<dyn SimOp>,
}

impl SimOpHandle {
    /// Create a new SimOpHandle with the given operation
    pub fn new(op: Box<dyn SimOp>) -> Self {
        SimOpHandle { op }
    }
}
