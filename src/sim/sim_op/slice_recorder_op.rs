use crate::diffusion_solver::DiffusionSolver;
use crate::grid::Axis;
use crate::sim::sim_op::{SavePoint, SimOp, SimOpHandle};
use log::warn;
use ndarray::Array2;
use std::sync::{Arc, Mutex, MutexGuard};

/// One recorded cross-section
#[derive(Debug, Clone, PartialEq)]
pub struct SliceFrame {
    pub time: f64,
    pub temperature: Array2<f64>,
}

/// Shared view of the frames a [`SliceRecorderOp`] has captured. Stays
/// readable after the operator has been moved into a runner or worker thread.
#[derive(Debug, Clone, Default)]
pub struct SliceFrames {
    inner: Arc<Mutex<Vec<SliceFrame>>>,
}

impl SliceFrames {
    fn lock(&self) -> MutexGuard<'_, Vec<SliceFrame>> {
        // frames stay consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn to_vec(&self) -> Vec<SliceFrame> {
        self.lock().clone()
    }

    fn push(&self, frame: SliceFrame) {
        self.lock().push(frame);
    }
}

/// Slice Recorder Operator
///
/// Copies one 2D slice of the temperature field at the start of the run and
/// after every save point.
#[derive(Debug)]
pub struct SliceRecorderOp {
    pub name: String,
    pub axis: Axis,
    pub position: usize,
    frames: SliceFrames,
}

impl SliceRecorderOp {
    pub fn new(axis: Axis, position: usize) -> Self {
        Self {
            name: format!("SliceRecorderOp[{}={}]", axis, position),
            axis,
            position,
            frames: SliceFrames::default(),
        }
    }

    /// Operator handle plus the frame store it writes into
    pub fn handle(axis: Axis, position: usize) -> (SimOpHandle, SliceFrames) {
        let op = Self::new(axis, position);
        let frames = op.frames();
        (SimOpHandle::new(Box::new(op)), frames)
    }

    pub fn frames(&self) -> SliceFrames {
        self.frames.clone()
    }

    fn capture(&self, solver: &DiffusionSolver) {
        match solver.get_slice(self.axis, self.position) {
            Ok(view) => self.frames.push(SliceFrame {
                time: solver.current_time(),
                temperature: view.to_owned(),
            }),
            Err(e) => warn!("{}: {}", self.name, e),
        }
    }
}

impl SimOp for SliceRecorderOp {
    fn name(&self) -> &str {
        &self.name
    }

    fn init_sim(&mut self, solver: &DiffusionSolver) {
        self.capture(solver);
    }

    fn update_sim(&mut self, solver: &DiffusionSolver, _point: &SavePoint) {
        self.capture(solver);
    }
}
