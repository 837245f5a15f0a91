use thiserror::Error;

use crate::grid::Axis;

#[derive(Error, Debug)]
pub enum GeothermError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required parameter `{0}`")]
    MissingParameter(&'static str),

    #[error("Unknown geometry kind: {0}")]
    UnknownGeometry(String),

    #[error("Point ({i}, {j}, {k}) lies outside the {nx}x{ny}x{nz} grid")]
    InvalidPoint {
        i: usize,
        j: usize,
        k: usize,
        nx: usize,
        ny: usize,
        nz: usize,
    },

    #[error("Invalid slice axis `{0}`, use 'x', 'y' or 'z'")]
    InvalidAxis(String),

    #[error("Slice position {position} out of range along {axis} (length {len})")]
    SliceOutOfRange { axis: Axis, position: usize, len: usize },

    #[error("Array shape {found:?} does not match grid shape {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },

    #[error("Time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),

    #[error("Temperature field became non-finite at t = {time:.3e} s")]
    NumericalBlowup { time: f64 },

    #[error("Solver has been stopped")]
    SolverStopped,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Worker error: {0}")]
    Worker(String),
}

pub type GeothermResult<T> = Result<T, GeothermError>;
