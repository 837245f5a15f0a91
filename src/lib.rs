pub mod constants;
pub mod error;
pub mod math_utils;
pub mod grid;
pub mod geometry;
pub mod material;
pub mod velocity;
pub mod history;
pub mod diffusion_solver;
pub mod analytical;
pub mod config;
pub mod parameter_store;
pub mod sim;

pub use error::{GeothermError, GeothermResult};
