//! Structured 3D grid: cell counts along each axis and the physical spacing
//! between cell centers.

use crate::constants::{DEFAULT_CELL_SIZE_M, DEFAULT_GRID_CELLS};
use crate::error::{GeothermError, GeothermResult};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Grid axis used to address slices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }

    /// ndarray axis index
    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = GeothermError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            _ => Err(GeothermError::InvalidAxis(s.to_string())),
        }
    }
}

/// Immutable grid description. Cell (i, j, k) sits at (i·dx, j·dy, k·dz).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridDomain {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

impl Default for GridDomain {
    fn default() -> Self {
        Self {
            nx: DEFAULT_GRID_CELLS,
            ny: DEFAULT_GRID_CELLS,
            nz: DEFAULT_GRID_CELLS,
            dx: DEFAULT_CELL_SIZE_M,
            dy: DEFAULT_CELL_SIZE_M,
            dz: DEFAULT_CELL_SIZE_M,
        }
    }
}

impl GridDomain {
    pub fn new(nx: usize, ny: usize, nz: usize, dx: f64, dy: f64, dz: f64) -> GeothermResult<Self> {
        let domain = Self { nx, ny, nz, dx, dy, dz };
        domain.validate()?;
        Ok(domain)
    }

    /// Grid with the same spacing `h` along every axis
    pub fn cubic(nx: usize, ny: usize, nz: usize, h: f64) -> GeothermResult<Self> {
        Self::new(nx, ny, nz, h, h, h)
    }

    pub fn validate(&self) -> GeothermResult<()> {
        if self.nx == 0 || self.ny == 0 || self.nz == 0 {
            return Err(GeothermError::Config(format!(
                "grid dimensions must be at least 1, got {}x{}x{}",
                self.nx, self.ny, self.nz
            )));
        }
        for (name, h) in [("dx", self.dx), ("dy", self.dy), ("dz", self.dz)] {
            if !(h.is_finite() && h > 0.0) {
                return Err(GeothermError::Config(format!("{} must be positive, got {}", name, h)));
            }
        }
        Ok(())
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    pub fn cell_count(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    pub fn spacing(&self) -> DVec3 {
        DVec3::new(self.dx, self.dy, self.dz)
    }

    pub fn min_spacing(&self) -> f64 {
        self.dx.min(self.dy).min(self.dz)
    }

    pub fn is_cubic(&self) -> bool {
        self.dx == self.dy && self.dy == self.dz
    }

    /// Number of cells along `axis`
    pub fn axis_len(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => self.nx,
            Axis::Y => self.ny,
            Axis::Z => self.nz,
        }
    }

    /// Physical coordinates (m) of cell (i, j, k)
    pub fn position(&self, i: usize, j: usize, k: usize) -> DVec3 {
        DVec3::new(i as f64 * self.dx, j as f64 * self.dy, k as f64 * self.dz)
    }

    pub fn contains(&self, i: usize, j: usize, k: usize) -> bool {
        i < self.nx && j < self.ny && k < self.nz
    }

    pub fn check_point(&self, i: usize, j: usize, k: usize) -> GeothermResult<()> {
        if self.contains(i, j, k) {
            Ok(())
        } else {
            Err(GeothermError::InvalidPoint {
                i,
                j,
                k,
                nx: self.nx,
                ny: self.ny,
                nz: self.nz,
            })
        }
    }

    /// Index of the center cell, (nx/2, ny/2, nz/2)
    pub fn center_index(&self) -> [usize; 3] {
        [self.nx / 2, self.ny / 2, self.nz / 2]
    }

    /// Physical position of the center cell
    pub fn center_position(&self) -> DVec3 {
        let [cx, cy, cz] = self.center_index();
        self.position(cx, cy, cz)
    }

    /// Monitoring points used when a run does not name its own: the center,
    /// then 10, 20 and 50 cells along +x. The 50-cell monitor falls back to the
    /// last x index when it does not fit.
    pub fn default_monitor_points(&self) -> Vec<[usize; 3]> {
        let [cx, cy, cz] = self.center_index();
        let mut points = vec![[cx, cy, cz]];
        for offset in [10, 20] {
            if cx + offset < self.nx {
                points.push([cx + offset, cy, cz]);
            }
        }
        let far = if cx + 50 < self.nx { [cx + 50, cy, cz] } else { [self.nx - 1, cy, cz] };
        if !points.contains(&far) {
            points.push(far);
        }
        points
    }
}
