// src/velocity.rs - Prescribed hydrothermal flow fields

use crate::constants::DEFAULT_MAX_VELOCITY_M_S;
use crate::error::{GeothermError, GeothermResult};
use crate::grid::GridDomain;
use glam::{DVec2, DVec3};
use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// Flow preset used to build a [`VelocityField`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowPattern {
    /// Toroidal recirculation cell centered on the domain
    ConvectionCell {
        #[serde(default = "default_max_velocity")]
        max_velocity: f64,
    },
    /// Uniform vertical flow, vz = max_velocity
    Upward {
        #[serde(default = "default_max_velocity")]
        max_velocity: f64,
    },
    /// Uniform flow along +x, vx = max_velocity
    Lateral {
        #[serde(default = "default_max_velocity")]
        max_velocity: f64,
    },
}

fn default_max_velocity() -> f64 {
    DEFAULT_MAX_VELOCITY_M_S
}

impl FlowPattern {
    pub fn max_velocity(&self) -> f64 {
        match self {
            FlowPattern::ConvectionCell { max_velocity }
            | FlowPattern::Upward { max_velocity }
            | FlowPattern::Lateral { max_velocity } => *max_velocity,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FlowPattern::ConvectionCell { .. } => "convection_cell",
            FlowPattern::Upward { .. } => "upward",
            FlowPattern::Lateral { .. } => "lateral",
        }
    }

    pub fn build(&self, domain: &GridDomain) -> GeothermResult<VelocityField> {
        let v = self.max_velocity();
        if !v.is_finite() {
            return Err(GeothermError::Config(format!("max velocity must be finite, got {}", v)));
        }
        let field = match self {
            FlowPattern::ConvectionCell { .. } => VelocityField::convection_cell(domain, v),
            FlowPattern::Upward { .. } => VelocityField::uniform(domain, DVec3::new(0.0, 0.0, v)),
            FlowPattern::Lateral { .. } => VelocityField::uniform(domain, DVec3::new(v, 0.0, 0.0)),
        };
        Ok(field)
    }
}

/// Three velocity components (m/s) co-indexed with the temperature field.
/// Read-only once built; the solver shares it through an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityField {
    pub vx: Array3<f64>,
    pub vy: Array3<f64>,
    pub vz: Array3<f64>,
}

impl VelocityField {
    pub fn zeros(domain: &GridDomain) -> Self {
        Self {
            vx: Array3::zeros(domain.shape()),
            vy: Array3::zeros(domain.shape()),
            vz: Array3::zeros(domain.shape()),
        }
    }

    pub fn uniform(domain: &GridDomain, v: DVec3) -> Self {
        Self {
            vx: Array3::from_elem(domain.shape(), v.x),
            vy: Array3::from_elem(domain.shape(), v.y),
            vz: Array3::from_elem(domain.shape(), v.z),
        }
    }

    /// Wraps externally computed components after checking their shapes
    pub fn from_components(
        domain: &GridDomain,
        vx: Array3<f64>,
        vy: Array3<f64>,
        vz: Array3<f64>,
    ) -> GeothermResult<Self> {
        for found in [vx.dim(), vy.dim(), vz.dim()] {
            if found != domain.shape() {
                return Err(GeothermError::ShapeMismatch {
                    expected: domain.shape(),
                    found,
                });
            }
        }
        Ok(Self { vx, vy, vz })
    }

    /// Recirculation cell inside a sphere of `min(nx, ny, nz) / 4` cells around
    /// the domain center. Fluid rises below the center and sinks above it.
    /// With `r` the horizontal distance from the vertical axis, the speed decays
    /// as `exp(-(r / R)^2)` and the horizontal components are a unit vector
    /// toward the axis, zero on the axis itself.
    pub fn convection_cell(domain: &GridDomain, max_velocity: f64) -> Self {
        let mut field = Self::zeros(domain);
        let radius_cells = domain.nx.min(domain.ny).min(domain.nz) / 4;
        if radius_cells == 0 {
            return field;
        }
        let radius = radius_cells as f64 * domain.dx;
        let center = domain.center_position();

        for ((i, j, k), vz) in field.vz.indexed_iter_mut() {
            let offset = domain.position(i, j, k) - center;
            if offset.length() > radius {
                continue;
            }
            let horizontal = DVec2::new(offset.x, offset.y);
            let r = horizontal.length();
            let decay = (-(r / radius).powi(2)).exp();
            *vz = if offset.z < 0.0 { max_velocity * decay } else { -max_velocity * decay };
            if r > 0.0 {
                let inward = -horizontal / r * max_velocity * decay;
                field.vx[[i, j, k]] = inward.x;
                field.vy[[i, j, k]] = inward.y;
            }
        }
        field
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        self.vx.dim()
    }

    pub fn at(&self, i: usize, j: usize, k: usize) -> DVec3 {
        DVec3::new(self.vx[[i, j, k]], self.vy[[i, j, k]], self.vz[[i, j, k]])
    }

    /// Largest speed found anywhere in the field
    pub fn max_speed(&self) -> f64 {
        let mut max = 0.0_f64;
        for ((a, b), c) in self.vx.iter().zip(self.vy.iter()).zip(self.vz.iter()) {
            max = max.max(DVec3::new(*a, *b, *c).length());
        }
        max
    }
}
