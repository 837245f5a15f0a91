// src/config.rs - Fully resolved run configuration

use crate::constants::{DEFAULT_DURATION_S, DEFAULT_SAVE_INTERVAL_S};
use crate::diffusion_solver::{BoundaryCondition, DiffusionSolver, StencilSpacing};
use crate::error::{GeothermError, GeothermResult};
use crate::geometry::{IntrusionMask, IntrusionPreset};
use crate::grid::GridDomain;
use crate::material::MaterialProperties;
use crate::velocity::{FlowPattern, VelocityField};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Run length and recording cadence (s)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeControl {
    pub duration: f64,
    pub save_interval: f64,
}

impl Default for TimeControl {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_S,
            save_interval: DEFAULT_SAVE_INTERVAL_S,
        }
    }
}

impl TimeControl {
    pub fn new(duration: f64, save_interval: f64) -> GeothermResult<Self> {
        let time = Self { duration, save_interval };
        time.validate()?;
        Ok(time)
    }

    pub fn validate(&self) -> GeothermResult<()> {
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(GeothermError::Config(format!("duration must be >= 0, got {}", self.duration)));
        }
        if !(self.save_interval.is_finite() && self.save_interval > 0.0) {
            return Err(GeothermError::Config(format!(
                "save interval must be positive, got {}",
                self.save_interval
            )));
        }
        Ok(())
    }

    /// Whole save intervals that fit in the duration
    pub fn save_points(&self) -> usize {
        (self.duration / self.save_interval).floor() as usize
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub domain: GridDomain,
    pub material: MaterialProperties,
    pub intrusion: Option<IntrusionPreset>,
    pub flow: Option<FlowPattern>,
    pub boundary: BoundaryCondition,
    pub stencil: StencilSpacing,
    pub time: TimeControl,
    /// Cells to record; the default monitor set is used when absent
    pub history_points: Option<Vec<[usize; 3]>>,
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> GeothermResult<Self> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> GeothermResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> GeothermResult<()> {
        self.domain.validate()?;
        self.material.validate()?;
        self.time.validate()?;
        if let Some(intrusion) = &self.intrusion {
            intrusion.resolve(&self.domain)?;
        }
        if let Some(points) = &self.history_points {
            for &[i, j, k] in points {
                self.domain.check_point(i, j, k)?;
            }
        }
        Ok(())
    }

    pub fn build_mask(&self) -> GeothermResult<Option<IntrusionMask>> {
        match &self.intrusion {
            Some(preset) => Ok(Some(preset.resolve(&self.domain)?.build_mask(&self.domain))),
            None => Ok(None),
        }
    }

    pub fn build_velocity(&self) -> GeothermResult<Option<Arc<VelocityField>>> {
        self.flow
            .map(|flow| flow.build(&self.domain).map(Arc::new))
            .transpose()
    }

    /// Ready solver with the intrusion painted in and history points registered
    pub fn build_solver(&self) -> GeothermResult<DiffusionSolver> {
        self.validate()?;
        let mask = self.build_mask()?;
        let velocity = self.build_velocity()?;

        let mut solver = DiffusionSolver::initialize(self.domain, self.material, velocity, mask.as_ref())?
            .with_boundary(self.boundary)
            .with_stencil(self.stencil);

        let points = match &self.history_points {
            Some(points) => points.clone(),
            None => self.domain.default_monitor_points(),
        };
        for [i, j, k] in points {
            solver.add_history_point(i, j, k)?;
        }
        Ok(solver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SillSize;

    #[test]
    fn test_defaults_match_tool() {
        let config = SimulationConfig::from_json_str("{}").unwrap();
        assert_eq!(config.domain.shape(), (100, 100, 100));
        assert_eq!(config.domain.dx, 10.0);
        assert_eq!(config.material.diffusivity_m2_s, 1e-6);
        assert_eq!(config.time.save_points(), 10);
        assert_eq!(config.boundary, BoundaryCondition::Fixed(0.0));
        assert_eq!(config.stencil, StencilSpacing::PerAxis);
        assert!(config.intrusion.is_none());
    }

    #[test]
    fn test_tagged_intrusion_from_json() {
        let json = r#"{
            "domain": { "nx": 20, "ny": 20, "nz": 20, "dx": 10.0, "dy": 10.0, "dz": 10.0 },
            "intrusion": { "kind": "sill", "width": 100.0, "height": 100.0, "thickness": 20.0 },
            "flow": { "kind": "upward", "max_velocity": 1e-7 },
            "boundary": "background",
            "history_points": [[10, 10, 10]]
        }"#;
        let config = SimulationConfig::from_json_str(json).unwrap();
        assert_eq!(
            config.intrusion,
            Some(IntrusionPreset::Sill(SillSize {
                width: 100.0,
                height: 100.0,
                thickness: 20.0
            }))
        );

        let solver = config.build_solver().unwrap();
        assert_eq!(solver.center_temperature(), 1200.0);
        assert_eq!(solver.history().len(), 1);
        assert_eq!(solver.boundary(), BoundaryCondition::Background);
        assert!(solver.velocity().is_some());
    }

    #[test]
    fn test_default_monitors_are_registered() {
        let config = SimulationConfig {
            domain: GridDomain::cubic(10, 10, 10, 10.0).unwrap(),
            ..Default::default()
        };
        let solver = config.build_solver().unwrap();
        let indices: Vec<[usize; 3]> = solver.history().iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![[5, 5, 5], [9, 5, 5]]);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let bad_points = r#"{ "domain": { "nx": 4, "ny": 4, "nz": 4, "dx": 1.0, "dy": 1.0, "dz": 1.0 },
                              "history_points": [[4, 0, 0]] }"#;
        assert!(matches!(
            SimulationConfig::from_json_str(bad_points),
            Err(GeothermError::InvalidPoint { .. })
        ));

        let bad_latent = r#"{ "material": { "use_latent_heat": true,
                              "latent_heat": { "solidus_c": 1300.0, "liquidus_c": 1200.0, "latent_heat_j_kg": 4e5 } } }"#;
        assert!(matches!(
            SimulationConfig::from_json_str(bad_latent),
            Err(GeothermError::Config(_))
        ));

        assert!(matches!(
            SimulationConfig::from_json_str("{ not json"),
            Err(GeothermError::Json(_))
        ));
        assert!(TimeControl::new(1e6, 0.0).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = SimulationConfig {
            domain: GridDomain::cubic(8, 8, 8, 5.0).unwrap(),
            intrusion: Some(IntrusionPreset::Pluton { radius: 10.0 }),
            flow: Some(FlowPattern::ConvectionCell { max_velocity: 1e-6 }),
            boundary: BoundaryCondition::Fixed(15.0),
            ..Default::default()
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(SimulationConfig::from_json_str(&json).unwrap(), config);
    }
}
