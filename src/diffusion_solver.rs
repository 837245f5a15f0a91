/// Explicit finite-difference heat solver for a cooling intrusion
///
/// Each step combines three contributions on the structured grid:
/// - conduction through a 7-point Laplacian stencil
/// - advection by an optional prescribed velocity field
/// - latent heat released as the melt crystallizes between liquidus and solidus
///
/// The scheme is forward-time, central-space. Requested steps larger than the
/// stability bound are clamped and reported rather than rejected.

use crate::constants::{ACCURACY_FACTOR, STABILITY_FACTOR};
use crate::error::{GeothermError, GeothermResult};
use crate::geometry::IntrusionMask;
use crate::grid::{Axis, GridDomain};
use crate::history::HistoryPoint;
use crate::material::MaterialProperties;
use crate::velocity::VelocityField;
use log::{debug, info, warn};
use ndarray::{Array3, ArrayView2};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Temperature assumed for the ghost cells just outside the grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryCondition {
    /// Constant temperature (°C) on every face
    Fixed(f64),
    /// Faces held at the material's background temperature
    Background,
}

impl Default for BoundaryCondition {
    fn default() -> Self {
        BoundaryCondition::Fixed(0.0)
    }
}

/// Spacing used to scale the second differences along each axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StencilSpacing {
    /// dx² along x, dy² along y, dz² along z
    #[default]
    PerAxis,
    /// dx² along every axis (legacy behavior, only exact on cubic grids).
    /// Advection gradients still use dx, dy and dz.
    Uniform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    Ready,
    Stepping,
    Stopped,
}

/// Outcome of one accepted time step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Step actually taken (s)
    pub dt: f64,
    /// True when the requested step exceeded the stability bound
    pub clamped: bool,
    /// Sum over all cells of the latent-heat temperature increment (°C)
    pub latent_release: f64,
}

/// Equal sub-steps carrying the clock from its current value to `target_time`.
/// The last step lands exactly on the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPlan {
    pub target_time: f64,
    pub dt: f64,
    pub steps: usize,
}

#[derive(Debug, Clone)]
pub struct DiffusionSolver {
    domain: GridDomain,
    properties: MaterialProperties,
    velocity: Option<Arc<VelocityField>>,
    boundary: BoundaryCondition,
    stencil: StencilSpacing,
    temperature: Array3<f64>,
    current_time: f64,
    history: Vec<HistoryPoint>,
    state: SolverState,
}

impl DiffusionSolver {
    /// Allocates the field at background temperature and paints the
    /// intrusion cells at magma temperature.
    pub fn initialize(
        domain: GridDomain,
        properties: MaterialProperties,
        velocity: Option<Arc<VelocityField>>,
        mask: Option<&IntrusionMask>,
    ) -> GeothermResult<Self> {
        domain.validate()?;
        properties.validate()?;

        if let Some(v) = &velocity {
            if v.shape() != domain.shape() {
                return Err(GeothermError::ShapeMismatch {
                    expected: domain.shape(),
                    found: v.shape(),
                });
            }
        }

        let mut temperature = Array3::from_elem(domain.shape(), properties.background_temp_c);
        let mut intrusion_cells = 0;
        if let Some(mask) = mask {
            if mask.shape() != domain.shape() {
                return Err(GeothermError::ShapeMismatch {
                    expected: domain.shape(),
                    found: mask.shape(),
                });
            }
            temperature.zip_mut_with(mask.as_array(), |t, &inside| {
                if inside {
                    *t = properties.magma_temp_c;
                }
            });
            intrusion_cells = mask.count();
        }

        if !domain.is_cubic() {
            warn!(
                "non-cubic grid ({} x {} x {} m); per-axis stencil results differ from the uniform dx² formula",
                domain.dx, domain.dy, domain.dz
            );
        }

        info!(
            "initialized {}x{}x{} solver: {} intrusion cells at {} °C, background {} °C, convection {}, latent heat {}",
            domain.nx,
            domain.ny,
            domain.nz,
            intrusion_cells,
            properties.magma_temp_c,
            properties.background_temp_c,
            if velocity.is_some() { "on" } else { "off" },
            if properties.use_latent_heat { "on" } else { "off" },
        );

        Ok(Self {
            domain,
            properties,
            velocity,
            boundary: BoundaryCondition::default(),
            stencil: StencilSpacing::default(),
            temperature,
            current_time: 0.0,
            history: Vec::new(),
            state: SolverState::Ready,
        })
    }

    pub fn with_boundary(mut self, boundary: BoundaryCondition) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_stencil(mut self, stencil: StencilSpacing) -> Self {
        self.stencil = stencil;
        self
    }

    // ---------------------------------------------------------------- accessors

    pub fn domain(&self) -> &GridDomain {
        &self.domain
    }

    pub fn properties(&self) -> &MaterialProperties {
        &self.properties
    }

    pub fn velocity(&self) -> Option<&VelocityField> {
        self.velocity.as_deref()
    }

    pub fn boundary(&self) -> BoundaryCondition {
        self.boundary
    }

    pub fn stencil(&self) -> StencilSpacing {
        self.stencil
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn temperature(&self) -> &Array3<f64> {
        &self.temperature
    }

    pub fn temperature_at(&self, i: usize, j: usize, k: usize) -> GeothermResult<f64> {
        self.domain.check_point(i, j, k)?;
        Ok(self.temperature[[i, j, k]])
    }

    /// Temperature of the domain-center cell
    pub fn center_temperature(&self) -> f64 {
        let [i, j, k] = self.domain.center_index();
        self.temperature[[i, j, k]]
    }

    /// Replaces the whole field, e.g. to resume from a stored snapshot
    pub fn set_temperature_field(&mut self, field: Array3<f64>) -> GeothermResult<()> {
        if field.dim() != self.domain.shape() {
            return Err(GeothermError::ShapeMismatch {
                expected: self.domain.shape(),
                found: field.dim(),
            });
        }
        self.temperature = field;
        Ok(())
    }

    pub fn history(&self) -> &[HistoryPoint] {
        &self.history
    }

    pub fn history_at(&self, i: usize, j: usize, k: usize) -> Option<&HistoryPoint> {
        self.history.iter().find(|p| p.index == [i, j, k])
    }

    /// Largest step accepted without clamping
    pub fn max_stable_dt(&self) -> f64 {
        STABILITY_FACTOR * self.domain.min_spacing().powi(2) / self.properties.diffusivity_m2_s
    }

    /// Sub-step used by `simulate_to` before rescaling
    pub fn accuracy_dt(&self) -> f64 {
        ACCURACY_FACTOR * self.domain.min_spacing().powi(2) / self.properties.diffusivity_m2_s
    }

    pub fn mark_stopped(&mut self) {
        self.state = SolverState::Stopped;
    }

    pub fn is_stopped(&self) -> bool {
        self.state == SolverState::Stopped
    }

    pub fn check_finite(&self) -> GeothermResult<()> {
        if self.temperature.iter().all(|t| t.is_finite()) {
            Ok(())
        } else {
            Err(GeothermError::NumericalBlowup {
                time: self.current_time,
            })
        }
    }

    // ------------------------------------------------------------------ history

    /// Starts recording cell (i, j, k). The current temperature becomes the
    /// first sample. Registering the same cell twice keeps the existing series.
    pub fn add_history_point(&mut self, i: usize, j: usize, k: usize) -> GeothermResult<()> {
        self.domain.check_point(i, j, k)?;
        if self.history_at(i, j, k).is_some() {
            return Ok(());
        }
        let mut point = HistoryPoint::new([i, j, k]);
        point.record(self.current_time, self.temperature[[i, j, k]]);
        self.history.push(point);
        Ok(())
    }

    // ------------------------------------------------------------------- slices

    /// 2D view of the field at `position` along `axis`
    pub fn get_slice(&self, axis: Axis, position: usize) -> GeothermResult<ArrayView2<'_, f64>> {
        let len = self.domain.axis_len(axis);
        if position >= len {
            return Err(GeothermError::SliceOutOfRange { axis, position, len });
        }
        Ok(self.temperature.index_axis(ndarray::Axis(axis.index()), position))
    }

    /// Same as [`get_slice`](Self::get_slice) with the axis given as "x", "y" or "z"
    pub fn get_slice_named(&self, axis: &str, position: usize) -> GeothermResult<ArrayView2<'_, f64>> {
        self.get_slice(axis.parse()?, position)
    }

    // ----------------------------------------------------------------- stepping

    pub fn simulate_step(&mut self, dt: f64) -> GeothermResult<StepReport> {
        self.ensure_running()?;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(GeothermError::InvalidTimeStep(dt));
        }

        let max_dt = self.max_stable_dt();
        let clamped = dt > max_dt;
        let dt = if clamped {
            warn!(
                "time step {:.3e} s exceeds stability limit, clamped to {:.3e} s",
                dt, max_dt
            );
            max_dt
        } else {
            dt
        };

        let next_time = self.current_time + dt;
        if next_time <= self.current_time {
            return Err(GeothermError::InvalidTimeStep(dt));
        }
        let latent_release = self.advance(dt, next_time);
        Ok(StepReport {
            dt,
            clamped,
            latent_release,
        })
    }

    /// Advances the clock to `target_time` with uniform sub-steps and returns
    /// the number of steps taken. Targets at or before the current time do
    /// nothing.
    pub fn simulate_to(&mut self, target_time: f64) -> GeothermResult<usize> {
        let plan = self.plan_to(target_time)?;
        for step in 0..plan.steps {
            self.take_planned_step(&plan, step)?;
        }
        if plan.steps > 0 {
            debug!("advanced to t = {:.3e} s in {} steps", target_time, plan.steps);
        }
        Ok(plan.steps)
    }

    /// Splits the way to `target_time` into sub-steps no longer than
    /// [`accuracy_dt`](Self::accuracy_dt). Zero steps when the target is not ahead.
    pub fn plan_to(&self, target_time: f64) -> GeothermResult<StepPlan> {
        self.ensure_running()?;
        if !target_time.is_finite() {
            return Err(GeothermError::InvalidTimeStep(target_time));
        }
        let remaining = target_time - self.current_time;
        if remaining <= 0.0 {
            return Ok(StepPlan {
                target_time,
                dt: 0.0,
                steps: 0,
            });
        }

        let steps = (remaining / self.accuracy_dt()).ceil().max(1.0) as usize;
        Ok(StepPlan {
            target_time,
            dt: remaining / steps as f64,
            steps,
        })
    }

    /// Takes sub-step `step` (zero-based) of `plan`. Callers may stop between
    /// any two sub-steps; the field is always left consistent.
    pub fn take_planned_step(&mut self, plan: &StepPlan, step: usize) -> GeothermResult<f64> {
        self.ensure_running()?;
        let next_time = if step + 1 >= plan.steps {
            plan.target_time
        } else {
            self.current_time + plan.dt
        };
        if !(plan.dt > 0.0 && next_time > self.current_time) {
            return Err(GeothermError::InvalidTimeStep(plan.dt));
        }
        Ok(self.advance(plan.dt, next_time))
    }

    fn ensure_running(&self) -> GeothermResult<()> {
        match self.state {
            SolverState::Stopped => Err(GeothermError::SolverStopped),
            _ => Ok(()),
        }
    }

    fn ghost_temperature(&self) -> f64 {
        match self.boundary {
            BoundaryCondition::Fixed(t) => t,
            BoundaryCondition::Background => self.properties.background_temp_c,
        }
    }

    fn stencil_spacing(&self) -> [f64; 3] {
        match self.stencil {
            StencilSpacing::PerAxis => [self.domain.dx, self.domain.dy, self.domain.dz],
            StencilSpacing::Uniform => [self.domain.dx; 3],
        }
    }

    /// One explicit update of the whole field; returns the summed latent increment
    fn advance(&mut self, dt: f64, next_time: f64) -> f64 {
        self.state = SolverState::Stepping;

        let (nx, ny, nz) = self.domain.shape();
        let kappa = self.properties.diffusivity_m2_s;
        let ghost = self.ghost_temperature();
        let s = self.stencil_spacing();
        let inv_h2 = [1.0 / (s[0] * s[0]), 1.0 / (s[1] * s[1]), 1.0 / (s[2] * s[2])];
        // advection always uses the true spacing
        let h = [self.domain.dx, self.domain.dy, self.domain.dz];
        let t = &self.temperature;
        let velocity = self.velocity.as_deref();

        let at = |i: isize, j: isize, k: isize| -> f64 {
            if i < 0 || j < 0 || k < 0 || i >= nx as isize || j >= ny as isize || k >= nz as isize {
                ghost
            } else {
                t[[i as usize, j as usize, k as usize]]
            }
        };

        // provisional field after conduction and advection
        let provisional = Array3::from_shape_fn((nx, ny, nz), |(i, j, k)| {
            let center = t[[i, j, k]];
            let (ii, jj, kk) = (i as isize, j as isize, k as isize);

            let laplacian = (at(ii - 1, jj, kk) + at(ii + 1, jj, kk) - 2.0 * center) * inv_h2[0]
                + (at(ii, jj - 1, kk) + at(ii, jj + 1, kk) - 2.0 * center) * inv_h2[1]
                + (at(ii, jj, kk - 1) + at(ii, jj, kk + 1) - 2.0 * center) * inv_h2[2];
            let mut rate = kappa * laplacian;

            if let Some(v) = velocity {
                // centered gradients on interior cells only
                let mut advection = 0.0;
                if i > 0 && i + 1 < nx {
                    advection += v.vx[[i, j, k]] * (t[[i + 1, j, k]] - t[[i - 1, j, k]]) / (2.0 * h[0]);
                }
                if j > 0 && j + 1 < ny {
                    advection += v.vy[[i, j, k]] * (t[[i, j + 1, k]] - t[[i, j - 1, k]]) / (2.0 * h[1]);
                }
                if k > 0 && k + 1 < nz {
                    advection += v.vz[[i, j, k]] * (t[[i, j, k + 1]] - t[[i, j, k - 1]]) / (2.0 * h[2]);
                }
                rate -= advection;
            }

            center + dt * rate
        });

        let mut latent_release = 0.0;
        let next = match self.properties.active_latent_heat() {
            Some(latent) => {
                let props = &self.properties;
                let mut next = provisional;
                next.zip_mut_with(t, |new, &old| {
                    let delta_phi = latent.crystallization_fraction(*new) - latent.crystallization_fraction(old);
                    let source_rate = latent.latent_heat_j_kg * props.density_kg_m3 * delta_phi
                        / (props.specific_heat_j_kg_k * props.density_kg_m3 * dt);
                    let increment = dt * source_rate;
                    latent_release += increment;
                    *new += increment;
                });
                next
            }
            None => provisional,
        };

        self.temperature = next;
        self.current_time = next_time;
        for point in &mut self.history {
            let [i, j, k] = point.index;
            point.record(next_time, self.temperature[[i, j, k]]);
        }
        self.state = SolverState::Ready;
        latent_release
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::IntrusionShape;
    use crate::material::LatentHeat;
    use approx::assert_abs_diff_eq;
    use glam::DVec3;

    fn small_grid() -> GridDomain {
        GridDomain::cubic(10, 10, 10, 10.0).unwrap()
    }

    fn plain_solver(domain: GridDomain) -> DiffusionSolver {
        DiffusionSolver::initialize(domain, MaterialProperties::default(), None, None).unwrap()
    }

    #[test]
    fn test_fresh_field_is_background() {
        let solver = plain_solver(small_grid());
        assert!(solver.temperature().iter().all(|&t| t == 20.0));
        assert_eq!(solver.current_time(), 0.0);
        assert_eq!(solver.state(), SolverState::Ready);
    }

    #[test]
    fn test_mask_sets_magma_temperature() {
        let domain = small_grid();
        let mask = IntrusionShape::Spherical {
            center: DVec3::new(50.0, 50.0, 50.0),
            radius: 10.0,
        }
        .build_mask(&domain);
        let solver = DiffusionSolver::initialize(domain, MaterialProperties::default(), None, Some(&mask)).unwrap();
        assert_eq!(solver.center_temperature(), 1200.0);
        assert_eq!(solver.temperature().iter().filter(|&&t| t == 1200.0).count(), 7);
    }

    #[test]
    fn test_mask_shape_is_checked() {
        let other = GridDomain::cubic(4, 4, 4, 10.0).unwrap();
        let mask = IntrusionMask::empty(&other);
        let result = DiffusionSolver::initialize(small_grid(), MaterialProperties::default(), None, Some(&mask));
        assert!(matches!(result, Err(GeothermError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_invalid_properties_are_rejected() {
        let props = MaterialProperties::new(-1.0, 20.0, 1200.0);
        assert!(DiffusionSolver::initialize(small_grid(), props, None, None).is_err());
    }

    #[test]
    fn test_large_step_is_clamped() {
        let mut clamped = plain_solver(small_grid());
        let mut reference = plain_solver(small_grid());
        let max_dt = clamped.max_stable_dt();
        assert_abs_diff_eq!(max_dt, 0.2 * 100.0 / 1e-6, epsilon = 1e-3);

        let report = clamped.simulate_step(1e15).unwrap();
        assert!(report.clamped);
        assert_eq!(report.dt, max_dt);

        let report = reference.simulate_step(max_dt).unwrap();
        assert!(!report.clamped);
        assert_eq!(clamped.temperature(), reference.temperature());
        assert_eq!(clamped.current_time(), reference.current_time());
    }

    #[test]
    fn test_non_positive_step_is_an_error() {
        let mut solver = plain_solver(small_grid());
        assert!(matches!(solver.simulate_step(0.0), Err(GeothermError::InvalidTimeStep(_))));
        assert!(matches!(solver.simulate_step(-1.0), Err(GeothermError::InvalidTimeStep(_))));
        assert!(solver.simulate_step(f64::NAN).is_err());
        assert_eq!(solver.current_time(), 0.0);
    }

    #[test]
    fn test_background_boundary_keeps_uniform_field() {
        let mut solver = plain_solver(small_grid()).with_boundary(BoundaryCondition::Background);
        solver.simulate_step(1e6).unwrap();
        for &t in solver.temperature().iter() {
            assert_abs_diff_eq!(t, 20.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_boundary_cools_faces_only() {
        let mut solver = plain_solver(small_grid());
        solver.simulate_step(1e6).unwrap();
        // corner touches three ghost faces at 0 °C, κ·dt/h² = 0.01
        assert_abs_diff_eq!(solver.temperature()[[0, 0, 0]], 20.0 - 0.01 * 3.0 * 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(solver.temperature()[[5, 5, 5]], 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_simulate_to_hits_target_exactly() {
        let mut solver = plain_solver(small_grid());
        solver.add_history_point(5, 5, 5).unwrap();
        let steps = solver.simulate_to(1e8).unwrap();
        assert_eq!(steps, 10);
        assert_eq!(solver.current_time(), 1e8);

        let history = solver.history_at(5, 5, 5).unwrap();
        assert_eq!(history.len(), 11);
        assert_eq!(history.latest().map(|(t, _)| t), Some(1e8));

        // partial interval is rounded up to a whole step
        let steps = solver.simulate_to(1.05e8).unwrap();
        assert_eq!(steps, 1);
        assert_eq!(solver.current_time(), 1.05e8);
    }

    #[test]
    fn test_simulate_to_past_time_is_noop() {
        let mut solver = plain_solver(small_grid());
        solver.add_history_point(0, 0, 0).unwrap();
        solver.simulate_to(2e7).unwrap();
        let before = solver.temperature().clone();

        assert_eq!(solver.simulate_to(1e7).unwrap(), 0);
        assert_eq!(solver.simulate_to(2e7).unwrap(), 0);
        assert_eq!(solver.temperature(), &before);
        assert_eq!(solver.history()[0].len(), 3);
    }

    #[test]
    fn test_history_point_registration() {
        let mut solver = plain_solver(small_grid());
        assert!(matches!(
            solver.add_history_point(10, 0, 0),
            Err(GeothermError::InvalidPoint { .. })
        ));
        assert!(solver.history().is_empty());

        solver.add_history_point(1, 2, 3).unwrap();
        solver.simulate_step(1e6).unwrap();
        solver.add_history_point(1, 2, 3).unwrap();
        assert_eq!(solver.history().len(), 1);
        assert_eq!(solver.history()[0].len(), 2);
    }

    #[test]
    fn test_slices() {
        let domain = GridDomain::new(4, 5, 6, 1.0, 1.0, 1.0).unwrap();
        let solver = plain_solver(domain);
        assert_eq!(solver.get_slice(Axis::X, 0).unwrap().dim(), (5, 6));
        assert_eq!(solver.get_slice(Axis::Y, 4).unwrap().dim(), (4, 6));
        assert_eq!(solver.get_slice(Axis::Z, 5).unwrap().dim(), (4, 5));
        assert!(matches!(
            solver.get_slice(Axis::Y, 5),
            Err(GeothermError::SliceOutOfRange { len: 5, .. })
        ));
        assert!(matches!(solver.get_slice_named("q", 0), Err(GeothermError::InvalidAxis(_))));
        assert!(solver.get_slice_named("Z", 1).is_ok());
    }

    #[test]
    fn test_advection_of_linear_profile() {
        let domain = GridDomain::cubic(5, 5, 5, 1.0).unwrap();
        let velocity = Arc::new(VelocityField::uniform(&domain, DVec3::new(0.0, 0.0, 1e-6)));
        let mut solver =
            DiffusionSolver::initialize(domain, MaterialProperties::default(), Some(velocity), None).unwrap();
        let ramp = Array3::from_shape_fn(domain.shape(), |(_, _, k)| k as f64);
        solver.set_temperature_field(ramp).unwrap();

        solver.simulate_step(1000.0).unwrap();
        // interior Laplacian of a ramp is zero, so only -vz·dT/dz remains
        assert_abs_diff_eq!(solver.temperature()[[2, 2, 2]], 2.0 - 1e-3, epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_stencil_differs_on_non_cubic_grid() {
        let domain = GridDomain::new(6, 6, 6, 10.0, 10.0, 5.0).unwrap();
        let mask = IntrusionShape::Spherical {
            center: DVec3::new(30.0, 30.0, 15.0),
            radius: 1.0,
        }
        .build_mask(&domain);
        let props = MaterialProperties::default();
        let mut per_axis = DiffusionSolver::initialize(domain, props, None, Some(&mask))
            .unwrap()
            .with_boundary(BoundaryCondition::Background);
        let mut uniform = per_axis.clone().with_stencil(StencilSpacing::Uniform);

        per_axis.simulate_step(1e6).unwrap();
        uniform.simulate_step(1e6).unwrap();
        assert!(per_axis.temperature()[[3, 3, 3]] < uniform.temperature()[[3, 3, 3]]);
    }

    #[test]
    fn test_uniform_stencil_advection_uses_true_spacing() {
        let domain = GridDomain::new(5, 5, 5, 10.0, 10.0, 5.0).unwrap();
        let velocity = Arc::new(VelocityField::uniform(&domain, DVec3::new(0.0, 0.0, 1e-6)));
        let ramp = Array3::from_shape_fn(domain.shape(), |(_, _, k)| k as f64);

        for stencil in [StencilSpacing::PerAxis, StencilSpacing::Uniform] {
            let mut solver =
                DiffusionSolver::initialize(domain, MaterialProperties::default(), Some(velocity.clone()), None)
                    .unwrap()
                    .with_stencil(stencil);
            solver.set_temperature_field(ramp.clone()).unwrap();
            solver.simulate_step(1000.0).unwrap();
            // dT/dz = 1 / 5 m, so vz·dT/dz·dt = 2e-4 in both modes
            assert_abs_diff_eq!(solver.temperature()[[2, 2, 2]], 2.0 - 2e-4, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_step_lost_to_rounding_is_rejected() {
        let domain = GridDomain::cubic(3, 3, 3, 1e7).unwrap();
        let mut solver = plain_solver(domain);
        solver.add_history_point(1, 1, 1).unwrap();
        solver.simulate_step(1e19).unwrap();
        let field = solver.temperature().clone();

        // 1e19 + 1 rounds back to 1e19
        assert!(matches!(solver.simulate_step(1.0), Err(GeothermError::InvalidTimeStep(_))));
        assert_eq!(solver.current_time(), 1e19);
        assert_eq!(solver.temperature(), &field);
        assert_eq!(solver.history()[0].len(), 2);
    }

    #[test]
    fn test_planned_steps_can_be_taken_one_by_one() {
        let mut stepped = plain_solver(small_grid());
        let mut direct = plain_solver(small_grid());

        let plan = stepped.plan_to(5e7).unwrap();
        assert_eq!(plan.steps, 5);
        assert_eq!(plan.dt, 1e7);
        for step in 0..2 {
            stepped.take_planned_step(&plan, step).unwrap();
        }
        assert_eq!(stepped.current_time(), 2e7);
        for step in 2..plan.steps {
            stepped.take_planned_step(&plan, step).unwrap();
        }

        direct.simulate_to(5e7).unwrap();
        assert_eq!(stepped.current_time(), 5e7);
        assert_eq!(stepped.temperature(), direct.temperature());
        assert_eq!(stepped.plan_to(1e7).unwrap().steps, 0);
    }

    #[test]
    fn test_latent_heat_slows_cooling() {
        let domain = small_grid();
        let mask = IntrusionShape::Spherical {
            center: DVec3::new(50.0, 50.0, 50.0),
            radius: 20.0,
        }
        .build_mask(&domain);
        let dry = MaterialProperties::default();
        let wet = dry.with_latent_heat(LatentHeat::default());

        let mut without = DiffusionSolver::initialize(domain, dry, None, Some(&mask)).unwrap();
        let mut with = DiffusionSolver::initialize(domain, wet, None, Some(&mask)).unwrap();
        let mut released = 0.0;
        for _ in 0..5 {
            without.simulate_step(1e7).unwrap();
            released += with.simulate_step(1e7).unwrap().latent_release;
        }
        assert!(released > 0.0);
        assert!(with.temperature()[[5, 5, 7]] > without.temperature()[[5, 5, 7]]);
    }

    #[test]
    fn test_stopped_solver_refuses_to_step() {
        let mut solver = plain_solver(small_grid());
        solver.mark_stopped();
        assert!(matches!(solver.simulate_step(1.0), Err(GeothermError::SolverStopped)));
        assert!(matches!(solver.simulate_to(1.0), Err(GeothermError::SolverStopped)));
    }
}
