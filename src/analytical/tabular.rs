use super::{AnalyticalGeometry, AnalyticalModel, Profile, ProfileSetup};
use crate::math_utils::erf;

/// Dimensionless temperature of an infinite sheet of half-width `d`
///
/// `ψ = ½·[erf((x + d) / 2√(κt)) − erf((x − d) / 2√(κt))]`
pub fn tabular_psi(x: f64, d: f64, diffusivity: f64, time: f64) -> f64 {
    let spread = 2.0 * (diffusivity * time).sqrt();
    0.5 * (erf((x + d) / spread) - erf((x - d) / spread))
}

/// Infinite tabular body (sill or dike seen edge-on)
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularModel;

impl AnalyticalModel for TabularModel {
    fn geometry(&self) -> AnalyticalGeometry {
        AnalyticalGeometry::Tabular
    }

    fn profile(&self, setup: &ProfileSetup, time: f64) -> Profile {
        let x = setup.axis(setup.d, setup.plot.samples);
        let temperature = x
            .iter()
            .map(|&xi| setup.scale(tabular_psi(xi, setup.d, setup.diffusivity, time)))
            .collect();
        Profile::Line { x, temperature }
    }
}
