use super::{AnalyticalGeometry, AnalyticalModel, Profile, ProfileSetup};
use crate::math_utils::erf;
use std::f64::consts::PI;

/// Dimensionless temperature around a sphere, Jaeger (1964) eq. 16
///
/// `eps = x/d` and `tau = κt/d²`. Undefined at `eps = 0`.
pub fn spherical_psi(eps: f64, tau: f64) -> f64 {
    let root_tau = tau.sqrt();
    let spread = 2.0 * root_tau;
    let bracket = (2.0 * root_tau / (eps * PI.sqrt()))
        * ((-(eps - 1.0).powi(2) / (4.0 * tau)).exp() - (-(eps + 1.0).powi(2) / (4.0 * tau)).exp());
    0.5 * (erf((eps + 1.0) / spread) - erf((eps - 1.0) / spread) - bracket)
}

/// Spherical body (pluton) of radius `d`
#[derive(Debug, Clone, Copy, Default)]
pub struct SphericalModel;

impl AnalyticalModel for SphericalModel {
    fn geometry(&self) -> AnalyticalGeometry {
        AnalyticalGeometry::Spherical
    }

    fn profile(&self, setup: &ProfileSetup, time: f64) -> Profile {
        let tau = setup.diffusivity * time / (setup.d * setup.d);
        let x: Vec<f64> = setup
            .axis(setup.d, setup.plot.samples)
            .into_iter()
            .filter(|&xi| xi != 0.0)
            .collect();
        let temperature = x
            .iter()
            .map(|&xi| setup.scale(spherical_psi(xi / setup.d, tau)))
            .collect();
        Profile::Line { x, temperature }
    }
}
