use super::{AnalyticalGeometry, AnalyticalModel, Profile, ProfileSetup};
use crate::math_utils::erf;
use ndarray::Array2;

/// One transverse factor of the rectangular-cylinder solution
/// (Carslaw & Jaeger 1959, §2.2(9)), with `xi = x/d` and `tau = κt/d²`
pub fn plug_phi(xi: f64, tau: f64) -> f64 {
    let spread = 2.0 * tau.sqrt();
    0.5 * (erf((xi + 1.0) / spread) - erf((xi - 1.0) / spread))
}

/// Plug of half-widths `d` (x) and `d2` (y), evaluated on a meshgrid
#[derive(Debug, Clone, Copy, Default)]
pub struct PlugModel;

impl AnalyticalModel for PlugModel {
    fn geometry(&self) -> AnalyticalGeometry {
        AnalyticalGeometry::Plug
    }

    fn profile(&self, setup: &ProfileSetup, time: f64) -> Profile {
        let n = setup.plot.surface_samples;
        let x = setup.axis(setup.d, n);
        let y = setup.axis(setup.d2, n);
        let tau1 = setup.diffusivity * time / (setup.d * setup.d);
        let tau2 = setup.diffusivity * time / (setup.d2 * setup.d2);

        let phi1: Vec<f64> = x.iter().map(|&xi| plug_phi(xi / setup.d, tau1)).collect();
        let phi2: Vec<f64> = y.iter().map(|&yi| plug_phi(yi / setup.d2, tau2)).collect();
        let temperature = Array2::from_shape_fn((y.len(), x.len()), |(row, col)| {
            setup.scale(phi1[col] * phi2[row])
        });

        Profile::Surface { x, y, temperature }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytical::tabular_psi;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_factor_matches_sheet_solution() {
        let (d, kappa, t) = (40.0, 1e-6, 3e8);
        let tau = kappa * t / (d * d);
        for x in [-90.0, -10.0, 0.0, 25.0, 60.0] {
            assert_abs_diff_eq!(plug_phi(x / d, tau), tabular_psi(x, d, kappa, t), epsilon = 1e-12);
        }
    }
}
