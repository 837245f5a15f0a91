//! Closed-form conduction profiles around instantaneously emplaced bodies.
//!
//! Every model evaluates a dimensionless profile between 0 and 1 and scales it
//! by `(T0 - Tbg)` on top of the country-rock baseline `Tbg`, where the
//! baseline follows the geotherm: `Tbg = surface_temperature + g·l`.
//!
//! - [`TabularModel`]: infinite sheet of half-width `d`
//! - [`SphericalModel`]: sphere of radius `d` (Jaeger 1964)
//! - [`PlugModel`]: rectangular cylinder with half-widths `d`, `d2` (Carslaw & Jaeger 1959)

mod plug;
mod spherical;
mod tabular;

pub use plug::{PlugModel, plug_phi};
pub use spherical::{SphericalModel, spherical_psi};
pub use tabular::{TabularModel, tabular_psi};

use crate::constants::{AUTO_PLOT_SPAN, DEFAULT_CONDUCTIVITY_W_M_K, DEFAULT_DIFFUSIVITY_M2_S, PROFILE_SAMPLES, SURFACE_SAMPLES};
use crate::error::{GeothermError, GeothermResult};
use crate::math_utils::linspace;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalyticalGeometry {
    #[serde(rename = "tabular", alias = "Tabular-like body")]
    Tabular,
    #[serde(rename = "spherical", alias = "Spheric-like body")]
    Spherical,
    #[serde(rename = "plug", alias = "Plug-like body")]
    Plug,
}

impl AnalyticalGeometry {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticalGeometry::Tabular => "tabular",
            AnalyticalGeometry::Spherical => "spherical",
            AnalyticalGeometry::Plug => "plug",
        }
    }

    /// Label used by the desktop tool
    pub fn label(&self) -> &'static str {
        match self {
            AnalyticalGeometry::Tabular => "Tabular-like body",
            AnalyticalGeometry::Spherical => "Spheric-like body",
            AnalyticalGeometry::Plug => "Plug-like body",
        }
    }
}

impl fmt::Display for AnalyticalGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalyticalGeometry {
    type Err = GeothermError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        [
            AnalyticalGeometry::Tabular,
            AnalyticalGeometry::Spherical,
            AnalyticalGeometry::Plug,
        ]
        .into_iter()
        .find(|g| trimmed.eq_ignore_ascii_case(g.as_str()) || trimmed.eq_ignore_ascii_case(g.label()))
        .ok_or_else(|| GeothermError::UnknownGeometry(s.to_string()))
    }
}

/// Plot-domain policy shared by all models
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotPolicy {
    /// Symmetric range of `AUTO_PLOT_SPAN · d` when true
    pub auto_plot: bool,
    /// Half-range (m) used when `auto_plot` is false
    pub half_range: Option<f64>,
    /// Output clip, manual mode only
    pub t_min: Option<f64>,
    pub t_max: Option<f64>,
    pub samples: usize,
    /// Samples per axis for surface profiles
    pub surface_samples: usize,
}

impl Default for PlotPolicy {
    fn default() -> Self {
        Self {
            auto_plot: true,
            half_range: None,
            t_min: None,
            t_max: None,
            samples: PROFILE_SAMPLES,
            surface_samples: SURFACE_SAMPLES,
        }
    }
}

impl PlotPolicy {
    pub fn manual(half_range: f64, t_min: Option<f64>, t_max: Option<f64>) -> Self {
        Self {
            auto_plot: false,
            half_range: Some(half_range),
            t_min,
            t_max,
            ..Self::default()
        }
    }

    fn validate(&self) -> GeothermResult<()> {
        if self.samples < 2 || self.surface_samples < 2 {
            return Err(GeothermError::Config("plot needs at least 2 samples per axis".to_string()));
        }
        if self.auto_plot {
            return Ok(());
        }
        let half_range = self.half_range.ok_or(GeothermError::MissingParameter("half_range"))?;
        if !(half_range.is_finite() && half_range > 0.0) {
            return Err(GeothermError::Config(format!("plot half-range must be positive, got {}", half_range)));
        }
        if let (Some(lo), Some(hi)) = (self.t_min, self.t_max) {
            if lo > hi {
                return Err(GeothermError::Config(format!("plot Tmin {} exceeds Tmax {}", lo, hi)));
            }
        }
        Ok(())
    }

    /// Half-range of the sample axis for a body of characteristic size `d`
    pub fn half_range_for(&self, d: f64) -> f64 {
        match (self.auto_plot, self.half_range) {
            (false, Some(h)) => h,
            _ => AUTO_PLOT_SPAN * d,
        }
    }

    fn clip(&self, temperature: f64) -> f64 {
        if self.auto_plot {
            return temperature;
        }
        let t = self.t_min.map_or(temperature, |lo| temperature.max(lo));
        self.t_max.map_or(t, |hi| t.min(hi))
    }
}

fn default_conductivity() -> f64 {
    DEFAULT_CONDUCTIVITY_W_M_K
}

fn default_diffusivity() -> f64 {
    DEFAULT_DIFFUSIVITY_M2_S
}

/// Inputs of one analytical evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticalParams {
    pub geometry: AnalyticalGeometry,
    /// Initial intrusion temperature (°C)
    pub t0: f64,
    /// Magma conductivity K1 (W/(m·K))
    #[serde(default = "default_conductivity")]
    pub magma_conductivity: f64,
    /// Country-rock diffusivity k (m²/s), drives every profile
    #[serde(default = "default_diffusivity")]
    pub rock_diffusivity: f64,
    /// Country-rock conductivity K (W/(m·K))
    #[serde(default = "default_conductivity")]
    pub rock_conductivity: f64,
    /// Magma diffusivity k1 (m²/s)
    #[serde(default = "default_diffusivity")]
    pub magma_diffusivity: f64,
    /// Geothermal gradient g (°C/m)
    #[serde(default)]
    pub gradient: f64,
    /// Emplacement depth l (m)
    #[serde(default)]
    pub depth: f64,
    #[serde(default)]
    pub surface_temperature: f64,
    /// Half-width or radius (m)
    #[serde(default)]
    pub d: Option<f64>,
    /// Second half-width of a plug (m); a square section when absent
    #[serde(default)]
    pub d2: Option<f64>,
    /// Evaluation times (s)
    #[serde(default)]
    pub times: Vec<f64>,
    #[serde(default)]
    pub plot: PlotPolicy,
}

impl AnalyticalParams {
    pub fn new(geometry: AnalyticalGeometry, t0: f64, d: f64, times: Vec<f64>) -> Self {
        Self {
            geometry,
            t0,
            magma_conductivity: DEFAULT_CONDUCTIVITY_W_M_K,
            rock_diffusivity: DEFAULT_DIFFUSIVITY_M2_S,
            rock_conductivity: DEFAULT_CONDUCTIVITY_W_M_K,
            magma_diffusivity: DEFAULT_DIFFUSIVITY_M2_S,
            gradient: 0.0,
            depth: 0.0,
            surface_temperature: 0.0,
            d: Some(d),
            d2: None,
            times,
            plot: PlotPolicy::default(),
        }
    }

    /// Country-rock baseline, `surface_temperature + g·l`
    pub fn background_temperature(&self) -> f64 {
        self.surface_temperature + self.gradient * self.depth
    }

    /// Initial contact temperature between magma and country rock
    /// (Jaeger eq. 27–28), `σ·T0/(1+σ) + Tbg` with `σ = K1·√k / (K·√k1)`.
    pub fn contact_temperature(&self) -> f64 {
        let sigma = (self.magma_conductivity * self.rock_diffusivity.sqrt())
            / (self.rock_conductivity * self.magma_diffusivity.sqrt());
        sigma * self.t0 / (1.0 + sigma) + self.background_temperature()
    }

    pub fn validate(&self) -> GeothermResult<()> {
        let d = self.d.ok_or(GeothermError::MissingParameter("d"))?;
        if self.times.is_empty() {
            return Err(GeothermError::MissingParameter("time"));
        }
        let mut lengths = vec![("d", d)];
        if let Some(d2) = self.d2 {
            lengths.push(("d2", d2));
        }
        for (name, value) in lengths {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeothermError::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        for &t in &self.times {
            if !(t.is_finite() && t > 0.0) {
                return Err(GeothermError::Config(format!("times must be positive, got {}", t)));
            }
        }
        let positive = [
            ("K1", self.magma_conductivity),
            ("k", self.rock_diffusivity),
            ("K", self.rock_conductivity),
            ("k1", self.magma_diffusivity),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeothermError::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        if ![self.t0, self.gradient, self.depth, self.surface_temperature]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(GeothermError::Config("T0, g, l and surface temperature must be finite".to_string()));
        }
        self.plot.validate()
    }
}

/// Temperatures at one requested time
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    /// 1D profile along x
    Line { x: Vec<f64>, temperature: Vec<f64> },
    /// 2D section, `temperature[[row, col]]` at `(x[col], y[row])`
    Surface {
        x: Vec<f64>,
        y: Vec<f64>,
        temperature: Array2<f64>,
    },
}

impl Profile {
    pub fn max_temperature(&self) -> f64 {
        self.temperatures().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min_temperature(&self) -> f64 {
        self.temperatures().fold(f64::INFINITY, f64::min)
    }

    fn temperatures(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            Profile::Line { temperature, .. } => Box::new(temperature.iter().copied()),
            Profile::Surface { temperature, .. } => Box::new(temperature.iter().copied()),
        }
    }

    fn map_temperatures(&mut self, f: impl Fn(f64) -> f64) {
        match self {
            Profile::Line { temperature, .. } => temperature.iter_mut().for_each(|t| *t = f(*t)),
            Profile::Surface { temperature, .. } => temperature.mapv_inplace(&f),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeProfile {
    pub time: f64,
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticalResult {
    pub geometry: AnalyticalGeometry,
    pub background_temperature: f64,
    /// Initial contact temperature, reported for spherical bodies
    pub contact_temperature: Option<f64>,
    /// One profile per requested time, in request order
    pub profiles: Vec<TimeProfile>,
}

impl AnalyticalResult {
    pub fn at(&self, time: f64) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.time == time).map(|p| &p.profile)
    }

    pub fn times(&self) -> Vec<f64> {
        self.profiles.iter().map(|p| p.time).collect()
    }
}

/// Dimensional scaling shared by the models
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileSetup {
    pub d: f64,
    pub d2: f64,
    pub diffusivity: f64,
    pub amplitude: f64,
    pub background: f64,
    pub plot: PlotPolicy,
}

impl ProfileSetup {
    fn from_params(params: &AnalyticalParams) -> GeothermResult<Self> {
        let d = params.d.ok_or(GeothermError::MissingParameter("d"))?;
        let background = params.background_temperature();
        Ok(Self {
            d,
            d2: params.d2.unwrap_or(d),
            diffusivity: params.rock_diffusivity,
            amplitude: params.t0 - background,
            background,
            plot: params.plot,
        })
    }

    /// `Tbg + (T0 - Tbg)·ψ`
    pub fn scale(&self, psi: f64) -> f64 {
        self.amplitude * psi + self.background
    }

    /// Symmetric sample axis for a body of size `d`
    pub fn axis(&self, d: f64, samples: usize) -> Vec<f64> {
        let h = self.plot.half_range_for(d);
        linspace(-h, h, samples)
    }
}

/// One closed-form solution family
pub trait AnalyticalModel {
    fn geometry(&self) -> AnalyticalGeometry;

    /// Unclipped profile at `time` (s)
    fn profile(&self, setup: &ProfileSetup, time: f64) -> Profile;
}

pub fn model_for(geometry: AnalyticalGeometry) -> Box<dyn AnalyticalModel> {
    match geometry {
        AnalyticalGeometry::Tabular => Box::new(TabularModel),
        AnalyticalGeometry::Spherical => Box::new(SphericalModel),
        AnalyticalGeometry::Plug => Box::new(PlugModel),
    }
}

/// Evaluates every requested time. Manual plot limits clip the returned
/// temperatures only.
pub fn solve(params: &AnalyticalParams) -> GeothermResult<AnalyticalResult> {
    params.validate()?;
    let setup = ProfileSetup::from_params(params)?;
    let model = model_for(params.geometry);

    let profiles = params
        .times
        .iter()
        .map(|&time| {
            let mut profile = model.profile(&setup, time);
            if !setup.plot.auto_plot {
                profile.map_temperatures(|t| setup.plot.clip(t));
            }
            TimeProfile { time, profile }
        })
        .collect();

    Ok(AnalyticalResult {
        geometry: params.geometry,
        background_temperature: setup.background,
        contact_temperature: (params.geometry == AnalyticalGeometry::Spherical).then(|| params.contact_temperature()),
        profiles,
    })
}

/// Same as [`solve`] with the geometry given by name
pub fn solve_named(geometry: &str, params: &AnalyticalParams) -> GeothermResult<AnalyticalResult> {
    let geometry: AnalyticalGeometry = geometry.parse()?;
    solve(&AnalyticalParams {
        geometry,
        ..params.clone()
    })
}
