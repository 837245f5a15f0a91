// Default thermal parameters for country rock and magma
pub const DEFAULT_DIFFUSIVITY_M2_S: f64 = 1.0e-6;
pub const DEFAULT_CONDUCTIVITY_W_M_K: f64 = 2.5;
pub const DEFAULT_SPECIFIC_HEAT_J_KG_K: f64 = 1000.0;
pub const DEFAULT_DENSITY_KG_M3: f64 = 2700.0;
pub const DEFAULT_BACKGROUND_TEMP_C: f64 = 20.0;
pub const DEFAULT_MAGMA_TEMP_C: f64 = 1200.0;

// Crystallization interval
pub const DEFAULT_SOLIDUS_C: f64 = 700.0;
pub const DEFAULT_LIQUIDUS_C: f64 = 1200.0;
pub const DEFAULT_LATENT_HEAT_J_KG: f64 = 400_000.0;

// default grid settings:
pub const DEFAULT_GRID_CELLS: usize = 100;
pub const DEFAULT_CELL_SIZE_M: f64 = 10.0;

// default run settings:
pub const DEFAULT_DURATION_S: f64 = 1.0e6;
pub const DEFAULT_SAVE_INTERVAL_S: f64 = 1.0e5;
pub const DEFAULT_MAX_VELOCITY_M_S: f64 = 1.0e-6;

// Explicit scheme factors, both multiplied by min(dx, dy, dz)² / κ
pub const STABILITY_FACTOR: f64 = 0.2; // hard clamp applied by simulate_step
pub const ACCURACY_FACTOR: f64 = 0.1; // sub-step used by simulate_to

// Analytical plot domain
pub const AUTO_PLOT_SPAN: f64 = 3.0; // auto range is [-3d, 3d]
pub const PROFILE_SAMPLES: usize = 1000;
pub const SURFACE_SAMPLES: usize = 200; // per axis for the plug meshgrid

pub const SECONDS_PER_YEAR: f64 = 365.25 * 24.0 * 3600.0;
