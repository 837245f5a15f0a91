// src/material.rs - Thermal properties of the magma / country rock system

use crate::constants::{
    DEFAULT_BACKGROUND_TEMP_C, DEFAULT_CONDUCTIVITY_W_M_K, DEFAULT_DENSITY_KG_M3, DEFAULT_DIFFUSIVITY_M2_S,
    DEFAULT_LATENT_HEAT_J_KG, DEFAULT_LIQUIDUS_C, DEFAULT_MAGMA_TEMP_C, DEFAULT_SOLIDUS_C,
    DEFAULT_SPECIFIC_HEAT_J_KG_K,
};
use crate::error::{GeothermError, GeothermResult};
use crate::math_utils::inverse_lerp;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Crystallization interval and the heat released across it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatentHeat {
    pub solidus_c: f64,
    pub liquidus_c: f64,
    pub latent_heat_j_kg: f64,
}

impl Default for LatentHeat {
    fn default() -> Self {
        Self {
            solidus_c: DEFAULT_SOLIDUS_C,
            liquidus_c: DEFAULT_LIQUIDUS_C,
            latent_heat_j_kg: DEFAULT_LATENT_HEAT_J_KG,
        }
    }
}

impl LatentHeat {
    /// Crystallized fraction at `temp_c`: 0 at or above the liquidus,
    /// 1 at or below the solidus, linear in between.
    pub fn crystallization_fraction(&self, temp_c: f64) -> f64 {
        inverse_lerp(self.liquidus_c, self.solidus_c, temp_c).clamp(0.0, 1.0)
    }

    pub fn validate(&self) -> GeothermResult<()> {
        if !(self.solidus_c < self.liquidus_c) {
            return Err(GeothermError::Config(format!(
                "solidus ({} °C) must be below liquidus ({} °C)",
                self.solidus_c, self.liquidus_c
            )));
        }
        if !(self.latent_heat_j_kg.is_finite() && self.latent_heat_j_kg >= 0.0) {
            return Err(GeothermError::Config(format!(
                "latent heat must be >= 0, got {}",
                self.latent_heat_j_kg
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialProperties {
    pub diffusivity_m2_s: f64,
    pub conductivity_w_m_k: f64,
    pub specific_heat_j_kg_k: f64,
    pub density_kg_m3: f64,
    pub background_temp_c: f64,
    pub magma_temp_c: f64,
    pub latent_heat: LatentHeat,
    pub use_latent_heat: bool,
}

impl Default for MaterialProperties {
    fn default() -> Self {
        Self {
            diffusivity_m2_s: DEFAULT_DIFFUSIVITY_M2_S,
            conductivity_w_m_k: DEFAULT_CONDUCTIVITY_W_M_K,
            specific_heat_j_kg_k: DEFAULT_SPECIFIC_HEAT_J_KG_K,
            density_kg_m3: DEFAULT_DENSITY_KG_M3,
            background_temp_c: DEFAULT_BACKGROUND_TEMP_C,
            magma_temp_c: DEFAULT_MAGMA_TEMP_C,
            latent_heat: LatentHeat::default(),
            use_latent_heat: false,
        }
    }
}

impl MaterialProperties {
    /// Default rock with the given diffusivity and initial temperatures
    pub fn new(diffusivity_m2_s: f64, background_temp_c: f64, magma_temp_c: f64) -> Self {
        Self {
            diffusivity_m2_s,
            background_temp_c,
            magma_temp_c,
            ..Self::default()
        }
    }

    /// Table values for a common rock type
    pub fn preset(kind: RockKind) -> Self {
        ROCK_PRESETS.get(&kind).copied().unwrap_or_default()
    }

    pub fn with_latent_heat(mut self, latent_heat: LatentHeat) -> Self {
        self.latent_heat = latent_heat;
        self.use_latent_heat = true;
        self
    }

    /// Latent heat parameters when the phase change is switched on
    pub fn active_latent_heat(&self) -> Option<&LatentHeat> {
        self.use_latent_heat.then_some(&self.latent_heat)
    }

    pub fn validate(&self) -> GeothermResult<()> {
        let positive = [
            ("diffusivity", self.diffusivity_m2_s),
            ("conductivity", self.conductivity_w_m_k),
            ("specific heat", self.specific_heat_j_kg_k),
            ("density", self.density_kg_m3),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeothermError::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        if !self.background_temp_c.is_finite() || !self.magma_temp_c.is_finite() {
            return Err(GeothermError::Config("temperatures must be finite".to_string()));
        }
        if self.use_latent_heat {
            self.latent_heat.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RockKind {
    Granite,
    Basalt,
    Gabbro,
    Sandstone,
    Shale,
}

impl RockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RockKind::Granite => "granite",
            RockKind::Basalt => "basalt",
            RockKind::Gabbro => "gabbro",
            RockKind::Sandstone => "sandstone",
            RockKind::Shale => "shale",
        }
    }
}

fn rock(conductivity_w_m_k: f64, density_kg_m3: f64, specific_heat_j_kg_k: f64) -> MaterialProperties {
    MaterialProperties {
        diffusivity_m2_s: conductivity_w_m_k / (density_kg_m3 * specific_heat_j_kg_k),
        conductivity_w_m_k,
        specific_heat_j_kg_k,
        density_kg_m3,
        ..MaterialProperties::default()
    }
}

pub static ROCK_PRESETS: Lazy<HashMap<RockKind, MaterialProperties>> = Lazy::new(|| {
    use RockKind::*;
    let mut m = HashMap::new();

    m.insert(Granite, rock(3.0, 2650.0, 790.0));
    m.insert(Basalt, rock(1.8, 2900.0, 840.0));
    m.insert(Gabbro, rock(2.2, 3000.0, 800.0));
    m.insert(Sandstone, rock(2.5, 2300.0, 920.0));
    m.insert(Shale, rock(1.5, 2500.0, 900.0));

    m
});
