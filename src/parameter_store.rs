// src/parameter_store.rs - Named analytical parameter sets and plot defaults

use crate::analytical::{AnalyticalParams, PlotPolicy};
use crate::error::GeothermResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Registry of named analytical models, owned by whichever layer persists them.
/// Solvers never read from it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterStore {
    models: BTreeMap<String, AnalyticalParams>,
    #[serde(default)]
    plot_defaults: PlotPolicy,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the parameter set stored under `id`
    pub fn add_or_update(&mut self, id: impl Into<String>, params: AnalyticalParams) {
        self.models.insert(id.into(), params);
    }

    pub fn get(&self, id: &str) -> Option<&AnalyticalParams> {
        self.models.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<AnalyticalParams> {
        self.models.remove(id)
    }

    /// Stored ids in sorted order
    pub fn ids(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.models.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn set_plot_defaults(&mut self, defaults: PlotPolicy) {
        self.plot_defaults = defaults;
    }

    pub fn plot_defaults(&self) -> &PlotPolicy {
        &self.plot_defaults
    }

    /// Stored parameters with the store's plot defaults applied
    pub fn params_for_plot(&self, id: &str) -> Option<AnalyticalParams> {
        self.models.get(id).map(|params| AnalyticalParams {
            plot: self.plot_defaults,
            ..params.clone()
        })
    }

    pub fn to_json(&self) -> GeothermResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> GeothermResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
