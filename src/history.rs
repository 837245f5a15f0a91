use serde::{Deserialize, Serialize};

/// Temperature time series recorded at a fixed grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub index: [usize; 3],
    samples: Vec<(f64, f64)>,
}

impl HistoryPoint {
    pub fn new(index: [usize; 3]) -> Self {
        Self {
            index,
            samples: Vec::new(),
        }
    }

    /// Appends a sample; times at or before the last recorded one are dropped
    /// so the series stays strictly increasing.
    pub fn record(&mut self, time: f64, temperature: f64) -> bool {
        if let Some(&(last, _)) = self.samples.last() {
            if time <= last {
                return false;
            }
        }
        self.samples.push((time, temperature));
        true
    }

    /// (time s, temperature °C) pairs in recording order
    pub fn samples(&self) -> &[(f64, f64)] {
        &self.samples
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|&(t, _)| t).collect()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.samples.iter().map(|&(_, temp)| temp).collect()
    }

    pub fn latest(&self) -> Option<(f64, f64)> {
        self.samples.last().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
