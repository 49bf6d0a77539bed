//! Detector response curves.
//!
//! Immutable value objects handed between pipeline stages; each stage
//! produces a new curve rather than mutating its input.

use serde::{Deserialize, Serialize};

use crate::sweep::ParameterPoint;

/// One grid point's aggregated detection efficiency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyPoint {
    pub point: ParameterPoint,
    /// Detected events summed over every chunk at this point
    pub detected: u64,
    /// Particles simulated, summed over every chunk at this point
    pub samples: u64,
    /// detected / samples, in [0, 1]
    pub efficiency: f64,
}

impl EfficiencyPoint {
    #[must_use]
    pub fn from_counts(point: ParameterPoint, detected: u64, samples: u64) -> Self {
        Self {
            point,
            detected,
            samples,
            efficiency: detected as f64 / samples as f64,
        }
    }
}

/// Detection efficiency per grid point, in sweep grid order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyCurve {
    points: Vec<EfficiencyPoint>,
}

impl EfficiencyCurve {
    #[must_use]
    pub fn new(points: Vec<EfficiencyPoint>) -> Self {
        Self { points }
    }

    #[must_use]
    pub fn points(&self) -> &[EfficiencyPoint] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn efficiencies(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.efficiency)
    }
}

/// One grid point's dose-rate sensitivity, cpm per µSv/h
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub point: ParameterPoint,
    pub sensitivity: f64,
}

/// Ambient-dose-equivalent sensitivity per grid point, in the order of the
/// efficiency curve it was calibrated from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseSensitivityCurve {
    points: Vec<SensitivityPoint>,
}

impl DoseSensitivityCurve {
    #[must_use]
    pub fn new(points: Vec<SensitivityPoint>) -> Self {
        Self { points }
    }

    #[must_use]
    pub fn points(&self) -> &[SensitivityPoint] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn sensitivities(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.sensitivity)
    }
}
