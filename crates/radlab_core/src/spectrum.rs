//! Nuclide emission spectra and per-source effective sensitivity.
//!
//! The dose-sensitivity curve describes monoenergetic response; a real
//! source emits several lines with different intensities. The effective
//! sensitivity is the intensity-weighted harmonic-style average
//! `Σ intensity / Σ (intensity / s_i)`: hard-to-detect lines dominate the
//! denominator, which is what limits overall detectability. An arithmetic
//! mean would overstate sources with one strong high-sensitivity line.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CalibrationError, SpectrumError};
use crate::response::DoseSensitivityCurve;
use crate::spline::NaturalCubicSpline;
use crate::sweep::ParameterPoint;

/// Interpolated sensitivities at or below this floor are skipped to avoid
/// dividing by a near-zero value (reference units: cpm per µSv/h)
pub const SENSITIVITY_FLOOR: f64 = 1e-3;

/// Nuclide used for relative-sensitivity reporting
pub const REFERENCE_NUCLIDE: &str = "Cs-137";

static BUNDLED_SPECTRA: &str = include_str!("../data/spectra.json");

/// One emission line: energy and relative intensity.
///
/// Intensities need not sum to 1; only their ratios matter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionLine {
    pub energy_kev: f64,
    pub intensity: f64,
}

/// Emission spectra per nuclide, lines sorted by energy
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpectrumTable {
    nuclides: BTreeMap<String, Vec<EmissionLine>>,
}

impl SpectrumTable {
    /// Parse the nested-map dataset shape:
    /// nuclide → { "energy in keV" → intensity }
    pub fn from_json(text: &str) -> Result<Self, SpectrumError> {
        let raw: BTreeMap<String, BTreeMap<String, f64>> = serde_json::from_str(text)?;

        let mut nuclides = BTreeMap::new();
        for (nuclide, spectrum) in raw {
            let mut lines = Vec::with_capacity(spectrum.len());
            for (key, intensity) in spectrum {
                let energy_kev: f64 = key.parse().map_err(|_| SpectrumError::BadEnergyKey {
                    nuclide: nuclide.clone(),
                    key: key.clone(),
                })?;
                lines.push(EmissionLine {
                    energy_kev,
                    intensity,
                });
            }
            lines.sort_by(|a, b| a.energy_kev.total_cmp(&b.energy_kev));
            nuclides.insert(nuclide, lines);
        }

        Ok(Self { nuclides })
    }

    /// The bundled reference spectra dataset
    pub fn bundled() -> Result<Self, SpectrumError> {
        Self::from_json(BUNDLED_SPECTRA)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nuclides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nuclides.is_empty()
    }

    #[must_use]
    pub fn get(&self, nuclide: &str) -> Option<&[EmissionLine]> {
        self.nuclides.get(nuclide).map(Vec::as_slice)
    }

    pub fn nuclides(&self) -> impl Iterator<Item = (&str, &[EmissionLine])> {
        self.nuclides
            .iter()
            .map(|(name, lines)| (name.as_str(), lines.as_slice()))
    }
}

/// Per-nuclide sensitivities, with the nuclides that produced no qualifying
/// line reported separately so the rest of the batch stays usable
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub sensitivities: BTreeMap<String, f64>,
    pub empty: Vec<String>,
}

impl SensitivityReport {
    #[must_use]
    pub fn get(&self, nuclide: &str) -> Option<f64> {
        self.sensitivities.get(nuclide).copied()
    }

    /// Sensitivities normalized against a reference nuclide (conventionally
    /// Cs-137); `None` if the reference is absent or non-positive
    #[must_use]
    pub fn relative_to(&self, reference: &str) -> Option<BTreeMap<String, f64>> {
        let norm = self.get(reference)?;
        if !(norm > 0.0) {
            return None;
        }
        Some(
            self.sensitivities
                .iter()
                .map(|(name, &value)| (name.clone(), value / norm))
                .collect(),
        )
    }
}

/// Estimates per-nuclide effective sensitivity from a dose-sensitivity curve
#[derive(Debug, Clone)]
pub struct SourceSensitivityEstimator {
    spline: NaturalCubicSpline,
    domain_kev: (f64, f64),
    floor: f64,
}

impl SourceSensitivityEstimator {
    /// Fit the interpolant over `(log10(energy), sensitivity)` from an
    /// energy-swept dose-sensitivity curve
    pub fn from_curve(curve: &DoseSensitivityCurve) -> Result<Self, CalibrationError> {
        let mut energies = Vec::with_capacity(curve.len());
        let mut values = Vec::with_capacity(curve.len());
        for pt in curve.points() {
            let ParameterPoint::Energy(energy_kev) = pt.point else {
                return Err(CalibrationError::NotAnEnergyCurve);
            };
            energies.push(energy_kev);
            values.push(pt.sensitivity);
        }
        let knots: Vec<f64> = energies.iter().map(|e| e.log10()).collect();
        let spline = NaturalCubicSpline::fit(&knots, &values)?;
        Ok(Self {
            spline,
            domain_kev: (energies[0], energies[energies.len() - 1]),
            floor: SENSITIVITY_FLOOR,
        })
    }

    /// Override the sensitivity floor
    #[must_use]
    pub fn with_floor(mut self, floor: f64) -> Self {
        self.floor = floor;
        self
    }

    /// Swept energy domain the line filter admits, keV
    #[must_use]
    pub fn domain_kev(&self) -> (f64, f64) {
        self.domain_kev
    }

    /// Interpolated dose sensitivity at an energy in keV
    #[must_use]
    pub fn sensitivity_at(&self, energy_kev: f64) -> f64 {
        self.spline.eval(energy_kev.log10())
    }

    /// Effective sensitivity of one nuclide.
    ///
    /// Lines outside the swept domain (inclusive bounds) and lines whose
    /// interpolated sensitivity is non-finite or at or below the floor are
    /// skipped; if nothing survives, the nuclide fails with `EmptySpectrum`.
    pub fn nuclide_sensitivity(
        &self,
        nuclide: &str,
        lines: &[EmissionLine],
    ) -> Result<f64, SpectrumError> {
        let (lo, hi) = self.domain_kev;
        let mut intensity_sum = 0.0;
        let mut weighted_sum = 0.0;

        for line in lines {
            if line.energy_kev < lo || line.energy_kev > hi {
                continue;
            }
            let sensitivity = self.sensitivity_at(line.energy_kev);
            if !sensitivity.is_finite() || sensitivity <= self.floor {
                continue;
            }
            intensity_sum += line.intensity;
            weighted_sum += line.intensity / sensitivity;
        }

        if !(intensity_sum > 0.0) || !(weighted_sum > 0.0) {
            return Err(SpectrumError::EmptySpectrum {
                nuclide: nuclide.to_string(),
            });
        }
        Ok(intensity_sum / weighted_sum)
    }

    /// Estimate every nuclide in the table. Nuclides with no qualifying
    /// lines land in `empty` instead of failing the batch.
    pub fn estimate(&self, table: &SpectrumTable) -> SensitivityReport {
        let mut report = SensitivityReport::default();
        for (nuclide, lines) in table.nuclides() {
            match self.nuclide_sensitivity(nuclide, lines) {
                Ok(value) => {
                    report.sensitivities.insert(nuclide.to_string(), value);
                }
                Err(_) => {
                    warn!(nuclide, "no qualifying emission lines, omitting");
                    report.empty.push(nuclide.to_string());
                }
            }
        }
        report
    }
}
