//! Fluence-to-dose conversion and ambient-dose-equivalent sensitivity.
//!
//! The conversion table gives H*(10) per unit photon fluence at tabulated
//! energies. Coefficients span orders of magnitude, so the interpolant is a
//! natural cubic spline over log10(energy); evaluation outside the table
//! range extrapolates smoothly and is left to the caller to keep physical.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CalibrationError;
use crate::response::{DoseSensitivityCurve, EfficiencyCurve, SensitivityPoint};
use crate::spline::NaturalCubicSpline;
use crate::sweep::ParameterPoint;
use crate::transport::MEV_PER_KEV;

/// Unit-conversion constant folding minutes-per-hour and pSv→µSv scaling,
/// so sensitivities come out in cpm per µSv/h. Injected at calibrator
/// construction; this is the reference value.
pub const CPM_PER_MICROSIEVERT_HOUR: f64 = 60.0 / 3600.0 / 1e-6;

/// Header rows in the bundled ICRP-74 table
const ICRP74_HEADER_ROWS: usize = 3;

static ICRP74_PHOTONS_H10: &str = include_str!("../data/icrp74_photons_H10.txt");

/// Tabulated fluence-to-dose conversion coefficients, used as interpolation
/// knots only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionTable {
    energies_mev: Vec<f64>,
    coefficients: Vec<f64>,
}

impl ConversionTable {
    /// Table from parallel energy/coefficient columns.
    ///
    /// Requires at least two rows, strictly increasing positive energies,
    /// and finite positive coefficients.
    pub fn new(energies_mev: Vec<f64>, coefficients: Vec<f64>) -> Result<Self, CalibrationError> {
        if energies_mev.len() < 2 || coefficients.len() < 2 {
            return Err(CalibrationError::TooFewRows(
                energies_mev.len().min(coefficients.len()),
            ));
        }
        for (row, &e) in energies_mev.iter().enumerate() {
            if !e.is_finite() || e <= 0.0 {
                return Err(CalibrationError::InvalidEnergy { row });
            }
        }
        for (row, w) in energies_mev.windows(2).enumerate() {
            if w[1] <= w[0] {
                return Err(CalibrationError::NonIncreasingEnergy { row: row + 1 });
            }
        }
        for (row, &c) in coefficients.iter().enumerate() {
            if !c.is_finite() || c <= 0.0 {
                return Err(CalibrationError::InvalidCoefficient { row });
            }
        }
        Ok(Self {
            energies_mev,
            coefficients,
        })
    }

    /// Parse a whitespace-delimited two-column table, skipping `header_rows`
    /// leading lines and any blank lines
    pub fn parse(text: &str, header_rows: usize) -> Result<Self, CalibrationError> {
        let mut energies = Vec::new();
        let mut coefficients = Vec::new();

        for (index, line) in text.lines().enumerate().skip(header_rows) {
            if line.trim().is_empty() {
                continue;
            }
            let mut columns = line.split_whitespace();
            let (Some(energy), Some(coefficient)) = (columns.next(), columns.next()) else {
                return Err(CalibrationError::MalformedRow { line: index + 1 });
            };
            let energy: f64 = energy
                .parse()
                .map_err(|_| CalibrationError::MalformedRow { line: index + 1 })?;
            let coefficient: f64 = coefficient
                .parse()
                .map_err(|_| CalibrationError::MalformedRow { line: index + 1 })?;
            energies.push(energy);
            coefficients.push(coefficient);
        }

        Self::new(energies, coefficients)
    }

    /// The bundled ICRP-74 photon H*(10) per fluence table (MeV, pSv·cm²)
    pub fn icrp74_photons() -> Result<Self, CalibrationError> {
        let table = Self::parse(ICRP74_PHOTONS_H10, ICRP74_HEADER_ROWS)?;
        debug!(rows = table.len(), "loaded ICRP-74 photon H*(10) table");
        Ok(table)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.energies_mev.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.energies_mev.is_empty()
    }

    #[must_use]
    pub fn energies_mev(&self) -> &[f64] {
        &self.energies_mev
    }

    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Covered energy range, MeV
    #[must_use]
    pub fn energy_range_mev(&self) -> (f64, f64) {
        (
            self.energies_mev[0],
            self.energies_mev[self.energies_mev.len() - 1],
        )
    }
}

/// Converts an efficiency curve into ambient-dose-equivalent sensitivity
#[derive(Debug, Clone)]
pub struct DoseCalibrator {
    spline: NaturalCubicSpline,
    source_area: f64,
    rate_factor: f64,
}

impl DoseCalibrator {
    /// Calibrator over `table`, for a source of `source_area` (cm²) and an
    /// injected unit-conversion constant
    pub fn new(
        table: &ConversionTable,
        source_area: f64,
        rate_factor: f64,
    ) -> Result<Self, CalibrationError> {
        let knots: Vec<f64> = table.energies_mev.iter().map(|e| e.log10()).collect();
        let spline = NaturalCubicSpline::fit(&knots, &table.coefficients)?;
        Ok(Self {
            spline,
            source_area,
            rate_factor,
        })
    }

    /// Calibrator with the reference cpm-per-µSv/h constant
    pub fn ambient(table: &ConversionTable, source_area: f64) -> Result<Self, CalibrationError> {
        Self::new(table, source_area, CPM_PER_MICROSIEVERT_HOUR)
    }

    /// Interpolated dose coefficient at an energy in keV
    #[must_use]
    pub fn coefficient_at(&self, energy_kev: f64) -> f64 {
        self.spline.eval((energy_kev * MEV_PER_KEV).log10())
    }

    /// Map every efficiency point to
    /// `rate_factor · source_area · efficiency / coefficient`, preserving
    /// the input curve's parameter order
    pub fn calibrate(
        &self,
        curve: &EfficiencyCurve,
    ) -> Result<DoseSensitivityCurve, CalibrationError> {
        let mut points = Vec::with_capacity(curve.len());
        for pt in curve.points() {
            let ParameterPoint::Energy(energy_kev) = pt.point else {
                return Err(CalibrationError::NotAnEnergyCurve);
            };
            let coefficient = self.coefficient_at(energy_kev);
            points.push(SensitivityPoint {
                point: pt.point,
                sensitivity: self.rate_factor * self.source_area * pt.efficiency / coefficient,
            });
        }
        Ok(DoseSensitivityCurve::new(points))
    }
}
