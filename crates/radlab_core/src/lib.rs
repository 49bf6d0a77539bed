//! Radiation-detector response characterization library
//!
//! This crate characterizes a Geiger–Müller tube model across incident
//! photon energy and incidence angle, then converts raw detection efficiency
//! into dose-rate and per-nuclide sensitivity figures. It provides:
//! - Sweep planning: energy/angle grids with a chunked Monte Carlo sample
//!   budget
//! - Parallel chunk dispatch over a bounded worker pool with
//!   completion-order-independent aggregation
//! - Dose calibration against the ICRP-74 fluence-to-dose table via
//!   log-energy cubic-spline interpolation
//! - Per-nuclide effective sensitivity from emission spectra using an
//!   intensity-weighted harmonic average
//!
//! Particle transport itself is delegated to an external engine behind the
//! [`transport::TransportEngine`] trait; this crate orchestrates it and owns
//! the statistics.
//!
//! ```ignore
//! use radlab_core::{
//!     ConversionTable, DetectorModel, DoseCalibrator, GridSpec,
//!     SourceSensitivityEstimator, SpectrumTable, SweepConfig, SweepPlan,
//!     SweepRunner,
//! };
//!
//! let model = DetectorModel::new("geometry/gm_tube.toml");
//! let plan = SweepPlan::build(&SweepConfig::new(GridSpec::energy_response(), 1_000_000))?;
//! let efficiency = SweepRunner::new().run(&engine, &model, &plan)?;
//!
//! let area = radlab_core::detector::source_area(&engine, &model)?;
//! let table = ConversionTable::icrp74_photons()?;
//! let dose = DoseCalibrator::ambient(&table, area)?.calibrate(&efficiency)?;
//!
//! let estimator = SourceSensitivityEstimator::from_curve(&dose)?;
//! let report = estimator.estimate(&SpectrumTable::bundled()?);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod detector;
pub mod dose;
pub mod error;
pub mod runner;
pub mod spectrum;
pub mod spline;
pub mod sweep;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod response;
pub mod transport;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use detector::DetectorModel;
pub use dose::{ConversionTable, DoseCalibrator};
pub use response::{DoseSensitivityCurve, EfficiencyCurve};
pub use runner::{SweepProgress, SweepRunner};
pub use spectrum::{SensitivityReport, SourceSensitivityEstimator, SpectrumTable};
pub use sweep::{GridSpec, ParameterPoint, SweepConfig, SweepPlan};
pub use transport::TransportEngine;
