//! Sweep planning: parameter grids and chunk decomposition.
//!
//! A sweep maps a total Monte Carlo sample budget onto a grid of energies or
//! incidence angles. The budget is split into fixed-size chunks so the
//! transport work parallelizes; every chunk carries the full chunk size, so
//! `ceil(N/C)` chunks per point may simulate slightly more than requested.
//! The overrun is accepted in exchange for uniform per-chunk accounting.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::transport::ParticleKind;

/// Points in the default energy-response grid
pub const ENERGY_GRID_POINTS: usize = 32;
/// Default energy-response grid bounds, keV
pub const ENERGY_GRID_MIN_KEV: f64 = 10.0;
pub const ENERGY_GRID_MAX_KEV: f64 = 3600.0;
/// Points in the default angular-response grid (10° steps over ±90°)
pub const ANGLE_GRID_POINTS: usize = 19;
/// Cs-137 gamma line, keV; reference energy for angular sweeps
pub const CS137_LINE_KEV: f64 = 661.7;
/// Default particles per chunk
pub const DEFAULT_CHUNK_SIZE: u64 = 100_000;

/// One sweep coordinate: the grid bucket a chunk's counts accumulate into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "axis", content = "value", rename_all = "snake_case")]
pub enum ParameterPoint {
    /// Incident photon energy, keV
    Energy(f64),
    /// Incidence angle, degrees; 0 is head-on
    Angle(f64),
}

impl ParameterPoint {
    /// The scalar coordinate regardless of axis
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            ParameterPoint::Energy(v) | ParameterPoint::Angle(v) => v,
        }
    }

    /// Energy in keV if this is an energy-axis point
    #[must_use]
    pub fn energy_kev(self) -> Option<f64> {
        match self {
            ParameterPoint::Energy(e) => Some(e),
            ParameterPoint::Angle(_) => None,
        }
    }
}

/// Sweep grid shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridSpec {
    /// Log-spaced energies at a fixed incidence angle
    Energies {
        count: usize,
        min_kev: f64,
        max_kev: f64,
        angle_deg: f64,
    },
    /// Linearly spaced angles at a fixed energy
    Angles {
        count: usize,
        min_deg: f64,
        max_deg: f64,
        energy_kev: f64,
    },
}

impl GridSpec {
    /// Standard energy-response grid: 32 log-spaced points, 10–3600 keV,
    /// head-on incidence
    #[must_use]
    pub fn energy_response() -> Self {
        GridSpec::Energies {
            count: ENERGY_GRID_POINTS,
            min_kev: ENERGY_GRID_MIN_KEV,
            max_kev: ENERGY_GRID_MAX_KEV,
            angle_deg: 0.0,
        }
    }

    /// Standard angular-response grid: 19 points over ±90° at the Cs-137 line
    #[must_use]
    pub fn angular_response() -> Self {
        GridSpec::Angles {
            count: ANGLE_GRID_POINTS,
            min_deg: -90.0,
            max_deg: 90.0,
            energy_kev: CS137_LINE_KEV,
        }
    }

    /// Number of grid points
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            GridSpec::Energies { count, .. } | GridSpec::Angles { count, .. } => *count,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expand into (point, energy keV, angle deg) triples in grid order
    fn expand(&self) -> Result<Vec<(ParameterPoint, f64, f64)>, ConfigError> {
        match *self {
            GridSpec::Energies {
                count,
                min_kev,
                max_kev,
                angle_deg,
            } => {
                if count == 0 {
                    return Err(ConfigError::EmptyGrid);
                }
                if !(min_kev > 0.0) || !min_kev.is_finite() {
                    return Err(ConfigError::NonPositiveEnergy(min_kev));
                }
                if !(max_kev > min_kev) || !max_kev.is_finite() {
                    return Err(ConfigError::InvalidRange {
                        lo: min_kev,
                        hi: max_kev,
                    });
                }
                let points = log_spaced(min_kev, max_kev, count)
                    .into_iter()
                    .map(|e| (ParameterPoint::Energy(e), e, angle_deg))
                    .collect();
                Ok(points)
            }
            GridSpec::Angles {
                count,
                min_deg,
                max_deg,
                energy_kev,
            } => {
                if count == 0 {
                    return Err(ConfigError::EmptyGrid);
                }
                if !(max_deg > min_deg) || !min_deg.is_finite() || !max_deg.is_finite() {
                    return Err(ConfigError::InvalidRange {
                        lo: min_deg,
                        hi: max_deg,
                    });
                }
                if !(energy_kev > 0.0) || !energy_kev.is_finite() {
                    return Err(ConfigError::NonPositiveEnergy(energy_kev));
                }
                let points = lin_spaced(min_deg, max_deg, count)
                    .into_iter()
                    .map(|a| (ParameterPoint::Angle(a), energy_kev, a))
                    .collect();
                Ok(points)
            }
        }
    }
}

/// Endpoint-exact linear spacing over [lo, hi]
fn lin_spaced(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    if count == 1 {
        return vec![lo];
    }
    let step = (hi - lo) / (count - 1) as f64;
    (0..count)
        .map(|i| {
            if i == count - 1 {
                hi
            } else {
                lo + step * i as f64
            }
        })
        .collect()
}

/// Endpoint-exact logarithmic spacing over [lo, hi]
fn log_spaced(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    if count == 1 {
        return vec![lo];
    }
    lin_spaced(lo.log10(), hi.log10(), count)
        .into_iter()
        .enumerate()
        .map(|(i, l)| {
            // keep the endpoints exact rather than 10^log10(x)
            if i == 0 {
                lo
            } else if i == count - 1 {
                hi
            } else {
                10f64.powf(l)
            }
        })
        .collect()
}

/// Everything needed to plan one sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub grid: GridSpec,
    pub particle: ParticleKind,
    /// Requested Monte Carlo samples per grid point
    pub total_samples: u64,
    pub chunk_size: u64,
}

impl SweepConfig {
    /// Photon sweep with the default chunk size
    #[must_use]
    pub fn new(grid: GridSpec, total_samples: u64) -> Self {
        Self {
            grid,
            particle: ParticleKind::Photon,
            total_samples,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// One unit of transport work: a fixed-size particle batch at one grid point.
///
/// `grid_index` travels with the task so results accumulate by index, never
/// by matching the float-valued coordinate back to a grid slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkTask {
    pub grid_index: usize,
    pub point: ParameterPoint,
    pub energy_kev: f64,
    pub angle_deg: f64,
    pub particle: ParticleKind,
    pub samples: u64,
}

/// Outcome of one chunk: detected-event and generated-particle counts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkResult {
    pub grid_index: usize,
    pub point: ParameterPoint,
    pub detected: u64,
    pub samples: u64,
}

/// Grid plus chunk decomposition for one sweep call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPlan {
    grid: Vec<ParameterPoint>,
    tasks: Vec<ChunkTask>,
    chunks_per_point: usize,
    chunk_size: u64,
}

impl SweepPlan {
    /// Build the grid and the full chunk-task list for `config`.
    ///
    /// Produces `grid.len() × ceil(total_samples / chunk_size)` tasks, each
    /// carrying exactly `chunk_size` samples.
    pub fn build(config: &SweepConfig) -> Result<Self, ConfigError> {
        if config.total_samples == 0 {
            return Err(ConfigError::ZeroSampleBudget);
        }
        if config.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }

        let expanded = config.grid.expand()?;
        let chunks_per_point = config.total_samples.div_ceil(config.chunk_size) as usize;

        let mut grid = Vec::with_capacity(expanded.len());
        let mut tasks = Vec::with_capacity(expanded.len() * chunks_per_point);
        for (grid_index, (point, energy_kev, angle_deg)) in expanded.into_iter().enumerate() {
            grid.push(point);
            for _ in 0..chunks_per_point {
                tasks.push(ChunkTask {
                    grid_index,
                    point,
                    energy_kev,
                    angle_deg,
                    particle: config.particle,
                    samples: config.chunk_size,
                });
            }
        }

        Ok(Self {
            grid,
            tasks,
            chunks_per_point,
            chunk_size: config.chunk_size,
        })
    }

    /// Grid points in sweep order
    #[must_use]
    pub fn grid(&self) -> &[ParameterPoint] {
        &self.grid
    }

    /// All chunk tasks, grouped by grid point in grid order
    #[must_use]
    pub fn tasks(&self) -> &[ChunkTask] {
        &self.tasks
    }

    #[must_use]
    pub fn chunks_per_point(&self) -> usize {
        self.chunks_per_point
    }

    /// Samples that will actually be simulated per grid point
    /// (≥ the requested budget)
    #[must_use]
    pub fn samples_per_point(&self) -> u64 {
        self.chunks_per_point as u64 * self.chunk_size
    }
}
