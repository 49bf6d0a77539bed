//! Boundary types for the external Monte Carlo transport engine.
//!
//! The engine itself (geometry construction, physics, particle tracking) is
//! an external collaborator. This module pins down the operations the core
//! needs from it and the fixed-schema records it hands back, so the rest of
//! the crate never touches the engine's native representation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TransportFailure;

/// Engine energies are MeV; the sweep grid is keV.
pub const MEV_PER_KEV: f64 = 1.0e-3;

/// Particle species the source can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    Photon,
    Electron,
}

impl ParticleKind {
    /// PDG Monte Carlo particle numbering
    #[must_use]
    pub fn pdg(self) -> i32 {
        match self {
            ParticleKind::Photon => 22,
            ParticleKind::Electron => 11,
        }
    }

    /// Particle name as transport engines spell it
    #[must_use]
    pub fn pid_name(self) -> &'static str {
        match self {
            ParticleKind::Photon => "gamma",
            ParticleKind::Electron => "e-",
        }
    }
}

/// Pose override applied to a named sub-volume before geometry construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumePose {
    /// Position of the volume origin, cm
    pub position: [f64; 3],
    /// Euler rotation about x/y/z, degrees
    pub rotation_deg: [f64; 3],
}

/// Deposit-sampling granularity requested from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositSampling {
    /// One aggregate deposit per event and volume
    Coarse,
    /// Per-step deposits with track detail
    Detailed,
}

/// Physics configuration handed to the engine per simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportSettings {
    pub sampling: DepositSampling,
    /// Electromagnetic physics list override (e.g. "livermore"); engine
    /// default when `None`
    pub em_model: Option<String>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            sampling: DepositSampling::Detailed,
            em_model: None,
        }
    }
}

/// One batch of monoenergetic primaries fired from inside a named volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleShot {
    pub particle: ParticleKind,
    pub energy_mev: f64,
    /// Generation volume name
    pub volume: String,
    /// Fixed initial direction (unit vector)
    pub direction: [f64; 3],
    pub count: u64,
}

/// Track-level detail attached to a deposit in detailed sampling mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepositDetail {
    pub track: u64,
    pub pid: i32,
    pub start: [f64; 3],
    pub end: [f64; 3],
    pub weight: f64,
}

/// One energy deposit attributed to a primary event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepositRecord {
    /// Triggering primary event id
    pub event: u64,
    /// Deposited energy, MeV
    pub value: f64,
    pub detail: Option<DepositDetail>,
}

/// One particle crossing into a recorded volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleCrossing {
    pub event: u64,
    pub pid: i32,
    /// Kinetic energy at the crossing, MeV
    pub energy: f64,
    pub position: [f64; 3],
    pub direction: [f64; 3],
    pub weight: f64,
}

/// Records for one named layer (recorded volume)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecords<T> {
    pub layer: String,
    pub records: Vec<T>,
}

/// Everything the engine reports back for one transport run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransportRecords {
    pub deposits: Vec<LayerRecords<DepositRecord>>,
    pub crossings: Vec<LayerRecords<ParticleCrossing>>,
}

/// Axis-aligned bounding box of a named volume, cm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb {
    /// Extent along one axis (0 = x, 1 = y, 2 = z)
    #[must_use]
    pub fn extent(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }
}

/// The Monte Carlo transport engine seam.
///
/// Implementations must be stateless across calls in the sense that
/// re-running the same request yields an independent stochastic sample,
/// never an error, so chunks can execute on any worker in any order.
pub trait TransportEngine {
    /// Opaque geometry handle produced per chunk
    type Geometry;

    /// Construct a geometry from `path`, overriding the pose of the named
    /// sub-volume
    fn build_geometry(
        &self,
        path: &Path,
        volume: &str,
        pose: &VolumePose,
    ) -> Result<Self::Geometry, TransportFailure>;

    /// Generate and transport one particle batch, returning per-layer
    /// deposit and crossing records
    fn run(
        &self,
        geometry: &Self::Geometry,
        settings: &TransportSettings,
        shot: &ParticleShot,
    ) -> Result<TransportRecords, TransportFailure>;

    /// Validate the geometry at `path`
    fn check_geometry(&self, path: &Path) -> Result<(), TransportFailure>;

    /// Bounding box of a named volume in the geometry at `path`
    fn volume_aabb(&self, path: &Path, volume: &str) -> Result<Aabb, TransportFailure>;
}
