//! Detector model and per-chunk transport execution.
//!
//! `run_chunk` is the unit of work the sweep runner dispatches: build the
//! geometry with the source posed for the chunk's incidence angle, fire the
//! particle batch, and reduce the engine's records to one detection count.
//! It holds no state between calls, so chunks can run on any worker, in any
//! order, any number of times.

use std::path::PathBuf;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::TransportFailure;
use crate::sweep::{ChunkResult, ChunkTask};
use crate::transport::{
    MEV_PER_KEV, ParticleKind, ParticleShot, TransportEngine, TransportRecords,
    TransportSettings, VolumePose,
};

/// Threshold energy for forming one electron-ion pair in neon gas, eV.
/// Based on: P.A. Zyla et al., Prog. Theor. Exp. Phys., Particle Data Group, 2020.
pub const NEON_W_VALUE_EV: f64 = 36.4;

/// Source-to-detector distance in the reference geometry, cm
pub const DEFAULT_SOURCE_DISTANCE_CM: f64 = 10.0;

/// Detector geometry plus the injected detection configuration.
///
/// Thresholds are per-model values rather than process globals so tests can
/// substitute synthetic ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorModel {
    pub geometry_path: PathBuf,
    /// Full path of the source volume inside the geometry tree, for the
    /// pose override
    pub source_volume_path: String,
    /// Source volume name, for particle generation and the area query
    pub source_volume: String,
    /// Minimum deposit that registers a count, MeV
    pub pair_threshold_mev: f64,
    pub source_distance_cm: f64,
    pub settings: TransportSettings,
}

impl DetectorModel {
    /// Model with the reference defaults: neon W-value threshold, 10 cm
    /// source distance, detailed deposit sampling
    pub fn new(geometry_path: impl Into<PathBuf>) -> Self {
        Self {
            geometry_path: geometry_path.into(),
            source_volume_path: "Environment.Source".to_string(),
            source_volume: "Source".to_string(),
            pair_threshold_mev: NEON_W_VALUE_EV * 1e-6,
            source_distance_cm: DEFAULT_SOURCE_DISTANCE_CM,
            settings: TransportSettings::default(),
        }
    }

    /// Override the ionization threshold, given in eV
    #[must_use]
    pub fn with_pair_threshold_ev(mut self, w_value_ev: f64) -> Self {
        self.pair_threshold_mev = w_value_ev * 1e-6;
        self
    }

    /// Source pose for an incidence angle: the source orbits the detector in
    /// the x/y plane at the model's distance, rotated to keep facing it
    #[must_use]
    pub fn source_pose(&self, angle_deg: f64) -> VolumePose {
        let theta = angle_deg.to_radians();
        VolumePose {
            position: [
                self.source_distance_cm * theta.sin(),
                -self.source_distance_cm * theta.cos(),
                0.0,
            ],
            rotation_deg: [0.0, 0.0, angle_deg],
        }
    }
}

/// Beam direction pointing from the posed source toward the detector
#[must_use]
pub fn beam_direction(angle_deg: f64) -> [f64; 3] {
    let theta = angle_deg.to_radians();
    [-theta.sin(), theta.cos(), 0.0]
}

/// Execute one chunk: one transport run at the task's energy and angle,
/// reduced to a detection count
pub fn run_chunk<E: TransportEngine>(
    engine: &E,
    model: &DetectorModel,
    task: &ChunkTask,
) -> Result<ChunkResult, TransportFailure> {
    let pose = model.source_pose(task.angle_deg);
    let geometry = engine.build_geometry(&model.geometry_path, &model.source_volume_path, &pose)?;

    let shot = ParticleShot {
        particle: task.particle,
        energy_mev: task.energy_kev * MEV_PER_KEV,
        volume: model.source_volume.clone(),
        direction: beam_direction(task.angle_deg),
        count: task.samples,
    };
    let records = engine.run(&geometry, &model.settings, &shot)?;

    let detected = count_detections(&records, model.pair_threshold_mev)?;
    if detected > task.samples {
        return Err(TransportFailure::ExcessDetections {
            detected,
            samples: task.samples,
        });
    }

    Ok(ChunkResult {
        grid_index: task.grid_index,
        point: task.point,
        detected,
        samples: task.samples,
    })
}

/// Count distinct primary events that triggered the detector.
///
/// An event qualifies through either channel: an energy deposit at or above
/// the ionization threshold, or an electron recorded crossing into a
/// sensitive volume. The two channels are unioned over event ids, so an
/// event producing many qualifying records still counts once.
pub fn count_detections(
    records: &TransportRecords,
    threshold_mev: f64,
) -> Result<u64, TransportFailure> {
    let mut events: FxHashSet<u64> = FxHashSet::default();

    for layer in &records.deposits {
        for deposit in &layer.records {
            if !deposit.value.is_finite() {
                return Err(TransportFailure::NonFiniteDeposit {
                    layer: layer.layer.clone(),
                    event: deposit.event,
                });
            }
            if deposit.value >= threshold_mev {
                events.insert(deposit.event);
            }
        }
    }

    for layer in &records.crossings {
        for crossing in &layer.records {
            if !crossing.energy.is_finite() {
                return Err(TransportFailure::NonFiniteCrossing {
                    layer: layer.layer.clone(),
                    event: crossing.event,
                });
            }
            if crossing.pid == ParticleKind::Electron.pdg() {
                events.insert(crossing.event);
            }
        }
    }

    Ok(events.len() as u64)
}

/// Illuminated lateral area of the source volume, from the geometry check
/// plus the bounding-box query
pub fn source_area<E: TransportEngine>(
    engine: &E,
    model: &DetectorModel,
) -> Result<f64, TransportFailure> {
    engine.check_geometry(&model.geometry_path)?;
    let aabb = engine.volume_aabb(&model.geometry_path, &model.source_volume)?;
    Ok(aabb.extent(0) * aabb.extent(2))
}
