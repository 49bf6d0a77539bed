//! Stub transport engines for exercising the sweep pipeline without a real
//! Monte Carlo backend.

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_distr::{Binomial, Distribution};

use crate::error::TransportFailure;
use crate::transport::{
    Aabb, DepositRecord, LayerRecords, ParticleShot, TransportEngine, TransportRecords,
    TransportSettings, VolumePose,
};

/// Records with `detected` qualifying single-deposit events
pub fn detection_records(detected: u64) -> TransportRecords {
    TransportRecords {
        deposits: vec![LayerRecords {
            layer: "Cathode".to_string(),
            records: (0..detected)
                .map(|event| DepositRecord {
                    event,
                    value: 1.0,
                    detail: None,
                })
                .collect(),
        }],
        crossings: vec![],
    }
}

const STUB_AABB: Aabb = Aabb {
    min: [-1.5, -0.05, -2.0],
    max: [1.5, 0.05, 2.0],
};

/// Deterministic engine: the detected fraction is a pure function of the
/// chunk's energy and angle, so aggregated efficiencies are exact
pub struct ResponseEngine<F: Fn(f64, f64) -> f64> {
    response: F,
}

impl<F: Fn(f64, f64) -> f64> ResponseEngine<F> {
    pub fn new(response: F) -> Self {
        Self { response }
    }
}

impl<F: Fn(f64, f64) -> f64 + Sync> TransportEngine for ResponseEngine<F> {
    type Geometry = f64;

    fn build_geometry(
        &self,
        _path: &Path,
        _volume: &str,
        pose: &VolumePose,
    ) -> Result<Self::Geometry, TransportFailure> {
        Ok(pose.rotation_deg[2])
    }

    fn run(
        &self,
        geometry: &Self::Geometry,
        _settings: &TransportSettings,
        shot: &ParticleShot,
    ) -> Result<TransportRecords, TransportFailure> {
        let fraction = (self.response)(shot.energy_mev * 1e3, *geometry).clamp(0.0, 1.0);
        let detected = (fraction * shot.count as f64).round() as u64;
        Ok(detection_records(detected.min(shot.count)))
    }

    fn check_geometry(&self, _path: &Path) -> Result<(), TransportFailure> {
        Ok(())
    }

    fn volume_aabb(&self, _path: &Path, _volume: &str) -> Result<Aabb, TransportFailure> {
        Ok(STUB_AABB)
    }
}

/// Stochastic engine: detected counts are binomial draws, modeling the
/// chunk-to-chunk variance of a real transport backend
pub struct BinomialEngine<F: Fn(f64, f64) -> f64> {
    response: F,
    rng: Mutex<SmallRng>,
}

impl<F: Fn(f64, f64) -> f64> BinomialEngine<F> {
    pub fn new(response: F, seed: u64) -> Self {
        Self {
            response,
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
        }
    }
}

impl<F: Fn(f64, f64) -> f64 + Sync> TransportEngine for BinomialEngine<F> {
    type Geometry = f64;

    fn build_geometry(
        &self,
        _path: &Path,
        _volume: &str,
        pose: &VolumePose,
    ) -> Result<Self::Geometry, TransportFailure> {
        Ok(pose.rotation_deg[2])
    }

    fn run(
        &self,
        geometry: &Self::Geometry,
        _settings: &TransportSettings,
        shot: &ParticleShot,
    ) -> Result<TransportRecords, TransportFailure> {
        let fraction = (self.response)(shot.energy_mev * 1e3, *geometry).clamp(0.0, 1.0);
        let binomial = Binomial::new(shot.count, fraction)
            .map_err(|e| TransportFailure::Engine(e.to_string()))?;
        let detected = {
            let mut rng = self.rng.lock().unwrap();
            binomial.sample(&mut *rng)
        };
        Ok(detection_records(detected))
    }

    fn check_geometry(&self, _path: &Path) -> Result<(), TransportFailure> {
        Ok(())
    }

    fn volume_aabb(&self, _path: &Path, _volume: &str) -> Result<Aabb, TransportFailure> {
        Ok(STUB_AABB)
    }
}

/// Engine that fails the nth chunk it runs
pub struct FailingEngine {
    runs: AtomicUsize,
    fail_at: usize,
}

impl FailingEngine {
    pub fn failing_after(fail_at: usize) -> Self {
        Self {
            runs: AtomicUsize::new(0),
            fail_at,
        }
    }
}

impl TransportEngine for FailingEngine {
    type Geometry = ();

    fn build_geometry(
        &self,
        _path: &Path,
        _volume: &str,
        _pose: &VolumePose,
    ) -> Result<Self::Geometry, TransportFailure> {
        Ok(())
    }

    fn run(
        &self,
        _geometry: &Self::Geometry,
        _settings: &TransportSettings,
        shot: &ParticleShot,
    ) -> Result<TransportRecords, TransportFailure> {
        if self.runs.fetch_add(1, Ordering::Relaxed) >= self.fail_at {
            return Err(TransportFailure::Engine("detector volume overlap".to_string()));
        }
        Ok(detection_records(shot.count / 2))
    }

    fn check_geometry(&self, _path: &Path) -> Result<(), TransportFailure> {
        Ok(())
    }

    fn volume_aabb(&self, _path: &Path, _volume: &str) -> Result<Aabb, TransportFailure> {
        Ok(STUB_AABB)
    }
}
