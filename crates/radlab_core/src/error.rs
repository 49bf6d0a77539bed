use std::fmt;

/// Errors raised while validating a sweep configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    ZeroSampleBudget,
    ZeroChunkSize,
    EmptyGrid,
    InvalidRange { lo: f64, hi: f64 },
    NonPositiveEnergy(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroSampleBudget => write!(f, "sample budget must be positive"),
            ConfigError::ZeroChunkSize => write!(f, "chunk size must be positive"),
            ConfigError::EmptyGrid => write!(f, "sweep grid has no points"),
            ConfigError::InvalidRange { lo, hi } => {
                write!(f, "invalid grid range [{lo}, {hi}]")
            }
            ConfigError::NonPositiveEnergy(e) => {
                write!(f, "energy {e} keV is not positive")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors raised at the transport-engine boundary.
///
/// Any of these aborts the whole sweep; there is no per-chunk recovery.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportFailure {
    /// The engine itself reported a failure
    Engine(String),
    NonFiniteDeposit { layer: String, event: u64 },
    NonFiniteCrossing { layer: String, event: u64 },
    /// More distinct detection events than generated particles
    ExcessDetections { detected: u64, samples: u64 },
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportFailure::Engine(msg) => write!(f, "transport engine failure: {msg}"),
            TransportFailure::NonFiniteDeposit { layer, event } => {
                write!(f, "non-finite deposit value in layer {layer:?}, event {event}")
            }
            TransportFailure::NonFiniteCrossing { layer, event } => {
                write!(f, "non-finite crossing energy in layer {layer:?}, event {event}")
            }
            TransportFailure::ExcessDetections { detected, samples } => {
                write!(f, "{detected} detection events exceed {samples} generated particles")
            }
        }
    }
}

impl std::error::Error for TransportFailure {}

/// Errors returned by a sweep run
#[derive(Debug, Clone, PartialEq)]
pub enum SweepError {
    Config(ConfigError),
    Transport(TransportFailure),
    /// The worker pool could not be constructed
    Pool(String),
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepError::Config(e) => write!(f, "{e}"),
            SweepError::Transport(e) => write!(f, "{e}"),
            SweepError::Pool(msg) => write!(f, "worker pool error: {msg}"),
        }
    }
}

impl std::error::Error for SweepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SweepError::Config(e) => Some(e),
            SweepError::Transport(e) => Some(e),
            SweepError::Pool(_) => None,
        }
    }
}

impl From<ConfigError> for SweepError {
    fn from(e: ConfigError) -> Self {
        SweepError::Config(e)
    }
}

impl From<TransportFailure> for SweepError {
    fn from(e: TransportFailure) -> Self {
        SweepError::Transport(e)
    }
}

/// Errors raised while fitting a cubic spline
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplineError {
    TooFewKnots(usize),
    LengthMismatch { knots: usize, values: usize },
    NonIncreasingKnots { index: usize },
    NonFiniteInput { index: usize },
}

impl fmt::Display for SplineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplineError::TooFewKnots(n) => {
                write!(f, "spline needs at least 2 knots, got {n}")
            }
            SplineError::LengthMismatch { knots, values } => {
                write!(f, "{knots} knots but {values} values")
            }
            SplineError::NonIncreasingKnots { index } => {
                write!(f, "knots must be strictly increasing at index {index}")
            }
            SplineError::NonFiniteInput { index } => {
                write!(f, "non-finite knot or value at index {index}")
            }
        }
    }
}

impl std::error::Error for SplineError {}

/// Errors raised by the dose calibration stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationError {
    Spline(SplineError),
    /// A conversion-table row could not be parsed (1-based line number)
    MalformedRow { line: usize },
    NonIncreasingEnergy { row: usize },
    InvalidEnergy { row: usize },
    InvalidCoefficient { row: usize },
    TooFewRows(usize),
    /// The curve is swept over angle, not energy
    NotAnEnergyCurve,
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::Spline(e) => write!(f, "{e}"),
            CalibrationError::MalformedRow { line } => {
                write!(f, "malformed conversion-table row at line {line}")
            }
            CalibrationError::NonIncreasingEnergy { row } => {
                write!(f, "conversion-table energies not strictly increasing at row {row}")
            }
            CalibrationError::InvalidEnergy { row } => {
                write!(f, "conversion-table energy at row {row} is not positive and finite")
            }
            CalibrationError::InvalidCoefficient { row } => {
                write!(f, "conversion-table coefficient at row {row} is not positive and finite")
            }
            CalibrationError::TooFewRows(n) => {
                write!(f, "conversion table needs at least 2 rows, got {n}")
            }
            CalibrationError::NotAnEnergyCurve => {
                write!(f, "dose calibration requires an energy-swept curve")
            }
        }
    }
}

impl std::error::Error for CalibrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CalibrationError::Spline(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SplineError> for CalibrationError {
    fn from(e: SplineError) -> Self {
        CalibrationError::Spline(e)
    }
}

/// Errors raised while loading spectra or estimating per-nuclide sensitivity
#[derive(Debug)]
pub enum SpectrumError {
    Parse(serde_json::Error),
    BadEnergyKey { nuclide: String, key: String },
    /// No emission line survived the range filter and sensitivity floor.
    /// Fatal to this nuclide only, never to the whole batch.
    EmptySpectrum { nuclide: String },
}

impl fmt::Display for SpectrumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpectrumError::Parse(e) => write!(f, "spectrum table parse error: {e}"),
            SpectrumError::BadEnergyKey { nuclide, key } => {
                write!(f, "nuclide {nuclide}: energy key {key:?} is not a number")
            }
            SpectrumError::EmptySpectrum { nuclide } => {
                write!(f, "nuclide {nuclide}: no qualifying emission lines")
            }
        }
    }
}

impl std::error::Error for SpectrumError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SpectrumError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SpectrumError {
    fn from(e: serde_json::Error) -> Self {
        SpectrumError::Parse(e)
    }
}
