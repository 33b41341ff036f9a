//! Error types for the tuner core.
//!
//! Only configuration problems and session start-up failures are errors.
//! A pipeline stage declining to produce a pitch is a normal outcome and is
//! reported through [`crate::PipelineResult::NoObservation`] instead.

use thiserror::Error;

/// Invalid parameter combinations, detected at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Frame size {0} is too small, need at least 2 samples")]
    FrameTooSmall(usize),

    #[error("Invalid frequency range: {min} - {max} Hz")]
    InvalidFrequencyRange { min: f32, max: f32 },

    /// The frequency bounds leave no lags to search within one frame.
    #[error("Empty lag range: min lag {min_lag} >= max lag {max_lag}")]
    EmptyLagRange { min_lag: usize, max_lag: usize },

    #[error("Gate open threshold {open_db} dB must be above close threshold {close_db} dB")]
    GateThresholds { open_db: f32, close_db: f32 },

    #[error("Median window size must be greater than 0")]
    EmptyMedianWindow,

    #[error("Invalid parameter {name}: {value}")]
    OutOfRange { name: &'static str, value: f32 },
}

/// Failures of the audio capture collaborator.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Capture authorization is missing. Not retried.
    #[error("Microphone access was denied")]
    PermissionDenied,

    /// The device could not be opened or configured. Not retried.
    #[error("Audio device initialization failed: {0}")]
    DeviceInit(String),

    /// A single read failed; the chunk is skipped.
    #[error("Audio read failed: {0}")]
    TransientRead(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CaptureError {
    /// Fatal errors end the session; transient ones are skipped.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CaptureError::TransientRead(_))
    }
}

/// Errors returned when starting an analysis session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to spawn the analysis thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    #[error("Analysis thread exited before start-up completed")]
    WorkerExited,
}

impl SessionError {
    /// True when the session failed because capture was not authorized.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, SessionError::Capture(CaptureError::PermissionDenied))
    }
}

/// Result type for configuration checks.
pub type ConfigResult<T> = Result<T, ConfigError>;
