//! Job-level errors, classified by what the caller should do about them.

use std::fmt;

use mesh_depth::DepthError;
use mesh_io::IoError;
use mesh_scan::ScanError;
use sensor_types::SensorError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Failure class of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or unreconcilable input. Not retryable.
    Input,
    /// Too little geometry survived a stage. Resubmit with other parameters.
    DegenerateGeometry,
    /// Unknown method, unsupported format or out-of-range parameter.
    /// Detected before any computation.
    Configuration,
    /// Writing an artifact failed.
    Persistence,
}

impl ErrorKind {
    /// Stable identifier for status stores and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::DegenerateGeometry => "degenerate_geometry",
            Self::Configuration => "configuration",
            Self::Persistence => "persistence",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed reconstruction job.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// See [`ErrorKind::Input`].
    #[error("input error: {0}")]
    Input(String),

    /// See [`ErrorKind::DegenerateGeometry`].
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// See [`ErrorKind::Configuration`].
    #[error("configuration error: {0}")]
    Configuration(String),

    /// See [`ErrorKind::Persistence`].
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl PipelineError {
    /// The failure class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) => ErrorKind::Input,
            Self::DegenerateGeometry(_) => ErrorKind::DegenerateGeometry,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// The message without the kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Input(m) | Self::DegenerateGeometry(m) | Self::Configuration(m) | Self::Persistence(m) => m,
        }
    }
}

impl From<SensorError> for PipelineError {
    fn from(err: SensorError) -> Self {
        match err {
            SensorError::InvalidParameter(_) => Self::Configuration(err.to_string()),
            _ => Self::Input(err.to_string()),
        }
    }
}

impl From<DepthError> for PipelineError {
    fn from(err: DepthError) -> Self {
        match err {
            DepthError::Sensor(inner) => inner.into(),
            DepthError::InvalidParameter(_) => Self::Configuration(err.to_string()),
            DepthError::Image(_) | DepthError::Io(_) => Self::Persistence(err.to_string()),
        }
    }
}

impl From<ScanError> for PipelineError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::InvalidParameter { .. } | ScanError::UnknownMethod { .. } => {
                Self::Configuration(err.to_string())
            }
            ScanError::Io(inner) => inner.into(),
            ScanError::EmptyPointCloud
            | ScanError::InsufficientPoints { .. }
            | ScanError::ReconstructionFailed { .. }
            | ScanError::NormalEstimationFailed { .. }
            | ScanError::Repair(_) => Self::DegenerateGeometry(err.to_string()),
        }
    }
}

impl From<IoError> for PipelineError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::UnknownFormat { .. } => Self::Configuration(err.to_string()),
            _ => Self::Persistence(err.to_string()),
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<mesh_turntable::RenderError> for PipelineError {
    fn from(err: mesh_turntable::RenderError) -> Self {
        use mesh_turntable::RenderError;
        match err {
            RenderError::NoInput => Self::Input(err.to_string()),
            RenderError::Mesh(inner) => inner.into(),
            RenderError::NoFrames
            | RenderError::InvalidParameter(_)
            | RenderError::UnsupportedFormat { .. }
            | RenderError::UnknownFormat { .. } => Self::Configuration(err.to_string()),
            RenderError::Image(_) | RenderError::Io(_) => Self::Persistence(err.to_string()),
        }
    }
}
