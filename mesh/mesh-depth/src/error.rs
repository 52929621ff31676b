//! Error types for depth processing.

use thiserror::Error;

/// Result type for depth processing.
pub type DepthResult<T> = Result<T, DepthError>;

/// Errors that can occur while lifting, texturing or visualizing depth.
#[derive(Debug, Error)]
pub enum DepthError {
    /// Input grids are malformed or do not share a pixel grid.
    #[error("invalid input: {0}")]
    Sensor(#[from] sensor_types::SensorError),

    /// A configuration value is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Encoding an image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Writing an artifact failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
