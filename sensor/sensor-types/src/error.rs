//! Error types for sensor operations.

use thiserror::Error;

/// Result type for sensor operations.
pub type SensorResult<T> = Result<T, SensorError>;

/// Errors that can occur when working with camera and grid data.
#[derive(Debug, Error)]
pub enum SensorError {
    /// Buffer size mismatch (e.g., depth buffer wrong size for its grid).
    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch {
        /// Expected buffer size.
        expected: usize,
        /// Actual buffer size.
        actual: usize,
    },

    /// Two grids that must share a pixel grid do not.
    #[error("dimension mismatch: expected {expected_width}x{expected_height}, got {actual_width}x{actual_height}")]
    DimensionMismatch {
        /// Expected width.
        expected_width: u32,
        /// Expected height.
        expected_height: u32,
        /// Actual width.
        actual_width: u32,
        /// Actual height.
        actual_height: u32,
    },

    /// Grid has zero width or height.
    #[error("empty grid: {width}x{height}")]
    EmptyGrid {
        /// Width.
        width: u32,
        /// Height.
        height: u32,
    },

    /// A depth sample is `NaN` or infinite.
    #[error("non-finite depth at pixel ({x}, {y})")]
    NonFiniteDepth {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl SensorError {
    /// Creates a buffer size mismatch error.
    #[must_use]
    pub const fn buffer_mismatch(expected: usize, actual: usize) -> Self {
        Self::BufferSizeMismatch { expected, actual }
    }

    /// Creates a dimension mismatch error.
    #[must_use]
    pub const fn dimension_mismatch(expected: (u32, u32), actual: (u32, u32)) -> Self {
        Self::DimensionMismatch {
            expected_width: expected.0,
            expected_height: expected.1,
            actual_width: actual.0,
            actual_height: actual.1,
        }
    }
}
