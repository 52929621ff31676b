//! Error types for scan processing operations.

use thiserror::Error;

/// Result type for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur during point cloud processing and reconstruction.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Point cloud has no points.
    #[error("point cloud is empty")]
    EmptyPointCloud,

    /// Not enough points for the requested operation.
    #[error("insufficient points: need at least {required}, got {actual}")]
    InsufficientPoints {
        /// Minimum number of points required.
        required: usize,
        /// Actual number of points.
        actual: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {reason}")]
    InvalidParameter {
        /// Description of what's wrong.
        reason: String,
    },

    /// Unrecognised reconstruction method token.
    #[error("unknown reconstruction method: {token} (expected poisson or ball_pivoting)")]
    UnknownMethod {
        /// The rejected token.
        token: String,
    },

    /// Surface reconstruction could not produce a mesh.
    #[error("reconstruction failed: {reason}")]
    ReconstructionFailed {
        /// Reason for failure.
        reason: String,
    },

    /// Normals are required but missing.
    #[error("normal estimation failed: {reason}")]
    NormalEstimationFailed {
        /// Reason for failure.
        reason: String,
    },

    /// Post-reconstruction cleanup failed.
    #[error("repair error: {0}")]
    Repair(#[from] mesh_repair::RepairError),

    /// Reading or writing a point cloud file failed.
    #[error("I/O error: {0}")]
    Io(#[from] mesh_io::IoError),
}

impl ScanError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_point_cloud_error() {
        assert_eq!(ScanError::EmptyPointCloud.to_string(), "point cloud is empty");
    }

    #[test]
    fn test_insufficient_points_error() {
        let err = ScanError::InsufficientPoints {
            required: 4,
            actual: 2,
        };
        assert_eq!(err.to_string(), "insufficient points: need at least 4, got 2");
    }

    #[test]
    fn test_invalid_parameter_error() {
        let err = ScanError::invalid("voxel size must be finite");
        assert_eq!(err.to_string(), "invalid parameter: voxel size must be finite");
    }

    #[test]
    fn test_unknown_method_error() {
        let err = ScanError::UnknownMethod {
            token: "marching".to_string(),
        };
        assert!(err.to_string().contains("marching"));
    }

    #[test]
    fn test_repair_error_conversion() {
        let err: ScanError = mesh_repair::RepairError::EmptyMesh { removed: 3 }.into();
        assert!(matches!(err, ScanError::Repair(_)));
    }
}
