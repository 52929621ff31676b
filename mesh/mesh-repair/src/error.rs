//! Error types for mesh cleanup.

use thiserror::Error;

/// Result type for cleanup operations.
pub type RepairResult<T> = Result<T, RepairError>;

/// Errors that can occur during mesh cleanup.
#[derive(Debug, Error)]
pub enum RepairError {
    /// No triangles survived cleanup.
    #[error("mesh is empty after cleanup ({removed} faces removed)")]
    EmptyMesh {
        /// Number of faces removed by the cleanup passes.
        removed: usize,
    },
}
