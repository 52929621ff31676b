//! Error types for rendering and export.

use thiserror::Error;

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors returned by the public rendering functions.
///
/// A failure to draw a single frame is not among them: such frames are
/// replaced by a placeholder and counted in the report.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No mesh files were given.
    #[error("no input meshes")]
    NoInput,

    /// Loading an input mesh failed.
    #[error("mesh I/O error: {0}")]
    Mesh(#[from] mesh_io::IoError),

    /// The animation would have no frames.
    #[error("no frames to export")]
    NoFrames,

    /// A configuration value is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The export format is recognised but cannot be written.
    #[error("unsupported export format: {format}")]
    UnsupportedFormat {
        /// Format token.
        format: String,
    },

    /// The export format token is not recognised.
    #[error("unknown export format: {token} (expected gif)")]
    UnknownFormat {
        /// The rejected token.
        token: String,
    },

    /// Encoding or decoding an image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Writing or inspecting an artifact failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single frame could not be drawn. Never leaves this crate.
#[derive(Debug, Error, PartialEq)]
pub(crate) enum RenderFrameError {
    #[error("mesh has no triangles")]
    NoTriangles,

    #[error("vertex {index} has a non-finite position")]
    NonFiniteVertex { index: usize },

    #[error("face {face} references a missing vertex")]
    DanglingIndex { face: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(RenderError::NoFrames.to_string(), "no frames to export");
        let err = RenderError::UnsupportedFormat {
            format: "mp4".to_string(),
        };
        assert!(err.to_string().contains("mp4"));
        assert!(RenderFrameError::NonFiniteVertex { index: 3 }.to_string().contains('3'));
    }

    #[test]
    fn io_error_converts() {
        let err: RenderError = mesh_io::IoError::invalid_content("bad header").into();
        assert!(matches!(err, RenderError::Mesh(_)));
    }
}
