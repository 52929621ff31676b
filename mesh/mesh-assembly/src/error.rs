//! Error types for scene composition.

use thiserror::Error;

/// Result type for scene composition.
pub type AssemblyResult<T> = Result<T, AssemblyError>;

/// Errors that can occur while composing a scene.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// The scene has no parts.
    #[error("cannot compose an empty scene")]
    EmptyScene,

    /// A part's scale is zero, negative or not finite.
    #[error("part {index} has invalid scale {scale} (must be positive)")]
    InvalidScale {
        /// Position of the part in the scene.
        index: usize,
        /// The rejected scale.
        scale: f64,
    },

    /// A part's translation has a non-finite component.
    #[error("part {index} has a non-finite translation")]
    InvalidTranslation {
        /// Position of the part in the scene.
        index: usize,
    },

    /// Scene name is empty or would escape the output directory.
    #[error("invalid scene name '{name}'")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// Loading or saving a mesh failed.
    #[error("mesh I/O error: {0}")]
    MeshIo(#[from] mesh_io::IoError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_part() {
        let err = AssemblyError::InvalidScale { index: 2, scale: -1.0 };
        assert!(err.to_string().contains("part 2"));
        assert!(err.to_string().contains("-1"));
        assert_eq!(AssemblyError::EmptyScene.to_string(), "cannot compose an empty scene");
    }
}
