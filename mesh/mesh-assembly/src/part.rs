//! Parts of a scene.

use std::path::PathBuf;

use mesh_types::IndexedMesh;
use nalgebra::{Point3, Vector3};

use crate::error::{AssemblyError, AssemblyResult};

/// A mesh with its placement in the scene.
///
/// The scale is applied about the mesh's own centroid, then the
/// translation. Both are optional.
///
/// # Example
///
/// ```
/// use mesh_assembly::ScenePart;
/// use mesh_types::unit_cube;
///
/// let part = ScenePart::new(unit_cube())
///     .with_scale(2.0)
///     .with_translation(1.0, 0.0, 0.0);
///
/// assert_eq!(part.scale, Some(2.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePart {
    /// Geometry, in its own coordinates.
    pub mesh: IndexedMesh,
    /// Uniform scale about the mesh centroid.
    pub scale: Option<f64>,
    /// Offset applied after scaling.
    pub translation: Option<Vector3<f64>>,
}

impl ScenePart {
    /// Part with no transform.
    #[must_use]
    pub const fn new(mesh: IndexedMesh) -> Self {
        Self {
            mesh,
            scale: None,
            translation: None,
        }
    }

    /// Set the scale (builder pattern).
    #[must_use]
    pub const fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Set the translation (builder pattern).
    #[must_use]
    pub fn with_translation(mut self, x: f64, y: f64, z: f64) -> Self {
        self.translation = Some(Vector3::new(x, y, z));
        self
    }

    /// The mesh as placed in the scene.
    ///
    /// `index` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::InvalidScale`] for a scale that is not a
    /// positive finite number and [`AssemblyError::InvalidTranslation`] for
    /// a non-finite offset.
    pub fn placed(&self, index: usize) -> AssemblyResult<IndexedMesh> {
        validate_transform(index, self.scale, self.translation)?;
        let mut mesh = self.mesh.clone();
        if let Some(scale) = self.scale {
            let center = mesh.centroid().unwrap_or_else(Point3::origin);
            mesh.scale_about(center, scale);
        }
        if let Some(offset) = self.translation {
            mesh.translate(offset);
        }
        Ok(mesh)
    }
}

/// A part still on disk, with its placement.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneFile {
    /// PLY or OBJ file to load.
    pub path: PathBuf,
    /// Uniform scale about the mesh centroid.
    pub scale: Option<f64>,
    /// Offset applied after scaling.
    pub translation: Option<Vector3<f64>>,
}

impl SceneFile {
    /// File with no transform.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scale: None,
            translation: None,
        }
    }

    /// Set the scale (builder pattern).
    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Set the translation (builder pattern).
    #[must_use]
    pub fn with_translation(mut self, x: f64, y: f64, z: f64) -> Self {
        self.translation = Some(Vector3::new(x, y, z));
        self
    }

    /// Loads the mesh and keeps the placement.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::MeshIo`] if the file cannot be loaded.
    pub fn load(&self) -> AssemblyResult<ScenePart> {
        Ok(ScenePart {
            mesh: mesh_io::load_mesh(&self.path)?,
            scale: self.scale,
            translation: self.translation,
        })
    }
}

pub(crate) fn validate_transform(
    index: usize,
    scale: Option<f64>,
    translation: Option<Vector3<f64>>,
) -> AssemblyResult<()> {
    if let Some(scale) = scale {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(AssemblyError::InvalidScale { index, scale });
        }
    }
    if translation.is_some_and(|t| !t.iter().all(|c| c.is_finite())) {
        return Err(AssemblyError::InvalidTranslation { index });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::{unit_cube, Vertex};

    #[test]
    fn untransformed_part_is_unchanged() {
        let part = ScenePart::new(unit_cube());
        assert_eq!(part.placed(0).unwrap(), unit_cube());
    }

    #[test]
    fn scale_is_about_the_centroid() {
        // Centroid (1, 0, 0) differs from the bounding-box center (1.5, 0, 0)
        let mesh = IndexedMesh::from_parts(
            vec![
                Vertex::from_coords(0.0, 0.0, 0.0),
                Vertex::from_coords(0.0, 0.0, 0.0),
                Vertex::from_coords(3.0, 0.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        let placed = ScenePart::new(mesh).with_scale(2.0).placed(0).unwrap();
        assert_relative_eq!(placed.vertices[0].position.x, -1.0);
        assert_relative_eq!(placed.vertices[2].position.x, 5.0);
        assert_relative_eq!(placed.centroid().unwrap().x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn scale_then_translate() {
        let placed = ScenePart::new(unit_cube())
            .with_scale(2.0)
            .with_translation(1.0, 0.0, 0.0)
            .placed(0)
            .unwrap();
        let center = placed.centroid().unwrap();
        assert_relative_eq!(center.x, 1.5, epsilon = 1e-12);
        let xs: Vec<f64> = placed.vertices.iter().map(|v| v.position.x).collect();
        let min = xs.iter().copied().fold(f64::INFINITY, f64::min);
        assert_relative_eq!(min, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn bad_transforms_are_rejected() {
        for scale in [0.0, -2.0, f64::NAN] {
            let err = ScenePart::new(unit_cube()).with_scale(scale).placed(4).unwrap_err();
            assert!(matches!(err, AssemblyError::InvalidScale { index: 4, .. }));
        }
        let err = ScenePart::new(unit_cube())
            .with_translation(f64::INFINITY, 0.0, 0.0)
            .placed(1)
            .unwrap_err();
        assert!(matches!(err, AssemblyError::InvalidTranslation { index: 1 }));
    }

    #[test]
    fn missing_file_fails_to_load() {
        let err = SceneFile::new("/nonexistent/part.ply").load().unwrap_err();
        assert!(matches!(err, AssemblyError::MeshIo(_)));
    }
}
