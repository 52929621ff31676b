//! Merging placed parts into one mesh.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use mesh_io::MeshFormat;
use mesh_types::{IndexedMesh, MeshBounds, MeshBoundsReport};
use tracing::{debug, info};

use crate::error::{AssemblyError, AssemblyResult};
use crate::part::{validate_transform, SceneFile, ScenePart};

/// What a saved composition contains.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionReport {
    /// Where the combined mesh was written.
    pub path: PathBuf,
    /// Number of parts merged.
    pub parts: usize,
    /// Vertices in the combined mesh.
    pub vertex_count: usize,
    /// Triangles in the combined mesh.
    pub face_count: usize,
    /// Bounds of the combined mesh.
    pub bounds: MeshBoundsReport,
}

impl fmt::Display for CompositionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} parts, {} vertices, {} faces; {}",
            self.path.display(),
            self.parts,
            self.vertex_count,
            self.face_count,
            self.bounds
        )
    }
}

/// Places every part and merges them, in order, into one mesh.
///
/// The combined vertex count is the sum of the parts' counts; face indices
/// of later parts are offset past the vertices of earlier ones.
///
/// # Errors
///
/// Returns [`AssemblyError::EmptyScene`] for no parts, or the first part's
/// transform error. All transforms are checked before any geometry is
/// copied.
///
/// # Example
///
/// ```
/// use mesh_assembly::{compose, ScenePart};
/// use mesh_types::unit_cube;
///
/// let scene = compose(&[
///     ScenePart::new(unit_cube()).with_scale(2.0).with_translation(1.0, 0.0, 0.0),
///     ScenePart::new(unit_cube()),
/// ])
/// .unwrap();
/// assert_eq!(scene.vertices.len(), 16);
/// assert_eq!(scene.faces.len(), 24);
/// ```
pub fn compose(parts: &[ScenePart]) -> AssemblyResult<IndexedMesh> {
    if parts.is_empty() {
        return Err(AssemblyError::EmptyScene);
    }
    for (index, part) in parts.iter().enumerate() {
        validate_transform(index, part.scale, part.translation)?;
    }

    let mut combined = IndexedMesh::new();
    for (index, part) in parts.iter().enumerate() {
        let placed = part.placed(index)?;
        debug!(
            index,
            vertices = placed.vertices.len(),
            faces = placed.faces.len(),
            "placed part"
        );
        combined.merge(&placed);
    }
    info!(
        parts = parts.len(),
        vertices = combined.vertices.len(),
        faces = combined.faces.len(),
        "scene composed"
    );
    Ok(combined)
}

/// Composes `parts` and writes the result to `path` in `format`.
///
/// # Errors
///
/// Returns a composition error, or [`AssemblyError::MeshIo`] if the write
/// fails. Nothing is written when composition fails.
pub fn compose_and_save(parts: &[ScenePart], path: &Path, format: MeshFormat) -> AssemblyResult<CompositionReport> {
    let combined = compose(parts)?;
    mesh_io::save_mesh_as(&combined, path, format)?;
    Ok(CompositionReport {
        path: path.to_path_buf(),
        parts: parts.len(),
        vertex_count: combined.vertices.len(),
        face_count: combined.faces.len(),
        bounds: combined.bounds().report(),
    })
}

/// Loads `files`, composes them and writes `{name}_combined.<ext>` into
/// `output_dir`.
///
/// # Errors
///
/// Returns [`AssemblyError::InvalidName`] for a name that is empty or
/// contains a path separator, [`AssemblyError::EmptyScene`] for no files,
/// or a load, transform or write error.
pub fn compose_files(
    files: &[SceneFile],
    output_dir: &Path,
    name: &str,
    format: MeshFormat,
) -> AssemblyResult<CompositionReport> {
    if !is_plain_name(name) {
        return Err(AssemblyError::InvalidName { name: name.to_string() });
    }
    if files.is_empty() {
        return Err(AssemblyError::EmptyScene);
    }
    let parts = files.iter().map(SceneFile::load).collect::<AssemblyResult<Vec<_>>>()?;
    let path = output_dir.join(format!("{name}_combined.{}", format.extension()));
    let report = compose_and_save(&parts, &path, format)?;
    info!(%report, "composition saved");
    Ok(report)
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}
