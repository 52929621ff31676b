//! Mesh file I/O for reconstructed meshes and point clouds.
//!
//! # Supported Formats
//!
//! | Format | Read | Write | Notes |
//! |--------|------|-------|-------|
//! | PLY | ✓ | ✓ | Binary interchange format, vertex colors and normals |
//! | OBJ | ✓ | ✓ | Plain-text portable format, `v x y z r g b` colors |
//!
//! # Atomic Writes
//!
//! Every save goes through [`write_atomic`]: data is written to a temporary
//! file next to the destination and renamed into place only on success, so
//! a failed write never leaves a partial artifact at the target path.
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::{load_mesh, save_mesh};
//!
//! let mesh = load_mesh("job_mesh.ply").unwrap();
//! save_mesh(&mesh, "job_mesh.obj").unwrap();
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod atomic;
mod error;
mod obj;
mod ply;

pub use atomic::write_atomic;
pub use error::{IoError, IoResult};
pub use obj::{load_obj, save_obj};
pub use ply::{load_ply, save_ply};

use std::path::Path;
use std::str::FromStr;

use mesh_types::IndexedMesh;
use tracing::info;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MeshFormat {
    /// PLY (Polygon File Format), written as binary little-endian.
    Ply,
    /// OBJ (Wavefront), ASCII.
    Obj,
}

impl MeshFormat {
    /// Detect format from file extension.
    ///
    /// Returns `None` if the extension is not recognized.
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref().extension()?.to_str()?.parse().ok()
    }

    /// Get the canonical file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Ply => "ply",
            Self::Obj => "obj",
        }
    }
}

impl FromStr for MeshFormat {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ply" => Ok(Self::Ply),
            "obj" => Ok(Self::Obj),
            _ => Err(IoError::UnknownFormat {
                extension: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

fn format_of(path: &Path) -> IoResult<MeshFormat> {
    MeshFormat::from_path(path).ok_or_else(|| IoError::UnknownFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a mesh from a file, detecting format from extension.
///
/// # Errors
///
/// Returns an error if:
/// - The file format cannot be determined from the extension
/// - The file cannot be read
/// - The file content is invalid for the detected format
pub fn load_mesh<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    match format_of(path)? {
        MeshFormat::Ply => load_ply(path),
        MeshFormat::Obj => load_obj(path),
    }
}

/// Save a mesh to a file, detecting format from extension.
///
/// # Errors
///
/// Returns an error if the format cannot be determined from the extension
/// or the file cannot be written.
pub fn save_mesh<P: AsRef<Path>>(mesh: &IndexedMesh, path: P) -> IoResult<()> {
    let path = path.as_ref();
    save_mesh_as(mesh, path, format_of(path)?)
}

/// Save a mesh in an explicit format, regardless of the path's extension.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_mesh_as<P: AsRef<Path>>(mesh: &IndexedMesh, path: P, format: MeshFormat) -> IoResult<()> {
    let path = path.as_ref();
    match format {
        MeshFormat::Ply => save_ply(mesh, path, true)?,
        MeshFormat::Obj => save_obj(mesh, path)?,
    }
    info!(
        path = %path.display(),
        %format,
        vertices = mesh.vertices.len(),
        faces = mesh.faces.len(),
        "mesh saved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{unit_cube, MeshTopology};

    #[test]
    fn format_from_path() {
        assert_eq!(MeshFormat::from_path("model.ply"), Some(MeshFormat::Ply));
        assert_eq!(MeshFormat::from_path("model.PLY"), Some(MeshFormat::Ply));
        assert_eq!(MeshFormat::from_path("/a/b/model.obj"), Some(MeshFormat::Obj));
        assert_eq!(MeshFormat::from_path("model.glb"), None);
        assert_eq!(MeshFormat::from_path("model"), None);
        assert_eq!(MeshFormat::from_path(""), None);
    }

    #[test]
    fn format_from_str() {
        assert_eq!("OBJ".parse::<MeshFormat>().ok(), Some(MeshFormat::Obj));
        let err = "stl".parse::<MeshFormat>().unwrap_err();
        assert!(err.to_string().contains("stl"));
    }

    #[test]
    fn format_extension_roundtrip() {
        for format in [MeshFormat::Ply, MeshFormat::Obj] {
            assert_eq!(format.extension().parse::<MeshFormat>().ok(), Some(format));
        }
    }

    #[test]
    fn save_and_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["cube.ply", "cube.obj"] {
            let path = dir.path().join(name);
            save_mesh(&unit_cube(), &path).unwrap();
            let loaded = load_mesh(&path).unwrap();
            assert_eq!(loaded.face_count(), 12);
        }
    }

    #[test]
    fn unknown_extension_is_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.glb");
        assert!(matches!(
            save_mesh(&unit_cube(), &path),
            Err(IoError::UnknownFormat { .. })
        ));
        assert!(!path.exists());
    }
}
