//! Point cloud file I/O.
//!
//! Point clouds are stored as vertex-only binary PLY files carrying
//! `x y z`, `nx ny nz` (when every point has a normal) and
//! `red green blue` (when every point has a colour). Writes go through
//! [`mesh_io::write_atomic`] like every other artifact.
//!
//! # Example
//!
//! ```no_run
//! use mesh_scan::pointcloud::PointCloud;
//!
//! let cloud = PointCloud::load("job_pointcloud.ply").unwrap();
//! cloud.save_ply("copy_pointcloud.ply").unwrap();
//! ```

use std::path::Path;

use tracing::info;

use super::PointCloud;
use crate::error::ScanResult;

impl PointCloud {
    /// Load the vertices of a PLY or OBJ file as a point cloud.
    ///
    /// Faces, if any, are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> ScanResult<Self> {
        let mesh = mesh_io::load_mesh(path)?;
        Ok(Self::from_mesh(&mesh))
    }

    /// Save the cloud as a binary PLY file with normals and colours.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written. No partial file is
    /// left at `path` on failure.
    pub fn save_ply<P: AsRef<Path>>(&self, path: P) -> ScanResult<()> {
        let path = path.as_ref();
        mesh_io::save_ply(&self.to_vertex_mesh(), path, true)?;
        info!(
            path = %path.display(),
            points = self.len(),
            normals = self.has_normals(),
            colors = self.has_colors(),
            "point cloud saved"
        );
        Ok(())
    }
}
