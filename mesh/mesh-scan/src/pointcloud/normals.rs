//! Normal estimation and orientation for point clouds.
//!
//! Normals are fitted with PCA (Principal Component Analysis) over a hybrid
//! neighbourhood: all points within a radius, capped at the closest
//! `max_neighbors`. The normal is the covariance eigenvector with the
//! smallest eigenvalue.
//!
//! # Example
//!
//! ```
//! use mesh_scan::pointcloud::{NormalParams, PointCloud};
//! use nalgebra::Point3;
//!
//! // A flat patch one unit in front of the camera
//! let positions: Vec<_> = (0..20)
//!     .flat_map(|i| (0..20).map(move |j| Point3::new(f64::from(i) * 0.02, f64::from(j) * 0.02, -1.0)))
//!     .collect();
//! let mut cloud = PointCloud::from_positions(&positions);
//!
//! cloud.estimate_normals(&NormalParams::default()).unwrap();
//! cloud.orient_normals_towards(&Point3::origin()).unwrap();
//!
//! // Every normal faces the camera at the origin
//! assert!(cloud.points.iter().all(|p| p.normal.unwrap().z > 0.99));
//! ```

use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};
use rayon::prelude::*;
use tracing::debug;

use super::PointCloud;
use crate::error::{ScanError, ScanResult};

/// Neighbourhood used for normal estimation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NormalParams {
    /// Search radius around each point.
    pub radius: f64,

    /// Maximum number of neighbours (closest first) within the radius.
    pub max_neighbors: usize,
}

impl Default for NormalParams {
    fn default() -> Self {
        Self {
            radius: 0.1,
            max_neighbors: 30,
        }
    }
}

impl NormalParams {
    /// Set the search radius.
    #[must_use]
    pub const fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Set the neighbour cap.
    #[must_use]
    pub const fn with_max_neighbors(mut self, max_neighbors: usize) -> Self {
        self.max_neighbors = max_neighbors;
        self
    }

    fn validate(&self) -> ScanResult<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ScanError::invalid(format!(
                "normal radius must be positive, got {}",
                self.radius
            )));
        }
        if self.max_neighbors == 0 {
            return Err(ScanError::invalid("max_neighbors must be greater than 0"));
        }
        Ok(())
    }
}

impl PointCloud {
    /// Estimates a unit normal for every point.
    ///
    /// Points with fewer than three neighbours in range get `+Z`. Normals
    /// are unoriented; call [`orient_normals_towards`](Self::orient_normals_towards)
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the cloud is empty or the parameters are invalid.
    pub fn estimate_normals(&mut self, params: &NormalParams) -> ScanResult<()> {
        if self.points.is_empty() {
            return Err(ScanError::EmptyPointCloud);
        }
        params.validate()?;

        let index = self.spatial_index();
        let points = &self.points;

        let normals: Vec<(Vector3<f64>, bool)> = points
            .par_iter()
            .map(|point| {
                let mut neighbors = index.within(&point.position, params.radius);
                neighbors.truncate(params.max_neighbors);
                let positions: Vec<Point3<f64>> =
                    neighbors.iter().map(|&(i, _)| points[i].position).collect();
                fit_normal(&positions).map_or((Vector3::z(), true), |n| (n, false))
            })
            .collect();

        let mut fallbacks = 0usize;
        for (point, (normal, fallback)) in self.points.iter_mut().zip(normals) {
            point.normal = Some(normal);
            fallbacks += usize::from(fallback);
        }
        debug!(points = self.points.len(), fallbacks, "normals estimated");

        Ok(())
    }

    /// Flips every normal that points away from `origin`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cloud is empty or any point lacks a normal.
    pub fn orient_normals_towards(&mut self, origin: &Point3<f64>) -> ScanResult<()> {
        if self.points.is_empty() {
            return Err(ScanError::EmptyPointCloud);
        }

        if !self.has_normals() {
            return Err(ScanError::NormalEstimationFailed {
                reason: "point cloud has no normals to orient".to_string(),
            });
        }

        for point in &mut self.points {
            if let Some(normal) = &mut point.normal {
                let to_origin = origin - point.position;
                if normal.dot(&to_origin) < 0.0 {
                    *normal = -*normal;
                }
            }
        }

        Ok(())
    }
}

/// PCA plane fit. Returns `None` if fewer than three points are given or
/// the fit is numerically degenerate.
fn fit_normal(positions: &[Point3<f64>]) -> Option<Vector3<f64>> {
    if positions.len() < 3 {
        return None;
    }

    let sum: Vector3<f64> = positions.iter().map(|p| p.coords).sum();
    #[allow(clippy::cast_precision_loss)]
    let centroid = sum / positions.len() as f64;

    let mut cov = Matrix3::zeros();
    for p in positions {
        let diff = p.coords - centroid;
        cov += diff * diff.transpose();
    }

    let eigen = SymmetricEigen::new(cov);
    let eigenvalues = eigen.eigenvalues;

    // Normal is eigenvector with smallest eigenvalue
    let min_idx = if eigenvalues[0] <= eigenvalues[1] && eigenvalues[0] <= eigenvalues[2] {
        0
    } else if eigenvalues[1] <= eigenvalues[2] {
        1
    } else {
        2
    };

    let normal: Vector3<f64> = eigen.eigenvectors.column(min_idx).into_owned();
    let norm = normal.norm();
    (norm > 1e-10).then(|| normal / norm)
}
