//! Surface reconstruction from oriented point clouds.
//!
//! Two strategies are available behind the [`SurfaceReconstructor`] trait:
//!
//! - **Poisson** - fits an implicit indicator function to the oriented
//!   samples and extracts its level set; robust to noise, trims
//!   low-density extrapolation afterwards
//! - **Ball Pivoting** - rolls balls of a few radii over the samples and
//!   connects the points they touch; never invents geometry away from
//!   the samples
//!
//! Whichever strategy runs, its output goes through
//! [`mesh_repair::cleanup_reconstruction`] before it is returned, so the
//! mesh is free of degenerate, duplicate and non-manifold geometry.
//!
//! # Quick Start
//!
//! ```
//! use mesh_scan::pointcloud::PointCloud;
//! use mesh_scan::reconstruct::{reconstruct_surface, ReconstructionMethod, ReconstructionParams};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut cloud = PointCloud::new();
//! for i in 0..12 {
//!     for j in 0..12 {
//!         let p = Point3::new(f64::from(i) * 0.1, f64::from(j) * 0.1, -1.0);
//!         cloud.add_point_with_normal(p, Vector3::z());
//!     }
//! }
//!
//! let method: ReconstructionMethod = "ball_pivoting".parse().unwrap();
//! let params = ReconstructionParams::default().with_method(method);
//! let result = reconstruct_surface(&cloud, &params).unwrap();
//! assert!(!result.mesh.faces.is_empty());
//! println!("{result}");
//! ```

pub mod ball_pivoting;
pub mod poisson;

pub use ball_pivoting::{BallPivotingParams, BallPivotingReconstructor};
pub use poisson::{PoissonParams, PoissonReconstructor};

use std::fmt;
use std::str::FromStr;

use mesh_repair::{cleanup_reconstruction, CleanupParams, CleanupSummary};
use mesh_types::IndexedMesh;
use nalgebra::{Point3, Vector3};
use tracing::info;

use crate::error::{ScanError, ScanResult};
use crate::pointcloud::PointCloud;

/// Fewest oriented points either strategy accepts.
pub const MIN_POINTS: usize = 4;

/// Closed set of reconstruction strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReconstructionMethod {
    /// Poisson reconstruction on a regular grid.
    #[default]
    Poisson,
    /// Multi-radius ball pivoting.
    BallPivoting,
}

impl ReconstructionMethod {
    /// Token used on the command line and in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Poisson => "poisson",
            Self::BallPivoting => "ball_pivoting",
        }
    }
}

impl fmt::Display for ReconstructionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReconstructionMethod {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poisson" => Ok(Self::Poisson),
            "ball_pivoting" | "ball-pivoting" | "bpa" => Ok(Self::BallPivoting),
            _ => Err(ScanError::UnknownMethod {
                token: s.to_string(),
            }),
        }
    }
}

/// A strategy turning an oriented point cloud into a raw triangle mesh.
///
/// Implementations may return meshes with degenerate or duplicated
/// geometry; [`reconstruct_with`] cleans their output.
pub trait SurfaceReconstructor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Builds a raw mesh from `cloud`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cloud lacks normals, has fewer than
    /// [`MIN_POINTS`] points, or no surface can be formed.
    fn reconstruct(&self, cloud: &PointCloud) -> ScanResult<IndexedMesh>;
}

/// Parameters for [`reconstruct_surface`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReconstructionParams {
    /// Strategy to run.
    pub method: ReconstructionMethod,

    /// Settings used when `method` is Poisson.
    pub poisson: PoissonParams,

    /// Settings used when `method` is ball pivoting.
    pub ball_pivoting: BallPivotingParams,
}

impl ReconstructionParams {
    /// Set the strategy.
    #[must_use]
    pub const fn with_method(mut self, method: ReconstructionMethod) -> Self {
        self.method = method;
        self
    }

    /// Set Poisson parameters.
    #[must_use]
    pub const fn with_poisson(mut self, poisson: PoissonParams) -> Self {
        self.poisson = poisson;
        self
    }

    /// Set ball pivoting parameters.
    #[must_use]
    pub fn with_ball_pivoting(mut self, ball_pivoting: BallPivotingParams) -> Self {
        self.ball_pivoting = ball_pivoting;
        self
    }

    /// The strategy selected by `method`, configured from these parameters.
    #[must_use]
    pub fn reconstructor(&self) -> Box<dyn SurfaceReconstructor> {
        match self.method {
            ReconstructionMethod::Poisson => Box::new(PoissonReconstructor::new(self.poisson.clone())),
            ReconstructionMethod::BallPivoting => {
                Box::new(BallPivotingReconstructor::new(self.ball_pivoting.clone()))
            }
        }
    }
}

/// A cleaned reconstruction.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    /// The cleaned mesh.
    pub mesh: IndexedMesh,

    /// Name of the strategy that produced it.
    pub method: &'static str,

    /// Faces in the raw output, before cleanup.
    pub raw_face_count: usize,

    /// What cleanup removed.
    pub cleanup: CleanupSummary,
}

impl fmt::Display for Reconstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reconstruction ({}): {} vertices, {} triangles ({} raw, {} removed by cleanup)",
            self.method,
            self.mesh.vertices.len(),
            self.mesh.faces.len(),
            self.raw_face_count,
            self.cleanup.faces_removed()
        )
    }
}

/// Reconstructs and cleans a surface with the strategy named in `params`.
///
/// # Errors
///
/// Returns [`ScanError::InsufficientPoints`] for clouds with fewer than
/// [`MIN_POINTS`] points, [`ScanError::NormalEstimationFailed`] if any point
/// lacks a normal, and [`ScanError::ReconstructionFailed`] or
/// [`ScanError::Repair`] if no triangles survive.
pub fn reconstruct_surface(
    cloud: &PointCloud,
    params: &ReconstructionParams,
) -> ScanResult<Reconstruction> {
    let reconstructor = params.reconstructor();
    reconstruct_with(cloud, reconstructor.as_ref(), &CleanupParams::default())
}

/// Runs `reconstructor` on `cloud` and cleans the result.
///
/// # Errors
///
/// See [`reconstruct_surface`].
pub fn reconstruct_with(
    cloud: &PointCloud,
    reconstructor: &dyn SurfaceReconstructor,
    cleanup: &CleanupParams,
) -> ScanResult<Reconstruction> {
    oriented_samples(cloud)?;

    let mut mesh = reconstructor.reconstruct(cloud)?;
    let raw_face_count = mesh.faces.len();
    if raw_face_count == 0 {
        return Err(ScanError::ReconstructionFailed {
            reason: format!("{} produced no triangles", reconstructor.name()),
        });
    }

    let summary = cleanup_reconstruction(&mut mesh, cleanup)?;
    info!(
        method = reconstructor.name(),
        points = cloud.len(),
        vertices = mesh.vertices.len(),
        triangles = mesh.faces.len(),
        removed = summary.faces_removed(),
        "surface reconstructed"
    );

    Ok(Reconstruction {
        mesh,
        method: reconstructor.name(),
        raw_face_count,
        cleanup: summary,
    })
}

/// Positions and normals of `cloud`, checking there are enough of them.
pub(crate) fn oriented_samples(
    cloud: &PointCloud,
) -> ScanResult<(Vec<Point3<f64>>, Vec<Vector3<f64>>)> {
    if cloud.len() < MIN_POINTS {
        return Err(ScanError::InsufficientPoints {
            required: MIN_POINTS,
            actual: cloud.len(),
        });
    }
    let mut positions = Vec::with_capacity(cloud.len());
    let mut normals = Vec::with_capacity(cloud.len());
    for point in &cloud.points {
        let Some(normal) = point.normal else {
            return Err(ScanError::NormalEstimationFailed {
                reason: "reconstruction requires a normal on every point".to_string(),
            });
        };
        positions.push(point.position);
        normals.push(normal);
    }
    Ok((positions, normals))
}
