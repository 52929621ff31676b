//! Point cloud cleaning before reconstruction.
//!
//! The cleaning pipeline runs these steps in order:
//! 1. Statistical outlier removal
//! 2. Voxel downsampling (if `voxel_size > 0`)
//! 3. Normal estimation, oriented towards the camera at the origin
//!
//! The input cloud is never modified; a new cloud is returned.
//!
//! # Quick Start
//!
//! ```
//! use mesh_scan::cleanup::{clean_point_cloud, CleanParams};
//! use mesh_scan::pointcloud::PointCloud;
//! use nalgebra::Point3;
//!
//! let positions: Vec<_> = (0..30)
//!     .flat_map(|i| (0..30).map(move |j| Point3::new(f64::from(i) * 0.01, f64::from(j) * 0.01, -1.0)))
//!     .collect();
//! let cloud = PointCloud::from_positions(&positions);
//!
//! let (cleaned, report) = clean_point_cloud(&cloud, &CleanParams::default()).unwrap();
//! assert!(cleaned.has_normals());
//! println!("{report}");
//! ```

pub mod outlier;
mod voxel;

pub use outlier::{remove_outliers, OutlierParams, OutlierReport};
pub use voxel::voxel_downsample;

use nalgebra::Point3;
use tracing::info;

use crate::error::ScanResult;
use crate::pointcloud::{NormalParams, PointCloud};

/// Parameters for the complete cleaning pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CleanParams {
    /// Parameters for outlier removal.
    pub outlier: OutlierParams,

    /// Voxel edge length for downsampling. Zero disables downsampling.
    pub voxel_size: f64,

    /// Neighbourhood for normal estimation.
    pub normals: NormalParams,
}

impl CleanParams {
    /// Set outlier removal parameters.
    #[must_use]
    pub fn with_outlier(mut self, outlier: OutlierParams) -> Self {
        self.outlier = outlier;
        self
    }

    /// Set the voxel size.
    #[must_use]
    pub const fn with_voxel_size(mut self, voxel_size: f64) -> Self {
        self.voxel_size = voxel_size;
        self
    }

    /// Set normal estimation parameters.
    #[must_use]
    pub const fn with_normals(mut self, normals: NormalParams) -> Self {
        self.normals = normals;
        self
    }
}

/// Point counts through the cleaning pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanReport {
    /// Points before cleaning.
    pub original_count: usize,

    /// Outlier removal details.
    pub outliers: OutlierReport,

    /// Points remaining after voxel downsampling (equal to the post-outlier
    /// count when downsampling is off).
    pub downsampled_count: usize,

    /// Points in the returned cloud.
    pub cleaned_count: usize,
}

impl std::fmt::Display for CleanReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Point cloud cleanup: {} → {} points ({} outliers removed",
            self.original_count, self.cleaned_count, self.outliers.outliers_removed
        )?;
        let after_outliers = self.original_count - self.outliers.outliers_removed;
        if self.downsampled_count != after_outliers {
            write!(f, ", {} merged by voxel grid", after_outliers - self.downsampled_count)?;
        }
        write!(f, ")")
    }
}

/// Cleans a point cloud and estimates oriented normals.
///
/// An empty cloud (or one emptied by cleaning) is returned as is, without
/// normals; the reconstructor rejects clouds that are too small.
///
/// # Errors
///
/// Returns an error if the voxel size or normal parameters are invalid.
pub fn clean_point_cloud(
    cloud: &PointCloud,
    params: &CleanParams,
) -> ScanResult<(PointCloud, CleanReport)> {
    let original_count = cloud.len();

    let (filtered, outliers) = remove_outliers(cloud, &params.outlier);
    let mut cleaned = voxel_downsample(&filtered, params.voxel_size)?;
    let downsampled_count = cleaned.len();

    if !cleaned.is_empty() {
        cleaned.estimate_normals(&params.normals)?;
        cleaned.orient_normals_towards(&Point3::origin())?;
    }

    let report = CleanReport {
        original_count,
        outliers,
        downsampled_count,
        cleaned_count: cleaned.len(),
    };
    info!(
        original = original_count,
        outliers = outliers.outliers_removed,
        cleaned = report.cleaned_count,
        "point cloud cleaned"
    );
    Ok((cleaned, report))
}
