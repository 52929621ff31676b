//! Statistical outlier removal for point clouds.
//!
//! # Algorithm
//!
//! For each point:
//! 1. Find the k nearest neighbors
//! 2. Compute the mean distance to those neighbors
//! 3. Compute the global mean and (population) standard deviation of mean distances
//! 4. Remove points where mean distance > `global_mean + std_ratio * std_dev`
//!
//! # Example
//!
//! ```
//! use mesh_scan::cleanup::{remove_outliers, OutlierParams};
//! use mesh_scan::pointcloud::PointCloud;
//! use nalgebra::Point3;
//!
//! let mut positions: Vec<_> = (0..10)
//!     .flat_map(|i| (0..10).map(move |j| Point3::new(f64::from(i) * 0.1, f64::from(j) * 0.1, -1.0)))
//!     .collect();
//!
//! // Add an outlier
//! positions.push(Point3::new(5.0, 100.0, 0.0));
//!
//! let cloud = PointCloud::from_positions(&positions);
//! let (filtered, report) = remove_outliers(&cloud, &OutlierParams::default());
//!
//! assert_eq!(report.outliers_removed, 1);
//! assert_eq!(filtered.len(), 100);
//! ```

use rayon::prelude::*;

use crate::pointcloud::PointCloud;

/// Relative spread below which every point is considered an inlier.
const NEGLIGIBLE_SPREAD: f64 = 1e-9;

/// Parameters for statistical outlier removal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OutlierParams {
    /// Number of nearest neighbors to consider.
    pub k_neighbors: usize,

    /// Standard deviation multiplier for the threshold.
    pub std_ratio: f64,
}

impl Default for OutlierParams {
    fn default() -> Self {
        Self {
            k_neighbors: 20,
            std_ratio: 2.0,
        }
    }
}

impl OutlierParams {
    /// Set the number of neighbours.
    #[must_use]
    pub const fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k;
        self
    }

    /// Set the standard deviation multiplier.
    #[must_use]
    pub const fn with_std_ratio(mut self, ratio: f64) -> Self {
        self.std_ratio = ratio;
        self
    }
}

/// What outlier removal did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierReport {
    /// Number of points before removal.
    pub original_count: usize,

    /// Number of points removed.
    pub outliers_removed: usize,

    /// Mean-distance threshold above which points were removed.
    /// Infinite when nothing was eligible for removal.
    pub distance_threshold: f64,
}

impl OutlierReport {
    /// Percentage of points that were removed.
    #[must_use]
    pub fn outlier_percentage(&self) -> f64 {
        if self.original_count == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            100.0 * self.outliers_removed as f64 / self.original_count as f64
        }
    }
}

impl std::fmt::Display for OutlierReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Outlier removal: {} → {} points ({} removed, {:.1}%)",
            self.original_count,
            self.original_count - self.outliers_removed,
            self.outliers_removed,
            self.outlier_percentage()
        )
    }
}

/// Removes statistical outliers, preserving the order of kept points.
///
/// A cloud with at most `k_neighbors` points is returned unchanged, as is
/// any cloud whose mean neighbour distances are (numerically) all equal.
/// A finite grid is not such a cloud: its corners see sparser
/// neighbourhoods than the interior and may be removed.
#[must_use]
pub fn remove_outliers(cloud: &PointCloud, params: &OutlierParams) -> (PointCloud, OutlierReport) {
    let original_count = cloud.len();
    let unchanged = |cloud: &PointCloud| {
        (
            cloud.clone(),
            OutlierReport {
                original_count,
                outliers_removed: 0,
                distance_threshold: f64::INFINITY,
            },
        )
    };

    if params.k_neighbors == 0 || original_count <= params.k_neighbors {
        return unchanged(cloud);
    }

    let mean_distances = mean_neighbor_distances(cloud, params.k_neighbors);

    #[allow(clippy::cast_precision_loss)]
    let n = mean_distances.len() as f64;
    let global_mean = mean_distances.iter().sum::<f64>() / n;
    let variance = mean_distances
        .iter()
        .map(|d| (d - global_mean).powi(2))
        .sum::<f64>()
        / n;
    let std_dev = variance.sqrt();

    if std_dev <= NEGLIGIBLE_SPREAD * global_mean.abs() {
        return unchanged(cloud);
    }

    let threshold = params.std_ratio.mul_add(std_dev, global_mean);
    let keep: Vec<bool> = mean_distances.iter().map(|&d| d <= threshold).collect();
    let filtered = cloud.select(&keep);

    let report = OutlierReport {
        original_count,
        outliers_removed: original_count - filtered.len(),
        distance_threshold: threshold,
    };
    (filtered, report)
}

/// Mean distance from each point to its `k` nearest other points.
fn mean_neighbor_distances(cloud: &PointCloud, k: usize) -> Vec<f64> {
    let index = cloud.spatial_index();
    cloud
        .points
        .par_iter()
        .map(|point| {
            let neighbors = index.nearest(&point.position, k + 1);

            // Skip the first neighbor (self) and compute mean distance
            let sum: f64 = neighbors.iter().skip(1).map(|&(_, d2)| d2.sqrt()).sum();

            #[allow(clippy::cast_precision_loss)]
            let mean = if neighbors.len() > 1 {
                sum / (neighbors.len() - 1) as f64
            } else {
                0.0
            };
            mean
        })
        .collect()
}
