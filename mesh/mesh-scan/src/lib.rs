//! Point cloud processing and surface reconstruction.
//!
//! This crate turns a raw, camera-space point cloud into a clean triangle
//! mesh:
//!
//! - **Point Cloud** - Point storage with PLY I/O, a k-d tree, and normal
//!   estimation
//! - **Cleanup** - Statistical outlier removal, voxel downsampling, and
//!   normals oriented towards the camera
//! - **Reconstruction** - Poisson or ball pivoting, followed by mesh cleanup
//!
//! The camera sits at the origin looking down `-Z`, so oriented normals
//! point back towards the origin.
//!
//! # Quick Start
//!
//! ```
//! use mesh_scan::{clean_point_cloud, reconstruct_surface, CleanParams, PointCloud, ReconstructionParams};
//! use nalgebra::Point3;
//!
//! let mut cloud = PointCloud::new();
//! for i in 0..20 {
//!     for j in 0..20 {
//!         cloud.push_coords(f64::from(i) * 0.05 - 0.5, f64::from(j) * 0.05 - 0.5, -2.0);
//!     }
//! }
//!
//! let (cleaned, report) = clean_point_cloud(&cloud, &CleanParams::default()).unwrap();
//! println!("{report}");
//!
//! let result = reconstruct_surface(&cleaned, &ReconstructionParams::default()).unwrap();
//! assert!(!result.mesh.faces.is_empty());
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cleanup;
pub mod error;
pub mod pointcloud;
pub mod reconstruct;

pub use cleanup::{clean_point_cloud, CleanParams, CleanReport, OutlierParams};
pub use error::{ScanError, ScanResult};
pub use pointcloud::{CloudPoint, NormalParams, PointCloud, SpatialIndex};
pub use reconstruct::{
    reconstruct_surface, reconstruct_with, BallPivotingParams, PoissonParams, Reconstruction,
    ReconstructionMethod, ReconstructionParams, SurfaceReconstructor,
};
