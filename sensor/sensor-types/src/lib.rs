//! Camera model and per-pixel input grids for single-view reconstruction.
//!
//! This crate provides the input-side types consumed by the reconstruction
//! pipeline:
//!
//! - [`CameraIntrinsics`] - Uncalibrated pinhole model derived from image size
//! - [`DepthMap`] - Per-pixel relative depth estimate
//! - [`Mask`] - Optional per-pixel foreground selection
//!
//! Depth maps and masks are produced by external collaborators (a depth
//! estimator, a segmenter) and are immutable once handed to the pipeline.
//!
//! # Coordinate Frames
//!
//! Pixel `(u, v)` has `u` growing right and `v` growing down. Deprojected
//! points are returned in the world frame: Y up, Z toward the viewer, so a
//! point in front of the camera has negative Z.
//!
//! # Example
//!
//! ```
//! use sensor_types::CameraIntrinsics;
//!
//! let intrinsics = CameraIntrinsics::from_image_size(100, 80, 0.7).unwrap();
//! let p = intrinsics.deproject(50.0, 40.0, 2.0);
//! assert!((p.z + 2.0).abs() < 1e-12);
//!
//! let (u, v) = intrinsics.project(&p).unwrap();
//! assert!((u - 50.0).abs() < 1e-9 && (v - 40.0).abs() < 1e-9);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod camera;
mod depth;
mod error;
mod mask;

pub use camera::{CameraIntrinsics, DEFAULT_FOCAL_FACTOR, PROJECTION_EPSILON};
pub use depth::{DepthMap, DepthStats};
pub use error::{SensorError, SensorResult};
pub use mask::Mask;
