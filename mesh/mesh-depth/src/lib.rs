//! From an image and its depth map to coloured geometry.
//!
//! - [`build_point_cloud`] - Lift every selected pixel into a coloured point
//! - [`texturize_mesh`] - Colour reconstructed vertices from the source image
//! - [`save_depth_visualization`] - Viridis preview of a depth map
//!
//! Lifting and texturing share one [`CameraIntrinsics`](sensor_types::CameraIntrinsics),
//! returned in [`BuildResult`], so a vertex reprojects onto the pixel that
//! produced it.
//!
//! # Example
//!
//! ```
//! use image::{Rgb, RgbImage};
//! use mesh_depth::{build_point_cloud, texturize_mesh, BuildConfig};
//! use sensor_types::DepthMap;
//!
//! let image = RgbImage::from_pixel(16, 16, Rgb([200, 10, 10]));
//! let depth = DepthMap::from_fn(16, 16, |x, _| if x < 8 { 0.0 } else { 1.0 }).unwrap();
//!
//! let built = build_point_cloud(&image, &depth, None, &BuildConfig::default()).unwrap();
//! assert_eq!(built.stats.points, 128);
//!
//! let mut mesh = built.cloud.to_vertex_mesh();
//! let gray = texturize_mesh(&mut mesh, &built.texture, &built.intrinsics).unwrap();
//! assert_eq!(gray, 0);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod builder;
mod error;
mod texture;
mod visualize;

pub use builder::{align_image, build_point_cloud, BuildConfig, BuildResult, BuildStats, DEFAULT_NEAR_CUTOFF};
pub use error::{DepthError, DepthResult};
pub use texture::texturize_mesh;
pub use visualize::{colorize_depth, save_depth_visualization, viridis};
