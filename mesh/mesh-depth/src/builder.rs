//! Lifting an image and its depth map into a coloured point cloud.
//!
//! The depth map is authoritative: if the image has a different size it is
//! resampled onto the depth grid first. Depth is normalized to `[0, 1]`,
//! scaled, and every selected pixel beyond the near cutoff becomes one
//! point, in row-major pixel order.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use image::imageops::{self, FilterType};
use image::RgbImage;
use mesh_scan::{CloudPoint, PointCloud};
use mesh_types::VertexColor;
use rayon::prelude::*;
use sensor_types::{CameraIntrinsics, DepthMap, Mask, SensorError, DEFAULT_FOCAL_FACTOR};
use tracing::{debug, info};

use crate::error::{DepthError, DepthResult};

/// Normalized depth at or below which a pixel is dropped.
pub const DEFAULT_NEAR_CUTOFF: f32 = 0.01;

/// Parameters for point cloud construction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuildConfig {
    /// Focal length as a fraction of the depth map width.
    pub focal_factor: f64,

    /// Multiplier applied after normalization.
    pub depth_scale: f32,

    /// Normalized depth at or below which pixels are dropped.
    pub near_cutoff: f32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            focal_factor: DEFAULT_FOCAL_FACTOR,
            depth_scale: 1.0,
            near_cutoff: DEFAULT_NEAR_CUTOFF,
        }
    }
}

impl BuildConfig {
    /// Set the focal factor.
    #[must_use]
    pub const fn with_focal_factor(mut self, focal_factor: f64) -> Self {
        self.focal_factor = focal_factor;
        self
    }

    /// Set the depth scale.
    #[must_use]
    pub const fn with_depth_scale(mut self, depth_scale: f32) -> Self {
        self.depth_scale = depth_scale;
        self
    }

    /// Set the near cutoff.
    #[must_use]
    pub const fn with_near_cutoff(mut self, near_cutoff: f32) -> Self {
        self.near_cutoff = near_cutoff;
        self
    }

    /// Checks the scale and cutoff. The focal factor is checked when the
    /// intrinsics are derived.
    ///
    /// # Errors
    ///
    /// Returns [`DepthError::InvalidParameter`] for a non-positive or
    /// non-finite scale, or a non-finite cutoff.
    pub fn validate(&self) -> DepthResult<()> {
        if !(self.depth_scale.is_finite() && self.depth_scale > 0.0) {
            return Err(DepthError::InvalidParameter(format!(
                "depth scale must be positive and finite, got {}",
                self.depth_scale
            )));
        }
        if !self.near_cutoff.is_finite() {
            return Err(DepthError::InvalidParameter(format!(
                "near cutoff must be finite, got {}",
                self.near_cutoff
            )));
        }
        Ok(())
    }
}

/// Pixel accounting for one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BuildStats {
    /// Pixels in the depth grid.
    pub total_pixels: usize,
    /// Pixels excluded by the mask.
    pub masked_out: usize,
    /// Selected pixels at or below the near cutoff.
    pub near_cut: usize,
    /// Points produced.
    pub points: usize,
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} pixels lifted ({} masked out, {} within near cutoff)",
            self.points, self.total_pixels, self.masked_out, self.near_cut
        )
    }
}

/// Output of [`build_point_cloud`].
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// Lifted points with colours in row-major pixel order.
    pub cloud: PointCloud,
    /// Camera used for lifting; texturing must use the same one.
    pub intrinsics: CameraIntrinsics,
    /// The source image on the depth grid.
    pub texture: RgbImage,
    /// Pixel accounting.
    pub stats: BuildStats,
}

/// Resamples `image` onto a `width × height` grid with a Lanczos filter.
/// An image already of that size is copied unchanged.
#[must_use]
pub fn align_image(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    debug!(
        from = ?image.dimensions(),
        to = ?(width, height),
        "resampling image onto depth grid"
    );
    imageops::resize(image, width, height, FilterType::Lanczos3)
}

/// Lifts every selected pixel of `depth` into a coloured 3D point.
///
/// An empty result is not an error; the reconstructor rejects clouds that
/// are too small.
///
/// # Errors
///
/// - [`DepthError::Sensor`] if the mask does not share the depth grid, or
///   the focal factor is invalid
/// - [`DepthError::InvalidParameter`] for a bad scale or cutoff
///
/// # Example
///
/// ```
/// use image::RgbImage;
/// use mesh_depth::{build_point_cloud, BuildConfig};
/// use sensor_types::DepthMap;
///
/// let image = RgbImage::from_pixel(8, 6, image::Rgb([255, 0, 0]));
/// let depth = DepthMap::from_fn(8, 6, |_, _| 1.0).unwrap();
///
/// let result = build_point_cloud(&image, &depth, None, &BuildConfig::default()).unwrap();
/// assert_eq!(result.cloud.len(), 48);
/// ```
pub fn build_point_cloud(
    image: &RgbImage,
    depth: &DepthMap,
    mask: Option<&Mask>,
    config: &BuildConfig,
) -> DepthResult<BuildResult> {
    config.validate()?;
    let (width, height) = depth.dimensions();
    if let Some(mask) = mask {
        if mask.dimensions() != (width, height) {
            return Err(SensorError::dimension_mismatch((width, height), mask.dimensions()).into());
        }
    }
    let intrinsics = CameraIntrinsics::from_image_size(width, height, config.focal_factor)?;
    let texture = align_image(image, width, height);
    let normalized = depth.normalized(config.depth_scale);

    let rows: Vec<(Vec<CloudPoint>, usize, usize)> = (0..height)
        .into_par_iter()
        .map(|y| {
            let mut points = Vec::new();
            let (mut masked_out, mut near_cut) = (0, 0);
            for x in 0..width {
                if mask.is_some_and(|m| !m.get(x, y)) {
                    masked_out += 1;
                    continue;
                }
                let d = normalized.get(x, y).unwrap_or(0.0);
                if d <= config.near_cutoff {
                    near_cut += 1;
                    continue;
                }
                let position = intrinsics.deproject(f64::from(x), f64::from(y), f64::from(d));
                let [r, g, b] = texture.get_pixel(x, y).0;
                points.push(CloudPoint::with_color(position, VertexColor::new(r, g, b)));
            }
            (points, masked_out, near_cut)
        })
        .collect();

    let mut stats = BuildStats {
        total_pixels: width as usize * height as usize,
        ..BuildStats::default()
    };
    let mut cloud = PointCloud::with_capacity(rows.iter().map(|(p, _, _)| p.len()).sum());
    for (points, masked_out, near_cut) in rows {
        stats.masked_out += masked_out;
        stats.near_cut += near_cut;
        cloud.points.extend(points);
    }
    stats.points = cloud.len();

    info!(%stats, "point cloud built");
    Ok(BuildResult {
        cloud,
        intrinsics,
        texture,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Rgb;

    fn solid(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([10, 200, 30]))
    }

    #[test]
    fn constant_depth_keeps_every_pixel_on_one_plane() {
        let depth = DepthMap::from_fn(12, 9, |_, _| 0.8).unwrap();
        let result = build_point_cloud(&solid(12, 9), &depth, None, &BuildConfig::default()).unwrap();

        assert_eq!(result.cloud.len(), 12 * 9);
        for p in result.cloud.positions() {
            assert_relative_eq!(p.z, -0.8, epsilon = 1e-6);
        }
        assert_eq!(result.stats.masked_out, 0);
        assert_eq!(result.stats.near_cut, 0);
    }

    #[test]
    fn masked_pixels_are_excluded_one_for_one() {
        let depth = DepthMap::from_fn(10, 10, |_, _| 1.0).unwrap();
        let mask = Mask::from_fn(10, 10, |x, y| !(x < 3 && y == 4)).unwrap();
        let result = build_point_cloud(&solid(10, 10), &depth, Some(&mask), &BuildConfig::default()).unwrap();

        assert_eq!(result.cloud.len(), 97);
        assert_eq!(result.stats.masked_out, 3);
    }

    #[test]
    fn near_cutoff_drops_background() {
        let depth = DepthMap::from_fn(10, 10, |x, _| if x < 5 { 0.0 } else { 2.0 }).unwrap();
        let result = build_point_cloud(&solid(10, 10), &depth, None, &BuildConfig::default()).unwrap();

        assert_eq!(result.cloud.len(), 50);
        assert_eq!(result.stats.near_cut, 50);
        // Normalized to [0, 1]
        assert!(result.cloud.positions().all(|p| (p.z + 1.0).abs() < 1e-6));
    }

    #[test]
    fn all_background_is_an_empty_cloud() {
        let depth = DepthMap::from_fn(6, 6, |_, _| 0.0).unwrap();
        let result = build_point_cloud(&solid(6, 6), &depth, None, &BuildConfig::default()).unwrap();
        assert!(result.cloud.is_empty());
        assert_eq!(result.stats.near_cut, 36);
    }

    #[test]
    fn colours_come_from_the_image() {
        let mut image = solid(4, 4);
        image.put_pixel(2, 1, Rgb([255, 0, 0]));
        let depth = DepthMap::from_fn(4, 4, |_, _| 1.0).unwrap();
        let result = build_point_cloud(&image, &depth, None, &BuildConfig::default()).unwrap();

        // Row-major: pixel (2, 1) is point 6
        assert_eq!(result.cloud.points[6].color, Some(VertexColor::new(255, 0, 0)));
        assert_eq!(result.cloud.points[0].color, Some(VertexColor::new(10, 200, 30)));
        assert!(result.cloud.points.iter().all(|p| p.normal.is_none()));
    }

    #[test]
    fn image_is_resampled_to_depth_grid() {
        let depth = DepthMap::from_fn(8, 8, |_, _| 1.0).unwrap();
        let result = build_point_cloud(&solid(32, 24), &depth, None, &BuildConfig::default()).unwrap();
        assert_eq!(result.texture.dimensions(), (8, 8));
        assert_eq!(result.cloud.len(), 64);
        assert_eq!(result.intrinsics.width, 8);
    }

    #[test]
    fn focal_factor_changes_lateral_spread() {
        let depth = DepthMap::from_fn(10, 10, |_, _| 1.0).unwrap();
        let narrow = build_point_cloud(&solid(10, 10), &depth, None, &BuildConfig::default()).unwrap();
        let wide = build_point_cloud(
            &solid(10, 10),
            &depth,
            None,
            &BuildConfig::default().with_focal_factor(1.4),
        )
        .unwrap();
        assert_relative_eq!(narrow.cloud.points[0].position.x, 2.0 * wide.cloud.points[0].position.x, epsilon = 1e-9);
    }

    #[test]
    fn mismatched_mask_is_rejected() {
        let depth = DepthMap::from_fn(10, 10, |_, _| 1.0).unwrap();
        let mask = Mask::full(5, 10).unwrap();
        let result = build_point_cloud(&solid(10, 10), &depth, Some(&mask), &BuildConfig::default());
        assert!(matches!(result, Err(DepthError::Sensor(_))));
    }

    #[test]
    fn bad_parameters_are_rejected() {
        let depth = DepthMap::from_fn(4, 4, |_, _| 1.0).unwrap();
        let image = solid(4, 4);
        let bad_scale = BuildConfig::default().with_depth_scale(0.0);
        assert!(matches!(
            build_point_cloud(&image, &depth, None, &bad_scale),
            Err(DepthError::InvalidParameter(_))
        ));
        let bad_focal = BuildConfig::default().with_focal_factor(-1.0);
        assert!(matches!(
            build_point_cloud(&image, &depth, None, &bad_focal),
            Err(DepthError::Sensor(_))
        ));
    }
}
