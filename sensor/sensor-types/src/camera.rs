//! Pinhole camera model.
//!
//! The reconstruction pipeline never sees real calibration data. Instead the
//! intrinsics are approximated from the image size alone: the focal length is
//! a fixed fraction of the image width and the principal point is the image
//! center. That fraction is a parameter, not a constant, so callers (and
//! tests) can vary it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use nalgebra::Point3;

use crate::{SensorError, SensorResult};

/// Focal length as a fraction of image width when nothing better is known.
pub const DEFAULT_FOCAL_FACTOR: f64 = 0.7;

/// Below this absolute depth a point cannot be projected.
pub const PROJECTION_EPSILON: f64 = 1e-3;

/// Pinhole camera intrinsic parameters.
///
/// # Example
///
/// ```
/// use sensor_types::CameraIntrinsics;
///
/// let intrinsics = CameraIntrinsics::from_image_size(640, 480, 0.7).unwrap();
/// assert!((intrinsics.fx - 448.0).abs() < 1e-9);
/// assert!((intrinsics.cx - 320.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CameraIntrinsics {
    /// Focal length in x (pixels).
    pub fx: f64,
    /// Focal length in y (pixels).
    pub fy: f64,
    /// Principal point x (pixels).
    pub cx: f64,
    /// Principal point y (pixels).
    pub cy: f64,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl CameraIntrinsics {
    /// Creates intrinsics from explicit parameters.
    #[must_use]
    pub const fn new(fx: f64, fy: f64, cx: f64, cy: f64, width: u32, height: u32) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            width,
            height,
        }
    }

    /// Derives uncalibrated intrinsics for an image of the given size.
    ///
    /// `fx = fy = width * focal_factor`, principal point at the image center.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::EmptyGrid`] for a zero-sized image and
    /// [`SensorError::InvalidParameter`] if `focal_factor` is not a positive
    /// finite number.
    pub fn from_image_size(width: u32, height: u32, focal_factor: f64) -> SensorResult<Self> {
        if width == 0 || height == 0 {
            return Err(SensorError::EmptyGrid { width, height });
        }
        if !focal_factor.is_finite() || focal_factor <= 0.0 {
            return Err(SensorError::InvalidParameter(format!(
                "focal factor must be positive and finite, got {focal_factor}"
            )));
        }
        let focal = f64::from(width) * focal_factor;
        Ok(Self::new(
            focal,
            focal,
            f64::from(width) / 2.0,
            f64::from(height) / 2.0,
            width,
            height,
        ))
    }

    /// Lifts pixel `(u, v)` at `depth` into the world frame.
    ///
    /// The camera-space point `((u-cx)·d/fx, (v-cy)·d/fy, d)` is returned
    /// as `(x, -y, -z)`: Y up, Z toward the viewer.
    #[must_use]
    pub fn deproject(&self, u: f64, v: f64, depth: f64) -> Point3<f64> {
        let x = (u - self.cx) * depth / self.fx;
        let y = (v - self.cy) * depth / self.fy;
        Point3::new(x, -y, -depth)
    }

    /// Projects a world-frame point back to continuous pixel coordinates.
    ///
    /// Inverse of [`deproject`](Self::deproject). Returns `None` when the
    /// point lies within [`PROJECTION_EPSILON`] of the camera plane.
    #[must_use]
    pub fn project(&self, point: &Point3<f64>) -> Option<(f64, f64)> {
        if point.z.abs() < PROJECTION_EPSILON {
            return None;
        }
        let depth = -point.z;
        let u = point.x * self.fx / depth + self.cx;
        let v = -point.y * self.fy / depth + self.cy;
        Some((u, v))
    }

    /// Projects a point and clamps it to a valid pixel index.
    ///
    /// Coordinates are truncated toward zero before clamping to
    /// `[0, width-1] × [0, height-1]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn project_clamped(&self, point: &Point3<f64>) -> Option<(u32, u32)> {
        let (u, v) = self.project(point)?;
        if !u.is_finite() || !v.is_finite() {
            return None;
        }
        let max_u = f64::from(self.width.saturating_sub(1));
        let max_v = f64::from(self.height.saturating_sub(1));
        // trunc then clamp keeps the result inside u32 range
        Some((u.trunc().clamp(0.0, max_u) as u32, v.trunc().clamp(0.0, max_v) as u32))
    }
}
