//! Depth map type.
//!
//! Depth maps come from a monocular depth estimator and carry relative, not
//! metric, depth. The pipeline normalizes them to `[0, 1]` before lifting.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{SensorError, SensorResult};

/// Row-major grid of per-pixel depth values.
///
/// # Example
///
/// ```
/// use sensor_types::DepthMap;
///
/// let depth = DepthMap::from_fn(4, 3, |x, _y| x as f32).unwrap();
/// assert_eq!(depth.get(3, 2), Some(3.0));
///
/// let normalized = depth.normalized(1.0);
/// assert_eq!(normalized.get(3, 0), Some(1.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepthMap {
    width: u32,
    height: u32,
    depths: Vec<f32>,
}

impl DepthMap {
    /// Creates a depth map from a row-major buffer.
    ///
    /// # Errors
    ///
    /// - [`SensorError::EmptyGrid`] if either dimension is zero
    /// - [`SensorError::BufferSizeMismatch`] if `depths.len() != width * height`
    /// - [`SensorError::NonFiniteDepth`] at the first `NaN`/infinite sample
    pub fn new(width: u32, height: u32, depths: Vec<f32>) -> SensorResult<Self> {
        if width == 0 || height == 0 {
            return Err(SensorError::EmptyGrid { width, height });
        }
        let expected = width as usize * height as usize;
        if depths.len() != expected {
            return Err(SensorError::buffer_mismatch(expected, depths.len()));
        }
        if let Some(idx) = depths.iter().position(|d| !d.is_finite()) {
            #[allow(clippy::cast_possible_truncation)]
            let idx = idx as u32;
            return Err(SensorError::NonFiniteDepth {
                x: idx % width,
                y: idx / width,
            });
        }
        Ok(Self {
            width,
            height,
            depths,
        })
    }

    /// Creates a depth map by evaluating `f(x, y)` at every pixel.
    ///
    /// # Errors
    ///
    /// Same as [`DepthMap::new`].
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> f32) -> SensorResult<Self> {
        let depths = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self::new(width, height, depths)
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Row-major depth samples.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.depths
    }

    /// Depth at pixel `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.depths.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// Min, max and mean over all samples.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> DepthStats {
        let (min, max, sum) = self.depths.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY, 0.0_f64),
            |(min, max, sum), &d| (min.min(d), max.max(d), sum + f64::from(d)),
        );
        #[allow(clippy::cast_possible_truncation)]
        let mean = (sum / self.depths.len() as f64) as f32;
        DepthStats { min, max, mean }
    }

    /// Rescales samples to `[0, 1]` with `(d - min) / (max - min)` and
    /// multiplies by `scale`.
    ///
    /// A constant map (`max == min`) is left unnormalized and only scaled.
    #[must_use]
    pub fn normalized(&self, scale: f32) -> Self {
        let DepthStats { min, max, .. } = self.stats();
        let range = max - min;
        let depths = if range > 0.0 {
            self.depths.iter().map(|&d| (d - min) / range * scale).collect()
        } else {
            self.depths.iter().map(|&d| d * scale).collect()
        };
        Self {
            width: self.width,
            height: self.height,
            depths,
        }
    }
}

/// Summary statistics of a depth map.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepthStats {
    /// Minimum depth.
    pub min: f32,
    /// Maximum depth.
    pub max: f32,
    /// Mean depth.
    pub mean: f32,
}
