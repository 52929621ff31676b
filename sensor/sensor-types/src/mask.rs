//! Foreground masks.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{SensorError, SensorResult};

/// Row-major boolean grid selecting the pixels to reconstruct.
///
/// A segmenter may return several masks per image; the pipeline consumes at
/// most one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mask {
    width: u32,
    height: u32,
    values: Vec<bool>,
}

impl Mask {
    /// Creates a mask from a row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::EmptyGrid`] or
    /// [`SensorError::BufferSizeMismatch`] for malformed input.
    pub fn new(width: u32, height: u32, values: Vec<bool>) -> SensorResult<Self> {
        if width == 0 || height == 0 {
            return Err(SensorError::EmptyGrid { width, height });
        }
        let expected = width as usize * height as usize;
        if values.len() != expected {
            return Err(SensorError::buffer_mismatch(expected, values.len()));
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Creates a mask by evaluating `f(x, y)` at every pixel.
    ///
    /// # Errors
    ///
    /// Same as [`Mask::new`].
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> SensorResult<Self> {
        let values = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self::new(width, height, values)
    }

    /// A mask selecting every pixel.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::EmptyGrid`] for a zero dimension.
    pub fn full(width: u32, height: u32) -> SensorResult<Self> {
        Self::new(width, height, vec![true; width as usize * height as usize])
    }

    /// `(width, height)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether pixel `(x, y)` is selected. Pixels outside the grid are not.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width
            && y < self.height
            && self.values[y as usize * self.width as usize + x as usize]
    }

    /// Row-major values.
    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.values
    }

    /// Number of selected pixels.
    #[must_use]
    pub fn count_selected(&self) -> usize {
        self.values.iter().filter(|&&v| v).count()
    }
}
