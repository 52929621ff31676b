//! Reading job inputs from image files.
//!
//! Depth estimation and segmentation happen elsewhere; their results arrive
//! here as grayscale images.

use std::path::Path;

use image::RgbImage;
use sensor_types::{DepthMap, Mask};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// Gray level above which a mask pixel is selected.
const MASK_THRESHOLD: u8 = 127;

fn open(path: &Path, what: &str) -> PipelineResult<image::DynamicImage> {
    image::open(path).map_err(|e| PipelineError::Input(format!("cannot read {what} {}: {e}", path.display())))
}

/// Loads the source photograph as 8-bit RGB.
///
/// # Errors
///
/// Returns [`PipelineError::Input`] if the file cannot be decoded.
pub fn load_image(path: &Path) -> PipelineResult<RgbImage> {
    let image = open(path, "image")?.to_rgb8();
    debug!(path = %path.display(), width = image.width(), height = image.height(), "image loaded");
    Ok(image)
}

/// Loads a grayscale depth image, 8 or 16 bits, as depths in `[0, 1]`.
///
/// Colour images are converted to luminance first.
///
/// # Errors
///
/// Returns [`PipelineError::Input`] if the file cannot be decoded or is
/// empty.
pub fn load_depth_map(path: &Path) -> PipelineResult<DepthMap> {
    let gray = open(path, "depth map")?.to_luma32f();
    let (width, height) = gray.dimensions();
    let depth = DepthMap::new(width, height, gray.into_raw())
        .map_err(|e| PipelineError::Input(format!("depth map {}: {e}", path.display())))?;
    debug!(path = %path.display(), width, height, "depth map loaded");
    Ok(depth)
}

/// Loads a segmentation mask; pixels brighter than mid-gray are selected.
///
/// # Errors
///
/// Returns [`PipelineError::Input`] if the file cannot be decoded or is
/// empty.
pub fn load_mask(path: &Path) -> PipelineResult<Mask> {
    let gray = open(path, "mask")?.to_luma8();
    let (width, height) = gray.dimensions();
    let values = gray.pixels().map(|p| p.0[0] > MASK_THRESHOLD).collect();
    let mask = Mask::new(width, height, values)
        .map_err(|e| PipelineError::Input(format!("mask {}: {e}", path.display())))?;
    debug!(path = %path.display(), selected = mask.count_selected(), "mask loaded");
    Ok(mask)
}
