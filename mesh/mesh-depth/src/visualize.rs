//! False-colour depth previews.

use std::path::{Path, PathBuf};

use image::codecs::png::PngEncoder;
use image::{Rgb, RgbImage};
use sensor_types::DepthMap;
use tracing::info;

use crate::error::{DepthError, DepthResult};

/// Viridis sampled at nine evenly spaced stops.
const VIRIDIS: [[f32; 3]; 9] = [
    [68.0, 1.0, 84.0],
    [71.0, 44.0, 122.0],
    [59.0, 81.0, 139.0],
    [44.0, 113.0, 142.0],
    [33.0, 144.0, 141.0],
    [39.0, 173.0, 129.0],
    [92.0, 200.0, 99.0],
    [170.0, 220.0, 50.0],
    [253.0, 231.0, 37.0],
];

/// Viridis colour for `t` in `[0, 1]`; values outside are clamped.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn viridis(t: f32) -> Rgb<u8> {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (VIRIDIS.len() - 1) as f32;
    let lo = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = scaled - lo as f32;
    let (a, b) = (VIRIDIS[lo], VIRIDIS[lo + 1]);
    Rgb(std::array::from_fn(|c| (a[c] + (b[c] - a[c]) * frac).round() as u8))
}

/// Normalizes `depth` to `[0, 1]` and maps it through viridis.
#[must_use]
pub fn colorize_depth(depth: &DepthMap) -> RgbImage {
    let normalized = depth.normalized(1.0);
    let (width, height) = depth.dimensions();
    RgbImage::from_fn(width, height, |x, y| viridis(normalized.get(x, y).unwrap_or(0.0)))
}

/// Writes the viridis preview of `depth` to `{output_dir}/{name}_depth.png`
/// and returns the path.
///
/// # Errors
///
/// Returns [`DepthError::InvalidParameter`] for an empty name, or an
/// I/O or encoding error. Nothing is left at the path on failure.
pub fn save_depth_visualization(depth: &DepthMap, output_dir: &Path, name: &str) -> DepthResult<PathBuf> {
    if name.is_empty() {
        return Err(DepthError::InvalidParameter("visualization name must not be empty".into()));
    }
    let path = output_dir.join(format!("{name}_depth.png"));
    let image = colorize_depth(depth);
    mesh_io::write_atomic(&path, |w| -> DepthResult<()> {
        image.write_with_encoder(PngEncoder::new(w))?;
        Ok(())
    })?;
    info!(path = %path.display(), "depth visualization saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_the_colormap() {
        assert_eq!(viridis(0.0), Rgb([68, 1, 84]));
        assert_eq!(viridis(1.0), Rgb([253, 231, 37]));
        assert_eq!(viridis(0.5), Rgb([33, 144, 141]));
        assert_eq!(viridis(-3.0), viridis(0.0));
        assert_eq!(viridis(f32::NAN), viridis(0.0));
    }

    #[test]
    fn colorized_depth_spans_the_map() {
        let depth = DepthMap::from_fn(5, 1, |x, _| x as f32).unwrap();
        let image = colorize_depth(&depth);
        assert_eq!(*image.get_pixel(0, 0), viridis(0.0));
        assert_eq!(*image.get_pixel(4, 0), viridis(1.0));
    }

    #[test]
    fn saved_preview_is_a_png() {
        let dir = tempfile::tempdir().unwrap();
        let depth = DepthMap::from_fn(16, 8, |x, y| (x + y) as f32).unwrap();
        let path = save_depth_visualization(&depth, dir.path(), "job42").unwrap();

        assert_eq!(path.file_name().unwrap(), "job42_depth.png");
        let loaded = image::open(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (16, 8));
    }

    #[test]
    fn missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let depth = DepthMap::from_fn(2, 2, |_, _| 1.0).unwrap();
        let result = save_depth_visualization(&depth, &dir.path().join("absent"), "x");
        assert!(matches!(result, Err(DepthError::Io(_))));
    }
}
