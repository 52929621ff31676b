//! Orbit animations: the camera circles the mesh at a fixed elevation.
//!
//! The mesh is first normalized (centroid at the origin, bounding radius
//! one), so `orbit_radius` is measured in mesh radii.

use std::f64::consts::TAU;
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use mesh_types::IndexedMesh;
use nalgebra::Point3;
use tracing::info;

use crate::animation::{write_gif, AnimationFormat};
use crate::error::{RenderError, RenderResult};
use crate::raster::{bounding_radius, Camera};
use crate::turntable::{load_scene, render_sequence, validate_resolution, RenderReport, RenderedFrames};

/// Steepest elevation allowed; straight above, "up" is undefined.
const MAX_ELEVATION_DEG: f64 = 89.0;

/// Orbit parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OrbitConfig {
    /// Frames per orbit.
    pub frames: usize,
    /// Seconds each frame is shown.
    pub frame_duration: f64,
    /// Camera distance from the centroid, in mesh radii. Must exceed one.
    pub orbit_radius: f64,
    /// Camera elevation above the horizontal plane, in degrees.
    pub elevation_deg: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            frames: 60,
            frame_duration: 0.05,
            orbit_radius: 2.0,
            elevation_deg: 30.0,
            width: 800,
            height: 600,
        }
    }
}

impl OrbitConfig {
    /// Set the frame count.
    #[must_use]
    pub const fn with_frames(mut self, frames: usize) -> Self {
        self.frames = frames;
        self
    }

    /// Set the orbit radius.
    #[must_use]
    pub const fn with_orbit_radius(mut self, radius: f64) -> Self {
        self.orbit_radius = radius;
        self
    }

    /// Set the elevation in degrees.
    #[must_use]
    pub const fn with_elevation(mut self, degrees: f64) -> Self {
        self.elevation_deg = degrees;
        self
    }

    /// Set the resolution.
    #[must_use]
    pub const fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NoFrames`] for zero frames, otherwise
    /// [`RenderError::InvalidParameter`] for the first bad value.
    pub fn validate(&self) -> RenderResult<()> {
        if self.frames == 0 {
            return Err(RenderError::NoFrames);
        }
        validate_resolution(self.width, self.height)?;
        if !(self.frame_duration.is_finite() && self.frame_duration > 0.0) {
            return Err(RenderError::InvalidParameter(format!(
                "frame duration must be positive, got {}",
                self.frame_duration
            )));
        }
        if !(self.orbit_radius.is_finite() && self.orbit_radius > 1.0) {
            return Err(RenderError::InvalidParameter(format!(
                "orbit radius must be greater than one mesh radius, got {}",
                self.orbit_radius
            )));
        }
        if !(self.elevation_deg.abs() <= MAX_ELEVATION_DEG) {
            return Err(RenderError::InvalidParameter(format!(
                "elevation must be within ±{MAX_ELEVATION_DEG}°, got {}",
                self.elevation_deg
            )));
        }
        Ok(())
    }

    /// Camera position for `frame` around a unit mesh at the origin.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn eye(&self, frame: usize) -> Point3<f64> {
        let angle = TAU * frame as f64 / self.frames as f64;
        let elevation = self.elevation_deg.to_radians();
        let r = self.orbit_radius;
        Point3::new(
            r * angle.cos() * elevation.cos(),
            r * elevation.sin(),
            r * angle.sin() * elevation.cos(),
        )
    }
}

/// Renders the orbit frames of `mesh`.
///
/// # Errors
///
/// Returns an error only for an invalid configuration.
pub fn render_orbit(mesh: &IndexedMesh, config: &OrbitConfig) -> RenderResult<RenderedFrames> {
    config.validate()?;
    let normalized = normalize(mesh);
    // Widen the view until the unit sphere fits, with a little margin.
    let fov_y = ((1.0 / config.orbit_radius).asin() * 2.2).min(170f64.to_radians());

    Ok(render_sequence(&normalized, config.frames, config.width, config.height, |i, _| {
        Camera::looking_at(config.eye(i), Point3::origin(), 1.0, fov_y, config.width, config.height)
    }))
}

/// Loads the meshes at `mesh_paths`, renders an orbit around them and writes
/// it to `output` in `format`.
///
/// # Errors
///
/// Returns [`RenderError::UnsupportedFormat`] for MP4 before rendering
/// anything, or a configuration, load, encoding or I/O error.
pub fn create_orbit<P: AsRef<Path>>(
    mesh_paths: &[P],
    output: &Path,
    config: &OrbitConfig,
    format: AnimationFormat,
) -> RenderResult<RenderReport> {
    format.ensure_supported()?;
    config.validate()?;
    let mesh = load_scene(mesh_paths)?;
    let rendered = render_orbit(&mesh, config)?;
    write_gif(&rendered.frames, config.frame_duration, output)?;

    let report = RenderReport {
        path: output.to_path_buf(),
        frames: rendered.frames.len(),
        placeholders: rendered.placeholders,
        width: config.width,
        height: config.height,
    };
    info!(%report, "orbit animation created");
    Ok(report)
}

/// Copy of `mesh` with its centroid at the origin and bounding radius one.
fn normalize(mesh: &IndexedMesh) -> IndexedMesh {
    let mut normalized = mesh.clone();
    let Some(center) = mesh.centroid() else {
        return normalized;
    };
    normalized.translate(-center.coords);
    let radius = bounding_radius(&normalized, &Point3::origin());
    if radius.is_finite() && radius > 0.0 {
        normalized.scale(1.0 / radius);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::unit_cube;

    fn small() -> OrbitConfig {
        OrbitConfig::default().with_frames(6).with_resolution(40, 30)
    }

    #[test]
    fn defaults() {
        let config = OrbitConfig::default();
        assert_eq!(config.frames, 60);
        assert_relative_eq!(config.frame_duration, 0.05);
        assert_relative_eq!(config.orbit_radius, 2.0);
        assert_relative_eq!(config.elevation_deg, 30.0);
    }

    #[test]
    fn eye_stays_on_the_orbit() {
        let config = small();
        for frame in 0..config.frames {
            let eye = config.eye(frame);
            assert_relative_eq!(eye.coords.norm(), 2.0, epsilon = 1e-12);
            assert_relative_eq!(eye.y, 1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(config.eye(0).z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn normalization_centres_and_scales() {
        let mut cube = unit_cube();
        cube.scale(10.0);
        let normalized = normalize(&cube);
        let center = normalized.centroid().unwrap();
        assert_relative_eq!(center.coords.norm(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(bounding_radius(&normalized, &Point3::origin()), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn renders_every_frame_with_the_mesh_in_view() {
        let rendered = render_orbit(&unit_cube(), &small()).unwrap();
        assert_eq!(rendered.frames.len(), 6);
        assert_eq!(rendered.placeholders, 0);
        for frame in &rendered.frames {
            assert_ne!(*frame.get_pixel(20, 15), image::Rgb([255, 255, 255]));
        }
    }

    #[test]
    fn invalid_configuration() {
        assert!(small().with_orbit_radius(0.5).validate().is_err());
        assert!(small().with_elevation(90.0).validate().is_err());
        assert!(small().with_elevation(f64::NAN).validate().is_err());
        assert!(matches!(small().with_frames(0).validate(), Err(RenderError::NoFrames)));
    }

    #[test]
    fn mp4_is_rejected_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        let result = create_orbit(
            &["does-not-exist.ply"],
            &dir.path().join("out.mp4"),
            &small(),
            AnimationFormat::Mp4,
        );
        assert!(matches!(result, Err(RenderError::UnsupportedFormat { .. })));
    }
}
