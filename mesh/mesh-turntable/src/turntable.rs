//! Full-revolution turntable renders.
//!
//! Frame `i` of `N` shows the mesh rotated by `θ_i = i·2π/N` about the
//! vertical axis through its centroid, seen by one fixed camera. Frames
//! are rendered in parallel from fresh copies of the source mesh and
//! returned in index order.

use std::f64::consts::TAU;
use std::fmt;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use image::RgbImage;
use mesh_types::IndexedMesh;
use nalgebra::Point3;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::animation::write_gif;
use crate::error::{RenderError, RenderResult};
use crate::placeholder::placeholder_frame;
use crate::raster::{bounding_radius, render_mesh, Camera};

/// Turntable parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TurntableConfig {
    /// Frames per revolution.
    pub frames: usize,
    /// Seconds each frame is shown.
    pub frame_duration: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl Default for TurntableConfig {
    fn default() -> Self {
        Self {
            frames: 36,
            frame_duration: 0.1,
            width: 800,
            height: 600,
        }
    }
}

impl TurntableConfig {
    /// Set the frame count.
    #[must_use]
    pub const fn with_frames(mut self, frames: usize) -> Self {
        self.frames = frames;
        self
    }

    /// Set the per-frame duration in seconds.
    #[must_use]
    pub const fn with_frame_duration(mut self, seconds: f64) -> Self {
        self.frame_duration = seconds;
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
    /// Returns [`RenderError::NoFrames`] for zero frames and
    /// [`RenderError::InvalidParameter`] for a zero resolution or a
    /// non-positive duration.
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
        Ok(())
    }
}

pub(crate) fn validate_resolution(width: u32, height: u32) -> RenderResult<()> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidParameter(format!(
            "resolution must be non-zero, got {width}x{height}"
        )));
    }
    Ok(())
}

/// Rendered frames, in order, and how many of them are placeholders.
#[derive(Debug, Clone)]
pub struct RenderedFrames {
    /// One image per angle.
    pub frames: Vec<RgbImage>,
    /// Frames replaced by [`placeholder_frame`].
    pub placeholders: usize,
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    /// Where the animation was written.
    pub path: PathBuf,
    /// Frames in the animation.
    pub frames: usize,
    /// Frames that could not be rendered and were substituted.
    pub placeholders: usize,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl fmt::Display for RenderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} frames at {}x{}",
            self.path.display(),
            self.frames,
            self.width,
            self.height
        )?;
        if self.placeholders > 0 {
            write!(f, " ({} placeholders)", self.placeholders)?;
        }
        Ok(())
    }
}

/// The `N` rotation angles of a turntable, `θ_i = i·2π/N`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn turntable_angles(frames: usize) -> Vec<f64> {
    (0..frames).map(|i| TAU * i as f64 / frames as f64).collect()
}

/// Loads and concatenates the meshes at `paths` into one.
///
/// # Errors
///
/// Returns [`RenderError::NoInput`] for an empty list, or the first load
/// error.
pub fn load_scene<P: AsRef<Path>>(paths: &[P]) -> RenderResult<IndexedMesh> {
    if paths.is_empty() {
        return Err(RenderError::NoInput);
    }
    let meshes = paths
        .iter()
        .map(|p| mesh_io::load_mesh(p.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(IndexedMesh::concatenate(&meshes))
}

/// Renders `count` frames. For frame `i`, `view` poses a fresh copy of
/// `mesh` and returns the camera to draw it with. Failed frames become
/// placeholders.
pub(crate) fn render_sequence<F>(
    mesh: &IndexedMesh,
    count: usize,
    width: u32,
    height: u32,
    view: F,
) -> RenderedFrames
where
    F: Fn(usize, &mut IndexedMesh) -> Camera + Sync,
{
    let rendered: Vec<Option<RgbImage>> = (0..count)
        .into_par_iter()
        .map(|i| {
            let mut posed = mesh.clone();
            let camera = view(i, &mut posed);
            match render_mesh(&posed, &camera) {
                Ok(image) => Some(image),
                Err(error) => {
                    warn!(frame = i, %error, "frame render failed, substituting placeholder");
                    None
                }
            }
        })
        .collect();

    let placeholders = rendered.iter().filter(|f| f.is_none()).count();
    let frames = rendered
        .into_iter()
        .map(|f| f.unwrap_or_else(|| placeholder_frame(width, height)))
        .collect();
    RenderedFrames { frames, placeholders }
}

/// Renders the turntable frames of `mesh`.
///
/// Always returns exactly `config.frames` frames.
///
/// # Errors
///
/// Returns an error only for an invalid configuration.
pub fn render_turntable(mesh: &IndexedMesh, config: &TurntableConfig) -> RenderResult<RenderedFrames> {
    config.validate()?;
    let pivot = mesh.centroid().unwrap_or_else(Point3::origin);
    let camera = Camera::framing(pivot, bounding_radius(mesh, &pivot), config.width, config.height);
    let angles = turntable_angles(config.frames);

    let rendered = render_sequence(mesh, config.frames, config.width, config.height, |i, posed| {
        posed.rotate_about_y(pivot, angles[i]);
        camera.clone()
    });
    if rendered.placeholders > 0 {
        warn!(
            placeholders = rendered.placeholders,
            frames = config.frames,
            "turntable contains placeholder frames"
        );
    }
    Ok(rendered)
}

/// Loads the meshes at `mesh_paths`, renders their turntable and writes it
/// as a looping GIF to `output`.
///
/// # Errors
///
/// Returns a configuration, load, encoding or I/O error. Per-frame render
/// failures are not errors; see [`RenderReport::placeholders`].
///
/// # Example
///
/// ```no_run
/// use mesh_turntable::{create_turntable, TurntableConfig};
/// use std::path::Path;
///
/// let report = create_turntable(&["job_mesh.ply"], Path::new("job.gif"), &TurntableConfig::default()).unwrap();
/// println!("{report}");
/// ```
pub fn create_turntable<P: AsRef<Path>>(
    mesh_paths: &[P],
    output: &Path,
    config: &TurntableConfig,
) -> RenderResult<RenderReport> {
    config.validate()?;
    let mesh = load_scene(mesh_paths)?;
    let rendered = render_turntable(&mesh, config)?;
    write_gif(&rendered.frames, config.frame_duration, output)?;

    let report = RenderReport {
        path: output.to_path_buf(),
        frames: rendered.frames.len(),
        placeholders: rendered.placeholders,
        width: config.width,
        height: config.height,
    };
    info!(%report, "turntable created");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::{unit_cube, Vertex};

    fn small() -> TurntableConfig {
        TurntableConfig::default().with_frames(8).with_resolution(48, 36)
    }

    #[test]
    fn defaults() {
        let config = TurntableConfig::default();
        assert_eq!(config.frames, 36);
        assert_eq!((config.width, config.height), (800, 600));
        assert_relative_eq!(config.frame_duration, 0.1);
    }

    #[test]
    fn angles_are_reproducible() {
        let a = turntable_angles(36);
        let b = turntable_angles(36);
        assert_eq!(a.len(), 36);
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
        assert_relative_eq!(a[0], 0.0);
        assert_relative_eq!(a[9], std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn every_frame_is_rendered_and_source_is_untouched() {
        let cube = unit_cube();
        let before = cube.clone();
        let rendered = render_turntable(&cube, &small()).unwrap();

        assert_eq!(rendered.frames.len(), 8);
        assert_eq!(rendered.placeholders, 0);
        assert!(rendered.frames.iter().all(|f| f.dimensions() == (48, 36)));
        assert_eq!(cube, before);
    }

    #[test]
    fn asymmetric_mesh_changes_between_frames() {
        let mut mesh = unit_cube();
        mesh.merge(&IndexedMesh::from_parts(
            vec![
                Vertex::from_coords(1.0, 0.0, 0.0),
                Vertex::from_coords(3.0, 0.5, 0.0),
                Vertex::from_coords(1.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        ));
        let rendered = render_turntable(&mesh, &small()).unwrap();
        assert_ne!(rendered.frames[0], rendered.frames[2]);
    }

    #[test]
    fn failed_frames_become_placeholders() {
        let empty = IndexedMesh::new();
        let rendered = render_turntable(&empty, &small()).unwrap();
        assert_eq!(rendered.frames.len(), 8);
        assert_eq!(rendered.placeholders, 8);
        assert_eq!(rendered.frames[3], placeholder_frame(48, 36));
    }

    #[test]
    fn zero_frames_is_fatal() {
        let result = render_turntable(&unit_cube(), &small().with_frames(0));
        assert!(matches!(result, Err(RenderError::NoFrames)));
    }

    #[test]
    fn invalid_configuration() {
        assert!(small().with_resolution(0, 10).validate().is_err());
        assert!(small().with_frame_duration(-1.0).validate().is_err());
    }

    #[test]
    fn scene_needs_input() {
        let none: [&str; 0] = [];
        assert!(matches!(load_scene(&none), Err(RenderError::NoInput)));
    }
}
