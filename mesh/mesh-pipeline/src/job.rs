//! One reconstruction job: image and depth map in, textured mesh out.
//!
//! Stages run in order, each to completion:
//!
//! 1. lift pixels into a coloured point cloud
//! 2. remove outliers, downsample and estimate normals
//! 3. reconstruct and clean a surface
//! 4. colour the vertices from the image
//!
//! Nothing is written until all four succeed.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use image::RgbImage;
use mesh_depth::{build_point_cloud, texturize_mesh};
use mesh_io::MeshFormat;
use mesh_scan::{clean_point_cloud, reconstruct_surface};
use sensor_types::{DepthMap, Mask};
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Point and mesh counts captured while the job ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconstructionStats {
    /// Points lifted from the depth map.
    pub original_point_count: usize,
    /// Points left after cleaning.
    pub cleaned_point_count: usize,
    /// Vertices of the final mesh.
    pub vertex_count: usize,
    /// Triangles of the final mesh.
    pub triangle_count: usize,
    /// Vertices that could not be reprojected and were coloured gray.
    pub gray_vertex_count: usize,
}

impl fmt::Display for ReconstructionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} points ({} after cleaning) → {} vertices, {} triangles",
            self.original_point_count, self.cleaned_point_count, self.vertex_count, self.triangle_count
        )
    }
}

/// Artifacts of a finished job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconstructionResult {
    /// The job identifier used in every artifact name.
    pub job_id: String,
    /// Strategy that produced the mesh.
    pub method: &'static str,
    /// `{job}_pointcloud.ply`: cleaned points with normals and colours.
    pub point_cloud_path: PathBuf,
    /// `{job}_mesh.<ext>`, one per configured format, in order.
    pub mesh_paths: Vec<PathBuf>,
    /// Counts from each stage.
    pub stats: ReconstructionStats,
}

impl ReconstructionResult {
    /// Path of the mesh written in `format`, if it was configured.
    #[must_use]
    pub fn mesh_path(&self, format: MeshFormat) -> Option<&Path> {
        self.mesh_paths
            .iter()
            .find(|p| MeshFormat::from_path(p) == Some(format))
            .map(PathBuf::as_path)
    }
}

impl fmt::Display for ReconstructionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Job {} ({}): {}", self.job_id, self.method, self.stats)?;
        writeln!(f, "  point cloud: {}", self.point_cloud_path.display())?;
        for path in &self.mesh_paths {
            writeln!(f, "  mesh: {}", path.display())?;
        }
        Ok(())
    }
}

/// Reconstructs a textured mesh from `image` and `depth` and writes the
/// artifacts into `output_dir`.
///
/// `image` is resampled onto the depth grid if the sizes differ. `mask`,
/// when given, must match the depth grid.
///
/// # Errors
///
/// - [`PipelineError::Configuration`] for an invalid `config`, before any
///   work is done
/// - [`PipelineError::Input`] for a bad job id or a mask that does not fit
///   the depth map
/// - [`PipelineError::DegenerateGeometry`] when no points survive
///   filtering, too few survive cleaning, or no triangles survive
///   reconstruction
/// - [`PipelineError::Persistence`] when an artifact cannot be written
///
/// # Example
///
/// ```no_run
/// use image::RgbImage;
/// use mesh_pipeline::{reconstruct_job, PipelineConfig};
/// use sensor_types::DepthMap;
/// use std::path::Path;
///
/// let image = RgbImage::new(64, 64);
/// let depth = DepthMap::from_fn(64, 64, |x, y| ((x + y) % 7) as f32).unwrap();
/// let result = reconstruct_job("demo", &image, &depth, None, Path::new("out"), &PipelineConfig::default())?;
/// println!("{result}");
/// # Ok::<(), mesh_pipeline::PipelineError>(())
/// ```
pub fn reconstruct_job(
    job_id: &str,
    image: &RgbImage,
    depth: &DepthMap,
    mask: Option<&Mask>,
    output_dir: &Path,
    config: &PipelineConfig,
) -> PipelineResult<ReconstructionResult> {
    let _span = info_span!("job", id = job_id).entered();
    if !is_plain_name(job_id) {
        return Err(PipelineError::Input(format!("job id '{job_id}' is not a plain file name")));
    }
    config.validate()?;

    let built = build_point_cloud(image, depth, mask, &config.build_config())?;
    if built.cloud.is_empty() {
        return Err(PipelineError::DegenerateGeometry(format!(
            "no points survived masking and the near cutoff ({})",
            built.stats
        )));
    }

    let (cleaned, clean_report) = clean_point_cloud(&built.cloud, &config.clean_params())?;
    debug!(%clean_report, "cleaning done");

    let reconstruction = reconstruct_surface(&cleaned, &config.reconstruction_params())?;
    let mut mesh = reconstruction.mesh;
    let gray_vertex_count = texturize_mesh(&mut mesh, &built.texture, &built.intrinsics)?;

    let stats = ReconstructionStats {
        original_point_count: built.cloud.len(),
        cleaned_point_count: cleaned.len(),
        vertex_count: mesh.vertices.len(),
        triangle_count: mesh.faces.len(),
        gray_vertex_count,
    };

    std::fs::create_dir_all(output_dir)?;
    let point_cloud_path = output_dir.join(format!("{job_id}_pointcloud.ply"));
    cleaned.save_ply(&point_cloud_path)?;
    let mut mesh_paths = Vec::with_capacity(config.mesh_formats.len());
    for &format in &config.mesh_formats {
        let path = output_dir.join(format!("{job_id}_mesh.{}", format.extension()));
        mesh_io::save_mesh_as(&mesh, &path, format)?;
        mesh_paths.push(path);
    }

    info!(%stats, method = reconstruction.method, "job complete");
    Ok(ReconstructionResult {
        job_id: job_id.to_string(),
        method: reconstruction.method,
        point_cloud_path,
        mesh_paths,
        stats,
    })
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use image::Rgb;

    fn flat_inputs(size: u32) -> (RgbImage, DepthMap) {
        (
            RgbImage::from_pixel(size, size, Rgb([30, 60, 90])),
            DepthMap::from_fn(size, size, |_, _| 0.0).unwrap(),
        )
    }

    #[test]
    fn job_ids_must_be_plain_names() {
        assert!(is_plain_name("job-42"));
        assert!(!is_plain_name(""));
        assert!(!is_plain_name("../escape"));
        assert!(!is_plain_name("a/b"));

        let dir = tempfile::tempdir().unwrap();
        let (image, depth) = flat_inputs(8);
        let err = reconstruct_job("../x", &image, &depth, None, dir.path(), &PipelineConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn invalid_config_is_rejected_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let (image, depth) = flat_inputs(8);
        let config = PipelineConfig::default().with_focal_factor(-1.0);

        let err = reconstruct_job("job", &image, &depth, None, &out, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!out.exists());
    }

    #[test]
    fn single_mesh_format_is_rejected_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let image = RgbImage::new(8, 8);
        let depth = DepthMap::from_fn(8, 8, |x, _| x as f32).unwrap();
        let config = PipelineConfig::default().with_mesh_formats(vec![MeshFormat::Obj]);

        let err = reconstruct_job("one", &image, &depth, None, &out, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!out.exists());
    }

    #[test]
    fn all_background_is_degenerate_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let (image, depth) = flat_inputs(16);

        let err = reconstruct_job("job", &image, &depth, None, &out, &PipelineConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateGeometry);
        assert!(!out.exists());
    }

    #[test]
    fn mismatched_mask_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let image = RgbImage::new(8, 8);
        let depth = DepthMap::from_fn(8, 8, |x, _| x as f32).unwrap();
        let mask = Mask::full(4, 4).unwrap();

        let err = reconstruct_job("job", &image, &depth, Some(&mask), dir.path(), &PipelineConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn stats_display() {
        let stats = ReconstructionStats {
            original_point_count: 100,
            cleaned_point_count: 90,
            vertex_count: 80,
            triangle_count: 150,
            gray_vertex_count: 0,
        };
        assert_eq!(stats.to_string(), "100 points (90 after cleaning) → 80 vertices, 150 triangles");
    }
}
