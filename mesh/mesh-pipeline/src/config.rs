//! Every tunable of a reconstruction job in one value.
//!
//! A job receives its own `PipelineConfig`; nothing is read from global
//! state, so overriding one job's parameters never affects another.

use std::path::Path;

use mesh_depth::BuildConfig;
use mesh_io::MeshFormat;
use mesh_scan::{
    BallPivotingParams, CleanParams, NormalParams, OutlierParams, PoissonParams, ReconstructionMethod,
    ReconstructionParams,
};
use mesh_turntable::TurntableConfig;
use sensor_types::DEFAULT_FOCAL_FACTOR;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// Configuration of a reconstruction job.
///
/// Deserializes from partial JSON; missing fields take their defaults.
///
/// # Example
///
/// ```
/// use mesh_pipeline::PipelineConfig;
/// use mesh_scan::ReconstructionMethod;
///
/// let config: PipelineConfig = serde_json::from_str(r#"{ "method": "ball_pivoting" }"#).unwrap();
/// assert_eq!(config.method, ReconstructionMethod::BallPivoting);
/// assert_eq!(config.outlier.k_neighbors, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Focal length as a fraction of the depth map width.
    pub focal_factor: f64,
    /// Multiplier applied to the normalized depth.
    pub depth_scale: f32,
    /// Normalized depth at or below which pixels are dropped.
    pub near_cutoff: f32,
    /// Statistical outlier removal.
    pub outlier: OutlierParams,
    /// Voxel edge for downsampling; zero disables it.
    pub voxel_size: f64,
    /// Normal estimation neighbourhood.
    pub normals: NormalParams,
    /// Reconstruction strategy.
    pub method: ReconstructionMethod,
    /// Poisson settings.
    pub poisson: PoissonParams,
    /// Ball pivoting settings.
    pub ball_pivoting: BallPivotingParams,
    /// Mesh formats written per job, one file each. Must contain both the
    /// binary (`ply`) and the text (`obj`) format.
    pub mesh_formats: Vec<MeshFormat>,
    /// Turntable rendering.
    pub turntable: TurntableConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let build = BuildConfig::default();
        Self {
            focal_factor: DEFAULT_FOCAL_FACTOR,
            depth_scale: build.depth_scale,
            near_cutoff: build.near_cutoff,
            outlier: OutlierParams::default(),
            voxel_size: 0.0,
            normals: NormalParams::default(),
            method: ReconstructionMethod::default(),
            poisson: PoissonParams::default(),
            ball_pivoting: BallPivotingParams::default(),
            mesh_formats: vec![MeshFormat::Ply, MeshFormat::Obj],
            turntable: TurntableConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Input`] if the file cannot be read and
    /// [`PipelineError::Configuration`] if it does not parse.
    pub fn from_json_file(path: &Path) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Input(format!("cannot read config {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| PipelineError::Configuration(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Set the focal factor.
    #[must_use]
    pub const fn with_focal_factor(mut self, focal_factor: f64) -> Self {
        self.focal_factor = focal_factor;
        self
    }

    /// Set the reconstruction method.
    #[must_use]
    pub const fn with_method(mut self, method: ReconstructionMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the Poisson parameters.
    #[must_use]
    pub const fn with_poisson(mut self, poisson: PoissonParams) -> Self {
        self.poisson = poisson;
        self
    }

    /// Set the outlier parameters.
    #[must_use]
    pub fn with_outlier(mut self, outlier: OutlierParams) -> Self {
        self.outlier = outlier;
        self
    }

    /// Set the voxel size.
    #[must_use]
    pub const fn with_voxel_size(mut self, voxel_size: f64) -> Self {
        self.voxel_size = voxel_size;
        self
    }

    /// Set the mesh formats.
    #[must_use]
    pub fn with_mesh_formats(mut self, formats: Vec<MeshFormat>) -> Self {
        self.mesh_formats = formats;
        self
    }

    /// Set the turntable configuration.
    #[must_use]
    pub const fn with_turntable(mut self, turntable: TurntableConfig) -> Self {
        self.turntable = turntable;
        self
    }

    /// Point cloud builder settings.
    #[must_use]
    pub const fn build_config(&self) -> BuildConfig {
        BuildConfig {
            focal_factor: self.focal_factor,
            depth_scale: self.depth_scale,
            near_cutoff: self.near_cutoff,
        }
    }

    /// Cleaner settings.
    #[must_use]
    pub fn clean_params(&self) -> CleanParams {
        CleanParams::default()
            .with_outlier(self.outlier.clone())
            .with_voxel_size(self.voxel_size)
            .with_normals(self.normals.clone())
    }

    /// Reconstructor settings.
    #[must_use]
    pub fn reconstruction_params(&self) -> ReconstructionParams {
        ReconstructionParams::default()
            .with_method(self.method)
            .with_poisson(self.poisson)
            .with_ball_pivoting(self.ball_pivoting.clone())
    }

    /// Checks everything that can be checked before touching any input.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] naming the first bad value.
    pub fn validate(&self) -> PipelineResult<()> {
        if !(self.focal_factor.is_finite() && self.focal_factor > 0.0) {
            return Err(PipelineError::Configuration(format!(
                "focal factor must be positive, got {}",
                self.focal_factor
            )));
        }
        self.build_config().validate()?;
        if self.outlier.k_neighbors == 0 {
            return Err(PipelineError::Configuration("outlier k_neighbors must be at least 1".into()));
        }
        if !(self.outlier.std_ratio.is_finite() && self.outlier.std_ratio > 0.0) {
            return Err(PipelineError::Configuration(format!(
                "outlier std_ratio must be positive, got {}",
                self.outlier.std_ratio
            )));
        }
        if !(self.voxel_size.is_finite() && self.voxel_size >= 0.0) {
            return Err(PipelineError::Configuration(format!(
                "voxel size must be zero or positive, got {}",
                self.voxel_size
            )));
        }
        if !(self.normals.radius.is_finite() && self.normals.radius > 0.0) || self.normals.max_neighbors == 0 {
            return Err(PipelineError::Configuration(format!(
                "normal estimation needs a positive radius and neighbour cap, got {} / {}",
                self.normals.radius, self.normals.max_neighbors
            )));
        }
        match self.method {
            ReconstructionMethod::Poisson => self.poisson.validate()?,
            ReconstructionMethod::BallPivoting => self.ball_pivoting.validate()?,
        }
        for required in [MeshFormat::Ply, MeshFormat::Obj] {
            if !self.mesh_formats.contains(&required) {
                return Err(PipelineError::Configuration(format!(
                    "mesh formats must include both ply and obj, {required} is missing"
                )));
            }
        }
        for (i, format) in self.mesh_formats.iter().enumerate() {
            if self.mesh_formats[..i].contains(format) {
                return Err(PipelineError::Configuration(format!("mesh format {format} listed twice")));
            }
        }
        self.turntable.validate()?;
        Ok(())
    }
}
