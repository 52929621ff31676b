//! Poisson surface reconstruction.
//!
//! # Algorithm
//!
//! 1. Enclose the samples in a cube enlarged by `scale` and pick a grid
//!    level: `min(depth, 7)`, lowered while fewer than `samples_per_node`
//!    samples fall in each occupied cell
//! 2. Splat the oriented normals trilinearly onto the grid nodes
//! 3. Solve `∇²χ = ∇·V` with `χ = 0` on the cube boundary
//! 4. Extract the level set of `χ` through the samples (mean of `χ` at the
//!    sample positions) near the samples
//! 5. Drop vertices whose local sample density is below the
//!    `density_quantile` quantile
//!
//! `χ` increases along the sample normals, so faces are wound to face the
//! same way the normals do.

mod density;
mod extract;
mod grid;
mod solver;

use hashbrown::HashSet;
use mesh_types::{IndexedMesh, Vertex};
use nalgebra::{Point3, Vector3};
use tracing::debug;

use self::grid::Grid;
use super::{oriented_samples, SurfaceReconstructor};
use crate::error::{ScanError, ScanResult};
use crate::pointcloud::PointCloud;

/// Finest grid level used regardless of the requested depth.
const MAX_LEVEL: u32 = 7;

/// Coarsest level the sample-density rule may fall back to.
const MIN_LEVEL: u32 = 3;

/// Cells around occupied cells in which the surface is extracted.
const BAND_RINGS: usize = 2;

const SOLVER_TOLERANCE: f64 = 1e-6;
const SOLVER_MAX_ITERATIONS: usize = 2000;

/// Parameters for Poisson reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoissonParams {
    /// Requested octree depth. The grid resolution is `2^min(depth, 7)`.
    pub depth: u32,

    /// Fraction of vertices (lowest density first) to trim.
    pub density_quantile: f64,

    /// Ratio between the reconstruction cube and the sample bounding box.
    pub scale: f64,

    /// Minimum mean number of samples per occupied cell.
    pub samples_per_node: f64,
}

impl Default for PoissonParams {
    fn default() -> Self {
        Self {
            depth: 9,
            density_quantile: 0.1,
            scale: 1.1,
            samples_per_node: 1.5,
        }
    }
}

impl PoissonParams {
    /// Set the depth.
    #[must_use]
    pub const fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Set the density trimming quantile.
    #[must_use]
    pub const fn with_density_quantile(mut self, quantile: f64) -> Self {
        self.density_quantile = quantile;
        self
    }

    /// Set the bounding cube scale.
    #[must_use]
    pub const fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Set the minimum samples per occupied cell.
    #[must_use]
    pub const fn with_samples_per_node(mut self, samples: f64) -> Self {
        self.samples_per_node = samples;
        self
    }

    /// Checks every parameter is in range.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidParameter`] naming the first bad value.
    pub fn validate(&self) -> ScanResult<()> {
        if self.depth == 0 || self.depth > 16 {
            return Err(ScanError::invalid(format!(
                "poisson depth must be between 1 and 16, got {}",
                self.depth
            )));
        }
        if !(0.0..1.0).contains(&self.density_quantile) {
            return Err(ScanError::invalid(format!(
                "density quantile must be in [0, 1), got {}",
                self.density_quantile
            )));
        }
        if !(self.scale.is_finite() && self.scale >= 1.0) {
            return Err(ScanError::invalid(format!(
                "poisson scale must be at least 1, got {}",
                self.scale
            )));
        }
        if !(self.samples_per_node.is_finite() && self.samples_per_node > 0.0) {
            return Err(ScanError::invalid(format!(
                "samples per node must be positive, got {}",
                self.samples_per_node
            )));
        }
        Ok(())
    }
}

/// Poisson reconstruction on a regular grid.
#[derive(Debug, Clone, Default)]
pub struct PoissonReconstructor {
    params: PoissonParams,
}

impl PoissonReconstructor {
    /// Creates a reconstructor with the given parameters.
    #[must_use]
    pub const fn new(params: PoissonParams) -> Self {
        Self { params }
    }

    /// The parameters in use.
    #[must_use]
    pub const fn params(&self) -> &PoissonParams {
        &self.params
    }
}

impl SurfaceReconstructor for PoissonReconstructor {
    fn name(&self) -> &'static str {
        "poisson"
    }

    fn reconstruct(&self, cloud: &PointCloud) -> ScanResult<IndexedMesh> {
        self.params.validate()?;
        let (positions, normals) = oriented_samples(cloud)?;

        let no_extent = || ScanError::ReconstructionFailed {
            reason: "samples do not span any volume".to_string(),
        };
        let level = choose_level(&positions, &self.params).ok_or_else(no_extent)?;
        let grid = Grid::enclosing(&positions, self.params.scale, 1 << level).ok_or_else(no_extent)?;

        let mut field = vec![Vector3::zeros(); grid.node_count()];
        let mut weight = vec![0.0; grid.node_count()];
        let mut occupied = vec![false; grid.cell_count()];
        for (p, n) in positions.iter().zip(&normals) {
            for (node, w) in grid.weights(p) {
                field[node] += n * w;
                weight[node] += w;
            }
            occupied[grid.cell_of(p)] = true;
        }

        let rhs = solver::poisson_rhs(&grid, &field);
        let solution = solver::solve(grid.nodes(), &rhs, SOLVER_TOLERANCE, SOLVER_MAX_ITERATIONS);
        debug!(
            level,
            iterations = solution.iterations,
            residual = solution.relative_residual,
            "poisson system solved"
        );
        let chi = solution.values;

        #[allow(clippy::cast_precision_loss)]
        let iso = positions.iter().map(|p| grid.sample(&chi, p)).sum::<f64>() / positions.len() as f64;

        let band = grid.dilate_cells(&occupied, BAND_RINGS);
        let (mut vertices, mut faces) = extract::surface_nets(&grid, &chi, iso, &band);

        let smoothed = density::box_blur(&grid, &weight);
        let densities: Vec<f64> = vertices.iter().map(|v| grid.sample(&smoothed, v)).collect();
        let trimmed =
            density::trim_low_density(&mut vertices, &mut faces, &densities, self.params.density_quantile);
        debug!(
            vertices = vertices.len(),
            faces = faces.len(),
            trimmed,
            "poisson surface extracted"
        );

        Ok(IndexedMesh::from_parts(
            vertices.into_iter().map(Vertex::new).collect(),
            faces,
        ))
    }
}

/// Grid level for `positions`, or `None` if they span no volume.
fn choose_level(positions: &[Point3<f64>], params: &PoissonParams) -> Option<u32> {
    let mut level = params.depth.min(MAX_LEVEL);
    let floor = level.min(MIN_LEVEL);
    #[allow(clippy::cast_precision_loss)]
    let samples = positions.len() as f64;

    while level > floor {
        let grid = Grid::enclosing(positions, params.scale, 1 << level)?;
        let occupied: HashSet<usize> = positions.iter().map(|p| grid.cell_of(p)).collect();
        #[allow(clippy::cast_precision_loss)]
        let per_cell = samples / occupied.len() as f64;
        if per_cell >= params.samples_per_node {
            break;
        }
        level -= 1;
    }
    Grid::enclosing(positions, params.scale, 1 << level).map(|_| level)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fibonacci_sphere(count: u32, radius: f64) -> PointCloud {
        let golden = std::f64::consts::PI * (3.0 - 5f64.sqrt());
        let mut cloud = PointCloud::new();
        for i in 0..count {
            let y = 1.0 - 2.0 * (f64::from(i) + 0.5) / f64::from(count);
            let r = (1.0 - y * y).sqrt();
            let theta = golden * f64::from(i);
            let n = Vector3::new(r * theta.cos(), y, r * theta.sin());
            cloud.add_point_with_normal(Point3::from(n * radius), n);
        }
        cloud
    }

    fn disc(radius: f64, spacing: f64) -> PointCloud {
        let mut cloud = PointCloud::new();
        let steps = (radius / spacing).ceil() as i32;
        for i in -steps..=steps {
            for j in -steps..=steps {
                let (x, y) = (f64::from(i) * spacing, f64::from(j) * spacing);
                if x.hypot(y) <= radius {
                    cloud.add_point_with_normal(Point3::new(x, y, -1.0), Vector3::z());
                }
            }
        }
        cloud
    }

    #[test]
    fn test_params_default_and_validation() {
        let params = PoissonParams::default();
        assert_eq!(params.depth, 9);
        assert!(params.validate().is_ok());
        assert!(params.with_depth(0).validate().is_err());
        assert!(params.with_density_quantile(1.0).validate().is_err());
        assert!(params.with_scale(0.5).validate().is_err());
        assert!(params.with_samples_per_node(0.0).validate().is_err());
    }

    #[test]
    fn test_level_is_capped_and_lowered_for_sparse_samples() {
        let sphere = fibonacci_sphere(400, 1.0);
        let positions: Vec<_> = sphere.positions().copied().collect();
        let level = choose_level(&positions, &PoissonParams::default()).unwrap();
        assert!((MIN_LEVEL..MAX_LEVEL).contains(&level));

        let shallow = PoissonParams::default().with_depth(2);
        assert_eq!(choose_level(&positions, &shallow), Some(2));
    }

    #[test]
    fn test_sphere_reconstruction() {
        let cloud = fibonacci_sphere(2000, 1.0);
        let mesh = PoissonReconstructor::default().reconstruct(&cloud).unwrap();
        assert!(!mesh.faces.is_empty());
        assert!(mesh.indices_in_range());

        #[allow(clippy::cast_precision_loss)]
        let mean_radius = mesh.vertices.iter().map(|v| v.position.coords.norm()).sum::<f64>()
            / mesh.vertices.len() as f64;
        assert!((mean_radius - 1.0).abs() < 0.2, "mean radius {mean_radius}");

        let outward = mesh
            .faces
            .iter()
            .filter(|f| {
                let [a, b, c] = f.map(|i| mesh.vertices[i as usize].position);
                (b - a).cross(&(c - a)).dot(&a.coords) > 0.0
            })
            .count();
        assert!(outward * 10 >= mesh.faces.len() * 9);
    }

    #[test]
    fn test_planar_disc_faces_camera() {
        let cloud = disc(0.35, 0.015);
        let mesh = PoissonReconstructor::default().reconstruct(&cloud).unwrap();
        assert!(!mesh.faces.is_empty());
        for v in &mesh.vertices {
            assert!((v.position.z + 1.0).abs() < 0.1);
        }
        let facing = mesh
            .faces
            .iter()
            .filter(|f| {
                let [a, b, c] = f.map(|i| mesh.vertices[i as usize].position);
                (b - a).cross(&(c - a)).z > 0.0
            })
            .count();
        assert!(facing * 10 >= mesh.faces.len() * 9);
    }

    #[test]
    fn test_coincident_samples_fail() {
        let mut cloud = PointCloud::new();
        for _ in 0..6 {
            cloud.add_point_with_normal(Point3::new(0.5, 0.5, -1.0), Vector3::z());
        }
        assert!(matches!(
            PoissonReconstructor::default().reconstruct(&cloud),
            Err(ScanError::ReconstructionFailed { .. })
        ));
    }
}
