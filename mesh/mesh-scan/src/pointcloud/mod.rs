//! Point cloud data structures and operations.
//!
//! This module provides the [`PointCloud`] type for working with coloured 3D
//! points deprojected from a depth map, before surface reconstruction.
//!
//! # Example
//!
//! ```
//! use mesh_scan::pointcloud::{PointCloud, CloudPoint};
//! use nalgebra::Point3;
//!
//! // Create a point cloud from positions
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let cloud = PointCloud::from_positions(&positions);
//!
//! assert_eq!(cloud.len(), 3);
//! assert!(!cloud.is_empty());
//! ```

mod index;
pub mod io;
pub mod normals;

pub use index::SpatialIndex;
pub use normals::NormalParams;

use mesh_types::{Aabb, IndexedMesh, Vertex, VertexColor};
use nalgebra::{Point3, Vector3};

/// A point in a point cloud with optional attributes.
///
/// Colours are stored as 8-bit channels; [`VertexColor::to_float`] gives the
/// `[0, 1]` representation used by the builder and texturizer.
///
/// # Example
///
/// ```
/// use mesh_scan::pointcloud::CloudPoint;
/// use nalgebra::{Point3, Vector3};
///
/// // Simple point with just position
/// let p1 = CloudPoint::new(Point3::new(1.0, 2.0, 3.0));
///
/// // Point with position and normal
/// let p2 = CloudPoint::with_normal(
///     Point3::new(1.0, 2.0, 3.0),
///     Vector3::new(0.0, 0.0, 1.0),
/// );
///
/// assert!(p1.normal.is_none());
/// assert!(p2.normal.is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CloudPoint {
    /// The 3D position of the point.
    pub position: Point3<f64>,

    /// Optional unit normal vector at this point.
    pub normal: Option<Vector3<f64>>,

    /// Optional RGB color.
    pub color: Option<VertexColor>,
}

impl CloudPoint {
    /// Creates a new point with just a position.
    #[must_use]
    pub const fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            normal: None,
            color: None,
        }
    }

    /// Creates a point from x, y, z coordinates.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_scan::pointcloud::CloudPoint;
    ///
    /// let point = CloudPoint::from_coords(1.0, 2.0, 3.0);
    /// assert_eq!(point.position.y, 2.0);
    /// ```
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::new is not const in nalgebra
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Creates a point with position and normal.
    #[must_use]
    pub const fn with_normal(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            position,
            normal: Some(normal),
            color: None,
        }
    }

    /// Creates a point with position and color.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_scan::pointcloud::CloudPoint;
    /// use mesh_types::VertexColor;
    /// use nalgebra::Point3;
    ///
    /// let point = CloudPoint::with_color(Point3::origin(), VertexColor::new(255, 128, 64));
    /// assert!(point.color.is_some());
    /// assert!(point.normal.is_none());
    /// ```
    #[must_use]
    pub const fn with_color(position: Point3<f64>, color: VertexColor) -> Self {
        Self {
            position,
            normal: None,
            color: Some(color),
        }
    }

    /// Converts this cloud point to a mesh vertex, keeping normal and color.
    #[must_use]
    pub const fn to_vertex(&self) -> Vertex {
        let mut vertex = Vertex::new(self.position);
        vertex.attributes.normal = self.normal;
        vertex.attributes.color = self.color;
        vertex
    }

    /// Returns true if this point has a normal.
    #[must_use]
    pub const fn has_normal(&self) -> bool {
        self.normal.is_some()
    }

    /// Returns true if this point has a color.
    #[must_use]
    pub const fn has_color(&self) -> bool {
        self.color.is_some()
    }
}

impl Default for CloudPoint {
    fn default() -> Self {
        Self::new(Point3::origin())
    }
}

/// An ordered collection of 3D points with optional attributes.
///
/// Point order is meaningful: the builder emits points in row-major pixel
/// order and every cleaning step preserves the relative order of the points
/// it keeps.
///
/// # Example
///
/// ```
/// use mesh_scan::pointcloud::PointCloud;
///
/// let mut cloud = PointCloud::new();
/// cloud.push_coords(0.0, 0.0, 0.0);
/// cloud.push_coords(1.0, 0.0, 0.0);
/// cloud.push_coords(0.0, 1.0, 0.0);
///
/// assert_eq!(cloud.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    /// The points in this cloud.
    pub points: Vec<CloudPoint>,
}

impl PointCloud {
    /// Creates an empty point cloud.
    #[must_use]
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Creates a point cloud with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Creates a point cloud from a slice of 3D positions.
    #[must_use]
    pub fn from_positions(positions: &[Point3<f64>]) -> Self {
        let points = positions.iter().map(|p| CloudPoint::new(*p)).collect();
        Self { points }
    }

    /// Creates a point cloud from mesh vertices, ignoring faces.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_scan::pointcloud::PointCloud;
    /// use mesh_types::{IndexedMesh, Vertex};
    ///
    /// let mut mesh = IndexedMesh::new();
    /// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
    /// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
    ///
    /// let cloud = PointCloud::from_mesh(&mesh);
    /// assert_eq!(cloud.len(), 2);
    /// ```
    #[must_use]
    pub fn from_mesh(mesh: &IndexedMesh) -> Self {
        let points = mesh
            .vertices
            .iter()
            .map(|v| CloudPoint {
                position: v.position,
                normal: v.attributes.normal,
                color: v.attributes.color,
            })
            .collect();
        Self { points }
    }

    /// Converts the cloud into a vertex-only mesh (no faces).
    #[must_use]
    pub fn to_vertex_mesh(&self) -> IndexedMesh {
        IndexedMesh::from_parts(self.points.iter().map(CloudPoint::to_vertex).collect(), Vec::new())
    }

    /// Returns the number of points in the cloud.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the cloud has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns true if all points have normals.
    #[must_use]
    pub fn has_normals(&self) -> bool {
        !self.points.is_empty() && self.points.iter().all(CloudPoint::has_normal)
    }

    /// Returns true if all points have colors.
    #[must_use]
    pub fn has_colors(&self) -> bool {
        !self.points.is_empty() && self.points.iter().all(CloudPoint::has_color)
    }

    /// Adds a point to the cloud.
    pub fn push(&mut self, point: CloudPoint) {
        self.points.push(point);
    }

    /// Adds a point with the given coordinates.
    pub fn push_coords(&mut self, x: f64, y: f64, z: f64) {
        self.points.push(CloudPoint::from_coords(x, y, z));
    }

    /// Adds a point with position and normal.
    pub fn add_point_with_normal(&mut self, position: Point3<f64>, normal: Vector3<f64>) {
        self.points.push(CloudPoint::with_normal(position, normal));
    }

    /// Iterates over point positions.
    pub fn positions(&self) -> impl ExactSizeIterator<Item = &Point3<f64>> + '_ {
        self.points.iter().map(|p| &p.position)
    }

    /// Returns the axis-aligned bounding box of the point cloud.
    ///
    /// Returns `None` if the cloud is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_scan::pointcloud::PointCloud;
    /// use nalgebra::Point3;
    ///
    /// let positions = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(2.0, 3.0, 1.0),
    /// ];
    /// let cloud = PointCloud::from_positions(&positions);
    /// let bounds = cloud.bounds().unwrap();
    ///
    /// assert_eq!(bounds.min.x, 0.0);
    /// assert_eq!(bounds.max.x, 2.0);
    /// ```
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        if self.points.is_empty() {
            return None;
        }
        Some(Aabb::from_points(self.positions()))
    }

    /// Returns the mean position of all points, or `None` if empty.
    #[must_use]
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.points.is_empty() {
            return None;
        }

        let sum: Vector3<f64> = self.points.iter().map(|p| p.position.coords).sum();

        #[allow(clippy::cast_precision_loss)]
        let centroid = sum / self.points.len() as f64;

        Some(Point3::from(centroid))
    }

    /// Builds a spatial index over the current point positions.
    ///
    /// Item `i` of every query result refers to `self.points[i]`.
    #[must_use]
    pub fn spatial_index(&self) -> SpatialIndex {
        SpatialIndex::build(self.positions())
    }

    /// Mean distance from each point to its nearest other point.
    ///
    /// Returns `None` for clouds with fewer than two points.
    #[must_use]
    pub fn mean_nearest_distance(&self) -> Option<f64> {
        if self.points.len() < 2 {
            return None;
        }
        let index = self.spatial_index();
        let total: f64 = self
            .points
            .iter()
            .filter_map(|p| {
                index
                    .nearest(&p.position, 2)
                    .into_iter()
                    .nth(1)
                    .map(|(_, d2)| d2.sqrt())
            })
            .sum();

        #[allow(clippy::cast_precision_loss)]
        Some(total / self.points.len() as f64)
    }

    /// Keeps only the points whose entry in `keep` is true, preserving order.
    #[must_use]
    pub fn select(&self, keep: &[bool]) -> Self {
        let points = self
            .points
            .iter()
            .zip(keep)
            .filter_map(|(p, &k)| k.then(|| p.clone()))
            .collect();
        Self { points }
    }
}

impl FromIterator<CloudPoint> for PointCloud {
    fn from_iter<I: IntoIterator<Item = CloudPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cloud_point_to_vertex_keeps_attributes() {
        let point = CloudPoint {
            position: Point3::new(1.0, 2.0, 3.0),
            normal: Some(Vector3::z()),
            color: Some(VertexColor::new(10, 20, 30)),
        };
        let vertex = point.to_vertex();
        assert_eq!(vertex.position, point.position);
        assert_eq!(vertex.attributes.normal, Some(Vector3::z()));
        assert_eq!(vertex.attributes.color, Some(VertexColor::new(10, 20, 30)));
    }

    #[test]
    fn test_has_normals_requires_all() {
        let mut cloud = PointCloud::new();
        assert!(!cloud.has_normals());
        cloud.add_point_with_normal(Point3::origin(), Vector3::z());
        assert!(cloud.has_normals());
        cloud.push_coords(1.0, 0.0, 0.0);
        assert!(!cloud.has_normals());
    }

    #[test]
    fn test_centroid() {
        let cloud = PointCloud::from_positions(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1.0, 3.0, 0.0),
        ]);
        let c = cloud.centroid().unwrap();
        assert_relative_eq!(c.x, 1.0);
        assert_relative_eq!(c.y, 1.0);
        assert!(PointCloud::new().centroid().is_none());
    }

    #[test]
    fn test_mean_nearest_distance_grid() {
        let positions: Vec<_> = (0..10)
            .flat_map(|i| (0..10).map(move |j| Point3::new(f64::from(i) * 0.5, f64::from(j) * 0.5, 0.0)))
            .collect();
        let cloud = PointCloud::from_positions(&positions);
        assert_relative_eq!(cloud.mean_nearest_distance().unwrap(), 0.5, epsilon = 1e-9);
        assert!(PointCloud::from_positions(&positions[..1]).mean_nearest_distance().is_none());
    }

    #[test]
    fn test_select_preserves_order() {
        let cloud = PointCloud::from_positions(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ]);
        let kept = cloud.select(&[true, false, true]);
        assert_eq!(kept.len(), 2);
        assert_relative_eq!(kept.points[1].position.x, 2.0);
    }

    #[test]
    fn test_vertex_mesh_roundtrip() {
        let mut cloud = PointCloud::new();
        cloud.push(CloudPoint::with_color(Point3::new(1.0, 1.0, 1.0), VertexColor::WHITE));
        let mesh = cloud.to_vertex_mesh();
        assert!(mesh.faces.is_empty());
        assert_eq!(PointCloud::from_mesh(&mesh), cloud);
    }
}
