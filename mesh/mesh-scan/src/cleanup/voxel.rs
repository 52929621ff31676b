//! Voxel-grid downsampling.

use hashbrown::HashMap;
use mesh_types::VertexColor;
use nalgebra::{Point3, Vector3};

use crate::error::{ScanError, ScanResult};
use crate::pointcloud::{CloudPoint, PointCloud};

#[derive(Default)]
struct Accumulator {
    position: Vector3<f64>,
    color: Vector3<f64>,
    colored: usize,
    normal: Vector3<f64>,
    oriented: usize,
    count: usize,
}

/// Merges all points that fall in the same `voxel_size` cube into one.
///
/// The representative's position, colour and normal are the averages of
/// the merged points (normals renormalised). Output order follows the
/// first point seen in each cell. A `voxel_size` of zero returns the cloud
/// unchanged.
///
/// # Errors
///
/// Returns [`ScanError::InvalidParameter`] if `voxel_size` is negative or
/// not finite.
///
/// # Example
///
/// ```
/// use mesh_scan::cleanup::voxel_downsample;
/// use mesh_scan::pointcloud::PointCloud;
/// use nalgebra::Point3;
///
/// let cloud = PointCloud::from_positions(&[
///     Point3::new(0.1, 0.1, 0.1),
///     Point3::new(0.3, 0.3, 0.3),
///     Point3::new(1.5, 0.0, 0.0),
/// ]);
/// let down = voxel_downsample(&cloud, 1.0).unwrap();
/// assert_eq!(down.len(), 2);
/// assert!((down.points[0].position.x - 0.2).abs() < 1e-12);
/// ```
pub fn voxel_downsample(cloud: &PointCloud, voxel_size: f64) -> ScanResult<PointCloud> {
    if !voxel_size.is_finite() || voxel_size < 0.0 {
        return Err(ScanError::invalid(format!(
            "voxel size must be finite and non-negative, got {voxel_size}"
        )));
    }
    if voxel_size == 0.0 || cloud.is_empty() {
        return Ok(cloud.clone());
    }

    let mut slots: HashMap<(i64, i64, i64), usize> = HashMap::new();
    let mut cells: Vec<Accumulator> = Vec::new();

    for point in &cloud.points {
        let key = cell_of(&point.position, voxel_size);
        let slot = *slots.entry(key).or_insert_with(|| {
            cells.push(Accumulator::default());
            cells.len() - 1
        });
        let cell = &mut cells[slot];
        cell.position += point.position.coords;
        cell.count += 1;
        if let Some(c) = point.color {
            let (r, g, b) = c.to_float();
            cell.color += Vector3::new(f64::from(r), f64::from(g), f64::from(b));
            cell.colored += 1;
        }
        if let Some(n) = point.normal {
            cell.normal += n;
            cell.oriented += 1;
        }
    }

    Ok(cells.into_iter().map(Accumulator::finish).collect())
}

impl Accumulator {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn finish(self) -> CloudPoint {
        let position = Point3::from(self.position / self.count as f64);
        let color = (self.colored > 0).then(|| {
            let c = self.color / self.colored as f64;
            VertexColor::from_float(c.x as f32, c.y as f32, c.z as f32)
        });
        let normal = (self.oriented > 0)
            .then(|| self.normal.try_normalize(1e-12))
            .flatten();
        CloudPoint {
            position,
            normal,
            color,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn cell_of(p: &Point3<f64>, voxel_size: f64) -> (i64, i64, i64) {
    (
        (p.x / voxel_size).floor() as i64,
        (p.y / voxel_size).floor() as i64,
        (p.z / voxel_size).floor() as i64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_voxel_is_identity() {
        let cloud = PointCloud::from_positions(&[Point3::new(0.1, 0.2, 0.3)]);
        assert_eq!(voxel_downsample(&cloud, 0.0).unwrap(), cloud);
    }

    #[test]
    fn test_invalid_voxel_size() {
        let cloud = PointCloud::new();
        assert!(voxel_downsample(&cloud, -0.1).is_err());
        assert!(voxel_downsample(&cloud, f64::NAN).is_err());
    }

    #[test]
    fn test_averages_colors_and_normals() {
        let mut cloud = PointCloud::new();
        cloud.push(CloudPoint {
            position: Point3::new(0.1, 0.0, 0.0),
            normal: Some(Vector3::x()),
            color: Some(VertexColor::new(0, 0, 0)),
        });
        cloud.push(CloudPoint {
            position: Point3::new(0.3, 0.0, 0.0),
            normal: Some(Vector3::y()),
            color: Some(VertexColor::new(255, 255, 255)),
        });
        let down = voxel_downsample(&cloud, 1.0).unwrap();
        assert_eq!(down.len(), 1);
        let p = &down.points[0];
        assert_relative_eq!(p.position.x, 0.2, epsilon = 1e-12);
        assert_eq!(p.color, Some(VertexColor::new(128, 128, 128)));
        let n = p.normal.unwrap();
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(n.x, n.y, epsilon = 1e-12);
    }

    #[test]
    fn test_first_seen_order_and_negative_cells() {
        let cloud = PointCloud::from_positions(&[
            Point3::new(5.5, 0.0, 0.0),
            Point3::new(-0.5, 0.0, 0.0),
            Point3::new(5.6, 0.0, 0.0),
            Point3::new(0.5, 0.0, 0.0),
        ]);
        let down = voxel_downsample(&cloud, 1.0).unwrap();
        assert_eq!(down.len(), 3);
        assert_relative_eq!(down.points[0].position.x, 5.55, epsilon = 1e-12);
        assert_relative_eq!(down.points[1].position.x, -0.5, epsilon = 1e-12);
        assert_relative_eq!(down.points[2].position.x, 0.5, epsilon = 1e-12);
    }
}
