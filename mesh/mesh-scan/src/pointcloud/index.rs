//! KD-tree nearest-neighbour queries over point positions.
//!
//! kiddo's bucketed tree cannot split a bucket whose points all share the
//! same coordinate on the split axis, which is exactly what depth-map clouds
//! produce (whole rows share `y`, flat regions share `z`). Points are
//! therefore stored in a fixed, generically rotated frame where no two
//! distinct points of a grid share a coordinate. Distances are unaffected.

use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::{Point3, Rotation3, Unit, Vector3};

/// Nearest-neighbour and radius queries over a fixed set of points.
///
/// Query results are `(index, squared_distance)` pairs sorted by distance,
/// where `index` is the position of the point in the sequence the index was
/// built from.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: KdTree<f64, 3>,
    frame: Rotation3<f64>,
    len: usize,
}

impl SpatialIndex {
    /// Build an index over `positions`.
    pub fn build<'a>(positions: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        let frame = Rotation3::from_axis_angle(&Unit::new_normalize(Vector3::new(0.3, 0.5, 0.8)), 0.7);
        let mut tree: KdTree<f64, 3> = KdTree::new();
        let mut len = 0usize;
        for (i, p) in positions.into_iter().enumerate() {
            tree.add(&to_key(&frame, p), i as u64);
            len += 1;
        }
        Self { tree, frame, len }
    }

    /// Number of indexed points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True if no points are indexed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The `k` points closest to `query`, nearest first.
    ///
    /// If `query` is itself an indexed point it is returned first with
    /// distance zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn nearest(&self, query: &Point3<f64>, k: usize) -> Vec<(usize, f64)> {
        if k == 0 || self.len == 0 {
            return Vec::new();
        }
        self.tree
            .nearest_n::<SquaredEuclidean>(&to_key(&self.frame, query), k.min(self.len))
            .into_iter()
            .map(|n| (n.item as usize, n.distance))
            .collect()
    }

    /// All points within `radius` of `query`, nearest first.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn within(&self, query: &Point3<f64>, radius: f64) -> Vec<(usize, f64)> {
        if self.len == 0 || radius < 0.0 || !radius.is_finite() {
            return Vec::new();
        }
        self.tree
            .within::<SquaredEuclidean>(&to_key(&self.frame, query), radius * radius)
            .into_iter()
            .map(|n| (n.item as usize, n.distance))
            .collect()
    }
}

fn to_key(frame: &Rotation3<f64>, p: &Point3<f64>) -> [f64; 3] {
    let r = frame * p;
    [r.x, r.y, r.z]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// A flat, perfectly regular grid: every row shares `y`, all share `z`.
    fn flat_grid(n: u32) -> Vec<Point3<f64>> {
        (0..n)
            .flat_map(|j| (0..n).map(move |i| Point3::new(f64::from(i), f64::from(j), -1.0)))
            .collect()
    }

    #[test]
    fn builds_over_axis_aligned_grid() {
        let points = flat_grid(40);
        let index = SpatialIndex::build(&points);
        assert_eq!(index.len(), 1600);

        let hits = index.nearest(&Point3::new(10.0, 10.0, -1.0), 5);
        assert_eq!(hits.len(), 5);
        assert_eq!(hits[0].0, 10 * 40 + 10);
        assert_relative_eq!(hits[0].1, 0.0, epsilon = 1e-9);
        for &(_, d2) in &hits[1..] {
            assert_relative_eq!(d2, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn within_is_sorted_by_distance() {
        let points = flat_grid(5);
        let index = SpatialIndex::build(&points);
        let hits = index.within(&Point3::new(2.0, 2.0, -1.0), 1.0 + 1e-9);
        assert_eq!(hits.len(), 5);
        assert!(hits.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn nearest_caps_at_len() {
        let points = flat_grid(2);
        let index = SpatialIndex::build(&points);
        assert_eq!(index.nearest(&Point3::origin(), 10).len(), 4);
        assert!(index.nearest(&Point3::origin(), 0).is_empty());
    }

    #[test]
    fn empty_index() {
        let index = SpatialIndex::build(std::iter::empty());
        assert!(index.is_empty());
        assert!(index.within(&Point3::origin(), 1.0).is_empty());
    }
}
