//! Ball Pivoting Algorithm for surface reconstruction.
//!
//! The Ball Pivoting Algorithm (BPA) reconstructs a triangle mesh from
//! a point cloud with normals by simulating a ball of given radius that
//! rolls over the point cloud surface, creating triangles where it touches
//! three points.
//!
//! # Algorithm Overview
//!
//! For each radius, smallest first:
//! 1. Re-open every boundary edge left by the previous radius
//! 2. Pivot the ball around each front edge; the first point it hits
//!    (smallest rotation) forms a new triangle
//! 3. When the front is exhausted, seed a new triangle from unused points
//!    and continue
//!
//! An edge never carries more than two triangles, and every triangle is
//! wound so its normal agrees with the normals of its points.
//!
//! Radii are multiples of the mean nearest-neighbour distance, so the same
//! parameters work at any scale.

use std::collections::VecDeque;
use std::f64::consts::TAU;

use hashbrown::{HashMap, HashSet};
use mesh_types::IndexedMesh;
use nalgebra::{Point3, Vector3};
use tracing::debug;

use super::{oriented_samples, SurfaceReconstructor};
use crate::error::{ScanError, ScanResult};
use crate::pointcloud::{CloudPoint, PointCloud, SpatialIndex};

/// Closest unused neighbours tried when seeding from a point.
const SEED_NEIGHBORS: usize = 16;

/// Points this close to the ball surface (relative to `r²`) do not count
/// as inside it.
const EMPTY_BALL_TOLERANCE: f64 = 1e-7;

/// Pivot angles below this are treated as zero (co-circular points).
const ANGLE_EPSILON: f64 = 1e-7;

/// Parameters for ball pivoting reconstruction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BallPivotingParams {
    /// Ball radii as multiples of the mean nearest-neighbour distance.
    pub radius_factors: Vec<f64>,
}

impl Default for BallPivotingParams {
    fn default() -> Self {
        Self {
            radius_factors: vec![0.5, 1.0, 2.0],
        }
    }
}

impl BallPivotingParams {
    /// Set the radius factors.
    #[must_use]
    pub fn with_radius_factors(mut self, factors: Vec<f64>) -> Self {
        self.radius_factors = factors;
        self
    }

    /// Checks the radius factors.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidParameter`] if there are no factors or any
    /// is not a positive finite number.
    pub fn validate(&self) -> ScanResult<()> {
        if self.radius_factors.is_empty() {
            return Err(ScanError::invalid("ball pivoting needs at least one radius"));
        }
        if let Some(bad) = self.radius_factors.iter().find(|f| !(f.is_finite() && **f > 0.0)) {
            return Err(ScanError::invalid(format!(
                "radius factors must be positive, got {bad}"
            )));
        }
        Ok(())
    }

    /// Absolute radii for a given mean point spacing, ascending.
    #[must_use]
    pub fn radii(&self, spacing: f64) -> Vec<f64> {
        let mut radii: Vec<f64> = self.radius_factors.iter().map(|f| f * spacing).collect();
        radii.sort_by(f64::total_cmp);
        radii.dedup();
        radii
    }
}

/// Multi-radius ball pivoting.
#[derive(Debug, Clone, Default)]
pub struct BallPivotingReconstructor {
    params: BallPivotingParams,
}

impl BallPivotingReconstructor {
    /// Creates a reconstructor with the given parameters.
    #[must_use]
    pub const fn new(params: BallPivotingParams) -> Self {
        Self { params }
    }

    /// The parameters in use.
    #[must_use]
    pub const fn params(&self) -> &BallPivotingParams {
        &self.params
    }
}

impl SurfaceReconstructor for BallPivotingReconstructor {
    fn name(&self) -> &'static str {
        "ball_pivoting"
    }

    fn reconstruct(&self, cloud: &PointCloud) -> ScanResult<IndexedMesh> {
        self.params.validate()?;
        let (positions, normals) = oriented_samples(cloud)?;

        let spacing = cloud
            .mean_nearest_distance()
            .filter(|d| *d > 0.0)
            .ok_or_else(|| ScanError::ReconstructionFailed {
                reason: "points have no spacing to derive ball radii from".to_string(),
            })?;

        let index = cloud.spatial_index();
        let mut pivoter = Pivoter::new(&positions, &normals, &index);
        for radius in self.params.radii(spacing) {
            pivoter.pass(radius);
            debug!(radius, faces = pivoter.faces.len(), "ball pivoting pass");
        }

        let vertices = cloud.points.iter().map(CloudPoint::to_vertex).collect();
        Ok(IndexedMesh::from_parts(vertices, pivoter.faces))
    }
}

/// An open edge `a → b` of the triangle `(a, b, opposite)`, with the ball
/// that rests on that triangle.
#[derive(Debug, Clone, Copy)]
struct FrontEdge {
    a: u32,
    b: u32,
    opposite: u32,
    center: Point3<f64>,
}

struct Pivoter<'a> {
    positions: &'a [Point3<f64>],
    normals: &'a [Vector3<f64>],
    index: &'a SpatialIndex,
    used: Vec<bool>,
    faces: Vec<[u32; 3]>,
    face_set: HashSet<[u32; 3]>,
    edge_faces: HashMap<(u32, u32), u8>,
    front: VecDeque<FrontEdge>,
}

impl<'a> Pivoter<'a> {
    fn new(positions: &'a [Point3<f64>], normals: &'a [Vector3<f64>], index: &'a SpatialIndex) -> Self {
        Self {
            positions,
            normals,
            index,
            used: vec![false; positions.len()],
            faces: Vec::new(),
            face_set: HashSet::new(),
            edge_faces: HashMap::new(),
            front: VecDeque::new(),
        }
    }

    fn position(&self, i: u32) -> Point3<f64> {
        self.positions[i as usize]
    }

    fn normal(&self, i: u32) -> Vector3<f64> {
        self.normals[i as usize]
    }

    fn edge_count(&self, a: u32, b: u32) -> u8 {
        self.edge_faces.get(&edge_key(a, b)).copied().unwrap_or(0)
    }

    /// One full pass at `radius`: re-open boundaries, expand, then seed
    /// until no unused point can start a triangle.
    #[allow(clippy::cast_possible_truncation)]
    fn pass(&mut self, radius: f64) {
        self.reopen_boundary(radius);
        self.expand(radius);
        for i in 0..self.positions.len() {
            if !self.used[i] && self.seed(i as u32, radius) {
                self.expand(radius);
            }
        }
    }

    fn reopen_boundary(&mut self, radius: f64) {
        for f in 0..self.faces.len() {
            let [x, y, z] = self.faces[f];
            for (a, b, opposite) in [(x, y, z), (y, z, x), (z, x, y)] {
                if self.edge_count(a, b) != 1 {
                    continue;
                }
                let center = ball_center(&self.position(a), &self.position(b), &self.position(opposite), radius);
                if let Some(center) = center {
                    self.front.push_back(FrontEdge {
                        a,
                        b,
                        opposite,
                        center,
                    });
                }
            }
        }
    }

    fn expand(&mut self, radius: f64) {
        while let Some(edge) = self.front.pop_front() {
            if self.edge_count(edge.a, edge.b) != 1 {
                continue;
            }
            if let Some((k, center)) = self.pivot(&edge, radius) {
                let face = [edge.b, edge.a, k];
                if self.can_add(face) {
                    self.add_face(face, center);
                }
            }
        }
    }

    /// The first point hit when rolling the ball over `edge`, and the
    /// ball's new centre.
    fn pivot(&self, edge: &FrontEdge, radius: f64) -> Option<(u32, Point3<f64>)> {
        let (pa, pb) = (self.position(edge.a), self.position(edge.b));
        let axis = (pb - pa).try_normalize(1e-12)?;
        let mid = Point3::from((pa.coords + pb.coords) / 2.0);
        let from = edge.center - mid;
        let edge_normals = self.normal(edge.a) + self.normal(edge.b);
        // Candidates on the same side as the existing triangle would overlap it.
        let inward = {
            let to_opposite = self.position(edge.opposite) - mid;
            to_opposite - axis * axis.dot(&to_opposite)
        };

        let mut candidates = self.index.within(&mid, 2.0 * radius);
        candidates.sort_unstable_by_key(|&(k, _)| k);

        let mut best: Option<(f64, u32, Point3<f64>)> = None;
        for (k, _) in candidates {
            let k = u32::try_from(k).ok()?;
            if k == edge.a || k == edge.b || k == edge.opposite {
                continue;
            }
            let pk = self.position(k);
            if (pk - mid).dot(&inward) > 0.0 {
                continue;
            }
            let face_normal = (pa - pb).cross(&(pk - pb));
            if face_normal.dot(&(edge_normals + self.normal(k))) <= 0.0 {
                continue;
            }
            let Some(center) = ball_center(&pb, &pa, &pk, radius) else {
                continue;
            };

            let to = center - mid;
            let mut angle = axis.dot(&from.cross(&to)).atan2(from.dot(&to));
            if angle < -ANGLE_EPSILON {
                angle += TAU;
            }
            let angle = angle.max(0.0);

            if best.is_some_and(|(best_angle, _, _)| best_angle <= angle) {
                continue;
            }
            if self.ball_is_empty(&center, radius, [edge.a, edge.b, k]) {
                best = Some((angle, k, center));
            }
        }
        best.map(|(_, k, center)| (k, center))
    }

    /// Tries to start a new surface patch at unused point `i`.
    fn seed(&mut self, i: u32, radius: f64) -> bool {
        let pi = self.position(i);
        let neighbors: Vec<u32> = self
            .index
            .within(&pi, 2.0 * radius)
            .into_iter()
            .filter_map(|(j, _)| u32::try_from(j).ok())
            .filter(|&j| j != i && !self.used[j as usize])
            .take(SEED_NEIGHBORS)
            .collect();

        for (x, &j) in neighbors.iter().enumerate() {
            for &k in &neighbors[x + 1..] {
                let (pj, pk) = (self.position(j), self.position(k));
                let agreement = (pj - pi)
                    .cross(&(pk - pi))
                    .dot(&(self.normal(i) + self.normal(j) + self.normal(k)));
                let face = if agreement > 0.0 {
                    [i, j, k]
                } else if agreement < 0.0 {
                    [i, k, j]
                } else {
                    continue;
                };

                let [p0, p1, p2] = face.map(|v| self.position(v));
                let Some(center) = ball_center(&p0, &p1, &p2, radius) else {
                    continue;
                };
                if self.ball_is_empty(&center, radius, face) && self.can_add(face) {
                    self.add_face(face, center);
                    return true;
                }
            }
        }
        false
    }

    fn ball_is_empty(&self, center: &Point3<f64>, radius: f64, touching: [u32; 3]) -> bool {
        let limit = radius * radius * (1.0 - EMPTY_BALL_TOLERANCE);
        self.index
            .within(center, radius)
            .into_iter()
            .all(|(j, d2)| d2 >= limit || touching.iter().any(|&t| t as usize == j))
    }

    fn can_add(&self, face: [u32; 3]) -> bool {
        let [x, y, z] = face;
        x != y
            && y != z
            && z != x
            && !self.face_set.contains(&sorted(face))
            && [(x, y), (y, z), (z, x)].iter().all(|&(a, b)| self.edge_count(a, b) < 2)
    }

    fn add_face(&mut self, face: [u32; 3], center: Point3<f64>) {
        let [x, y, z] = face;
        self.faces.push(face);
        self.face_set.insert(sorted(face));
        for v in face {
            self.used[v as usize] = true;
        }
        for (a, b) in [(x, y), (y, z), (z, x)] {
            *self.edge_faces.entry(edge_key(a, b)).or_insert(0) += 1;
        }
        for (a, b, opposite) in [(x, y, z), (y, z, x), (z, x, y)] {
            if self.edge_count(a, b) == 1 {
                self.front.push_back(FrontEdge {
                    a,
                    b,
                    opposite,
                    center,
                });
            }
        }
    }
}

const fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn sorted(mut face: [u32; 3]) -> [u32; 3] {
    face.sort_unstable();
    face
}

/// Centre of the ball of `radius` touching `p0`, `p1` and `p2`, on the side
/// the triangle `(p0, p1, p2)` faces. `None` if the triangle is degenerate
/// or its circumcircle is wider than the ball.
fn ball_center(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>, radius: f64) -> Option<Point3<f64>> {
    let ab = p1 - p0;
    let ac = p2 - p0;
    let n = ab.cross(&ac);
    let n2 = n.norm_squared();
    if n2 <= f64::EPSILON * ab.norm_squared() * ac.norm_squared() {
        return None;
    }

    let circumcenter = p0 + (ac.norm_squared() * n.cross(&ab) + ab.norm_squared() * ac.cross(&n)) / (2.0 * n2);
    let h2 = radius.mul_add(radius, -(circumcenter - p0).norm_squared());
    if h2 < 0.0 {
        return None;
    }
    Some(circumcenter + n / n2.sqrt() * h2.sqrt())
}
