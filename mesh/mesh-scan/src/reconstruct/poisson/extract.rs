//! Level-set extraction with surface nets.
//!
//! Every cell whose corners straddle the iso-value gets one vertex at the
//! mean of its edge crossings. Every grid edge with a crossing is then
//! bridged by a quad joining the four cells around it, wound so the face
//! normal points towards increasing `χ`.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use super::grid::Grid;

const NO_VERTEX: u32 = u32::MAX;

/// Corner offsets of a cell, indexed by `dx | dy << 1 | dz << 2`.
const CORNERS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

/// Extracts the `iso` level set of per-node `chi`, restricted to cells
/// whose entry in `band` is set.
pub(super) fn surface_nets(
    grid: &Grid,
    chi: &[f64],
    iso: f64,
    band: &[bool],
) -> (Vec<Point3<f64>>, Vec<[u32; 3]>) {
    let cell_points: Vec<Option<Point3<f64>>> = (0..grid.cell_count())
        .into_par_iter()
        .map(|cell| {
            if band[cell] {
                cell_vertex(grid, chi, iso, grid.cell_coords(cell))
            } else {
                None
            }
        })
        .collect();

    let mut vertices = Vec::new();
    let mut cell_vertex_index = vec![NO_VERTEX; cell_points.len()];
    for (cell, point) in cell_points.into_iter().enumerate() {
        if let Some(p) = point {
            cell_vertex_index[cell] = u32::try_from(vertices.len()).unwrap_or(NO_VERTEX);
            vertices.push(p);
        }
    }

    let mut faces = Vec::new();
    for (cell, &v) in cell_vertex_index.iter().enumerate() {
        if v == NO_VERTEX {
            continue;
        }
        let p = grid.cell_coords(cell);
        for axis in 0..3 {
            let b = (axis + 1) % 3;
            let c = (axis + 2) % 3;
            if p[b] == 0 || p[c] == 0 {
                continue;
            }

            let mut q = p;
            q[axis] += 1;
            let from = chi[grid.node_index(p[0], p[1], p[2])] - iso;
            let to = chi[grid.node_index(q[0], q[1], q[2])] - iso;
            if (from > 0.0) == (to > 0.0) {
                continue;
            }

            let neighbor = |db: usize, dc: usize| {
                let mut n = p;
                n[b] -= db;
                n[c] -= dc;
                cell_vertex_index[grid.cell_index(n[0], n[1], n[2])]
            };
            let quad = [neighbor(1, 1), neighbor(0, 1), v, neighbor(1, 0)];
            if quad.contains(&NO_VERTEX) {
                continue;
            }

            let [c00, c10, c11, c01] = quad;
            if to > from {
                faces.push([c00, c10, c11]);
                faces.push([c00, c11, c01]);
            } else {
                faces.push([c00, c11, c10]);
                faces.push([c00, c01, c11]);
            }
        }
    }

    (vertices, faces)
}

/// Mean of the iso crossings on the twelve edges of a cell, or `None` if
/// the level set does not pass through it.
fn cell_vertex(grid: &Grid, chi: &[f64], iso: f64, [i, j, k]: [usize; 3]) -> Option<Point3<f64>> {
    let values: [f64; 8] =
        std::array::from_fn(|c| chi[grid.node_index(i + CORNERS[c][0], j + CORNERS[c][1], k + CORNERS[c][2])] - iso);

    let mut sum = Vector3::zeros();
    let mut crossings = 0u32;
    for a in 0..8 {
        for bit in [1, 2, 4] {
            if a & bit != 0 {
                continue;
            }
            let b = a | bit;
            if (values[a] > 0.0) == (values[b] > 0.0) {
                continue;
            }
            let t = values[a] / (values[a] - values[b]);
            let pa = corner_offset(a);
            sum += pa + (corner_offset(b) - pa) * t;
            crossings += 1;
        }
    }

    (crossings > 0).then(|| {
        grid.node_position(i, j, k) + sum / f64::from(crossings) * grid.spacing()
    })
}

#[allow(clippy::cast_precision_loss)]
fn corner_offset(corner: usize) -> Vector3<f64> {
    let [x, y, z] = CORNERS[corner];
    Vector3::new(x as f64, y as f64, z as f64)
}
