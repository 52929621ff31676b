//! Discrete Poisson equation on the node grid.
//!
//! The indicator function `χ` satisfies `∇²χ = ∇·V`. With the 7-point
//! Laplacian and `χ = 0` on the outer layer of nodes this becomes the
//! symmetric positive definite system `6χ - Σ neighbours = -h² ∇·V` over
//! the interior nodes, solved with conjugate gradients.

use nalgebra::Vector3;
use rayon::prelude::*;

use super::grid::Grid;

/// Result of a conjugate gradient solve.
#[derive(Debug)]
pub(super) struct Solution {
    /// `χ` at every node, zero on the boundary.
    pub values: Vec<f64>,
    /// Iterations performed.
    pub iterations: usize,
    /// Final residual norm relative to the right-hand side.
    pub relative_residual: f64,
}

/// Right-hand side `-h² ∇·V`, with `∇·V` taken by central differences at
/// interior nodes. Boundary entries are zero.
pub(super) fn poisson_rhs(grid: &Grid, field: &[Vector3<f64>]) -> Vec<f64> {
    let n = grid.nodes();
    let half_h = grid.spacing() / 2.0;
    let mut rhs = vec![0.0; grid.node_count()];
    rhs.par_chunks_mut(n * n).enumerate().for_each(|(k, slab)| {
        if k == 0 || k == n - 1 {
            return;
        }
        for j in 1..n - 1 {
            for i in 1..n - 1 {
                let at = |di: isize, dj: isize, dk: isize| {
                    field[grid.node_index(
                        i.wrapping_add_signed(di),
                        j.wrapping_add_signed(dj),
                        k.wrapping_add_signed(dk),
                    )]
                };
                let diff = (at(1, 0, 0).x - at(-1, 0, 0).x)
                    + (at(0, 1, 0).y - at(0, -1, 0).y)
                    + (at(0, 0, 1).z - at(0, 0, -1).z);
                // -h² · diff / (2h)
                slab[j * n + i] = -half_h * diff;
            }
        }
    });
    rhs
}

/// Solves `A χ = rhs` for the interior nodes of an `n³` node grid.
///
/// Stops once `‖r‖ ≤ tolerance · ‖rhs‖` or after `max_iterations`.
pub(super) fn solve(n: usize, rhs: &[f64], tolerance: f64, max_iterations: usize) -> Solution {
    let mut x = vec![0.0; rhs.len()];
    let rhs_norm = dot(rhs, rhs).sqrt();
    if rhs_norm <= 0.0 {
        return Solution {
            values: x,
            iterations: 0,
            relative_residual: 0.0,
        };
    }

    let mut r = rhs.to_vec();
    let mut p = r.clone();
    let mut ap = vec![0.0; rhs.len()];
    let mut rr = dot(&r, &r);
    let target = (tolerance * rhs_norm).powi(2);
    let mut iterations = 0;

    while iterations < max_iterations && rr > target {
        apply_laplacian(n, &p, &mut ap);
        let pap = dot(&p, &ap);
        if pap <= 0.0 {
            break;
        }
        let alpha = rr / pap;
        x.par_iter_mut().zip(&p).for_each(|(xi, pi)| *xi += alpha * pi);
        r.par_iter_mut().zip(&ap).for_each(|(ri, api)| *ri -= alpha * api);

        let rr_next = dot(&r, &r);
        let beta = rr_next / rr;
        p.par_iter_mut().zip(&r).for_each(|(pi, ri)| *pi = ri + beta * *pi);
        rr = rr_next;
        iterations += 1;
    }

    Solution {
        values: x,
        iterations,
        relative_residual: rr.sqrt() / rhs_norm,
    }
}

/// `out = A x` with `A = 6I - adjacency` on interior nodes, zero on the
/// boundary.
fn apply_laplacian(n: usize, x: &[f64], out: &mut [f64]) {
    let slab_len = n * n;
    out.par_chunks_mut(slab_len).enumerate().for_each(|(k, slab)| {
        if k == 0 || k == n - 1 {
            slab.fill(0.0);
            return;
        }
        for j in 0..n {
            for i in 0..n {
                let local = j * n + i;
                if i == 0 || j == 0 || i == n - 1 || j == n - 1 {
                    slab[local] = 0.0;
                    continue;
                }
                let g = k * slab_len + local;
                slab[local] = 6.0 * x[g]
                    - x[g - 1]
                    - x[g + 1]
                    - x[g - n]
                    - x[g + n]
                    - x[g - slab_len]
                    - x[g + slab_len];
            }
        }
    });
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.par_iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn interior_rhs(n: usize, value: f64) -> Vec<f64> {
        let mut rhs = vec![0.0; n * n * n];
        for k in 1..n - 1 {
            for j in 1..n - 1 {
                for i in 1..n - 1 {
                    rhs[(k * n + j) * n + i] = value;
                }
            }
        }
        rhs
    }

    #[test]
    fn test_solution_satisfies_system() {
        let n = 9;
        let rhs = interior_rhs(n, 1.0);
        let solution = solve(n, &rhs, 1e-10, 500);
        assert!(solution.relative_residual <= 1e-10);

        let mut check = vec![0.0; rhs.len()];
        apply_laplacian(n, &solution.values, &mut check);
        for (a, b) in check.iter().zip(&rhs) {
            assert_relative_eq!(a, b, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_boundary_stays_zero_and_interior_positive() {
        let n = 7;
        let solution = solve(n, &interior_rhs(n, 1.0), 1e-8, 500);
        assert_relative_eq!(solution.values[0], 0.0);
        assert_relative_eq!(solution.values[n * n * n - 1], 0.0);
        let centre = (3 * n + 3) * n + 3;
        assert!(solution.values[centre] > solution.values[(3 * n + 3) * n + 1]);
        assert!(solution.values[centre] > 0.0);
    }

    #[test]
    fn test_zero_rhs_is_trivial() {
        let solution = solve(5, &[0.0; 125], 1e-6, 100);
        assert_eq!(solution.iterations, 0);
        assert!(solution.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_rhs_of_uniform_field_vanishes() {
        let corners = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)];
        let grid = Grid::enclosing(&corners, 1.0, 4).unwrap();
        let field = vec![Vector3::new(0.3, -0.2, 1.0); grid.node_count()];
        assert!(poisson_rhs(&grid, &field).iter().all(|v| v.abs() < 1e-12));
    }
}
