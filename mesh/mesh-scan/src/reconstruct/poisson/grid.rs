//! Regular node grid over the bounding cube of the samples.
//!
//! Nodes are stored x-fastest: `(k * n + j) * n + i` for `n` nodes per
//! axis. Cells are indexed the same way with `n - 1` per axis; cell
//! `(i, j, k)` has node `(i, j, k)` as its minimum corner.

use mesh_types::Aabb;
use nalgebra::{Point3, Vector3};

/// Offset of the lattice from the centred cube, in cells. Keeps
/// axis-aligned sample planes (flat depth regions) off the node layers.
const LATTICE_SHIFT: f64 = 0.237;

#[derive(Debug, Clone)]
pub(super) struct Grid {
    origin: Point3<f64>,
    spacing: f64,
    cells: usize,
}

impl Grid {
    /// Cube enclosing `positions`, enlarged about its centre by `scale` and
    /// split into `cells` cells per axis. The lattice is shifted by a
    /// fraction of a cell from the centred cube.
    ///
    /// Returns `None` when the samples do not span any extent.
    #[allow(clippy::cast_precision_loss)]
    pub(super) fn enclosing(positions: &[Point3<f64>], scale: f64, cells: usize) -> Option<Self> {
        let bounds = Aabb::from_points(positions.iter());
        let side = bounds.max_extent() * scale;
        if !(side.is_finite() && side > 0.0) || cells == 0 {
            return None;
        }
        let spacing = side / cells as f64;
        Some(Self {
            origin: bounds.center() - Vector3::repeat(side / 2.0 - LATTICE_SHIFT * spacing),
            spacing,
            cells,
        })
    }

    pub(super) const fn nodes(&self) -> usize {
        self.cells + 1
    }

    pub(super) const fn spacing(&self) -> f64 {
        self.spacing
    }

    pub(super) const fn node_count(&self) -> usize {
        self.nodes() * self.nodes() * self.nodes()
    }

    pub(super) const fn cell_count(&self) -> usize {
        self.cells * self.cells * self.cells
    }

    pub(super) const fn node_index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.nodes() + j) * self.nodes() + i
    }

    pub(super) const fn cell_index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.cells + j) * self.cells + i
    }

    /// Inverse of [`cell_index`](Self::cell_index).
    pub(super) const fn cell_coords(&self, index: usize) -> [usize; 3] {
        let i = index % self.cells;
        let j = (index / self.cells) % self.cells;
        let k = index / (self.cells * self.cells);
        [i, j, k]
    }

    #[allow(clippy::cast_precision_loss)]
    pub(super) fn node_position(&self, i: usize, j: usize, k: usize) -> Point3<f64> {
        self.origin + Vector3::new(i as f64, j as f64, k as f64) * self.spacing
    }

    /// Cell containing `p` and the position of `p` inside it, each
    /// coordinate in `[0, 1]`. Points outside the grid are clamped to the
    /// nearest cell.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub(super) fn locate(&self, p: &Point3<f64>) -> ([usize; 3], [f64; 3]) {
        let mut cell = [0usize; 3];
        let mut local = [0.0; 3];
        let last = (self.cells - 1) as f64;
        for axis in 0..3 {
            let x = (p[axis] - self.origin[axis]) / self.spacing;
            let c = x.floor().clamp(0.0, last);
            cell[axis] = c as usize;
            local[axis] = (x - c).clamp(0.0, 1.0);
        }
        (cell, local)
    }

    pub(super) fn cell_of(&self, p: &Point3<f64>) -> usize {
        let ([i, j, k], _) = self.locate(p);
        self.cell_index(i, j, k)
    }

    /// The eight nodes around `p` with their trilinear weights.
    pub(super) fn weights(&self, p: &Point3<f64>) -> [(usize, f64); 8] {
        let ([i, j, k], [tx, ty, tz]) = self.locate(p);
        let mut out = [(0usize, 0.0); 8];
        for (corner, slot) in out.iter_mut().enumerate() {
            let (dx, dy, dz) = (corner & 1, (corner >> 1) & 1, (corner >> 2) & 1);
            let wx = if dx == 1 { tx } else { 1.0 - tx };
            let wy = if dy == 1 { ty } else { 1.0 - ty };
            let wz = if dz == 1 { tz } else { 1.0 - tz };
            *slot = (self.node_index(i + dx, j + dy, k + dz), wx * wy * wz);
        }
        out
    }

    /// Trilinear interpolation of per-node `values` at `p`.
    pub(super) fn sample(&self, values: &[f64], p: &Point3<f64>) -> f64 {
        self.weights(p).iter().map(|&(n, w)| values[n] * w).sum()
    }

    /// Grows a cell mask by `rings` cells in every direction, diagonals
    /// included.
    pub(super) fn dilate_cells(&self, mask: &[bool], rings: usize) -> Vec<bool> {
        let c = self.cells;
        let strides = [1, c, c * c];
        let mut current = mask.to_vec();
        for (axis, &stride) in strides.iter().enumerate() {
            let mut next = vec![false; current.len()];
            for (index, out) in next.iter_mut().enumerate() {
                let pos = self.cell_coords(index)[axis];
                let lo = pos.saturating_sub(rings);
                let hi = (pos + rings).min(c - 1);
                *out = (lo..=hi).any(|q| current[index - pos * stride + q * stride]);
            }
            current = next;
        }
        current
    }
}
