//! Sample density estimation and low-density trimming.
//!
//! Density is the splatted sample weight per node, smoothed with a 3×3×3
//! box filter and interpolated at each extracted vertex. Vertices far from
//! every sample (the extrapolated parts of the level set) get the lowest
//! values.

use super::grid::Grid;

/// 3×3×3 mean of per-node `values`, averaging only neighbours that exist.
pub(super) fn box_blur(grid: &Grid, values: &[f64]) -> Vec<f64> {
    let n = grid.nodes();
    let strides = [1, n, n * n];
    let mut current = values.to_vec();
    for stride in strides {
        let next: Vec<f64> = (0..current.len())
            .map(|index| {
                let pos = (index / stride) % n;
                let lo = pos.saturating_sub(1);
                let hi = (pos + 1).min(n - 1);
                let base = index - pos * stride;
                let sum: f64 = (lo..=hi).map(|q| current[base + q * stride]).sum();
                #[allow(clippy::cast_precision_loss)]
                let mean = sum / (hi - lo + 1) as f64;
                mean
            })
            .collect();
        current = next;
    }
    current
}

/// The `q` quantile of `values` with linear interpolation between order
/// statistics. `values` must not be empty.
pub(super) fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    #[allow(clippy::cast_precision_loss)]
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    #[allow(clippy::cast_precision_loss)]
    let t = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * t
}

/// Removes vertices whose density is below the `q` quantile, dropping the
/// faces that used them and compacting the rest.
///
/// Returns the number of vertices removed.
pub(super) fn trim_low_density<V>(
    vertices: &mut Vec<V>,
    faces: &mut Vec<[u32; 3]>,
    densities: &[f64],
    q: f64,
) -> usize {
    if vertices.is_empty() || q <= 0.0 {
        return 0;
    }
    let threshold = quantile(densities, q);

    let mut remap = vec![u32::MAX; vertices.len()];
    let mut next = 0u32;
    for (slot, &density) in remap.iter_mut().zip(densities) {
        if density >= threshold {
            *slot = next;
            next += 1;
        }
    }

    let before = vertices.len();
    let mut index = 0;
    vertices.retain(|_| {
        let keep = remap[index] != u32::MAX;
        index += 1;
        keep
    });
    faces.retain_mut(|face| {
        let mapped = face.map(|v| remap[v as usize]);
        if mapped.contains(&u32::MAX) {
            return false;
        }
        *face = mapped;
        true
    });
    before - vertices.len()
}
