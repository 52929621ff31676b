//! Non-manifold edge removal.

use mesh_types::IndexedMesh;
use tracing::trace;

use crate::adjacency::MeshAdjacency;
use crate::repair::face_area;

/// Drop faces until every edge is shared by at most two faces.
///
/// For each over-shared edge the two largest faces are kept and the rest
/// are removed, smallest first. Edges are processed in sorted order and ties
/// are broken by face order, so the result is deterministic. Removing a face
/// only lowers the counts of other edges, so a single pass suffices.
///
/// Returns the number of faces removed.
pub fn remove_non_manifold_edges(mesh: &mut IndexedMesh) -> usize {
    let adjacency = MeshAdjacency::build(&mesh.faces);
    let edges = adjacency.non_manifold_edges();
    if edges.is_empty() {
        return 0;
    }

    let areas: Vec<f64> = mesh
        .faces
        .iter()
        .map(|face| face_area(&mesh.vertices, face).unwrap_or(0.0))
        .collect();
    let mut alive = vec![true; mesh.faces.len()];

    for (v0, v1) in edges {
        let Some(faces) = adjacency.faces_for_edge(v0, v1) else {
            continue;
        };
        let mut live: Vec<usize> = faces.iter().copied().filter(|&f| alive[f]).collect();
        if live.len() <= 2 {
            continue;
        }
        live.sort_by(|&a, &b| areas[b].total_cmp(&areas[a]).then(a.cmp(&b)));
        for &f in &live[2..] {
            alive[f] = false;
        }
        trace!(v0, v1, dropped = live.len() - 2, "non-manifold edge resolved");
    }

    let original_count = mesh.faces.len();
    let mut idx = 0usize;
    mesh.faces.retain(|_| {
        let keep = alive[idx];
        idx += 1;
        keep
    });
    original_count - mesh.faces.len()
}
