//! Property-based tests for the cleanup passes.
//!
//! Random meshes are drawn from a coarse integer lattice so that duplicate
//! vertices, collinear corners, repeated faces and over-shared edges all
//! show up often.
//!
//! Run with: cargo test -p mesh-repair -- proptest

use hashbrown::HashSet;
use mesh_repair::{
    cleanup_reconstruction, merge_duplicate_vertices, remove_duplicate_faces,
    remove_non_manifold_edges, validate_mesh, CleanupParams, MeshAdjacency, RepairError,
};
use mesh_types::{IndexedMesh, Vertex};
use proptest::prelude::*;

// =============================================================================
// Strategies for generating random meshes
// =============================================================================

/// Lattice position with few distinct values per axis.
fn arb_position() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3(-2i32..=2).prop_map(|p| p.map(f64::from))
}

fn arb_vertex() -> impl Strategy<Value = Vertex> {
    arb_position().prop_map(|[x, y, z]| Vertex::from_coords(x, y, z))
}

/// Random mesh whose face indices may run up to two past the vertex count.
fn arb_mesh(
    min_vertices: usize,
    max_vertices: usize,
    min_faces: usize,
    max_faces: usize,
) -> impl Strategy<Value = IndexedMesh> {
    (min_vertices..=max_vertices).prop_flat_map(move |num_vertices| {
        prop::collection::vec(arb_vertex(), num_vertices).prop_flat_map(move |verts| {
            #[allow(clippy::cast_possible_truncation)]
            let n = verts.len() as u32;
            let face = prop::array::uniform3(0..n + 2);
            prop::collection::vec(face, min_faces..=max_faces).prop_map(move |faces| {
                IndexedMesh {
                    vertices: verts.clone(),
                    faces,
                }
            })
        })
    })
}

fn sorted(face: &[u32; 3]) -> [u32; 3] {
    let mut key = *face;
    key.sort_unstable();
    key
}

// =============================================================================
// Property Tests: Full cleanup
// =============================================================================

proptest! {
    /// Every post-cleanup invariant holds, or cleanup reports an empty mesh.
    #[test]
    fn cleanup_establishes_invariants(mesh in arb_mesh(3, 40, 1, 80)) {
        let mut cleaned = mesh.clone();
        match cleanup_reconstruction(&mut cleaned, &CleanupParams::default()) {
            Err(RepairError::EmptyMesh { removed }) => {
                prop_assert!(cleaned.faces.is_empty());
                prop_assert_eq!(removed, mesh.faces.len());
            }
            Ok(_) => {
                #[allow(clippy::cast_possible_truncation)]
                let n = cleaned.vertices.len() as u32;
                let mut sets = HashSet::new();
                for face in &cleaned.faces {
                    prop_assert!(face.iter().all(|&i| i < n));
                    let [a, b, c] = face.map(|i| cleaned.vertices[i as usize].position);
                    prop_assert!((b - a).cross(&(c - a)).norm() > 0.0);
                    prop_assert!(sets.insert(sorted(face)), "duplicate face {:?}", face);
                }
                prop_assert!(MeshAdjacency::build(&cleaned.faces).max_faces_per_edge() <= 2);
                prop_assert!(validate_mesh(&cleaned).is_clean());
            }
        }
    }

    /// Running cleanup on an already clean mesh changes nothing.
    #[test]
    fn cleanup_is_idempotent(mesh in arb_mesh(3, 30, 1, 60)) {
        let mut once = mesh;
        if cleanup_reconstruction(&mut once, &CleanupParams::default()).is_ok() {
            let mut twice = once.clone();
            let summary = cleanup_reconstruction(&mut twice, &CleanupParams::default()).unwrap();
            prop_assert_eq!(summary.faces_removed(), 0);
            prop_assert_eq!(summary.vertices_removed(), 0);
            prop_assert_eq!(once, twice);
        }
    }

    /// Cleanup never adds geometry.
    #[test]
    fn cleanup_never_grows(mesh in arb_mesh(3, 30, 0, 60)) {
        let mut cleaned = mesh.clone();
        let _ = cleanup_reconstruction(&mut cleaned, &CleanupParams::default());
        prop_assert!(cleaned.vertices.len() <= mesh.vertices.len());
        prop_assert!(cleaned.faces.len() <= mesh.faces.len());
    }
}

// =============================================================================
// Property Tests: Individual passes
// =============================================================================

proptest! {
    /// Merging leaves exactly one vertex per distinct position.
    #[test]
    fn merge_leaves_unique_positions(mesh in arb_mesh(1, 60, 0, 0)) {
        let distinct: HashSet<[i64; 3]> = mesh
            .vertices
            .iter()
            .map(|v| {
                #[allow(clippy::cast_possible_truncation)]
                let key = [v.position.x as i64, v.position.y as i64, v.position.z as i64];
                key
            })
            .collect();
        let mut merged = mesh.clone();
        let removed = merge_duplicate_vertices(&mut merged);
        prop_assert_eq!(merged.vertices.len(), distinct.len());
        prop_assert_eq!(removed + distinct.len(), mesh.vertices.len());
    }

    /// Non-manifold removal never touches a mesh that is already manifold,
    /// and always produces one.
    #[test]
    fn non_manifold_removal(mesh in arb_mesh(3, 20, 1, 60)) {
        let mut mesh = mesh;
        let n = mesh.vertices.len();
        mesh.faces.retain(|f| f.iter().all(|&i| (i as usize) < n));
        let was_manifold = MeshAdjacency::build(&mesh.faces).is_manifold();
        let removed = remove_non_manifold_edges(&mut mesh);
        prop_assert!(MeshAdjacency::build(&mesh.faces).is_manifold());
        if was_manifold {
            prop_assert_eq!(removed, 0);
        }
    }

    /// Duplicate removal keeps exactly one face per vertex set.
    #[test]
    fn duplicate_removal_keeps_one_per_set(mesh in arb_mesh(3, 10, 1, 60)) {
        let distinct: HashSet<[u32; 3]> = mesh.faces.iter().map(sorted).collect();
        let mut deduped = mesh;
        remove_duplicate_faces(&mut deduped);
        prop_assert_eq!(deduped.faces.len(), distinct.len());
    }
}

// =============================================================================
// Fixed meshes
// =============================================================================

#[test]
fn cube_cleanup_is_stable() {
    let cube = mesh_types::unit_cube();
    let mut cleaned = cube.clone();
    let summary = cleanup_reconstruction(&mut cleaned, &CleanupParams::default()).unwrap();
    assert_eq!(summary.faces_removed(), 0);
    assert_eq!(cleaned, cube);
}

#[test]
fn empty_mesh_is_an_error() {
    let mut mesh = IndexedMesh::new();
    assert!(matches!(
        cleanup_reconstruction(&mut mesh, &CleanupParams::default()),
        Err(RepairError::EmptyMesh { removed: 0 })
    ));
}
