//! Cleanup passes for freshly reconstructed triangle meshes.
//!
//! Surface reconstruction produces meshes with slivers, repeated triangles,
//! coincident vertices and edges shared by more than two faces. This crate
//! removes all of them so downstream stages (texturing, rendering, export)
//! only see well-formed geometry.
//!
//! After [`cleanup_reconstruction`] succeeds, the mesh satisfies:
//! - every face index is below the vertex count
//! - no face has zero area
//! - no two faces share the same vertex set
//! - no two vertices share the exact same position
//! - every edge is used by at most two faces
//! - every vertex is referenced by at least one face
//!
//! # Example
//!
//! ```
//! use mesh_types::{IndexedMesh, Vertex};
//! use mesh_repair::{cleanup_reconstruction, CleanupParams};
//!
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
//! mesh.faces.push([0, 1, 2]);
//! mesh.faces.push([2, 1, 0]); // same triangle, reversed
//!
//! let summary = cleanup_reconstruction(&mut mesh, &CleanupParams::default()).unwrap();
//! assert_eq!(summary.duplicate_faces, 1);
//! assert_eq!(mesh.faces.len(), 1);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod adjacency;
mod error;
mod manifold;
mod repair;
mod validate;

pub use adjacency::MeshAdjacency;
pub use error::{RepairError, RepairResult};
pub use manifold::remove_non_manifold_edges;
pub use repair::{
    cleanup_reconstruction, merge_duplicate_vertices, remove_degenerate_triangles,
    remove_duplicate_faces, remove_invalid_faces, remove_unreferenced_vertices, CleanupParams,
    CleanupSummary,
};
pub use validate::{validate_mesh, MeshReport};
