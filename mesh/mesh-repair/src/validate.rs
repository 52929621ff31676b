//! Mesh health reporting.
//!
//! Counts the defects that [`cleanup_reconstruction`](crate::cleanup_reconstruction)
//! removes, without modifying the mesh.

use hashbrown::HashSet;
use mesh_types::IndexedMesh;

use crate::adjacency::MeshAdjacency;
use crate::repair::{face_area, DEFAULT_DEGENERATE_AREA};

/// Defect counts for a mesh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshReport {
    /// Number of vertices.
    pub vertex_count: usize,
    /// Number of faces.
    pub face_count: usize,
    /// Number of distinct edges.
    pub edge_count: usize,

    /// Faces referencing a missing vertex.
    pub invalid_face_count: usize,
    /// Faces with area at or below the default threshold.
    pub degenerate_face_count: usize,
    /// Faces repeating an earlier face's vertex set.
    pub duplicate_face_count: usize,
    /// Vertices sharing a position with an earlier vertex.
    pub duplicate_vertex_count: usize,
    /// Edges used by more than two faces.
    pub non_manifold_edge_count: usize,
    /// Edges used by exactly one face. Not a defect for open scans.
    pub boundary_edge_count: usize,
    /// Vertices referenced by no face.
    pub unreferenced_vertex_count: usize,
}

impl MeshReport {
    /// True if the mesh has none of the defects cleanup removes.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.invalid_face_count == 0
            && self.degenerate_face_count == 0
            && self.duplicate_face_count == 0
            && self.duplicate_vertex_count == 0
            && self.non_manifold_edge_count == 0
            && self.unreferenced_vertex_count == 0
    }

    /// True if every edge is shared by exactly two faces.
    #[must_use]
    pub const fn is_watertight(&self) -> bool {
        self.boundary_edge_count == 0 && self.non_manifold_edge_count == 0
    }
}

impl std::fmt::Display for MeshReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Mesh Report:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Faces: {}", self.face_count)?;
        writeln!(f, "  Edges: {}", self.edge_count)?;
        writeln!(f, "  Boundary edges: {}", self.boundary_edge_count)?;
        writeln!(
            f,
            "  Clean: {}",
            if self.is_clean() { "Yes" } else { "No" }
        )?;

        let issues = [
            ("Invalid faces", self.invalid_face_count),
            ("Degenerate faces", self.degenerate_face_count),
            ("Duplicate faces", self.duplicate_face_count),
            ("Duplicate vertices", self.duplicate_vertex_count),
            ("Non-manifold edges", self.non_manifold_edge_count),
            ("Unreferenced vertices", self.unreferenced_vertex_count),
        ];
        for (label, count) in issues {
            if count > 0 {
                writeln!(f, "    {label}: {count}")?;
            }
        }
        Ok(())
    }
}

/// Inspect a mesh and count its defects.
#[must_use]
pub fn validate_mesh(mesh: &IndexedMesh) -> MeshReport {
    let vertex_count = mesh.vertices.len();
    let adjacency = MeshAdjacency::build(&mesh.faces);

    let mut referenced = vec![false; vertex_count];
    let mut seen_faces: HashSet<[u32; 3]> = HashSet::with_capacity(mesh.faces.len());
    let mut report = MeshReport {
        vertex_count,
        face_count: mesh.faces.len(),
        edge_count: adjacency.edge_count(),
        non_manifold_edge_count: adjacency.non_manifold_edge_count(),
        boundary_edge_count: adjacency.boundary_edge_count(),
        ..MeshReport::default()
    };

    for face in &mesh.faces {
        match face_area(&mesh.vertices, face) {
            None => report.invalid_face_count += 1,
            Some(area) => {
                for &i in face {
                    referenced[i as usize] = true;
                }
                if area <= DEFAULT_DEGENERATE_AREA {
                    report.degenerate_face_count += 1;
                }
            }
        }
        let mut key = *face;
        key.sort_unstable();
        if !seen_faces.insert(key) {
            report.duplicate_face_count += 1;
        }
    }

    let mut positions: HashSet<[u64; 3]> = HashSet::with_capacity(vertex_count);
    for v in &mesh.vertices {
        let p = v.position;
        let key = [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()];
        if !positions.insert(key) {
            report.duplicate_vertex_count += 1;
        }
    }

    report.unreferenced_vertex_count = referenced.iter().filter(|&&r| !r).count();
    report
}
