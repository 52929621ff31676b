//! Edge-to-face adjacency.

use hashbrown::HashMap;

/// Undirected edge as `(smaller, larger)` vertex index.
pub type Edge = (u32, u32);

/// Maps every undirected edge to the faces that use it.
#[derive(Debug, Clone)]
pub struct MeshAdjacency {
    edge_to_faces: HashMap<Edge, Vec<usize>>,
}

impl MeshAdjacency {
    /// Build adjacency for a face list.
    #[must_use]
    pub fn build(faces: &[[u32; 3]]) -> Self {
        let mut edge_to_faces: HashMap<Edge, Vec<usize>> = HashMap::with_capacity(faces.len() * 2);

        for (face_idx, face) in faces.iter().enumerate() {
            for edge in face_edges(face) {
                edge_to_faces.entry(edge).or_default().push(face_idx);
            }
        }

        Self { edge_to_faces }
    }

    /// Faces sharing the edge between `v0` and `v1`, in face order.
    #[must_use]
    pub fn faces_for_edge(&self, v0: u32, v1: u32) -> Option<&[usize]> {
        self.edge_to_faces
            .get(&normalize_edge(v0, v1))
            .map(Vec::as_slice)
    }

    /// Number of edges used by exactly one face.
    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_to_faces
            .values()
            .filter(|faces| faces.len() == 1)
            .count()
    }

    /// Edges used by more than two faces, sorted for deterministic processing.
    #[must_use]
    pub fn non_manifold_edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .edge_to_faces
            .iter()
            .filter(|(_, faces)| faces.len() > 2)
            .map(|(&edge, _)| edge)
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Number of edges used by more than two faces.
    #[must_use]
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edge_to_faces
            .values()
            .filter(|faces| faces.len() > 2)
            .count()
    }

    /// Largest number of faces sharing any one edge.
    #[must_use]
    pub fn max_faces_per_edge(&self) -> usize {
        self.edge_to_faces.values().map(Vec::len).max().unwrap_or(0)
    }

    /// True if no edge is shared by more than two faces.
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.max_faces_per_edge() <= 2
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_to_faces.len()
    }
}

#[inline]
fn normalize_edge(v0: u32, v1: u32) -> Edge {
    if v0 < v1 {
        (v0, v1)
    } else {
        (v1, v0)
    }
}

#[inline]
pub(crate) fn face_edges(face: &[u32; 3]) -> [Edge; 3] {
    [
        normalize_edge(face[0], face[1]),
        normalize_edge(face[1], face[2]),
        normalize_edge(face[2], face[0]),
    ]
}
