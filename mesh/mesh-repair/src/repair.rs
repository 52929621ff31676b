//! Individual cleanup passes and the combined post-reconstruction cleanup.

use hashbrown::{HashMap, HashSet};
use mesh_types::{IndexedMesh, Point3};
use tracing::debug;

use crate::error::{RepairError, RepairResult};
use crate::manifold::remove_non_manifold_edges;

/// Faces with an area at or below this are treated as degenerate by default.
pub const DEFAULT_DEGENERATE_AREA: f64 = 1e-12;

/// Parameters for [`cleanup_reconstruction`].
#[derive(Debug, Clone)]
pub struct CleanupParams {
    /// Faces with area at or below this threshold are removed.
    pub degenerate_area_threshold: f64,
}

impl Default for CleanupParams {
    fn default() -> Self {
        Self {
            degenerate_area_threshold: DEFAULT_DEGENERATE_AREA,
        }
    }
}

impl CleanupParams {
    /// Set the degenerate area threshold.
    #[must_use]
    pub const fn with_degenerate_area_threshold(mut self, threshold: f64) -> Self {
        self.degenerate_area_threshold = threshold;
        self
    }
}

/// Counts of what each cleanup pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    /// Faces referencing a vertex index out of range.
    pub invalid_faces: usize,
    /// Zero-area (or collinear) faces.
    pub degenerate_faces: usize,
    /// Faces repeating another face's vertex set.
    pub duplicate_faces: usize,
    /// Vertices merged into an earlier vertex at the same position.
    pub merged_vertices: usize,
    /// Faces dropped to bring every edge down to at most two faces.
    pub non_manifold_faces: usize,
    /// Vertices no longer referenced by any face.
    pub unreferenced_vertices: usize,
}

impl CleanupSummary {
    /// Total number of faces removed across all passes.
    #[must_use]
    pub const fn faces_removed(&self) -> usize {
        self.invalid_faces + self.degenerate_faces + self.duplicate_faces + self.non_manifold_faces
    }

    /// Total number of vertices removed across all passes.
    #[must_use]
    pub const fn vertices_removed(&self) -> usize {
        self.merged_vertices + self.unreferenced_vertices
    }
}

impl std::fmt::Display for CleanupSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cleanup: {} invalid, {} degenerate, {} duplicate, {} non-manifold faces removed; \
             {} vertices merged, {} unreferenced removed",
            self.invalid_faces,
            self.degenerate_faces,
            self.duplicate_faces,
            self.non_manifold_faces,
            self.merged_vertices,
            self.unreferenced_vertices
        )
    }
}

/// Run the full cleanup sequence on a reconstructed mesh.
///
/// Passes run in this order: invalid indices, degenerate faces, duplicate
/// faces, duplicate vertices (followed by another degenerate/duplicate
/// pass if any vertices merged, since merging can collapse or repeat
/// faces), non-manifold edges, and finally unreferenced vertices.
///
/// # Errors
///
/// Returns [`RepairError::EmptyMesh`] if no faces remain afterwards.
pub fn cleanup_reconstruction(
    mesh: &mut IndexedMesh,
    params: &CleanupParams,
) -> RepairResult<CleanupSummary> {
    let original_faces = mesh.faces.len();
    let threshold = params.degenerate_area_threshold;

    let mut summary = CleanupSummary {
        invalid_faces: remove_invalid_faces(mesh),
        ..CleanupSummary::default()
    };
    summary.degenerate_faces = remove_degenerate_triangles(mesh, threshold);
    summary.duplicate_faces = remove_duplicate_faces(mesh);
    summary.merged_vertices = merge_duplicate_vertices(mesh);
    if summary.merged_vertices > 0 {
        summary.degenerate_faces += remove_degenerate_triangles(mesh, threshold);
        summary.duplicate_faces += remove_duplicate_faces(mesh);
    }
    summary.non_manifold_faces = remove_non_manifold_edges(mesh);
    summary.unreferenced_vertices = remove_unreferenced_vertices(mesh);

    debug!(
        vertices = mesh.vertices.len(),
        faces = mesh.faces.len(),
        "{summary}"
    );

    if mesh.faces.is_empty() {
        return Err(RepairError::EmptyMesh {
            removed: original_faces,
        });
    }
    Ok(summary)
}

/// Remove faces that reference a vertex index outside the vertex array.
///
/// Returns the number of faces removed.
pub fn remove_invalid_faces(mesh: &mut IndexedMesh) -> usize {
    let original_count = mesh.faces.len();
    let vertex_count = mesh.vertices.len();
    mesh.faces
        .retain(|face| face.iter().all(|&i| (i as usize) < vertex_count));
    original_count - mesh.faces.len()
}

/// Area of a face, or `None` if it references a missing vertex.
pub(crate) fn face_area(vertices: &[mesh_types::Vertex], face: &[u32; 3]) -> Option<f64> {
    let p0 = vertices.get(face[0] as usize)?.position;
    let p1 = vertices.get(face[1] as usize)?.position;
    let p2 = vertices.get(face[2] as usize)?.position;
    Some((p1 - p0).cross(&(p2 - p0)).norm() * 0.5)
}

/// Remove triangles whose area is at or below `area_threshold`.
///
/// Faces with a repeated index or collinear corners have zero area and are
/// always caught. Faces with out-of-range indices are removed as well.
///
/// Returns the number of faces removed.
pub fn remove_degenerate_triangles(mesh: &mut IndexedMesh, area_threshold: f64) -> usize {
    let original_count = mesh.faces.len();
    let vertices = &mesh.vertices;

    mesh.faces.retain(|face| {
        face[0] != face[1]
            && face[1] != face[2]
            && face[0] != face[2]
            && face_area(vertices, face).is_some_and(|area| area > area_threshold)
    });

    original_count - mesh.faces.len()
}

/// Canonical key for a face's vertex set, independent of order and winding.
#[inline]
fn face_key(face: &[u32; 3]) -> [u32; 3] {
    let mut key = *face;
    key.sort_unstable();
    key
}

/// Remove faces that repeat the vertex set of an earlier face.
///
/// Two faces with the same three vertices are duplicates regardless of
/// winding. The first occurrence is kept.
///
/// Returns the number of faces removed.
pub fn remove_duplicate_faces(mesh: &mut IndexedMesh) -> usize {
    let original_count = mesh.faces.len();
    let mut seen: HashSet<[u32; 3]> = HashSet::with_capacity(original_count);
    mesh.faces.retain(|face| seen.insert(face_key(face)));
    original_count - mesh.faces.len()
}

/// Bit pattern of a position, with `-0.0` folded onto `0.0`.
fn position_key(p: &Point3<f64>) -> [u64; 3] {
    [
        (p.x + 0.0).to_bits(),
        (p.y + 0.0).to_bits(),
        (p.z + 0.0).to_bits(),
    ]
}

/// Merge vertices that share exactly the same position.
///
/// The first vertex at each position is kept (with its attributes) and
/// faces are remapped onto it. The vertex array is compacted, preserving
/// first-seen order. Faces may end up with a repeated index; run
/// [`remove_degenerate_triangles`] afterwards to drop them.
///
/// Returns the number of vertices merged away.
#[allow(clippy::cast_possible_truncation)]
pub fn merge_duplicate_vertices(mesh: &mut IndexedMesh) -> usize {
    let original_count = mesh.vertices.len();
    let mut first_at: HashMap<[u64; 3], u32> = HashMap::with_capacity(original_count);
    let mut remap: Vec<u32> = Vec::with_capacity(original_count);
    let mut kept = Vec::with_capacity(original_count);

    for vertex in mesh.vertices.drain(..) {
        let next = kept.len() as u32;
        let target = *first_at.entry(position_key(&vertex.position)).or_insert(next);
        if target == next {
            kept.push(vertex);
        }
        remap.push(target);
    }
    mesh.vertices = kept;

    let merged = original_count - mesh.vertices.len();
    if merged > 0 {
        remap_faces(&mut mesh.faces, &remap);
    }
    merged
}

/// Rewrite face indices through `remap`, dropping faces with indices
/// outside it.
fn remap_faces(faces: &mut Vec<[u32; 3]>, remap: &[u32]) {
    faces.retain_mut(|face| {
        for index in face.iter_mut() {
            match remap.get(*index as usize) {
                Some(&new) if new != u32::MAX => *index = new,
                _ => return false,
            }
        }
        true
    });
}

/// Remove vertices not referenced by any face and compact the indices.
///
/// Returns the number of vertices removed.
#[allow(clippy::cast_possible_truncation)]
pub fn remove_unreferenced_vertices(mesh: &mut IndexedMesh) -> usize {
    let original_count = mesh.vertices.len();
    let mut referenced = vec![false; original_count];
    for face in &mesh.faces {
        for &i in face {
            if let Some(slot) = referenced.get_mut(i as usize) {
                *slot = true;
            }
        }
    }

    let mut remap = vec![u32::MAX; original_count];
    let mut next = 0u32;
    for (old, &used) in referenced.iter().enumerate() {
        if used {
            remap[old] = next;
            next += 1;
        }
    }
    if next as usize == original_count {
        return 0;
    }

    let mut old_index = 0usize;
    mesh.vertices.retain(|_| {
        let keep = referenced[old_index];
        old_index += 1;
        keep
    });
    remap_faces(&mut mesh.faces, &remap);

    original_count - mesh.vertices.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{unit_cube, Vertex, VertexColor};

    fn tri(mesh: &mut IndexedMesh, a: [f64; 3], b: [f64; 3], c: [f64; 3]) {
        let base = mesh.vertices.len() as u32;
        for p in [a, b, c] {
            mesh.vertices.push(Vertex::from_coords(p[0], p[1], p[2]));
        }
        mesh.faces.push([base, base + 1, base + 2]);
    }

    #[test]
    fn degenerate_removes_collinear_and_repeated() {
        let mut mesh = IndexedMesh::new();
        tri(&mut mesh, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        tri(&mut mesh, [0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]);
        mesh.faces.push([0, 0, 1]);

        let removed = remove_degenerate_triangles(&mut mesh, DEFAULT_DEGENERATE_AREA);
        assert_eq!(removed, 2);
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn duplicate_faces_ignore_winding() {
        let mut mesh = unit_cube();
        let first = mesh.faces[0];
        mesh.faces.push([first[2], first[1], first[0]]);
        mesh.faces.push([first[1], first[2], first[0]]);

        assert_eq!(remove_duplicate_faces(&mut mesh), 2);
        assert_eq!(mesh.faces.len(), 12);
        assert_eq!(mesh.faces[0], first);
    }

    #[test]
    fn merge_exact_duplicates_and_remap() {
        let mut mesh = IndexedMesh::new();
        // Two triangles sharing an edge, but with the shared vertices repeated
        tri(&mut mesh, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        tri(&mut mesh, [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]);
        mesh.vertices[3].attributes.color = Some(VertexColor::WHITE);

        let merged = merge_duplicate_vertices(&mut mesh);
        assert_eq!(merged, 2);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [1, 3, 2]]);
        // First occurrence keeps its own (absent) colour
        assert_eq!(mesh.vertices[1].attributes.color, None);
    }

    #[test]
    fn merge_treats_signed_zero_as_equal() {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(-0.0, 0.0, -0.0));
        assert_eq!(merge_duplicate_vertices(&mut mesh), 1);
    }

    #[test]
    fn merge_keeps_near_but_distinct_positions() {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1e-12, 0.0, 0.0));
        assert_eq!(merge_duplicate_vertices(&mut mesh), 0);
    }

    #[test]
    fn unreferenced_vertices_are_compacted() {
        let mut mesh = IndexedMesh::new();
        for i in 0..5 {
            mesh.vertices.push(Vertex::from_coords(f64::from(i), f64::from(i * i), 0.0));
        }
        mesh.faces.push([1, 3, 4]);

        assert_eq!(remove_unreferenced_vertices(&mut mesh), 2);
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
        assert!((mesh.vertices[0].position.x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn invalid_faces_are_dropped() {
        let mut mesh = unit_cube();
        mesh.faces.push([0, 1, 99]);
        assert_eq!(remove_invalid_faces(&mut mesh), 1);
        assert_eq!(mesh.faces.len(), 12);
    }

    #[test]
    fn cleanup_clean_mesh_is_noop() {
        let mut mesh = unit_cube();
        let summary = cleanup_reconstruction(&mut mesh, &CleanupParams::default()).unwrap();
        assert_eq!(summary, CleanupSummary::default());
        assert_eq!(mesh, unit_cube());
    }

    #[test]
    fn cleanup_handles_merge_induced_duplicates() {
        let mut mesh = IndexedMesh::new();
        tri(&mut mesh, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        tri(&mut mesh, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);

        let summary = cleanup_reconstruction(&mut mesh, &CleanupParams::default()).unwrap();
        assert_eq!(summary.merged_vertices, 3);
        assert_eq!(summary.duplicate_faces, 1);
        assert_eq!(mesh.faces.len(), 1);
        assert_eq!(mesh.vertices.len(), 3);
    }

    #[test]
    fn cleanup_of_only_degenerate_faces_is_an_error() {
        let mut mesh = IndexedMesh::new();
        tri(&mut mesh, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]);
        let err = cleanup_reconstruction(&mut mesh, &CleanupParams::default()).unwrap_err();
        assert!(matches!(err, RepairError::EmptyMesh { removed: 1 }));
    }

    #[test]
    fn summary_display() {
        let summary = CleanupSummary {
            degenerate_faces: 3,
            merged_vertices: 2,
            ..CleanupSummary::default()
        };
        let text = summary.to_string();
        assert!(text.starts_with("Cleanup:"));
        assert!(text.contains("3 degenerate"));
        assert!(text.contains("2 vertices merged"));
        assert_eq!(summary.faces_removed(), 3);
        assert_eq!(summary.vertices_removed(), 2);
    }
}
