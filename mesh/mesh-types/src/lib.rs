//! Core mesh types for the depth reconstruction workspace.
//!
//! This crate provides the foundational geometry types shared by every
//! stage of the pipeline:
//!
//! - [`Vertex`] - A point in 3D space with optional normal and colour
//! - [`IndexedMesh`] - A triangle mesh with indexed vertices
//! - [`Triangle`] - A concrete triangle with vertex positions
//! - [`Aabb`] - Axis-aligned bounding box
//! - [`MeshBoundsReport`] - min/max/center/extent summary of a mesh
//!
//! # Units
//!
//! Reconstructions come from an uncalibrated camera, so coordinates are
//! relative: only the shape is meaningful, not the absolute scale.
//!
//! # Coordinate System
//!
//! Uses a **right-handed, Y-up coordinate system** with the camera at the
//! origin looking down `-Z`:
//! - X: right
//! - Y: up
//! - Z: toward the viewer
//!
//! # Example
//!
//! ```
//! use mesh_types::{Vertex, IndexedMesh, Point3, MeshTopology};
//!
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Vertex::new(Point3::new(0.0, 0.0, 0.0)));
//! mesh.vertices.push(Vertex::new(Point3::new(1.0, 0.0, 0.0)));
//! mesh.vertices.push(Vertex::new(Point3::new(0.5, 1.0, 0.0)));
//! mesh.faces.push([0, 1, 2]);
//!
//! assert_eq!(mesh.face_count(), 1);
//! assert!(!mesh.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod mesh;
mod traits;
mod triangle;
mod vertex;

pub use bounds::{Aabb, MeshBoundsReport};
pub use mesh::{unit_cube, IndexedMesh};
pub use traits::{MeshBounds, MeshTopology};
pub use triangle::Triangle;
pub use vertex::{Vertex, VertexAttributes, VertexColor};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
