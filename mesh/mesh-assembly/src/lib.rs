//! Composing several meshes into one scene.
//!
//! Each [`ScenePart`] is scaled about its own centroid, then translated,
//! and the placed parts are merged in order into a single
//! [`IndexedMesh`](mesh_types::IndexedMesh).
//!
//! - [`compose`] - Merge in memory
//! - [`compose_and_save`] - Merge and write with `mesh-io`
//! - [`compose_files`] - Load, merge and write `{name}_combined.<ext>`

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod part;
mod scene;

pub use error::{AssemblyError, AssemblyResult};
pub use part::{SceneFile, ScenePart};
pub use scene::{compose, compose_and_save, compose_files, CompositionReport};
