//! Software rendering of meshes into looping animations.
//!
//! - [`create_turntable`] - The mesh spins once about its vertical axis
//! - [`create_orbit`] - The camera circles the mesh at a fixed elevation
//! - [`export_info`] - Size, dimensions and frame count of an export
//!
//! Rendering is a CPU rasterizer with flat Lambert shading over the vertex
//! colours, so the output needs no GPU or window system. Frames are drawn
//! in parallel. A frame that cannot be drawn is replaced by
//! [`placeholder_frame`] rather than failing the export.
//!
//! # Example
//!
//! ```
//! use mesh_turntable::{render_turntable, TurntableConfig};
//! use mesh_types::unit_cube;
//!
//! let config = TurntableConfig::default().with_frames(4).with_resolution(32, 24);
//! let rendered = render_turntable(&unit_cube(), &config).unwrap();
//! assert_eq!(rendered.frames.len(), 4);
//! assert_eq!(rendered.placeholders, 0);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod animation;
mod error;
mod info;
mod orbit;
mod placeholder;
mod raster;
mod turntable;

pub use animation::{frame_delay, write_gif, AnimationFormat};
pub use error::{RenderError, RenderResult};
pub use info::{export_info, ExportInfo};
pub use orbit::{create_orbit, render_orbit, OrbitConfig};
pub use placeholder::placeholder_frame;
pub use turntable::{
    create_turntable, load_scene, render_turntable, turntable_angles, RenderReport, RenderedFrames,
    TurntableConfig,
};
