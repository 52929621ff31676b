//! Single-view reconstruction jobs.
//!
//! [`reconstruct_job`] turns one photograph and its depth map into a
//! textured triangle mesh, using the stages of `mesh-depth`, `mesh-scan`
//! and `mesh-repair`, and writes:
//!
//! - `{job}_pointcloud.ply`
//! - `{job}_mesh.ply` and `{job}_mesh.obj` (configurable)
//!
//! Every tunable lives in one [`PipelineConfig`] passed to the job.
//! Failures come back as a [`PipelineError`] whose [`ErrorKind`] tells the
//! caller whether to fix the input, change parameters or look at storage.

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod error;
mod inputs;
mod job;

pub use config::PipelineConfig;
pub use error::{ErrorKind, PipelineError, PipelineResult};
pub use inputs::{load_depth_map, load_image, load_mask};
pub use job::{reconstruct_job, ReconstructionResult, ReconstructionStats};
