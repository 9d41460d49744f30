//! Background tasks for the rendering system.
//!
//! # Available Tasks
//! - `MesherBackgroundJob`: meshes a copy of one sub-chunk's voxels and swaps the result in

pub mod mesher_background_job;

pub use mesher_background_job::MesherBackgroundJob;
