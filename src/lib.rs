#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Sparse Voxel Engine
//!
//! Storage, collision and background meshing for large, sparse voxel worlds.
//!
//! Voxels live in sorted vectors of Morton-keyed runs, one per 128³ super-chunk. The renderer
//! cuts super-chunks into 32³ sub-chunks, meshes them on worker threads with a greedy mesher and
//! hands the results to a [`engine_state::buffer_state::RenderBackend`] on the owning thread,
//! double-buffered so that a sub-chunk always has a complete mesh to draw.
//!
//! ## Key Modules
//!
//! * `core` - Shared resource handles used across threads
//! * `engine_state` - The engine façade, configuration, voxels, rendering and task management
//!
//! ## Usage
//!
//! ```rust
//! use sparse_voxel_engine::engine_state::{
//!     buffer_state::HeadlessBufferState, config::EngineConfig, EngineState,
//! };
//!
//! let mut engine = EngineState::new(EngineConfig::default(), HeadlessBufferState::new());
//! engine.add_voxel(3, 3, 3, [204, 3, 2]);
//! engine.schedule_visible_chunks();
//! while engine.pending_meshing_jobs() > 0 {
//!     engine.tick();
//! }
//! assert_eq!(engine.render(), 1);
//! ```
//!
//! ## Performance Considerations
//!
//! * Runs of consecutive keys are stored as one record
//! * Greedy meshing merges coplanar same-coloured faces into single quads
//! * Meshing runs on a fixed worker pool; the owning thread only uploads and swaps

use log::info;

pub mod core;
pub mod engine_state;

/// Initializes `env_logger` on stdout, filtered by `RUST_LOG`.
///
/// Library code never initializes logging itself; binaries call this once at startup.
pub fn init_logger() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");
}
