//! Rendering system for the voxel engine.
//!
//! Everything between the voxel store and the render backend: the greedy mesher, the per
//! sub-chunk double-buffered render state, the background meshing job and the
//! [`WorldRenderer`] that schedules jobs and issues draws.

pub mod meshing;
pub mod sub_chunk;
pub mod tasks;
pub mod world_renderer;

// Re-export commonly used types
pub use sub_chunk::{MeshBuffer, MeshBufferState, WorldSubChunk};
pub use world_renderer::{DrawParameters, SubChunkView, WorldRenderer};
