//! # Voxel Storage and Queries
//!
//! Everything that knows where voxels are, independent of how they are drawn.
//!
//! ## Architecture
//!
//! * **Morton**: key encoding and the 32³ sub-chunk arithmetic built on it
//! * **Node**: the 12-byte voxel record and the six face directions
//! * **Octree**: the sorted sparse store with tombstone deletion
//! * **Collision**: point, box, ray and swept-box queries over any [`octree::VoxelIndex`]
//! * **Super-chunk / World**: partitioning of signed world space into 128³ stores
//! * **World generation**: noise-driven terrain fill
//!
//! ## Data Flow
//!
//! 1. The generator appends voxels to each super-chunk's store and sorts it once
//! 2. Edits go through [`world::World`], which routes them to the owning super-chunk
//! 3. The renderer reads sorted spans per sub-chunk and meshes them in the background
//!
//! ## Thread Safety
//!
//! Stores are plain owned data. Background jobs receive a copy of a sub-chunk's records, so the
//! world is only ever touched from the main thread.

pub mod collision;
pub mod morton;
pub mod node;
pub mod octree;
pub mod super_chunk;
pub mod world;
pub mod world_generation;
