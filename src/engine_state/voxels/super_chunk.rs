//! # Super-Chunk Module
//!
//! A super-chunk is a 128³ region of the world with its own voxel store. It is the unit of world
//! partitioning and generation; the renderer cuts it into 32³ sub-chunks for meshing.

use cgmath::{Point3, Vector3};

use super::morton;
use super::octree::MortonOctree;

/// Edge length of a super-chunk in voxels.
pub const SUPER_CHUNK_SIZE: i32 = 128;

/// log2 of [`SUPER_CHUNK_SIZE`]; the depth of each super-chunk's store.
pub const SUPER_CHUNK_DEPTH: u32 = 7;

/// Number of sub-chunks along one edge of a super-chunk.
pub const SUB_CHUNKS_PER_EDGE: i32 = SUPER_CHUNK_SIZE / morton::SUB_CHUNK_EDGE as i32;

/// One 128³ region of the world and its voxels, keyed by local coordinates.
#[derive(Debug, Clone)]
pub struct WorldSuperChunk {
    position: Point3<i32>,
    octree: MortonOctree,
}

impl WorldSuperChunk {
    /// Creates an empty super-chunk at super-chunk grid coordinate `position`.
    pub fn new(position: Point3<i32>) -> Self {
        WorldSuperChunk {
            position,
            octree: MortonOctree::with_depth(SUPER_CHUNK_DEPTH),
        }
    }

    /// Super-chunk grid coordinate.
    pub fn position(&self) -> Point3<i32> {
        self.position
    }

    /// World-space voxel coordinate of the minimum corner.
    pub fn world_offset(&self) -> Point3<i32> {
        self.position * SUPER_CHUNK_SIZE
    }

    pub fn octree(&self) -> &MortonOctree {
        &self.octree
    }

    pub fn octree_mut(&mut self) -> &mut MortonOctree {
        &mut self.octree
    }

    /// World-space voxel coordinate of the minimum corner of the sub-chunk starting at
    /// `chunk_key`.
    pub fn sub_chunk_world_offset(&self, chunk_key: u32) -> Point3<i32> {
        let local = morton::decode_point(morton::get_chunk(chunk_key));
        self.world_offset() + Vector3::new(local.x as i32, local.y as i32, local.z as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::morton::encode;

    #[test]
    fn offsets_scale_with_position() {
        let chunk = WorldSuperChunk::new(Point3::new(-1, 0, 2));
        assert_eq!(chunk.world_offset(), Point3::new(-128, 0, 256));
        assert_eq!(
            chunk.sub_chunk_world_offset(encode(33, 70, 5)),
            Point3::new(-128 + 32, 64, 256)
        );
        assert_eq!(chunk.octree().size(), 128);
        assert_eq!(SUB_CHUNKS_PER_EDGE, 4);
    }
}
