//! # World Module
//!
//! The world partition map: super-chunk grid coordinates to [`WorldSuperChunk`]s. Super-chunks
//! are created lazily the first time generation or an edit touches them.
//!
//! World coordinates are signed. A voxel at world coordinate `p` lives in super-chunk
//! `p.div_euclid(128)` at local coordinate `p.rem_euclid(128)`, so negative coordinates map the
//! same way positive ones do.

use std::collections::HashMap;

use cgmath::{Point3, Vector3};

use super::morton;
use super::node::VoxNode;
use super::octree::VoxelIndex;
use super::super_chunk::{WorldSuperChunk, SUPER_CHUNK_SIZE};

/// Sparse map of generated super-chunks.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use sparse_voxel_engine::engine_state::voxels::world::World;
///
/// let mut world = World::new();
/// world.create_chunk(Point3::new(0, 0, 0));
/// assert!(world.get_chunk(Point3::new(0, 0, 0)).is_some());
/// ```
#[derive(Debug, Default)]
pub struct World {
    chunks: HashMap<Point3<i32>, WorldSuperChunk>,
    /// Inclusive min and max super-chunk coordinates created so far.
    bounds: Option<(Point3<i32>, Point3<i32>)>,
}

impl World {
    pub fn new() -> Self {
        World {
            chunks: HashMap::new(),
            bounds: None,
        }
    }

    pub fn get_chunk(&self, position: Point3<i32>) -> Option<&WorldSuperChunk> {
        self.chunks.get(&position)
    }

    pub fn get_chunk_mut(&mut self, position: Point3<i32>) -> Option<&mut WorldSuperChunk> {
        self.chunks.get_mut(&position)
    }

    /// Returns the super-chunk at `position`, creating an empty one if needed.
    pub fn create_chunk(&mut self, position: Point3<i32>) -> &mut WorldSuperChunk {
        self.bounds = Some(match self.bounds {
            None => (position, position),
            Some((min, max)) => (
                Point3::new(
                    min.x.min(position.x),
                    min.y.min(position.y),
                    min.z.min(position.z),
                ),
                Point3::new(
                    max.x.max(position.x),
                    max.y.max(position.y),
                    max.z.max(position.z),
                ),
            ),
        });
        self.chunks
            .entry(position)
            .or_insert_with(|| WorldSuperChunk::new(position))
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &WorldSuperChunk> {
        self.chunks.values()
    }

    /// Existing super-chunks within a cube of `radius` super-chunks around the one containing
    /// `origin`, nearest first.
    ///
    /// # Arguments
    /// * `origin` - World-space voxel coordinate
    /// * `radius` - Half edge of the searched cube, in super-chunks
    ///
    /// # Returns
    /// `(distance, chunk)` pairs where `distance` is the floored Euclidean distance between
    /// super-chunk coordinates. Chunks at equal distance keep y, z, x scan order.
    pub fn get_chunks_around_origin(
        &self,
        origin: Point3<i32>,
        radius: i32,
    ) -> Vec<(i32, &WorldSuperChunk)> {
        let center = Self::super_chunk_of(origin);
        let mut found = Vec::new();
        for y in -radius..=radius {
            for z in -radius..=radius {
                for x in -radius..=radius {
                    let position = center + Vector3::new(x, y, z);
                    if let Some(chunk) = self.chunks.get(&position) {
                        let distance = ((x * x + y * y + z * z) as f64).sqrt().floor() as i32;
                        found.push((distance, chunk));
                    }
                }
            }
        }
        found.sort_by_key(|(distance, _)| *distance);
        found
    }

    /// Super-chunk grid coordinate containing a world voxel.
    pub fn super_chunk_of(voxel: Point3<i32>) -> Point3<i32> {
        Point3::new(
            voxel.x.div_euclid(SUPER_CHUNK_SIZE),
            voxel.y.div_euclid(SUPER_CHUNK_SIZE),
            voxel.z.div_euclid(SUPER_CHUNK_SIZE),
        )
    }

    /// Coordinate of a world voxel inside its super-chunk.
    pub fn local_of(voxel: Point3<i32>) -> (u32, u32, u32) {
        (
            voxel.x.rem_euclid(SUPER_CHUNK_SIZE) as u32,
            voxel.y.rem_euclid(SUPER_CHUNK_SIZE) as u32,
            voxel.z.rem_euclid(SUPER_CHUNK_SIZE) as u32,
        )
    }

    /// World offset of the 32³ sub-chunk containing a world voxel.
    pub fn sub_chunk_of(voxel: Point3<i32>) -> Point3<i32> {
        let edge = morton::SUB_CHUNK_EDGE as i32;
        Point3::new(
            voxel.x.div_euclid(edge) * edge,
            voxel.y.div_euclid(edge) * edge,
            voxel.z.div_euclid(edge) * edge,
        )
    }

    pub fn check_node(&self, x: i32, y: i32, z: i32) -> bool {
        let voxel = Point3::new(x, y, z);
        let (lx, ly, lz) = Self::local_of(voxel);
        self.chunks
            .get(&Self::super_chunk_of(voxel))
            .is_some_and(|chunk| chunk.octree().check_node(lx, ly, lz))
    }

    /// Tombstones the voxel at a world coordinate.
    ///
    /// # Returns
    /// `false` when no live voxel was there.
    pub fn remove_node(&mut self, x: i32, y: i32, z: i32) -> bool {
        let voxel = Point3::new(x, y, z);
        let (lx, ly, lz) = Self::local_of(voxel);
        self.chunks
            .get_mut(&Self::super_chunk_of(voxel))
            .is_some_and(|chunk| chunk.octree_mut().remove_node(lx, ly, lz))
    }

    /// Places a single voxel, creating its super-chunk if needed.
    pub fn add_node(&mut self, x: i32, y: i32, z: i32, color: [u8; 3]) {
        let voxel = Point3::new(x, y, z);
        let (lx, ly, lz) = Self::local_of(voxel);
        let [r, g, b] = color;
        self.create_chunk(Self::super_chunk_of(voxel))
            .octree_mut()
            .add_node(VoxNode::new(morton::encode(lx, ly, lz), 1, r, g, b));
    }
}

impl VoxelIndex for World {
    fn is_occupied(&self, x: i32, y: i32, z: i32) -> bool {
        self.check_node(x, y, z)
    }

    fn find_voxel(&self, x: i32, y: i32, z: i32) -> Option<VoxNode> {
        let voxel = Point3::new(x, y, z);
        let (lx, ly, lz) = Self::local_of(voxel);
        self.chunks
            .get(&Self::super_chunk_of(voxel))
            .and_then(|chunk| chunk.octree().find_node(morton::encode(lx, ly, lz)))
            .copied()
    }

    fn origin(&self) -> Point3<i32> {
        self.bounds
            .map(|(min, _)| min * SUPER_CHUNK_SIZE)
            .unwrap_or(Point3::new(0, 0, 0))
    }

    /// Smallest power-of-two cube covering every created super-chunk.
    fn depth(&self) -> u32 {
        match self.bounds {
            None => 0,
            Some((min, max)) => {
                let span = (max.x - min.x).max(max.y - min.y).max(max.z - min.z) + 1;
                ((span * SUPER_CHUNK_SIZE) as u32)
                    .next_power_of_two()
                    .trailing_zeros()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_coordinates_map_to_their_chunk() {
        assert_eq!(World::super_chunk_of(Point3::new(-1, 0, 127)), Point3::new(-1, 0, 0));
        assert_eq!(World::local_of(Point3::new(-1, 0, 127)), (127, 0, 127));
        assert_eq!(World::sub_chunk_of(Point3::new(-1, 40, 5)), Point3::new(-32, 32, 0));
    }

    #[test]
    fn chunks_around_origin_are_sorted() {
        let mut world = World::new();
        for position in [
            Point3::new(2, 0, 0),
            Point3::new(0, 0, 0),
            Point3::new(1, 0, 1),
            Point3::new(-1, 0, 0),
            Point3::new(5, 0, 0),
        ] {
            world.create_chunk(position);
        }

        let around = world.get_chunks_around_origin(Point3::new(10, 10, 10), 2);
        let distances: Vec<i32> = around.iter().map(|(distance, _)| *distance).collect();
        assert_eq!(distances, vec![0, 1, 1, 2]);
        assert_eq!(around[0].1.position(), Point3::new(0, 0, 0));
        assert!(around
            .iter()
            .all(|(_, chunk)| chunk.position() != Point3::new(5, 0, 0)));
    }

    #[test]
    fn edits_in_world_space() {
        let mut world = World::new();
        world.add_node(-3, 5, 130, [1, 1, 1]);
        assert!(world.check_node(-3, 5, 130));
        assert!(world.get_chunk(Point3::new(-1, 0, 1)).is_some());
        assert!(world.remove_node(-3, 5, 130));
        assert!(!world.check_node(-3, 5, 130));
        assert!(!world.remove_node(400, 5, 130));
    }

    #[test]
    fn index_extent_covers_all_chunks() {
        let mut world = World::new();
        world.create_chunk(Point3::new(-1, 0, 0));
        world.create_chunk(Point3::new(1, 0, 0));
        assert_eq!(world.origin(), Point3::new(-128, 0, 0));
        assert_eq!(world.extent(), 512);
    }
}
