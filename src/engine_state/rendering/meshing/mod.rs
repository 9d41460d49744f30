//! Mesh generation for voxel sub-chunks.
//!
//! [`ChunkMesher`] turns the records of one 32³ sub-chunk into a [`VoxelMesh`]:
//! 1. The records are expanded into a dense occupancy grid with one colour per cell
//! 2. For each plane (XY, XZ, YZ) and each of the 32 slices along the remaining axis, a 32×32
//!    mask of visible front and back faces is built
//! 3. Each mask is greedily merged into rectangles, one quad per rectangle
//!
//! Faces on the sub-chunk border are always emitted; neighbouring sub-chunks are not consulted.
//!
//! # Performance Considerations
//! - Greedy meshing turns a solid single-colour region into one quad per outer face
//! - The dense grid is a bit vector plus a colour array, reused across calls

use bitvec::prelude::BitVec;
use log::trace;
use web_time::Instant;

pub mod mesh;

pub use mesh::*;

use crate::engine_state::voxels::morton::{
    self, LOCAL_VOXEL_MASK, SUB_CHUNK_EDGE, VOXELS_IN_CHUNK,
};
use crate::engine_state::voxels::node::VoxNode;

const EDGE: i32 = SUB_CHUNK_EDGE as i32;

#[inline]
fn cell_index(x: u32, y: u32, z: u32) -> usize {
    ((x * SUB_CHUNK_EDGE + y) * SUB_CHUNK_EDGE + z) as usize
}

/// Reusable greedy mesher for 32³ sub-chunks.
pub struct ChunkMesher {
    solid: BitVec,
    colors: Vec<[u8; 3]>,
    mask: Box<SliceMask>,
    faces: Vec<Face>,
}

impl Default for ChunkMesher {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkMesher {
    pub fn new() -> Self {
        let mut solid = BitVec::with_capacity(VOXELS_IN_CHUNK as usize);
        solid.resize(VOXELS_IN_CHUNK as usize, false);
        ChunkMesher {
            solid,
            colors: vec![[0; 3]; VOXELS_IN_CHUNK as usize],
            mask: Box::new([[MaskCell::default(); MASK_EDGE]; MASK_EDGE]),
            faces: Vec::new(),
        }
    }

    /// Meshes the records of one sub-chunk.
    ///
    /// `nodes` must all lie in the same sub-chunk; their keys are reduced to local coordinates.
    /// Tombstones are ignored. The output depends only on the occupied cells and their colours.
    pub fn build_chunk(&mut self, nodes: &[VoxNode]) -> VoxelMesh {
        let mut mesh = VoxelMesh::new();
        self.build_chunk_into(nodes, &mut mesh);
        mesh
    }

    /// Like [`ChunkMesher::build_chunk`], appending to an existing mesh.
    pub fn build_chunk_into(&mut self, nodes: &[VoxNode], mesh: &mut VoxelMesh) {
        let Some(first) = nodes.first() else {
            return;
        };
        let start = Instant::now();
        let chunk_key = morton::get_chunk(first.start);

        self.clear_build_nodes();
        for node in nodes.iter().filter(|node| node.is_alive()) {
            assert!(
                morton::get_chunk(node.start) == chunk_key
                    && morton::get_chunk(node.end() - 1) == chunk_key,
                "node {} (size {}) is outside sub-chunk {}",
                node.start,
                node.size,
                chunk_key
            );
            self.set_build_node(node);
        }

        self.greedy_build_chunk(mesh);
        trace!(
            "Meshed sub-chunk {} into {} quads in {:?}",
            chunk_key,
            mesh.quad_count(),
            start.elapsed()
        );
    }

    fn clear_build_nodes(&mut self) {
        self.solid.fill(false);
    }

    fn set_build_node(&mut self, node: &VoxNode) {
        for key in node.start..node.end() {
            let (x, y, z) = morton::decode(key & LOCAL_VOXEL_MASK);
            let index = cell_index(x, y, z);
            self.solid.set(index, true);
            self.colors[index] = node.color();
        }
    }

    /// `true` for an occupied cell. Cells outside the sub-chunk are empty.
    fn check_build_node(&self, x: i32, y: i32, z: i32) -> bool {
        if !(0..EDGE).contains(&x) || !(0..EDGE).contains(&y) || !(0..EDGE).contains(&z) {
            return false;
        }
        self.solid[cell_index(x as u32, y as u32, z as u32)]
    }

    fn build_slice_mask(&mut self, plane: FacePlane, slice: u32) {
        for v in 0..SUB_CHUNK_EDGE {
            for u in 0..SUB_CHUNK_EDGE {
                let (x, y, z) = plane.cell(slice, u, v);
                let index = cell_index(x, y, z);
                if !self.solid[index] {
                    self.mask[v as usize][u as usize] = MaskCell::default();
                    continue;
                }

                let (x, y, z) = (x as i32, y as i32, z as i32);
                let (front, back) = match plane {
                    FacePlane::XY => (
                        !self.check_build_node(x, y, z + 1),
                        !self.check_build_node(x, y, z - 1),
                    ),
                    FacePlane::XZ => (
                        !self.check_build_node(x, y + 1, z),
                        !self.check_build_node(x, y - 1, z),
                    ),
                    FacePlane::YZ => (
                        !self.check_build_node(x + 1, y, z),
                        !self.check_build_node(x - 1, y, z),
                    ),
                };
                self.mask[v as usize][u as usize] = MaskCell {
                    front,
                    back,
                    color: self.colors[index],
                };
            }
        }
    }

    fn greedy_build_chunk(&mut self, mesh: &mut VoxelMesh) {
        self.faces.clear();
        for plane in FacePlane::all() {
            for slice in 0..SUB_CHUNK_EDGE {
                self.build_slice_mask(plane, slice);
                build_faces_from_mask(&mut self.mask, plane, slice, true, &mut self.faces);
                build_faces_from_mask(&mut self.mask, plane, slice, false, &mut self.faces);
            }
        }

        for face in &self.faces {
            mesh.add_face(face);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::morton::encode;

    fn cube(edge: u32, color: [u8; 3]) -> Vec<VoxNode> {
        let mut nodes = Vec::new();
        for x in 0..edge {
            for y in 0..edge {
                for z in 0..edge {
                    let [r, g, b] = color;
                    nodes.push(VoxNode::new(encode(x, y, z), 1, r, g, b));
                }
            }
        }
        nodes.sort();
        nodes
    }

    #[test]
    fn empty_input_gives_empty_mesh() {
        assert!(ChunkMesher::new().build_chunk(&[]).is_empty());
    }

    #[test]
    fn single_voxel_has_six_quads() {
        let mesh = ChunkMesher::new().build_chunk(&[VoxNode::new(encode(3, 4, 5), 1, 1, 2, 3)]);
        assert_eq!(mesh.quad_count(), 6);
        assert_eq!(mesh.index_count(), 36);
        for vertex in &mesh.vertices {
            assert!((3.0..=4.0).contains(&vertex[0]));
            assert!((4.0..=5.0).contains(&vertex[1]));
            assert!((5.0..=6.0).contains(&vertex[2]));
        }
    }

    #[test]
    fn solid_cube_collapses_to_six_quads() {
        let mesh = ChunkMesher::new().build_chunk(&cube(32, [9, 9, 9]));
        assert_eq!(mesh.quad_count(), 6);
        assert!(mesh.uvs.iter().all(|uv| uv[2] == 9.0));
    }

    #[test]
    fn runs_are_expanded() {
        let run = VoxNode::new(encode(0, 0, 0), 8, 5, 5, 5);
        let mesh = ChunkMesher::new().build_chunk(&[run]);
        // the first 8 keys form a 2×2×2 cube
        assert_eq!(mesh.quad_count(), 6);
        assert!(mesh.vertices.iter().flatten().all(|&c| c == 0.0 || c == 2.0));
    }

    #[test]
    fn tombstones_are_skipped() {
        let mut nodes = cube(2, [1, 1, 1]);
        nodes[0] = VoxNode::tombstone(nodes[0].start);
        let mesh = ChunkMesher::new().build_chunk(&nodes);
        // the missing corner splits three outer faces and exposes three inner ones
        assert!(mesh.quad_count() > 6);
    }

    #[test]
    fn meshing_is_idempotent() {
        let mut rng = fastrand::Rng::with_seed(11);
        let mut nodes = Vec::new();
        for key in 0..VOXELS_IN_CHUNK {
            if rng.f32() < 0.3 {
                let shade = rng.u8(0..3);
                nodes.push(VoxNode::new(key, 1, shade, shade, shade));
            }
        }

        let mut mesher = ChunkMesher::new();
        let first = mesher.build_chunk(&nodes);
        let second = mesher.build_chunk(&nodes);
        let fresh = ChunkMesher::new().build_chunk(&nodes);
        assert_eq!(first, second);
        assert_eq!(first, fresh);
    }

    #[test]
    fn two_colours_split_faces() {
        let mut nodes = cube(2, [1, 1, 1]);
        for node in nodes.iter_mut().filter(|node| morton::decode(node.start).0 == 1) {
            node.g = 2;
        }
        let mesh = ChunkMesher::new().build_chunk(&nodes);
        // ±x faces stay whole, the four faces spanning x split in two
        assert_eq!(mesh.quad_count(), 2 + 4 * 2);
    }

    #[test]
    #[should_panic]
    fn nodes_from_two_sub_chunks_are_rejected() {
        ChunkMesher::new().build_chunk(&[
            VoxNode::with_texture(encode(0, 0, 0), 1),
            VoxNode::with_texture(encode(40, 0, 0), 1),
        ]);
    }
}
