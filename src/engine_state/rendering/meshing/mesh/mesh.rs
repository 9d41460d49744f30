//! CPU-side geometry produced by the mesher, laid out as four parallel attribute streams.

use super::face::Face;

/// Number of attribute buffers a [`VoxelMesh`] uploads into.
pub const MESH_ATTRIBUTE_COUNT: usize = 4;

/// Indexed triangle geometry in sub-chunk local space.
///
/// `vertices`, `uvs` and `normals` are parallel arrays; every quad adds four entries to each and
/// six entries to `indices`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoxelMesh {
    pub indices: Vec<u32>,
    pub vertices: Vec<[f32; 3]>,
    /// `(u, v, texture_id)` per vertex.
    pub uvs: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
}

impl VoxelMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the four corners and two triangles of `face`.
    pub fn add_face(&mut self, face: &Face) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(face.corners());
        self.uvs.extend(face.uvs());
        self.normals.extend([face.normal(); 4]);
        self.indices.extend(face.indices(base));
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn clear(&mut self) {
        self.indices.clear();
        self.vertices.clear();
        self.uvs.clear();
        self.normals.clear();
    }

    /// Raw bytes of each attribute stream, in buffer order: indices, positions, UVs, normals.
    pub fn attribute_bytes(&self) -> [&[u8]; MESH_ATTRIBUTE_COUNT] {
        [
            bytemuck::cast_slice(&self.indices),
            bytemuck::cast_slice(&self.vertices),
            bytemuck::cast_slice(&self.uvs),
            bytemuck::cast_slice(&self.normals),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::meshing::mesh::FacePlane;

    #[test]
    fn faces_share_no_vertices() {
        let mut mesh = VoxelMesh::new();
        let face = Face {
            plane: FacePlane::XZ,
            slice: 0,
            front: true,
            start: (0, 0),
            dims: (1, 1),
            color: [1, 2, 3],
        };
        mesh.add_face(&face);
        mesh.add_face(&face);

        assert_eq!(mesh.quad_count(), 2);
        assert_eq!(mesh.index_count(), 12);
        assert!(mesh.indices[6..].iter().all(|&index| index >= 4));
        let bytes = mesh.attribute_bytes();
        assert_eq!(bytes[0].len(), 12 * 4);
        assert_eq!(bytes[1].len(), 8 * 12);

        mesh.clear();
        assert!(mesh.is_empty());
    }
}
