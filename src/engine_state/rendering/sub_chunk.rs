//! # Sub-Chunk Render State
//!
//! Each 32³ sub-chunk owns two mesh buffers. One is active and drawn; the other receives the
//! next mesh. A background job never touches either buffer: it meshes a copy of the voxels and
//! the owning thread uploads the result into the inactive buffer and swaps.
//!
//! ## State Machine
//! ```text
//!          begin_generation              finish_generation            swap_buffers
//! Active ─────────────────▶ GeneratingInto(i) ─────────────▶ SwapPending(i) ──────────▶ Active
//! ```
//! `is_dirty` is orthogonal to the buffer state. It is set by edits and cleared by
//! `swap_buffers` only when no edit arrived after the job was enqueued.

use cgmath::Point3;
use log::trace;

use crate::engine_state::buffer_state::{MeshHandle, RenderBackend, VOXEL_MESH_BUFFERS};
use crate::engine_state::rendering::meshing::VoxelMesh;

/// One of the two GPU-side copies of a sub-chunk mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshBuffer {
    /// Buffer array, created on the first non-empty upload.
    handle: Option<MeshHandle>,
    index_count: u32,
    is_ready: bool,
}

impl MeshBuffer {
    pub fn handle(&self) -> Option<MeshHandle> {
        self.handle
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// `true` once something has been uploaded, even an empty mesh.
    pub fn is_ready(&self) -> bool {
        self.is_ready
    }

    /// Replaces the buffer contents with `mesh`.
    pub fn upload(&mut self, backend: &mut dyn RenderBackend, mesh: &VoxelMesh) {
        if self.handle.is_none() && !mesh.is_empty() {
            self.handle = Some(backend.create_buffer_array(&VOXEL_MESH_BUFFERS));
        }
        if let Some(handle) = self.handle {
            for (buffer_index, bytes) in mesh.attribute_bytes().into_iter().enumerate() {
                backend.write_buffer(handle, buffer_index, bytes);
            }
        }
        self.index_count = mesh.index_count();
        self.is_ready = true;
    }
}

/// Where a sub-chunk is in its re-mesh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshBufferState {
    /// No job in flight.
    Active,
    /// A job is meshing into buffer `.0`.
    GeneratingInto(usize),
    /// Buffer `.0` holds a finished upload and becomes active on the next swap.
    SwapPending(usize),
}

/// Render-side state of one 32³ sub-chunk.
#[derive(Debug, Clone)]
pub struct WorldSubChunk {
    world_offset: Point3<i32>,
    super_chunk: Point3<i32>,
    chunk_key: u32,
    buffers: [MeshBuffer; 2],
    active: usize,
    state: MeshBufferState,
    is_dirty: bool,
    /// Incremented by every edit; a job remembers the value it was enqueued with.
    edit_generation: u64,
    /// Generation of the job whose mesh waits in `SwapPending`.
    pending_generation: u64,
}

impl WorldSubChunk {
    /// A new sub-chunk starts dirty so that it gets meshed once.
    pub fn new(world_offset: Point3<i32>, super_chunk: Point3<i32>, chunk_key: u32) -> Self {
        WorldSubChunk {
            world_offset,
            super_chunk,
            chunk_key,
            buffers: [MeshBuffer::default(); 2],
            active: 0,
            state: MeshBufferState::Active,
            is_dirty: true,
            edit_generation: 0,
            pending_generation: 0,
        }
    }

    /// World-space voxel coordinate of the minimum corner.
    pub fn world_offset(&self) -> Point3<i32> {
        self.world_offset
    }

    pub fn super_chunk(&self) -> Point3<i32> {
        self.super_chunk
    }

    /// First Morton key of the sub-chunk inside its super-chunk.
    pub fn chunk_key(&self) -> u32 {
        self.chunk_key
    }

    pub fn state(&self) -> MeshBufferState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn is_generating(&self) -> bool {
        self.state != MeshBufferState::Active
    }

    pub fn edit_generation(&self) -> u64 {
        self.edit_generation
    }

    /// Dirty and no job in flight.
    pub fn needs_meshing(&self) -> bool {
        self.is_dirty && self.state == MeshBufferState::Active
    }

    /// Flags the sub-chunk for re-meshing. Safe to call while a job is in flight: that job's
    /// result is still swapped in, but the sub-chunk stays dirty.
    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
        self.edit_generation += 1;
    }

    /// Claims the inactive buffer for a new job.
    ///
    /// # Returns
    /// The edit generation the job must hand back to [`WorldSubChunk::finish_generation`].
    ///
    /// # Panics
    /// Panics if a job is already in flight.
    pub fn begin_generation(&mut self) -> u64 {
        assert_eq!(
            self.state,
            MeshBufferState::Active,
            "sub-chunk at {:?} already has a meshing job",
            self.world_offset
        );
        self.state = MeshBufferState::GeneratingInto(1 - self.active);
        self.edit_generation
    }

    /// Uploads a finished mesh into the buffer the job was generating into.
    ///
    /// # Panics
    /// Panics unless the sub-chunk is in `GeneratingInto`.
    pub fn finish_generation(
        &mut self,
        backend: &mut dyn RenderBackend,
        mesh: &VoxelMesh,
        generation: u64,
    ) {
        let MeshBufferState::GeneratingInto(target) = self.state else {
            panic!(
                "sub-chunk at {:?} finished a job it never started ({:?})",
                self.world_offset, self.state
            );
        };
        self.buffers[target].upload(backend, mesh);
        self.pending_generation = generation;
        self.state = MeshBufferState::SwapPending(target);
    }

    /// Makes the freshly uploaded buffer active.
    ///
    /// # Panics
    /// Panics unless the sub-chunk is in `SwapPending`.
    pub fn swap_buffers(&mut self) {
        let MeshBufferState::SwapPending(target) = self.state else {
            panic!(
                "sub-chunk at {:?} has no buffer to swap ({:?})",
                self.world_offset, self.state
            );
        };
        self.active = target;
        self.state = MeshBufferState::Active;
        if self.pending_generation == self.edit_generation {
            self.is_dirty = false;
        } else {
            trace!(
                "Sub-chunk at {:?} was edited while meshing, staying dirty",
                self.world_offset
            );
        }
    }

    /// The buffer drawn by the render pass.
    pub fn active_buffer(&self) -> &MeshBuffer {
        &self.buffers[self.active]
    }

    pub fn is_ready(&self) -> bool {
        self.active_buffer().is_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::buffer_state::HeadlessBufferState;
    use crate::engine_state::rendering::meshing::ChunkMesher;
    use crate::engine_state::voxels::node::VoxNode;

    fn single_voxel_mesh() -> VoxelMesh {
        ChunkMesher::new().build_chunk(&[VoxNode::with_texture(0, 3)])
    }

    fn sub_chunk() -> WorldSubChunk {
        WorldSubChunk::new(Point3::new(32, 0, 0), Point3::new(0, 0, 0), 4096)
    }

    #[test]
    fn full_cycle_swaps_and_cleans() {
        let mut backend = HeadlessBufferState::new();
        let mut sub_chunk = sub_chunk();
        assert!(sub_chunk.needs_meshing());
        assert!(!sub_chunk.is_ready());

        let generation = sub_chunk.begin_generation();
        assert_eq!(sub_chunk.state(), MeshBufferState::GeneratingInto(1));
        assert!(!sub_chunk.needs_meshing());

        sub_chunk.finish_generation(&mut backend, &single_voxel_mesh(), generation);
        assert_eq!(sub_chunk.state(), MeshBufferState::SwapPending(1));
        // the old buffer stays active until the swap
        assert!(!sub_chunk.is_ready());

        sub_chunk.swap_buffers();
        assert_eq!(sub_chunk.state(), MeshBufferState::Active);
        assert!(sub_chunk.is_ready());
        assert!(!sub_chunk.is_dirty());
        assert_eq!(sub_chunk.active_buffer().index_count(), 36);
        assert_eq!(backend.buffer_array_count(), 1);
    }

    #[test]
    fn edit_during_generation_keeps_dirty() {
        let mut backend = HeadlessBufferState::new();
        let mut sub_chunk = sub_chunk();

        let generation = sub_chunk.begin_generation();
        sub_chunk.mark_dirty();
        sub_chunk.finish_generation(&mut backend, &single_voxel_mesh(), generation);
        sub_chunk.swap_buffers();

        assert!(sub_chunk.is_ready());
        assert!(sub_chunk.is_dirty());
        assert!(sub_chunk.needs_meshing());
    }

    #[test]
    fn buffers_alternate() {
        let mut backend = HeadlessBufferState::new();
        let mut sub_chunk = sub_chunk();
        let mut handles = Vec::new();
        for _ in 0..3 {
            sub_chunk.mark_dirty();
            let generation = sub_chunk.begin_generation();
            sub_chunk.finish_generation(&mut backend, &single_voxel_mesh(), generation);
            sub_chunk.swap_buffers();
            handles.push(sub_chunk.active_buffer().handle());
        }
        assert_ne!(handles[0], handles[1]);
        assert_eq!(handles[0], handles[2]);
        assert_eq!(backend.buffer_array_count(), 2);
    }

    #[test]
    fn empty_mesh_is_ready_without_buffers() {
        let mut backend = HeadlessBufferState::new();
        let mut sub_chunk = sub_chunk();
        let generation = sub_chunk.begin_generation();
        sub_chunk.finish_generation(&mut backend, &VoxelMesh::new(), generation);
        sub_chunk.swap_buffers();

        assert!(sub_chunk.is_ready());
        assert_eq!(sub_chunk.active_buffer().handle(), None);
        assert_eq!(sub_chunk.active_buffer().index_count(), 0);
        assert_eq!(backend.buffer_array_count(), 0);
    }

    #[test]
    #[should_panic]
    fn second_job_is_rejected() {
        let mut sub_chunk = sub_chunk();
        sub_chunk.begin_generation();
        sub_chunk.begin_generation();
    }

    #[test]
    #[should_panic]
    fn swap_without_upload_is_rejected() {
        let mut sub_chunk = sub_chunk();
        sub_chunk.begin_generation();
        sub_chunk.swap_buffers();
    }
}
