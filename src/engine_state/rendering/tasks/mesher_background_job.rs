//! Task for meshing one sub-chunk in a background thread.

use log::trace;

use crate::{
    core::MtResource,
    engine_state::{
        buffer_state::RenderBackend,
        rendering::{
            meshing::{ChunkMesher, VoxelMesh},
            sub_chunk::WorldSubChunk,
        },
        task_management::task::Task,
        voxels::node::VoxNode,
    },
};

/// Re-meshes one sub-chunk.
///
/// The job owns a copy of the sub-chunk's voxels taken at enqueue time, so `run()` never reads
/// the store or the sub-chunk. The sub-chunk handle is only locked in
/// `finalize_in_main_thread()`.
pub struct MesherBackgroundJob {
    sub_chunk: MtResource<WorldSubChunk>,
    nodes: Vec<VoxNode>,
    /// Edit generation of the sub-chunk when the job was enqueued.
    generation: u64,
    mesh: Option<VoxelMesh>,
}

impl MesherBackgroundJob {
    /// Creates a job for a sub-chunk whose generation was already started with
    /// `WorldSubChunk::begin_generation`.
    ///
    /// # Arguments
    /// * `sub_chunk` - Handle of the sub-chunk receiving the mesh
    /// * `nodes` - The sub-chunk's live records, all inside it
    /// * `generation` - Value returned by `begin_generation`
    pub fn new(sub_chunk: MtResource<WorldSubChunk>, nodes: Vec<VoxNode>, generation: u64) -> Self {
        MesherBackgroundJob {
            sub_chunk,
            nodes,
            generation,
            mesh: None,
        }
    }
}

impl Task<dyn RenderBackend> for MesherBackgroundJob {
    fn run(&mut self) {
        self.mesh = Some(ChunkMesher::new().build_chunk(&self.nodes));
    }

    fn finalize_in_main_thread(self: Box<Self>, backend: &mut (dyn RenderBackend + 'static)) {
        let MesherBackgroundJob {
            sub_chunk,
            generation,
            mesh,
            ..
        } = *self;
        let mesh = mesh.unwrap_or_default();
        let mut sub_chunk = sub_chunk.get_mut();
        sub_chunk.finish_generation(backend, &mesh, generation);
        sub_chunk.swap_buffers();
        trace!(
            "Swapped in {} quads for sub-chunk at {:?}",
            mesh.quad_count(),
            sub_chunk.world_offset()
        );
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::engine_state::buffer_state::HeadlessBufferState;
    use crate::engine_state::voxels::morton::encode;

    #[test]
    fn job_meshes_its_copy() {
        let sub_chunk = MtResource::new(WorldSubChunk::new(
            Point3::new(0, 0, 0),
            Point3::new(0, 0, 0),
            0,
        ));
        let generation = sub_chunk.get_mut().begin_generation();
        let mut job = Box::new(MesherBackgroundJob::new(
            sub_chunk.clone(),
            vec![VoxNode::with_texture(encode(1, 1, 1), 2)],
            generation,
        ));

        job.run();
        let mut backend = HeadlessBufferState::new();
        job.finalize_in_main_thread(&mut backend);

        let sub_chunk = sub_chunk.get();
        assert!(sub_chunk.is_ready());
        assert!(!sub_chunk.is_dirty());
        assert_eq!(sub_chunk.active_buffer().index_count(), 36);
    }
}
