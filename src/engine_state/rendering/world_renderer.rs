//! # World Renderer
//!
//! Decides which sub-chunks need a new mesh, feeds them to the background mesher and draws the
//! active buffers.
//!
//! ## Frame Flow
//! 1. `generate_visible_chunks()` walks the super-chunks around the player, nearest first, and
//!    enqueues a job for every dirty sub-chunk with no job in flight
//! 2. `update()` finalizes at most one finished job: upload, swap, maybe clean
//! 3. `render_all_meshes()` draws every ready, non-empty active buffer

use std::collections::HashMap;

use cgmath::{Matrix4, Point3, SquareMatrix, Vector3};
use log::{debug, info, trace};

use super::sub_chunk::WorldSubChunk;
use super::tasks::MesherBackgroundJob;
use crate::core::MtResource;
use crate::engine_state::buffer_state::{DrawUniforms, MeshHandle, RenderBackend};
use crate::engine_state::task_management::TaskManager;
use crate::engine_state::voxels::morton::SUB_CHUNK_EDGE;
use crate::engine_state::voxels::super_chunk::{WorldSuperChunk, SUPER_CHUNK_SIZE};
use crate::engine_state::voxels::world::World;

/// Edge of a renderable sub-chunk in voxels.
pub const RENDERABLE_CHUNK_SIZE: i32 = SUB_CHUNK_EDGE as i32;

/// Default light, matching the voxel shader's tuning.
pub const DEFAULT_LIGHT_POSITION: [f32; 3] = [200.0, 656.0, 400.0];
pub const DEFAULT_LIGHT_POWER: f32 = 640000.0;

/// Camera and light inputs of one render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawParameters {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub light_position: Vector3<f32>,
    pub light_power: f32,
}

impl Default for DrawParameters {
    fn default() -> Self {
        DrawParameters {
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            light_position: DEFAULT_LIGHT_POSITION.into(),
            light_power: DEFAULT_LIGHT_POWER,
        }
    }
}

impl DrawParameters {
    fn uniforms(&self, world_offset: Point3<i32>) -> DrawUniforms {
        let model = Matrix4::from_translation(Vector3::new(
            world_offset.x as f32,
            world_offset.y as f32,
            world_offset.z as f32,
        ));
        DrawUniforms {
            model: model.into(),
            view: self.view.into(),
            projection: self.projection.into(),
            light_position: self.light_position.into(),
            light_power: self.light_power,
        }
    }
}

/// What the render pass needs to know about one sub-chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubChunkView {
    pub world_offset: Point3<i32>,
    pub handle: Option<MeshHandle>,
    pub index_count: u32,
    pub is_ready: bool,
}

/// Converts a render distance in sub-chunks into a search radius in super-chunks.
pub fn render_radius_in_super_chunks(render_distance_in_chunks: i32) -> i32 {
    render_distance_in_chunks * RENDERABLE_CHUNK_SIZE / SUPER_CHUNK_SIZE + 1
}

/// Owns the render state of every sub-chunk seen so far and the background mesher.
pub struct WorldRenderer {
    /// Keyed by sub-chunk world offset.
    sub_chunks: HashMap<Point3<i32>, MtResource<WorldSubChunk>>,
    /// Sub-chunk offsets known for each super-chunk position.
    super_chunk_members: HashMap<Point3<i32>, Vec<Point3<i32>>>,
    /// Store revision of each super-chunk at its last full scan.
    scanned_revisions: HashMap<Point3<i32>, u64>,
    full_scans: usize,
    task_manager: TaskManager<dyn RenderBackend>,
    /// Search radius around the player in super-chunks.
    render_radius: i32,
    player_origin: Point3<i32>,
}

impl WorldRenderer {
    /// # Arguments
    /// * `worker_count` - Background mesher threads
    /// * `render_distance_in_chunks` - View distance in 32³ sub-chunks
    pub fn new(worker_count: usize, render_distance_in_chunks: i32) -> Self {
        let render_radius = render_radius_in_super_chunks(render_distance_in_chunks);
        info!(
            "World renderer: {} mesher workers, render radius {} super-chunks",
            worker_count, render_radius
        );
        WorldRenderer {
            sub_chunks: HashMap::new(),
            super_chunk_members: HashMap::new(),
            scanned_revisions: HashMap::new(),
            full_scans: 0,
            task_manager: TaskManager::new(worker_count),
            render_radius,
            player_origin: Point3::new(0, 0, 0),
        }
    }

    pub fn render_radius(&self) -> i32 {
        self.render_radius
    }

    pub fn set_player_origin(&mut self, origin: Point3<i32>) {
        self.player_origin = origin;
    }

    pub fn player_origin(&self) -> Point3<i32> {
        self.player_origin
    }

    /// Enqueues a job for every dirty, idle sub-chunk of `super_chunk`.
    ///
    /// A sub-chunk holding only tombstones is meshed to an empty mesh, so removed voxels
    /// disappear from the screen.
    ///
    /// The store is only cut into spans when it changed since the last scan. Otherwise just the
    /// sub-chunks flagged with [`WorldRenderer::set_chunk_dirty`] copy their records.
    ///
    /// # Returns
    /// The number of jobs enqueued.
    pub fn build_chunk(&mut self, super_chunk: &WorldSuperChunk) -> usize {
        let position = super_chunk.position();
        let revision = super_chunk.octree().revision();
        if self.scanned_revisions.get(&position) == Some(&revision) {
            return self.build_dirty_sub_chunks(super_chunk);
        }
        self.scanned_revisions.insert(position, revision);
        self.full_scans += 1;
        trace!("Scanning super-chunk {:?} at revision {}", position, revision);

        let mut enqueued = 0;
        for span in super_chunk.octree().sub_chunk_spans() {
            let world_offset = super_chunk.sub_chunk_world_offset(span.chunk_key);
            let handle = self.get_sub_chunk(super_chunk, span.chunk_key, world_offset);

            let generation = {
                let mut sub_chunk = handle.get_mut();
                if !sub_chunk.needs_meshing() {
                    continue;
                }
                sub_chunk.begin_generation()
            };

            self.task_manager.publish_task(Box::new(MesherBackgroundJob::new(
                handle,
                span.nodes,
                generation,
            )));
            enqueued += 1;
        }
        enqueued
    }

    /// Enqueues the dirty sub-chunks of a super-chunk whose store is unchanged since its last
    /// scan.
    fn build_dirty_sub_chunks(&mut self, super_chunk: &WorldSuperChunk) -> usize {
        let Some(members) = self.super_chunk_members.get(&super_chunk.position()) else {
            return 0;
        };
        let claimed: Vec<(MtResource<WorldSubChunk>, u32, u64)> = members
            .iter()
            .filter_map(|world_offset| {
                let handle = self.sub_chunks.get(world_offset)?;
                let mut sub_chunk = handle.get_mut();
                if !sub_chunk.needs_meshing() {
                    return None;
                }
                let chunk_key = sub_chunk.chunk_key();
                let generation = sub_chunk.begin_generation();
                drop(sub_chunk);
                Some((handle.clone(), chunk_key, generation))
            })
            .collect();

        let enqueued = claimed.len();
        for (handle, chunk_key, generation) in claimed {
            let span = super_chunk.octree().sub_chunk_span(chunk_key);
            self.task_manager.publish_task(Box::new(MesherBackgroundJob::new(
                handle,
                span.nodes,
                generation,
            )));
        }
        enqueued
    }

    /// Runs [`WorldRenderer::build_chunk`] over the super-chunks around the player, nearest
    /// first.
    pub fn generate_visible_chunks(&mut self, world: &World) -> usize {
        let mut enqueued = 0;
        for (_, super_chunk) in world.get_chunks_around_origin(self.player_origin, self.render_radius)
        {
            enqueued += self.build_chunk(super_chunk);
        }
        if enqueued > 0 {
            debug!("Enqueued {} meshing jobs", enqueued);
        }
        enqueued
    }

    /// Finalizes at most one finished meshing job. Call once per tick.
    ///
    /// # Returns
    /// `true` when a job was finalized.
    pub fn update(&mut self, backend: &mut (dyn RenderBackend + 'static)) -> bool {
        self.task_manager.process_completed_tasks(backend)
    }

    /// Flags the sub-chunk at `world_offset` for re-meshing.
    ///
    /// # Returns
    /// `false` when no sub-chunk has been seen at that offset.
    pub fn set_chunk_dirty(&mut self, world_offset: Point3<i32>) -> bool {
        match self.sub_chunks.get(&world_offset) {
            Some(sub_chunk) => {
                sub_chunk.get_mut().mark_dirty();
                true
            }
            None => false,
        }
    }

    /// Draws every ready, non-empty active buffer.
    ///
    /// # Returns
    /// The number of draw calls issued.
    pub fn render_all_meshes(
        &self,
        backend: &mut dyn RenderBackend,
        parameters: &DrawParameters,
    ) -> usize {
        backend.bind_material();
        let mut draws = 0;
        for view in self.visible_sub_chunks() {
            let Some(handle) = view.handle else {
                continue;
            };
            if !view.is_ready || view.index_count == 0 {
                continue;
            }
            backend.draw_indexed(handle, view.index_count, &parameters.uniforms(view.world_offset));
            draws += 1;
        }
        draws
    }

    /// Active buffer of every known sub-chunk.
    pub fn visible_sub_chunks(&self) -> Vec<SubChunkView> {
        self.sub_chunks
            .iter()
            .map(|(world_offset, sub_chunk)| {
                let sub_chunk = sub_chunk.get();
                let buffer = sub_chunk.active_buffer();
                SubChunkView {
                    world_offset: *world_offset,
                    handle: buffer.handle(),
                    index_count: buffer.index_count(),
                    is_ready: buffer.is_ready(),
                }
            })
            .collect()
    }

    pub fn sub_chunk(&self, world_offset: Point3<i32>) -> Option<&MtResource<WorldSubChunk>> {
        self.sub_chunks.get(&world_offset)
    }

    pub fn sub_chunk_count(&self) -> usize {
        self.sub_chunks.len()
    }

    /// Times a super-chunk store was cut into sub-chunk spans.
    pub fn full_scan_count(&self) -> usize {
        self.full_scans
    }

    /// Meshing jobs enqueued and not yet finalized.
    pub fn jobs_in_flight(&self) -> usize {
        self.task_manager.tasks_in_flight()
    }

    fn get_sub_chunk(
        &mut self,
        super_chunk: &WorldSuperChunk,
        chunk_key: u32,
        world_offset: Point3<i32>,
    ) -> MtResource<WorldSubChunk> {
        if let Some(sub_chunk) = self.sub_chunks.get(&world_offset) {
            return sub_chunk.clone();
        }
        let sub_chunk = MtResource::new(WorldSubChunk::new(
            world_offset,
            super_chunk.position(),
            chunk_key,
        ));
        self.sub_chunks.insert(world_offset, sub_chunk.clone());
        self.super_chunk_members
            .entry(super_chunk.position())
            .or_default()
            .push(world_offset);
        sub_chunk
    }
}
