//! # Engine State Module
//!
//! The core engine module that ties the voxel world to its renderer.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container for the engine
//! * `buffer_state` - The render backend interface and its headless implementation
//! * `config` - JSON engine settings
//! * `rendering` - Greedy meshing, sub-chunk render state and the world renderer
//! * `task_management` - Worker threads running background jobs
//! * `voxels` - Voxel storage, collision, world partitioning and generation
//!
//! ## Architecture
//!
//! `EngineState` owns the world, its generator, the renderer and the render backend. Everything
//! is driven from one thread: a tick finalizes at most one finished meshing job, and edits
//! go through the engine so that the affected sub-chunk is flagged for re-meshing.

use cgmath::{Point3, Vector3};
use log::{debug, info};

use buffer_state::{HeadlessBufferState, RenderBackend};
use config::EngineConfig;
use rendering::{DrawParameters, WorldRenderer};
use voxels::{
    collision::{collision_info::CollisionInfo, CollisionManager},
    node::{voxel_side::VoxelSide, VoxNode},
    world::World,
    world_generation::{GenerationStats, WorldGenerator},
};

pub mod buffer_state;
pub mod config;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// Result of [`EngineState::cast_ray`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World cell of the struck voxel.
    pub voxel: Point3<i32>,
    pub node: VoxNode,
    /// Face the ray entered through, when it can be determined.
    pub side: Option<VoxelSide>,
}

/// The main state container for the voxel engine
///
/// # Examples
///
/// ```
/// use sparse_voxel_engine::engine_state::{config::EngineConfig, EngineState};
/// use sparse_voxel_engine::engine_state::buffer_state::HeadlessBufferState;
///
/// let mut engine = EngineState::new(EngineConfig::default(), HeadlessBufferState::new());
/// engine.world_mut().add_node(0, 0, 0, [1, 1, 1]);
/// engine.schedule_visible_chunks();
/// while engine.pending_meshing_jobs() > 0 {
///     engine.tick();
/// }
/// assert_eq!(engine.render(), 1);
/// ```
pub struct EngineState<B: RenderBackend + 'static = HeadlessBufferState> {
    config: EngineConfig,
    world: World,
    generator: WorldGenerator,
    renderer: WorldRenderer,
    backend: B,
    draw_parameters: DrawParameters,
}

impl<B: RenderBackend + 'static> EngineState<B> {
    /// Creates an engine with an empty world.
    ///
    /// # Arguments
    /// * `config` - Engine settings, already validated
    /// * `backend` - Receives mesh uploads and draws
    pub fn new(config: EngineConfig, backend: B) -> Self {
        let mut generator = WorldGenerator::new(config.world_size.half_size())
            .with_palette_height(config.palette_height);
        generator.add_layer_with_settings("terrain", config.terrain);

        let renderer = WorldRenderer::new(config.worker_count, config.render_distance.sub_chunks());
        let draw_parameters = config.draw_parameters();

        info!(
            "Engine created: world {:?}, render distance {:?}",
            config.world_size, config.render_distance
        );

        EngineState {
            config,
            world: World::new(),
            generator,
            renderer,
            backend,
            draw_parameters,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct access to the voxels. Edits made here are not seen by the renderer until the
    /// affected sub-chunks are flagged with [`EngineState::set_chunk_dirty`].
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn renderer(&self) -> &WorldRenderer {
        &self.renderer
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn set_camera(&mut self, view: cgmath::Matrix4<f32>, projection: cgmath::Matrix4<f32>) {
        self.draw_parameters.view = view;
        self.draw_parameters.projection = projection;
    }

    /// Fills the world with terrain.
    pub fn generate_world(&mut self) -> GenerationStats {
        self.generator.generate(&mut self.world)
    }

    pub fn set_player_origin(&mut self, origin: Point3<i32>) {
        self.renderer.set_player_origin(origin);
    }

    /// Enqueues meshing jobs for the dirty sub-chunks around the player.
    pub fn schedule_visible_chunks(&mut self) -> usize {
        self.renderer.generate_visible_chunks(&self.world)
    }

    /// One step of the owning thread: finalizes at most one finished meshing job.
    pub fn tick(&mut self) -> bool {
        self.renderer.update(&mut self.backend)
    }

    pub fn pending_meshing_jobs(&self) -> usize {
        self.renderer.jobs_in_flight()
    }

    /// Draws every ready sub-chunk.
    ///
    /// # Returns
    /// The number of draw calls issued.
    pub fn render(&mut self) -> usize {
        self.renderer
            .render_all_meshes(&mut self.backend, &self.draw_parameters)
    }

    /// Nearest voxel along a ray, and the face it was entered through.
    pub fn cast_ray(&self, start: Vector3<f32>, direction: Vector3<f32>) -> Option<RayHit> {
        let mut info = CollisionInfo::new(start, direction);
        CollisionManager::new(&self.world).collide(&mut info);
        if !info.has_collided() {
            return None;
        }

        let voxel = info.position;
        let side = CollisionManager::<World>::get_collision_side(
            Vector3::new(voxel.x as f32, voxel.y as f32, voxel.z as f32),
            info.ray_start,
            info.ray_direction,
        );
        Some(RayHit {
            voxel,
            node: info.node,
            side,
        })
    }

    /// Places a voxel and flags its sub-chunk.
    pub fn add_voxel(&mut self, x: i32, y: i32, z: i32, color: [u8; 3]) {
        self.world.add_node(x, y, z, color);
        self.set_chunk_dirty(World::sub_chunk_of(Point3::new(x, y, z)));
    }

    /// Removes a voxel and flags its sub-chunk.
    ///
    /// # Returns
    /// `false` when there was no live voxel at the cell.
    pub fn remove_voxel(&mut self, x: i32, y: i32, z: i32) -> bool {
        if !self.world.remove_node(x, y, z) {
            return false;
        }
        debug!("Removed voxel at ({}, {}, {})", x, y, z);
        self.set_chunk_dirty(World::sub_chunk_of(Point3::new(x, y, z)));
        true
    }

    /// Flags the sub-chunk at `world_offset` for re-meshing.
    ///
    /// A sub-chunk the renderer has not seen yet is meshed on its first schedule anyway.
    pub fn set_chunk_dirty(&mut self, world_offset: Point3<i32>) -> bool {
        self.renderer.set_chunk_dirty(world_offset)
    }
}
