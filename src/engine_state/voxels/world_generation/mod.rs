//! # World Generation
//!
//! Fills a square of super-chunks with height-field terrain. Each super-chunk samples one noise
//! layer per column, then walks its 128³ cells in Morton order appending every cell under the
//! surface as an unsorted single-voxel node. One sort at the end restores the store's ordering.

pub mod noise_layer;

use cgmath::Point3;
use log::info;
use web_time::Instant;

use self::noise_layer::{NoiseLayer, NoiseSettings};
use super::morton;
use super::node::VoxNode;
use super::super_chunk::SUPER_CHUNK_SIZE;
use super::world::World;

/// Default vertical extent of the color bands.
pub const DEFAULT_PALETTE_HEIGHT: f64 = 256.0;

/// Totals reported by [`WorldGenerator::generate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub chunks_created: usize,
    pub nodes_added: usize,
}

/// Color for a voxel at height `y`, in three bands over `palette_height`.
pub fn texture_for_height(y: u32, palette_height: f64) -> [u8; 3] {
    let t = y as f64 / palette_height;
    if t < 0.3333 {
        [204, 3, 2]
    } else if t < 0.6666 {
        [1, 1, 1]
    } else {
        [8, 8, 8]
    }
}

/// Procedural terrain source over a square of `2 * half_size` super-chunks per side.
pub struct WorldGenerator {
    half_size: i32,
    palette_height: f64,
    noise_layers: Vec<NoiseLayer>,
    next_layer_id: u32,
}

impl WorldGenerator {
    pub fn new(half_size: i32) -> Self {
        WorldGenerator {
            half_size,
            palette_height: DEFAULT_PALETTE_HEIGHT,
            noise_layers: Vec::new(),
            next_layer_id: 0,
        }
    }

    pub fn with_palette_height(mut self, palette_height: f64) -> Self {
        self.palette_height = palette_height;
        self
    }

    pub fn half_size(&self) -> i32 {
        self.half_size
    }

    /// Adds a terrain layer with the default terrain settings and returns its id.
    pub fn add_layer(&mut self, name: &str) -> u32 {
        self.add_layer_with_settings(name, NoiseSettings::terrain())
    }

    pub fn add_layer_with_settings(&mut self, name: &str, settings: NoiseSettings) -> u32 {
        let id = self.next_layer_id;
        self.next_layer_id += 1;
        self.noise_layers.push(NoiseLayer::new(id, name, settings));
        id
    }

    pub fn layers(&self) -> &[NoiseLayer] {
        &self.noise_layers
    }

    pub fn layer_mut(&mut self, id: u32) -> Option<&mut NoiseLayer> {
        self.noise_layers.iter_mut().find(|layer| layer.index() == id)
    }

    /// Generates every super-chunk in `[-half_size, half_size)` on x and z at y = 0.
    ///
    /// # Panics
    /// Panics if no noise layer has been added.
    pub fn generate(&self, world: &mut World) -> GenerationStats {
        assert!(
            !self.noise_layers.is_empty(),
            "world generation needs at least one noise layer"
        );

        let mut stats = GenerationStats::default();
        for chunk_z in -self.half_size..self.half_size {
            for chunk_x in -self.half_size..self.half_size {
                stats.nodes_added +=
                    self.generate_super_chunk(world, Point3::new(chunk_x, 0, chunk_z));
                stats.chunks_created += 1;
            }
        }

        info!(
            "WorldGen > Chunks created: {}, Nodes added = {}",
            stats.chunks_created, stats.nodes_added
        );
        stats
    }

    /// Fills the super-chunk at `position` from the first noise layer.
    ///
    /// # Returns
    /// The number of voxels added.
    pub fn generate_super_chunk(&self, world: &mut World, position: Point3<i32>) -> usize {
        let Some(layer) = self.noise_layers.first() else {
            return 0;
        };
        let start = Instant::now();

        let size = SUPER_CHUNK_SIZE as usize;
        let origin = position * SUPER_CHUNK_SIZE;
        let heights = layer.height_map(origin.x, origin.z, size);

        let chunk = world.create_chunk(position);
        let octree = chunk.octree_mut();
        let mut added = 0;
        let edge = SUPER_CHUNK_SIZE as u32;
        for key in 0..morton::encode(edge - 1, edge - 1, edge - 1) + 1 {
            let (x, y, z) = morton::decode(key);
            let surface = heights[z as usize * size + x as usize];
            if (y as i32) < surface {
                let [r, g, b] = texture_for_height(y, self.palette_height);
                octree.add_orphan_node(VoxNode::new(key, 1, r, g, b));
                added += 1;
            }
        }
        octree.sort_leaf_nodes();

        info!(
            "WorldGen > Super-chunk {:?}: {} nodes in {:?}",
            position,
            added,
            start.elapsed()
        );
        added
    }
}
