//! # Morton Octree Module
//!
//! The sparse voxel store. Despite the name there is no pointer tree: the octree is implicit in
//! the Morton keys, and the store is a single vector of [`VoxNode`]s kept sorted by key. Point
//! lookups are binary searches, and every octree node corresponds to a contiguous key range.
//!
//! ## Deletion
//!
//! Removing a voxel marks its record as a tombstone instead of erasing it, so indices handed out
//! earlier stay valid and the sorted order is untouched. [`MortonOctree::compact`] is the explicit
//! maintenance step that physically drops tombstones and duplicates.
//!
//! ## Bulk Insertion
//!
//! Generators append with [`MortonOctree::add_orphan_node`] and call
//! [`MortonOctree::sort_leaf_nodes`] once at the end.

pub mod chunk_iteration;

use std::ops::Range;

use cgmath::Point3;
use log::debug;

use super::morton::{self, MORTON_AXIS_BITS};
use super::node::voxel_side::{VoxelSide, VoxelSides};
use super::node::VoxNode;

/// A queryable set of occupied unit cells.
///
/// Collision queries only go through this trait, so they work unchanged on a single store or on
/// a whole partitioned world.
pub trait VoxelIndex {
    /// `true` when a live voxel occupies the cell. Out-of-range cells are empty.
    fn is_occupied(&self, x: i32, y: i32, z: i32) -> bool;

    /// The live record occupying the cell, if any.
    fn find_voxel(&self, x: i32, y: i32, z: i32) -> Option<VoxNode>;

    /// Minimum corner of the indexed cube.
    fn origin(&self) -> Point3<i32>;

    /// log2 of the indexed cube's edge length.
    fn depth(&self) -> u32;

    /// Edge length of the indexed cube.
    fn extent(&self) -> i32 {
        1 << self.depth()
    }
}

/// Index range of all records whose key equals `key`.
fn equal_range(nodes: &[VoxNode], key: u32) -> Range<usize> {
    let lower = nodes.partition_point(|node| node.start < key);
    let upper = lower + nodes[lower..].partition_point(|node| node.start == key);
    lower..upper
}

/// First live record with exactly `key` in a sorted slice.
fn find_alive(nodes: &[VoxNode], key: u32) -> Option<&VoxNode> {
    nodes[equal_range(nodes, key)]
        .iter()
        .find(|node| node.is_alive())
}

/// Sorted, tombstoning store of voxel records.
#[derive(Debug, Clone)]
pub struct MortonOctree {
    nodes: Vec<VoxNode>,
    depth: u32,
    /// Bumped by every mutation.
    revision: u64,
}

impl Default for MortonOctree {
    fn default() -> Self {
        Self::new()
    }
}

impl MortonOctree {
    /// Creates an empty store spanning the full key range.
    pub fn new() -> Self {
        Self::with_depth(MORTON_AXIS_BITS)
    }

    /// Creates an empty store whose cells lie in `0..2^depth` on each axis.
    ///
    /// # Panics
    /// Panics if `depth` exceeds [`MORTON_AXIS_BITS`].
    pub fn with_depth(depth: u32) -> Self {
        assert!(
            depth <= MORTON_AXIS_BITS,
            "octree depth {depth} exceeds the Morton key width"
        );
        MortonOctree {
            nodes: Vec::new(),
            depth,
            revision: 0,
        }
    }

    /// Edge length in cells.
    pub fn size(&self) -> u32 {
        1 << self.depth
    }

    /// All records, tombstones included, in key order.
    pub fn nodes(&self) -> &[VoxNode] {
        &self.nodes
    }

    /// Changes whenever the records change. Lets readers skip stores they have already seen.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of records, tombstones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of records that are not tombstoned.
    pub fn live_node_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_alive()).count()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional);
    }

    fn contains_coordinate(&self, x: u32, y: u32, z: u32) -> bool {
        let size = self.size();
        x < size && y < size && z < size
    }

    /// Index of the first record whose key is not less than `key`.
    pub fn lower_bound(&self, key: u32) -> usize {
        self.nodes.partition_point(|node| node.start < key)
    }

    /// Records with keys in `lower..=upper`.
    pub fn nodes_in_key_range(&self, lower: u32, upper: u32) -> &[VoxNode] {
        let begin = self.lower_bound(lower);
        let end = self.nodes.partition_point(|node| node.start <= upper);
        &self.nodes[begin..end.max(begin)]
    }

    /// Inserts a record at its sorted position.
    ///
    /// A record already holding the same key, live or tombstoned, is overwritten in place.
    pub fn add_node(&mut self, node: VoxNode) {
        debug_assert!(
            node.start <= morton::encode(self.size() - 1, self.size() - 1, self.size() - 1),
            "key {} is outside the octree",
            node.start
        );
        self.revision += 1;
        let range = equal_range(&self.nodes, node.start);
        if range.is_empty() {
            self.nodes.insert(range.start, node);
            return;
        }

        self.nodes[range.start] = node;
        // duplicates left by bulk insertion must keep size-descending order
        if range.len() > 1 {
            self.nodes[range].sort();
        }
    }

    /// Appends a record without keeping order. Call [`Self::sort_leaf_nodes`] before querying.
    #[inline]
    pub fn add_orphan_node(&mut self, node: VoxNode) {
        self.revision += 1;
        self.nodes.push(node);
    }

    /// Restores key order after bulk insertion.
    pub fn sort_leaf_nodes(&mut self) {
        self.nodes.sort();
        self.revision += 1;
        debug!("Sorted {} leaf nodes", self.nodes.len());
    }

    /// Checks the ordering invariant.
    pub fn is_sorted(&self) -> bool {
        self.nodes.windows(2).all(|pair| pair[0] <= pair[1])
    }

    /// Tombstones every live record at the coordinate.
    ///
    /// # Returns
    /// `false` when there was no live voxel to remove. Nothing is mutated in that case.
    pub fn remove_node(&mut self, x: u32, y: u32, z: u32) -> bool {
        if !self.contains_coordinate(x, y, z) {
            return false;
        }
        let removed = self.tombstone_key(morton::encode(x, y, z));
        if removed {
            debug!("Removed node at ({x}, {y}, {z})");
        }
        removed
    }

    /// Tombstones the live record with the same key as `node`.
    pub fn remove(&mut self, node: &VoxNode) -> bool {
        self.tombstone_key(node.start)
    }

    fn tombstone_key(&mut self, key: u32) -> bool {
        let range = equal_range(&self.nodes, key);
        let mut removed = false;
        for node in &mut self.nodes[range] {
            if node.is_alive() {
                node.size = super::node::TOMBSTONE;
                removed = true;
            }
        }
        if removed {
            self.revision += 1;
        }
        removed
    }

    /// `true` iff a live record with exactly this cell's key exists.
    pub fn check_node(&self, x: u32, y: u32, z: u32) -> bool {
        if !self.contains_coordinate(x, y, z) {
            return false;
        }
        find_alive(&self.nodes, morton::encode(x, y, z)).is_some()
    }

    /// [`Self::check_node`] for a point in continuous space. Negative coordinates are empty.
    pub fn check_node_f32(&self, x: f32, y: f32, z: f32) -> bool {
        if x < 0.0 || y < 0.0 || z < 0.0 {
            return false;
        }
        self.check_node(x as u32, y as u32, z as u32)
    }

    /// The live record stored under `key`.
    pub fn find_node(&self, key: u32) -> Option<&VoxNode> {
        find_alive(&self.nodes, key)
    }

    /// Faces of the cell not covered by an occupied neighbour.
    ///
    /// `start_hint` is the lower-bound index of the cell's own key. Neighbours in the positive
    /// directions always have larger keys and are searched from the hint onwards; the negative
    /// ones are searched before it.
    pub fn get_visible_sides(&self, x: u32, y: u32, z: u32, start_hint: usize) -> VoxelSides {
        let hint = start_hint.min(self.nodes.len());
        let (before, after) = self.nodes.split_at(hint);
        let size = self.size() as i64;

        let mut sides = VoxelSides::ALL;
        for side in VoxelSide::all() {
            let offset = side.offset();
            let (nx, ny, nz) = (
                x as i64 + offset.x as i64,
                y as i64 + offset.y as i64,
                z as i64 + offset.z as i64,
            );
            if nx < 0 || ny < 0 || nz < 0 || nx >= size || ny >= size || nz >= size {
                continue;
            }

            let key = morton::encode(nx as u32, ny as u32, nz as u32);
            let search = match side {
                VoxelSide::TOP | VoxelSide::FRONT | VoxelSide::RIGHT => after,
                VoxelSide::BOTTOM | VoxelSide::BACK | VoxelSide::LEFT => before,
            };
            if find_alive(search, key).is_some() {
                sides.remove(side);
            }
        }
        sides
    }

    /// [`Self::get_visible_sides`] with the hint computed from the coordinate.
    pub fn get_visible_sides_at(&self, x: u32, y: u32, z: u32) -> VoxelSides {
        let hint = self.lower_bound(morton::encode(x, y, z));
        self.get_visible_sides(x, y, z, hint)
    }

    /// Physically drops tombstones and duplicate keys, keeping the largest record per key.
    ///
    /// Must only run while no job holds indices into this store.
    ///
    /// # Returns
    /// The number of records removed.
    pub fn compact(&mut self) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|node| node.is_alive());
        self.nodes.dedup_by_key(|node| node.start);
        let removed = before - self.nodes.len();
        if removed > 0 {
            self.revision += 1;
        }
        debug!("Compacted octree, {removed} records dropped");
        removed
    }
}

impl VoxelIndex for MortonOctree {
    fn is_occupied(&self, x: i32, y: i32, z: i32) -> bool {
        if x < 0 || y < 0 || z < 0 {
            return false;
        }
        self.check_node(x as u32, y as u32, z as u32)
    }

    fn find_voxel(&self, x: i32, y: i32, z: i32) -> Option<VoxNode> {
        if x < 0 || y < 0 || z < 0 || !self.contains_coordinate(x as u32, y as u32, z as u32) {
            return None;
        }
        self.find_node(morton::encode(x as u32, y as u32, z as u32))
            .copied()
    }

    fn origin(&self) -> Point3<i32> {
        Point3::new(0, 0, 0)
    }

    fn depth(&self) -> u32 {
        self.depth
    }
}
