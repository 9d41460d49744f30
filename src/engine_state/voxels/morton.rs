//! # Morton Codec
//!
//! Bit-interleaves three 10-bit coordinates into a single 30-bit key so that cells which are
//! close in space are close in key order. Every other voxel structure in the engine is a sorted
//! sequence over these keys.
//!
//! Bit layout of a key: `... z1 y1 x1 z0 y0 x0`. Because of this interleaving, the low
//! 15 bits of a key address a cell inside one 32³ sub-chunk and the remaining high bits address
//! the sub-chunk itself.

use cgmath::Point3;

use super::node::VoxNode;

/// Number of bits stored per axis.
pub const MORTON_AXIS_BITS: u32 = 10;

/// Edge length of the addressable world in cells.
pub const WORLD_EXTENT: u32 = 1 << MORTON_AXIS_BITS;

/// All key bits that may be set.
pub const MORTON_KEY_MASK: u32 = (1 << (MORTON_AXIS_BITS * 3)) - 1;

/// log2 of the sub-chunk edge length.
pub const SUB_CHUNK_EDGE_BITS: u32 = 5;

/// Edge length of a sub-chunk in cells.
pub const SUB_CHUNK_EDGE: u32 = 1 << SUB_CHUNK_EDGE_BITS;

/// Number of cells (and keys) in one sub-chunk.
pub const VOXELS_IN_CHUNK: u32 = SUB_CHUNK_EDGE * SUB_CHUNK_EDGE * SUB_CHUNK_EDGE;

/// Mask selecting the in-sub-chunk part of a key.
pub const LOCAL_VOXEL_MASK: u32 = VOXELS_IN_CHUNK - 1;

/// Mask selecting the sub-chunk part of a key.
pub const CHUNK_MASK: u32 = !LOCAL_VOXEL_MASK & MORTON_KEY_MASK;

/// Spreads the low 10 bits of `value` so that there are two zero bits between each of them.
fn split_by_3(value: u32) -> u32 {
    let mut x = value & 0x0000_03ff;
    x = (x | (x << 16)) & 0x0300_00ff;
    x = (x | (x << 8)) & 0x0300_f00f;
    x = (x | (x << 4)) & 0x030c_30c3;
    x = (x | (x << 2)) & 0x0924_9249;
    x
}

/// Inverse of [`split_by_3`].
fn compact_by_3(value: u32) -> u32 {
    let mut x = value & 0x0924_9249;
    x = (x ^ (x >> 2)) & 0x030c_30c3;
    x = (x ^ (x >> 4)) & 0x0300_f00f;
    x = (x ^ (x >> 8)) & 0xff00_00ff;
    x = (x ^ (x >> 16)) & 0x0000_03ff;
    x
}

/// Encodes a cell coordinate into its Morton key.
///
/// Coordinates are truncated to [`MORTON_AXIS_BITS`] bits; callers clamp beforehand.
#[inline]
pub fn encode(x: u32, y: u32, z: u32) -> u32 {
    split_by_3(x) | (split_by_3(y) << 1) | (split_by_3(z) << 2)
}

/// Decodes a Morton key back into `(x, y, z)`.
#[inline]
pub fn decode(key: u32) -> (u32, u32, u32) {
    (compact_by_3(key), compact_by_3(key >> 1), compact_by_3(key >> 2))
}

/// Decodes a Morton key into a point.
#[inline]
pub fn decode_point(key: u32) -> Point3<u32> {
    let (x, y, z) = decode(key);
    Point3::new(x, y, z)
}

/// Returns the first key of the sub-chunk containing `key`.
#[inline]
pub fn get_chunk(key: u32) -> u32 {
    key & CHUNK_MASK
}

/// Returns the first key of the sub-chunk that follows `key`'s sub-chunk along the curve.
///
/// The Morton curve is not monotone in any single axis, so this is generally *not* the
/// neighbouring sub-chunk in +X.
#[inline]
pub fn next_chunk(key: u32) -> u32 {
    key.wrapping_add(VOXELS_IN_CHUNK) & CHUNK_MASK
}

/// Sub-chunk grid coordinate of the cell addressed by `key`, computed per axis.
pub fn sub_chunk_coordinates(key: u32) -> Point3<u32> {
    let (x, y, z) = decode(key);
    Point3::new(
        x >> SUB_CHUNK_EDGE_BITS,
        y >> SUB_CHUNK_EDGE_BITS,
        z >> SUB_CHUNK_EDGE_BITS,
    )
}

/// Local coordinate of `key` inside its sub-chunk, each axis in `0..SUB_CHUNK_EDGE`.
pub fn local_coordinates(key: u32) -> (u32, u32, u32) {
    decode(key & LOCAL_VOXEL_MASK)
}

/// Returns `true` when the first cell of `node` lies in the sub-chunk starting at `chunk`.
pub fn is_node_in_chunk(node: &VoxNode, chunk: u32) -> bool {
    get_chunk(node.start) == chunk
}

/// Number of sub-chunks touched by a run, counting the one it starts in.
pub fn voxel_chunk_span(node: &VoxNode) -> u32 {
    if node.size == 0 {
        return 0;
    }
    let last = node.start.saturating_add(node.size - 1);
    ((get_chunk(last) - get_chunk(node.start)) / VOXELS_IN_CHUNK) + 1
}

/// First key of the sub-chunk holding the last cell of `node`.
pub fn get_node_end_chunk(node: &VoxNode) -> u32 {
    get_chunk(node.start.saturating_add(node.size.saturating_sub(1)))
}

/// Clamps the run so it ends at the boundary of the aligned block of `2^(3 * edge_log2)` keys
/// it starts in. Returns the number of cells cut off.
pub fn fit_node_to_block(node: &mut VoxNode, edge_log2: u32) -> u32 {
    let block_volume = 1u32 << (edge_log2 * 3);
    let block_end = (node.start & !(block_volume - 1)) + block_volume;
    let available = block_end - node.start;
    if node.size > available {
        let leftover = node.size - available;
        node.size = available;
        leftover
    } else {
        0
    }
}

/// Clamps the run to the sub-chunk it starts in. Returns the number of cells cut off.
pub fn fit_node_to_chunk(node: &mut VoxNode) -> u32 {
    fit_node_to_block(node, SUB_CHUNK_EDGE_BITS)
}
