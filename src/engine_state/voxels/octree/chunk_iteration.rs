//! # Sub-Chunk Iteration
//!
//! Splits the sorted record sequence of a store into per-sub-chunk spans, the unit of meshing.
//!
//! Sub-chunk membership is decided by decoding keys and comparing the per-axis sub-chunk
//! coordinates. A run that crosses a sub-chunk boundary is cut into one piece per sub-chunk.

use std::collections::BTreeMap;

use cgmath::Point3;

use super::MortonOctree;
use crate::engine_state::voxels::morton::{self, VOXELS_IN_CHUNK};
use crate::engine_state::voxels::node::VoxNode;

/// The records of one sub-chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct SubChunkSpan {
    /// First Morton key of the sub-chunk.
    pub chunk_key: u32,
    /// Live records inside the sub-chunk, in key order, clipped to its boundary.
    pub nodes: Vec<VoxNode>,
}

impl SubChunkSpan {
    /// Sub-chunk grid coordinate.
    pub fn coordinates(&self) -> Point3<u32> {
        morton::sub_chunk_coordinates(self.chunk_key)
    }

    /// Cell offset of the sub-chunk's minimum corner.
    pub fn local_offset(&self) -> Point3<u32> {
        morton::decode_point(self.chunk_key)
    }
}

/// Cuts a live run into pieces that each stay inside one sub-chunk.
fn split_run(node: &VoxNode, mut emit: impl FnMut(u32, VoxNode)) {
    let end = node.end();
    let mut piece_start = node.start;
    while piece_start < end {
        let cell = morton::sub_chunk_coordinates(piece_start);
        let mut piece_end = piece_start + 1;
        while piece_end < end && morton::sub_chunk_coordinates(piece_end) == cell {
            piece_end += 1;
        }
        let mut piece = *node;
        piece.start = piece_start;
        piece.size = piece_end - piece_start;
        emit(morton::get_chunk(piece_start), piece);
        piece_start = piece_end;
    }
}

/// Groups a sorted record slice by sub-chunk.
///
/// Sub-chunks that only contain tombstones are reported with an empty node list, so that a
/// sub-chunk whose last voxel was removed still gets re-meshed to nothing.
pub fn sub_chunk_spans(nodes: &[VoxNode]) -> Vec<SubChunkSpan> {
    let mut spans: BTreeMap<u32, Vec<VoxNode>> = BTreeMap::new();
    for node in nodes {
        if !node.is_alive() {
            spans.entry(morton::get_chunk(node.start)).or_default();
            continue;
        }
        split_run(node, |chunk_key, piece| {
            spans.entry(chunk_key).or_default().push(piece)
        });
    }

    spans
        .into_iter()
        .map(|(chunk_key, nodes)| SubChunkSpan { chunk_key, nodes })
        .collect()
}

impl MortonOctree {
    /// All sub-chunks that hold records, in key order.
    pub fn sub_chunk_spans(&self) -> Vec<SubChunkSpan> {
        sub_chunk_spans(self.nodes())
    }

    /// Copies the live records of the sub-chunk starting at `chunk_key`.
    ///
    /// A run that starts in an earlier sub-chunk and reaches into this one contributes its
    /// clipped tail.
    pub fn sub_chunk_span(&self, chunk_key: u32) -> SubChunkSpan {
        let chunk_key = morton::get_chunk(chunk_key);
        let begin = self.lower_bound(chunk_key);
        let end = self.lower_bound(chunk_key.saturating_add(VOXELS_IN_CHUNK));

        let mut nodes = Vec::with_capacity(end - begin + 1);
        let mut keep = |key: u32, piece: VoxNode| {
            if key == chunk_key {
                nodes.push(piece);
            }
        };
        if let Some(previous) = begin.checked_sub(1).map(|index| &self.nodes()[index]) {
            if previous.is_alive() && previous.end() > chunk_key {
                split_run(previous, &mut keep);
            }
        }
        for node in self.nodes()[begin..end].iter().filter(|node| node.is_alive()) {
            split_run(node, &mut keep);
        }

        SubChunkSpan { chunk_key, nodes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::morton::encode;

    #[test]
    fn groups_by_sub_chunk() {
        let mut octree = MortonOctree::new();
        octree.add_node(VoxNode::with_texture(encode(0, 0, 0), 1));
        octree.add_node(VoxNode::with_texture(encode(31, 31, 31), 1));
        octree.add_node(VoxNode::with_texture(encode(32, 0, 0), 1));
        octree.add_node(VoxNode::with_texture(encode(0, 0, 40), 1));

        let spans = octree.sub_chunk_spans();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].nodes.len(), 2);
        assert_eq!(spans[0].coordinates(), Point3::new(0, 0, 0));
        assert_eq!(spans[1].coordinates(), Point3::new(1, 0, 0));
        assert_eq!(spans[2].coordinates(), Point3::new(0, 0, 1));
        assert_eq!(spans[2].local_offset(), Point3::new(0, 0, 32));
    }

    #[test]
    fn splits_crossing_runs() {
        let node = VoxNode::new(VOXELS_IN_CHUNK - 2, 5, 1, 1, 1);
        let spans = sub_chunk_spans(&[node]);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].nodes[0].size, 2);
        assert_eq!(spans[1].nodes[0].start, VOXELS_IN_CHUNK);
        assert_eq!(spans[1].nodes[0].size, 3);
    }

    #[test]
    fn tombstoned_sub_chunk_is_reported_empty() {
        let mut octree = MortonOctree::new();
        octree.add_node(VoxNode::with_texture(encode(40, 0, 0), 1));
        octree.remove_node(40, 0, 0);
        let spans = octree.sub_chunk_spans();
        assert_eq!(spans.len(), 1);
        assert!(spans[0].nodes.is_empty());
    }

    #[test]
    fn single_span_matches_grouping() {
        let mut octree = MortonOctree::new();
        octree.add_orphan_node(VoxNode::new(VOXELS_IN_CHUNK - 1, 3, 2, 2, 2));
        octree.add_orphan_node(VoxNode::with_texture(VOXELS_IN_CHUNK + 10, 2));
        octree.sort_leaf_nodes();

        let span = octree.sub_chunk_span(VOXELS_IN_CHUNK);
        let grouped = octree.sub_chunk_spans();
        assert_eq!(span.nodes.len(), 2);
        assert_eq!(span, grouped[1]);
    }
}
