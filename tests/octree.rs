use sparse_voxel_engine::engine_state::voxels::morton::{self, encode, fit_node_to_block};
use sparse_voxel_engine::engine_state::voxels::node::VoxNode;
use sparse_voxel_engine::engine_state::voxels::octree::MortonOctree;

#[test]
fn random_edits_match_a_reference_set() {
    let mut rng = fastrand::Rng::with_seed(99);
    let mut octree = MortonOctree::with_depth(6);
    let mut reference = std::collections::HashSet::new();

    for _ in 0..5000 {
        let (x, y, z) = (rng.u32(0..64), rng.u32(0..64), rng.u32(0..64));
        if rng.bool() {
            octree.add_node(VoxNode::with_texture(encode(x, y, z), 1));
            reference.insert((x, y, z));
        } else {
            let removed = octree.remove_node(x, y, z);
            assert_eq!(removed, reference.remove(&(x, y, z)));
        }
    }

    assert!(octree.is_sorted());
    assert_eq!(octree.live_node_count(), reference.len());
    for z in 0..64 {
        for y in 0..64 {
            for x in 0..64 {
                assert_eq!(octree.check_node(x, y, z), reference.contains(&(x, y, z)));
            }
        }
    }
}

#[test]
fn bulk_load_then_sort() {
    let mut rng = fastrand::Rng::with_seed(5);
    let mut octree = MortonOctree::new();
    for _ in 0..2000 {
        octree.add_orphan_node(VoxNode::new(rng.u32(0..100_000), rng.u32(1..5), 1, 1, 1));
    }
    octree.sort_leaf_nodes();
    assert!(octree.is_sorted());
}

#[test]
fn removing_a_missing_voxel_mutates_nothing() {
    let mut octree = MortonOctree::new();
    octree.add_node(VoxNode::with_texture(encode(1, 2, 3), 1));
    let before = octree.nodes().to_vec();

    assert!(!octree.remove_node(3, 2, 1));
    assert!(!octree.remove_node(2000, 0, 0));
    assert_eq!(octree.nodes(), &before[..]);
}

#[test]
fn run_fitted_to_eight_cells() {
    let mut node = VoxNode::new(encode(0, 0, 0), 10, 1, 1, 1);
    let leftover = fit_node_to_block(&mut node, 1);
    assert_eq!((node.start, node.size, leftover), (0, 8, 2));
}

#[test]
fn sub_chunk_key_is_stable_inside_the_sub_chunk() {
    let mut rng = fastrand::Rng::with_seed(3);
    for _ in 0..1000 {
        let (cx, cy, cz) = (rng.u32(0..32), rng.u32(0..32), rng.u32(0..32));
        let base = encode(cx * 32, cy * 32, cz * 32);
        let key = encode(cx * 32 + rng.u32(0..32), cy * 32 + rng.u32(0..32), cz * 32 + rng.u32(0..32));
        assert_eq!(morton::get_chunk(key), base);
    }
}
