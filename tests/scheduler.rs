use std::thread;
use std::time::{Duration, Instant};

use cgmath::Point3;
use sparse_voxel_engine::engine_state::buffer_state::HeadlessBufferState;
use sparse_voxel_engine::engine_state::rendering::WorldRenderer;
use sparse_voxel_engine::engine_state::voxels::world::World;

/// Ticks until every job is finalized and returns how many ticks finalized one.
fn drain(renderer: &mut WorldRenderer, backend: &mut HeadlessBufferState) -> usize {
    let mut finalized = 0;
    let deadline = Instant::now() + Duration::from_secs(20);
    while renderer.jobs_in_flight() > 0 && Instant::now() < deadline {
        if renderer.update(backend) {
            finalized += 1;
        } else {
            thread::sleep(Duration::from_millis(1));
        }
    }
    finalized
}

fn positions(backend: &HeadlessBufferState, renderer: &WorldRenderer, offset: Point3<i32>) -> Vec<f32> {
    let sub_chunk = renderer.sub_chunk(offset).expect("sub-chunk should exist");
    let handle = sub_chunk
        .get()
        .active_buffer()
        .handle()
        .expect("a non-empty mesh has a buffer array");
    backend
        .buffer_data(handle, 1)
        .expect("position buffer")
        .chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect()
}

#[test]
fn each_sub_chunk_is_finalized_once_with_its_own_mesh() {
    let mut world = World::new();
    let mut offsets = Vec::new();
    for i in 0..8 {
        let offset = Point3::new((i & 1) * 32, ((i >> 1) & 1) * 32, ((i >> 2) & 1) * 32);
        world.add_node(offset.x + i, offset.y + i, offset.z + i, [1, 1, 1]);
        offsets.push(offset);
    }

    let mut renderer = WorldRenderer::new(4, 16);
    let mut backend = HeadlessBufferState::new();
    assert_eq!(renderer.generate_visible_chunks(&world), 8);
    assert_eq!(drain(&mut renderer, &mut backend), 8, "one finalize per job");
    assert!(!renderer.update(&mut backend), "no extra finalize");

    for (i, offset) in offsets.into_iter().enumerate() {
        let coordinates = positions(&backend, &renderer, offset);
        let min = coordinates.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = coordinates.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(min, i as f32, "sub-chunk {offset:?} got another sub-chunk's mesh");
        assert_eq!(max, i as f32 + 1.0);

        let sub_chunk = renderer.sub_chunk(offset).unwrap().get();
        assert!(sub_chunk.is_ready());
        assert!(!sub_chunk.is_dirty());
    }
}

#[test]
fn edit_while_meshing_is_not_lost() {
    let mut world = World::new();
    world.add_node(3, 3, 3, [1, 1, 1]);

    let mut renderer = WorldRenderer::new(1, 16);
    let mut backend = HeadlessBufferState::new();
    assert_eq!(renderer.generate_visible_chunks(&world), 1);

    // the edit lands while the job is in flight
    world.add_node(4, 3, 3, [1, 1, 1]);
    assert!(renderer.set_chunk_dirty(Point3::new(0, 0, 0)));
    assert_eq!(drain(&mut renderer, &mut backend), 1);

    {
        let sub_chunk = renderer.sub_chunk(Point3::new(0, 0, 0)).unwrap().get();
        assert!(sub_chunk.is_ready(), "the stale mesh is still swapped in");
        assert!(sub_chunk.is_dirty(), "the edit keeps the sub-chunk dirty");
        assert_eq!(sub_chunk.active_buffer().index_count(), 36);
    }

    assert_eq!(renderer.generate_visible_chunks(&world), 1);
    drain(&mut renderer, &mut backend);
    let sub_chunk = renderer.sub_chunk(Point3::new(0, 0, 0)).unwrap().get();
    assert!(!sub_chunk.is_dirty());
    let coordinates = positions(&backend, &renderer, Point3::new(0, 0, 0));
    assert!(coordinates.contains(&5.0), "the new voxel is meshed");
}

#[test]
fn shutdown_with_queued_jobs_does_not_hang() {
    let mut world = World::new();
    for i in 0..4 {
        world.add_node(i * 32, 0, 0, [2, 2, 2]);
    }
    let mut renderer = WorldRenderer::new(2, 16);
    renderer.generate_visible_chunks(&world);
    drop(renderer);
}
