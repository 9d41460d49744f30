use cgmath::{Point3, Vector3};
use sparse_voxel_engine::engine_state::voxels::collision::aabb::AxisAlignedBoundingBox;
use sparse_voxel_engine::engine_state::voxels::collision::swept_mover::SweptMover;
use sparse_voxel_engine::engine_state::voxels::collision::CollisionManager;
use sparse_voxel_engine::engine_state::voxels::world::World;

/// A two-voxel thick floor spanning the four super-chunks around the origin.
fn floor_world() -> World {
    let mut world = World::new();
    for z in -40..40 {
        for x in -40..40 {
            world.add_node(x, 0, z, [1, 1, 1]);
            world.add_node(x, 1, z, [1, 1, 1]);
        }
    }
    world
}

#[test]
fn isolated_voxel_swept_hit_time() {
    let mut world = World::new();
    world.add_node(-10, 20, 300, [5, 5, 5]);
    let collision = CollisionManager::new(&world);

    let aabb = AxisAlignedBoundingBox::new(
        Vector3::new(-9.5, 24.5, 300.5),
        Vector3::new(0.5, 0.5, 0.5),
    );
    let hits = collision.check_collision_swept(&aabb, Vector3::new(0.0, -6.0, 0.0));

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].voxel, Point3::new(-10, 20, 300));
    // bottom face at 24 meets the top face at 21 after 3 of 6 units
    assert!((hits[0].time - 0.5).abs() < 1e-5, "time was {}", hits[0].time);
    assert_eq!(hits[0].normal, Vector3::new(0.0, 1.0, 0.0));
}

#[test]
fn falling_body_lands_across_super_chunk_corner() {
    let world = floor_world();
    let collision = CollisionManager::new(&world);
    let mover = SweptMover::new(0.6, 1.8);

    let start = Vector3::new(0.0, 5.0, 0.0);
    let step = mover.move_and_collide(&collision, start, Vector3::new(0.0, -10.0, 0.0));

    assert!(step.collided);
    assert!((step.position.y - 2.9).abs() < 1e-3, "landed at {}", step.position.y);
    assert_eq!(step.position.x, 0.0);
    assert_eq!(step.position.z, 0.0);
    assert!(mover.is_on_ground(&collision, step.position));
    assert!(!collision.check_collision_b(&mover.aabb_at(step.position + Vector3::new(0.0, 0.01, 0.0))));
}

#[test]
fn box_containment_with_negative_coordinates() {
    let world = floor_world();
    let collision = CollisionManager::new(&world);

    let inside = AxisAlignedBoundingBox::new(Vector3::new(-20.5, 1.5, -3.5), Vector3::new(0.2, 0.2, 0.2));
    let above = AxisAlignedBoundingBox::new(Vector3::new(-20.5, 3.5, -3.5), Vector3::new(0.2, 0.2, 0.2));
    let outside = AxisAlignedBoundingBox::new(Vector3::new(-60.5, 1.5, -3.5), Vector3::new(0.2, 0.2, 0.2));
    assert!(collision.check_collision_b(&inside));
    assert!(!collision.check_collision_b(&above));
    assert!(!collision.check_collision_b(&outside));
}
