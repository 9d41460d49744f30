//! Moves a box through the voxel world one step at a time, stopping at the first surface hit.

use cgmath::Vector3;

use super::aabb::AxisAlignedBoundingBox;
use super::CollisionManager;
use crate::engine_state::voxels::octree::VoxelIndex;

/// Upper bound on re-queries per step, guarding against degenerate geometry.
pub const MAX_ITERATIONS: usize = 20;

/// Outcome of one [`SweptMover::move_and_collide`] step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweptMove {
    pub position: Vector3<f32>,
    /// Velocity actually applied, after clamping.
    pub applied_velocity: Vector3<f32>,
    /// `true` when at least one impact clamped the motion.
    pub collided: bool,
}

/// A moving box of fixed size, such as a player body.
#[derive(Debug, Clone, Copy)]
pub struct SweptMover {
    half_size: Vector3<f32>,
}

/// Axis a hit normal points along.
fn normal_axis(normal: Vector3<f32>) -> usize {
    if normal.x != 0.0 {
        0
    } else if normal.y != 0.0 {
        1
    } else {
        2
    }
}

impl SweptMover {
    pub fn new(width: f32, height: f32) -> Self {
        SweptMover {
            half_size: Vector3::new(width / 2.0, height / 2.0, width / 2.0),
        }
    }

    /// The mover's box centred on `position`.
    pub fn aabb_at(&self, position: Vector3<f32>) -> AxisAlignedBoundingBox {
        AxisAlignedBoundingBox::new(position, self.half_size)
    }

    /// Advances `position` by `velocity`, clamping the motion at impacts.
    ///
    /// Each round sorts the impacts by time and scales the velocity component along the earliest
    /// hit's normal by that hit's time, then queries again. After [`MAX_ITERATIONS`] rounds the
    /// remaining clamped velocity is applied regardless.
    pub fn move_and_collide<I: VoxelIndex + ?Sized>(
        &self,
        collision: &CollisionManager<'_, I>,
        position: Vector3<f32>,
        velocity: Vector3<f32>,
    ) -> SweptMove {
        let mut velocity = velocity;
        for iteration in 0..MAX_ITERATIONS {
            if velocity == Vector3::new(0.0, 0.0, 0.0) {
                return SweptMove {
                    position,
                    applied_velocity: velocity,
                    collided: iteration > 0,
                };
            }

            let mut collisions =
                collision.check_collision_swept(&self.aabb_at(position), velocity);
            if collisions.is_empty() {
                return SweptMove {
                    position: position + velocity,
                    applied_velocity: velocity,
                    collided: iteration > 0,
                };
            }

            collisions.sort_by(|a, b| a.time.total_cmp(&b.time));
            let first = collisions[0];
            velocity[normal_axis(first.normal)] *= first.time;
        }

        SweptMove {
            position: position + velocity,
            applied_velocity: velocity,
            collided: true,
        }
    }

    /// `true` when the mover standing at `position` rests on a voxel.
    pub fn is_on_ground<I: VoxelIndex + ?Sized>(
        &self,
        collision: &CollisionManager<'_, I>,
        position: Vector3<f32>,
    ) -> bool {
        collision.is_on_ground(&self.aabb_at(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::morton::encode;
    use crate::engine_state::voxels::node::VoxNode;
    use crate::engine_state::voxels::octree::MortonOctree;

    fn floor(size: u32) -> MortonOctree {
        let mut octree = MortonOctree::new();
        for z in 0..size {
            for x in 0..size {
                octree.add_orphan_node(VoxNode::with_texture(encode(x, 0, z), 1));
            }
        }
        octree.sort_leaf_nodes();
        octree
    }

    #[test]
    fn falling_box_lands_on_floor() {
        let octree = floor(8);
        let collision = CollisionManager::new(&octree);
        let mover = SweptMover::new(0.8, 1.8);

        let start = Vector3::new(4.0, 3.0, 4.0);
        let result = mover.move_and_collide(&collision, start, Vector3::new(0.0, -5.0, 0.0));

        assert!(result.collided);
        // bottom of the box rests on top of the floor at y = 1
        assert!((result.position.y - 1.9).abs() < 1e-4, "landed at {:?}", result.position);
        assert!(mover.is_on_ground(&collision, result.position));
    }

    #[test]
    fn free_motion_is_unchanged() {
        let octree = floor(8);
        let collision = CollisionManager::new(&octree);
        let mover = SweptMover::new(0.8, 1.8);

        let start = Vector3::new(4.0, 5.0, 4.0);
        let result = mover.move_and_collide(&collision, start, Vector3::new(1.0, 0.5, 0.0));
        assert!(!result.collided);
        assert_eq!(result.position, Vector3::new(5.0, 5.5, 4.0));
        assert!(!mover.is_on_ground(&collision, result.position));
    }

    #[test]
    fn sliding_keeps_lateral_motion() {
        let octree = floor(16);
        let collision = CollisionManager::new(&octree);
        let mover = SweptMover::new(0.8, 1.8);

        let start = Vector3::new(4.0, 2.0, 4.0);
        let result = mover.move_and_collide(&collision, start, Vector3::new(2.0, -1.0, 0.0));
        assert!(result.collided);
        assert!((result.position.x - 6.0).abs() < 1e-4);
        assert!((result.position.y - 1.9).abs() < 1e-4);
    }
}
