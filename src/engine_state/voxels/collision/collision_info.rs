use cgmath::{InnerSpace, Point3, Vector3};

use crate::engine_state::voxels::node::{VoxNode, TOMBSTONE};

/// State of a nearest-voxel ray query. Filled in by `CollisionManager::collide`.
#[derive(Debug, Clone, Copy)]
pub struct CollisionInfo {
    /// The voxel hit, or a tombstone when nothing was hit.
    pub node: VoxNode,
    /// Cell coordinate of the hit voxel.
    pub position: Point3<i32>,
    /// Squared distance from the ray start to the hit cell's minimum corner.
    pub nearest_distance: f32,
    pub ray_start: Vector3<f32>,
    /// Normalised ray direction.
    pub ray_direction: Vector3<f32>,
    /// `1 / direction` per component, as the slab test wants it.
    pub ray_inverse_direction: Vector3<f32>,
}

impl CollisionInfo {
    pub fn new(ray_start: Vector3<f32>, ray_direction: Vector3<f32>) -> Self {
        let direction = if ray_direction.magnitude2() > 0.0 {
            ray_direction.normalize()
        } else {
            ray_direction
        };

        CollisionInfo {
            node: VoxNode::tombstone(0),
            position: Point3::new(0, 0, 0),
            nearest_distance: f32::INFINITY,
            ray_start,
            ray_direction: direction,
            ray_inverse_direction: Vector3::new(
                1.0 / ray_direction.x,
                1.0 / ray_direction.y,
                1.0 / ray_direction.z,
            ),
        }
    }

    pub fn has_collided(&self) -> bool {
        self.node.size != TOMBSTONE
    }
}

/// One impact reported by a swept box query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweptCollision {
    /// Cell coordinate of the voxel that was hit.
    pub voxel: Point3<i32>,
    /// Fraction of the velocity travelled before impact, in `[0, 1)`.
    pub time: f32,
    /// Surface normal of the hit face.
    pub normal: Vector3<f32>,
}
