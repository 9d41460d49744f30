//! # Collision Module
//!
//! Spatial queries against a [`VoxelIndex`]:
//!
//! * box containment ([`CollisionManager::check_collision_b`]),
//! * nearest voxel along a ray ([`CollisionManager::collide`]), walking the implicit octree from
//!   the full index extent down to unit cells,
//! * swept boxes ([`CollisionManager::check_collision_swept`]), returning every impact of a
//!   moving box during one step.
//!
//! Resolving swept impacts into motion is done by [`swept_mover::SweptMover`].

pub mod aabb;
pub mod collision_info;
pub mod swept_mover;

use std::ops::Range;

use cgmath::{EuclideanSpace, InnerSpace, MetricSpace, Point3, Vector3};

use aabb::{ray_intersects_box, AxisAlignedBoundingBox};
use collision_info::{CollisionInfo, SweptCollision};

use super::morton;
use super::node::voxel_side::VoxelSide;
use super::octree::{MortonOctree, VoxelIndex};

/// Determinants and hit distances below this are treated as zero.
pub const FLOATING_POINT_ROUNDING_ERROR: f32 = 1e-5;

/// Collision queries over a borrowed voxel index.
pub struct CollisionManager<'a, I: VoxelIndex + ?Sized> {
    index: &'a I,
    /// Edge length of an octree node at each depth, root first, unit cells last.
    size_table: Vec<i32>,
}

impl<'a, I: VoxelIndex + ?Sized> CollisionManager<'a, I> {
    pub fn new(index: &'a I) -> Self {
        let depth = index.depth();
        let size_table = (0..=depth).map(|level| 1 << (depth - level)).collect();
        CollisionManager { index, size_table }
    }

    /// The index queries run against.
    pub fn index(&self) -> &I {
        self.index
    }

    /// Deepest level of the octree walk, where nodes are unit cells.
    pub fn max_depth(&self) -> usize {
        self.size_table.len() - 1
    }

    /// Slab test of a ray against the box `[box_min, box_max]`.
    pub fn check_collision(
        box_min: Vector3<f32>,
        box_max: Vector3<f32>,
        ray_start: Vector3<f32>,
        ray_inverse_direction: Vector3<f32>,
    ) -> bool {
        ray_intersects_box(box_min, box_max, ray_start, ray_inverse_direction)
    }

    /// Cells along one axis overlapped by `[min, max)`, clamped to the index.
    fn cell_range(&self, min: f32, max: f32, axis: usize) -> Range<i32> {
        let origin = self.index.origin()[axis];
        let end = origin + self.index.extent();
        let lo = (min.floor() as i32).max(origin);
        let hi = (max.ceil() as i32).min(end);
        lo..hi.max(lo)
    }

    fn cells_overlapping(
        &self,
        aabb: &AxisAlignedBoundingBox,
    ) -> (Range<i32>, Range<i32>, Range<i32>) {
        let (min, max) = (aabb.min(), aabb.max());
        (
            self.cell_range(min.x, max.x, 0),
            self.cell_range(min.y, max.y, 1),
            self.cell_range(min.z, max.z, 2),
        )
    }

    /// `true` when any occupied cell overlaps the box.
    ///
    /// Every covered cell is looked up, so this is meant for small, player sized boxes.
    pub fn check_collision_b(&self, aabb: &AxisAlignedBoundingBox) -> bool {
        let (xs, ys, zs) = self.cells_overlapping(aabb);
        for z in zs {
            for y in ys.clone() {
                for x in xs.clone() {
                    if self.index.is_occupied(x, y, z) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// `true` when the box, nudged slightly downwards, rests on an occupied cell.
    pub fn is_on_ground(&self, aabb: &AxisAlignedBoundingBox) -> bool {
        let mut probe = *aabb;
        probe.translate(Vector3::new(0.0, -0.001, 0.0));
        self.check_collision_b(&probe)
    }

    /// Every impact of `aabb` moving by `velocity` during one step.
    ///
    /// Hits are reported in cell iteration order. Callers wanting the earliest impact sort by
    /// `time` themselves.
    pub fn check_collision_swept(
        &self,
        aabb: &AxisAlignedBoundingBox,
        velocity: Vector3<f32>,
    ) -> Vec<SweptCollision> {
        let broadphase = aabb.broadphase(velocity);
        let (xs, ys, zs) = self.cells_overlapping(&broadphase);

        let mut collisions = Vec::new();
        for z in zs {
            for y in ys.clone() {
                for x in xs.clone() {
                    if !self.index.is_occupied(x, y, z) {
                        continue;
                    }
                    let voxel_box = AxisAlignedBoundingBox::unit_cell(x, y, z);
                    let (time, normal) = aabb.sweep_collides_with(&voxel_box, velocity);
                    if time != 1.0 {
                        collisions.push(SweptCollision {
                            voxel: Point3::new(x, y, z),
                            time,
                            normal,
                        });
                    }
                }
            }
        }
        collisions
    }

    /// Finds the nearest occupied cell along the ray described by `info`.
    pub fn collide(&self, info: &mut CollisionInfo) {
        self.collide_node(info, 0, self.index.origin());
    }

    fn collide_node(&self, info: &mut CollisionInfo, depth_level: usize, start: Point3<i32>) {
        let search_start = Vector3::new(start.x as f32, start.y as f32, start.z as f32);
        let size = self.size_table[depth_level] as f32;
        let search_end = search_start + Vector3::new(size, size, size);

        if !Self::check_collision(
            search_start,
            search_end,
            info.ray_start,
            info.ray_inverse_direction,
        ) {
            return;
        }

        if depth_level == self.max_depth() {
            let distance = Point3::from_vec(info.ray_start)
                .distance2(Point3::from_vec(search_start));
            if distance > 0.0 && distance < info.nearest_distance {
                if let Some(node) = self.index.find_voxel(start.x, start.y, start.z) {
                    info.nearest_distance = distance;
                    info.node = node;
                    info.position = start;
                }
            }
            return;
        }

        let depth_level = depth_level + 1;
        let s = self.size_table[depth_level];
        for offset in [
            Vector3::new(0, 0, 0),
            Vector3::new(s, 0, 0),
            Vector3::new(s, 0, s),
            Vector3::new(0, 0, s),
            Vector3::new(0, s, 0),
            Vector3::new(s, s, 0),
            Vector3::new(s, s, s),
            Vector3::new(0, s, s),
        ] {
            self.collide_node(info, depth_level, start + offset);
        }
    }

    /// Face of the voxel at `voxel_position` first struck by the ray.
    ///
    /// Faces are tested in the order TOP, BOTTOM, BACK, FRONT, LEFT, RIGHT and the first match
    /// wins. Faces whose normal points along the ray are skipped.
    pub fn get_collision_side(
        voxel_position: Vector3<f32>,
        ray_start: Vector3<f32>,
        ray_direction: Vector3<f32>,
    ) -> Option<VoxelSide> {
        let v = |x: f32, y: f32, z: f32| voxel_position + Vector3::new(x, y, z);
        let faces = [
            (
                VoxelSide::TOP,
                [v(0., 1., 0.), v(1., 1., 0.), v(0., 1., 1.)],
                [v(1., 1., 1.), v(1., 1., 0.), v(0., 1., 1.)],
            ),
            (
                VoxelSide::BOTTOM,
                [v(0., 0., 0.), v(1., 0., 0.), v(0., 0., 1.)],
                [v(1., 0., 1.), v(1., 0., 0.), v(0., 0., 1.)],
            ),
            (
                VoxelSide::BACK,
                [v(0., 0., 0.), v(1., 0., 0.), v(0., 1., 0.)],
                [v(0., 1., 0.), v(1., 0., 0.), v(1., 1., 0.)],
            ),
            (
                VoxelSide::FRONT,
                [v(0., 0., 1.), v(1., 0., 1.), v(0., 1., 1.)],
                [v(0., 1., 1.), v(1., 0., 1.), v(1., 1., 1.)],
            ),
            (
                VoxelSide::LEFT,
                [v(0., 0., 0.), v(0., 0., 1.), v(0., 1., 0.)],
                [v(0., 1., 1.), v(0., 0., 1.), v(0., 1., 0.)],
            ),
            (
                VoxelSide::RIGHT,
                [v(1., 0., 0.), v(1., 0., 1.), v(1., 1., 0.)],
                [v(1., 1., 1.), v(1., 0., 1.), v(1., 1., 0.)],
            ),
        ];

        faces.into_iter().find_map(|(side, first, second)| {
            let normal = side.normal();
            let hit = ray_intersects_triangle(first, normal, ray_start, ray_direction)
                || ray_intersects_triangle(second, normal, ray_start, ray_direction);
            hit.then_some(side)
        })
    }
}

/// Möller–Trumbore ray/triangle test, rejecting triangles facing away from the ray.
fn ray_intersects_triangle(
    [a, b, c]: [Vector3<f32>; 3],
    normal: Vector3<f32>,
    ray_start: Vector3<f32>,
    ray_direction: Vector3<f32>,
) -> bool {
    if normal.dot(ray_direction) > 0.0 {
        return false;
    }

    let ab = b - a;
    let ac = c - a;
    let p = ray_direction.cross(ac);
    let determinant = ab.dot(p);
    if determinant.abs() < FLOATING_POINT_ROUNDING_ERROR {
        return false;
    }
    let inverse_determinant = 1.0 / determinant;

    let t_vec = ray_start - a;
    let u = t_vec.dot(p) * inverse_determinant;
    if !(0.0..=1.0).contains(&u) {
        return false;
    }

    let q = t_vec.cross(ab);
    let v = ray_direction.dot(q) * inverse_determinant;
    if v < 0.0 || u + v > 1.0 {
        return false;
    }

    let t = ac.dot(q) * inverse_determinant;
    t > FLOATING_POINT_ROUNDING_ERROR
}

/// Box containment against a sorted store, scanning only the Morton key range the box can
/// possibly cover.
///
/// Every cell inside the box has, per axis, coordinates between those of the box's minimum and
/// maximum cell, so its key lies between their keys.
pub fn check_collision_ordered(octree: &MortonOctree, aabb: &AxisAlignedBoundingBox) -> bool {
    let limit = (octree.size() - 1) as f32;
    let clamp = |value: f32| value.clamp(0.0, limit).floor() as u32;
    let (min, max) = (aabb.min(), aabb.max());
    if max.x < 0.0 || max.y < 0.0 || max.z < 0.0 {
        return false;
    }

    let lower = morton::encode(clamp(min.x), clamp(min.y), clamp(min.z));
    let upper = morton::encode(clamp(max.x), clamp(max.y), clamp(max.z));

    octree
        .nodes_in_key_range(lower, upper)
        .iter()
        .filter(|node| node.is_alive())
        .flat_map(|node| node.start..node.end())
        .any(|key| {
            let (x, y, z) = morton::decode(key);
            aabb.intersects_with(&AxisAlignedBoundingBox::unit_cell(
                x as i32, y as i32, z as i32,
            ))
        })
}
