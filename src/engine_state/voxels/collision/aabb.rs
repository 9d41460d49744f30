//! Axis aligned bounding boxes stored as center and half size.

use cgmath::{Point3, Vector3};

/// Slab test of a ray against the box `[min, max]`.
///
/// `ray_inverse_direction` holds `1 / direction` per component. Returns `true` when the ray's
/// parametric interval inside the box is non-empty and not entirely behind `ray_start`. The
/// arithmetic runs in `f64` to keep grazing hits stable.
pub fn ray_intersects_box(
    min: Vector3<f32>,
    max: Vector3<f32>,
    ray_start: Vector3<f32>,
    ray_inverse_direction: Vector3<f32>,
) -> bool {
    let mut t_min = f64::NEG_INFINITY;
    let mut t_max = f64::INFINITY;
    for axis in 0..3 {
        let inverse = ray_inverse_direction[axis] as f64;
        let t1 = (min[axis] as f64 - ray_start[axis] as f64) * inverse;
        let t2 = (max[axis] as f64 - ray_start[axis] as f64) * inverse;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
    }
    t_max >= t_min.max(0.0) && t_min < f32::MAX as f64
}

/// An axis aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAlignedBoundingBox {
    center: Vector3<f32>,
    half_size: Vector3<f32>,
}

impl Default for AxisAlignedBoundingBox {
    fn default() -> Self {
        Self::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0))
    }
}

impl AxisAlignedBoundingBox {
    pub fn new(center: Vector3<f32>, half_size: Vector3<f32>) -> Self {
        AxisAlignedBoundingBox { center, half_size }
    }

    pub fn from_min_max(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        AxisAlignedBoundingBox {
            center: (min + max) * 0.5,
            half_size: (max - min) * 0.5,
        }
    }

    /// The unit box of the cell with minimum corner `(x, y, z)`.
    pub fn unit_cell(x: i32, y: i32, z: i32) -> Self {
        Self::new(
            Vector3::new(x as f32 + 0.5, y as f32 + 0.5, z as f32 + 0.5),
            Vector3::new(0.5, 0.5, 0.5),
        )
    }

    pub fn center(&self) -> Vector3<f32> {
        self.center
    }

    pub fn half_size(&self) -> Vector3<f32> {
        self.half_size
    }

    pub fn min(&self) -> Vector3<f32> {
        self.center - self.half_size
    }

    pub fn max(&self) -> Vector3<f32> {
        self.center + self.half_size
    }

    /// Collapses the box onto a single point.
    pub fn reset(&mut self, point: Vector3<f32>) {
        self.center = point;
        self.half_size = Vector3::new(0.0, 0.0, 0.0);
    }

    /// Grows the box until it contains `point`.
    pub fn add_point(&mut self, point: Vector3<f32>) {
        let min = self.min();
        let max = self.max();
        let min = Vector3::new(min.x.min(point.x), min.y.min(point.y), min.z.min(point.z));
        let max = Vector3::new(max.x.max(point.x), max.y.max(point.y), max.z.max(point.z));
        *self = Self::from_min_max(min, max);
    }

    /// The eight corners.
    pub fn calculate_points(&self) -> [Point3<f32>; 8] {
        let min = self.min();
        let max = self.max();
        [
            Point3::new(min.x, min.y, min.z),
            Point3::new(max.x, min.y, min.z),
            Point3::new(max.x, min.y, max.z),
            Point3::new(min.x, min.y, max.z),
            Point3::new(min.x, max.y, min.z),
            Point3::new(max.x, max.y, min.z),
            Point3::new(max.x, max.y, max.z),
            Point3::new(min.x, max.y, max.z),
        ]
    }

    pub fn contains_point(&self, point: Vector3<f32>) -> bool {
        let min = self.min();
        let max = self.max();
        (0..3).all(|axis| point[axis] >= min[axis] && point[axis] <= max[axis])
    }

    /// Strict overlap: boxes that only touch do not intersect.
    pub fn intersects_with(&self, other: &AxisAlignedBoundingBox) -> bool {
        self.intersects_with_center(other.center, other.half_size)
    }

    pub fn intersects_with_center(&self, center: Vector3<f32>, half_size: Vector3<f32>) -> bool {
        (0..3).all(|axis| {
            (self.center[axis] - center[axis]).abs() < self.half_size[axis] + half_size[axis]
        })
    }

    pub fn collides_with_ray(
        &self,
        ray_start: Vector3<f32>,
        ray_inverse_direction: Vector3<f32>,
    ) -> bool {
        ray_intersects_box(self.min(), self.max(), ray_start, ray_inverse_direction)
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.center += offset;
    }

    pub fn set_center(&mut self, center: Vector3<f32>) {
        self.center = center;
    }

    /// Box covering everything this box touches while moving by `velocity`.
    pub fn broadphase(&self, velocity: Vector3<f32>) -> AxisAlignedBoundingBox {
        let half_velocity = velocity * 0.5;
        AxisAlignedBoundingBox::new(
            self.center + half_velocity,
            self.half_size
                + Vector3::new(
                    half_velocity.x.abs(),
                    half_velocity.y.abs(),
                    half_velocity.z.abs(),
                ),
        )
    }

    /// Swept test of this box moving by `velocity` against the static `other`.
    ///
    /// # Returns
    /// The fraction of `velocity` travelled before first contact and the contact normal on
    /// `other`. A time of exactly `1.0` with a zero normal means no impact during the step.
    /// Boxes that already overlap also report `1.0`.
    pub fn sweep_collides_with(
        &self,
        other: &AxisAlignedBoundingBox,
        velocity: Vector3<f32>,
    ) -> (f32, Vector3<f32>) {
        let no_hit = (1.0, Vector3::new(0.0, 0.0, 0.0));
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());

        let mut inverse_entry = [0.0f32; 3];
        let mut entry = [0.0f32; 3];
        let mut exit = [0.0f32; 3];
        for axis in 0..3 {
            let v = velocity[axis];
            if v > 0.0 {
                inverse_entry[axis] = b_min[axis] - a_max[axis];
                entry[axis] = inverse_entry[axis] / v;
                exit[axis] = (b_max[axis] - a_min[axis]) / v;
            } else if v < 0.0 {
                inverse_entry[axis] = b_max[axis] - a_min[axis];
                entry[axis] = inverse_entry[axis] / v;
                exit[axis] = (b_min[axis] - a_max[axis]) / v;
            } else {
                // a still axis can never start or end the contact, only forbid it
                if a_max[axis] <= b_min[axis] || a_min[axis] >= b_max[axis] {
                    return no_hit;
                }
                entry[axis] = f32::NEG_INFINITY;
                exit[axis] = f32::INFINITY;
            }
        }

        let entry_time = entry[0].max(entry[1]).max(entry[2]);
        let exit_time = exit[0].min(exit[1]).min(exit[2]);

        if entry_time > exit_time
            || entry.iter().all(|&t| t < 0.0)
            || entry.iter().any(|&t| t > 1.0)
        {
            return no_hit;
        }

        let axis = (0..3)
            .find(|&axis| entry[axis] == entry_time)
            .unwrap_or(0);
        let mut normal = Vector3::new(0.0, 0.0, 0.0);
        normal[axis] = if velocity[axis] > 0.0 { -1.0 } else { 1.0 };
        (entry_time, normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(x: f32, y: f32, z: f32) -> AxisAlignedBoundingBox {
        AxisAlignedBoundingBox::new(Vector3::new(x, y, z), Vector3::new(0.5, 0.5, 0.5))
    }

    #[test]
    fn min_max_round_trip() {
        let aabb = AxisAlignedBoundingBox::from_min_max(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(3.0, 6.0, 4.0),
        );
        assert_eq!(aabb.center(), Vector3::new(2.0, 4.0, 3.5));
        assert_eq!(aabb.min(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.max(), Vector3::new(3.0, 6.0, 4.0));
    }

    #[test]
    fn add_point_grows() {
        let mut aabb = AxisAlignedBoundingBox::default();
        aabb.reset(Vector3::new(1.0, 1.0, 1.0));
        aabb.add_point(Vector3::new(-1.0, 3.0, 1.0));
        assert!(aabb.contains_point(Vector3::new(0.0, 2.0, 1.0)));
        assert_eq!(aabb.min(), Vector3::new(-1.0, 1.0, 1.0));
        assert_eq!(aabb.calculate_points()[6], Point3::new(1.0, 3.0, 1.0));
    }

    #[test]
    fn touching_boxes_do_not_intersect() {
        let a = unit_box_at(0.5, 0.5, 0.5);
        assert!(!a.intersects_with(&unit_box_at(1.5, 0.5, 0.5)));
        assert!(a.intersects_with(&unit_box_at(1.4, 0.5, 0.5)));
    }

    #[test]
    fn ray_behind_box_misses() {
        let aabb = unit_box_at(5.5, 0.5, 0.5);
        let forward = Vector3::new(1.0, f32::INFINITY, f32::INFINITY);
        let backward = Vector3::new(-1.0, f32::INFINITY, f32::INFINITY);
        let start = Vector3::new(0.0, 0.5, 0.5);
        assert!(aabb.collides_with_ray(start, forward));
        assert!(!aabb.collides_with_ray(start, backward));
    }

    #[test]
    fn sweep_hits_at_analytic_time() {
        let mover = unit_box_at(0.5, 0.5, 0.5);
        let wall = unit_box_at(3.5, 0.5, 0.5);
        let (time, normal) = mover.sweep_collides_with(&wall, Vector3::new(4.0, 0.0, 0.0));
        assert!((time - 0.5).abs() < 1e-5);
        assert_eq!(normal, Vector3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn sweep_misses_when_offset_on_still_axis() {
        let mover = unit_box_at(0.5, 2.5, 0.5);
        let wall = unit_box_at(3.5, 0.5, 0.5);
        let (time, _) = mover.sweep_collides_with(&wall, Vector3::new(4.0, 0.0, 0.0));
        assert_eq!(time, 1.0);
    }

    #[test]
    fn sweep_that_falls_short_misses() {
        let mover = unit_box_at(0.5, 0.5, 0.5);
        let wall = unit_box_at(3.5, 0.5, 0.5);
        let (time, _) = mover.sweep_collides_with(&wall, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(time, 1.0);
    }
}
