//! # Voxel Side Module
//!
//! The six faces of a voxel as single bits, and a compact mask of several faces. Masks are what
//! visibility queries return and what face culling consumes.

use cgmath::Vector3;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// One face of a unit voxel. The discriminant is the face's bit in a [`VoxelSides`] mask.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, FromPrimitive)]
pub enum VoxelSide {
    /// Facing positive Y
    TOP = 1,
    /// Facing negative Y
    BOTTOM = 2,
    /// Facing positive Z
    FRONT = 4,
    /// Facing positive X
    RIGHT = 8,
    /// Facing negative Z
    BACK = 16,
    /// Facing negative X
    LEFT = 32,
}

impl VoxelSide {
    /// All faces, in bit order.
    pub fn all() -> [VoxelSide; 6] {
        [
            VoxelSide::TOP,
            VoxelSide::BOTTOM,
            VoxelSide::FRONT,
            VoxelSide::RIGHT,
            VoxelSide::BACK,
            VoxelSide::LEFT,
        ]
    }

    /// Mask bit of this face.
    #[inline]
    pub fn bit(self) -> u8 {
        self as u8
    }

    /// Unit offset from a voxel to the neighbour sharing this face.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            VoxelSide::TOP => Vector3::new(0, 1, 0),
            VoxelSide::BOTTOM => Vector3::new(0, -1, 0),
            VoxelSide::FRONT => Vector3::new(0, 0, 1),
            VoxelSide::RIGHT => Vector3::new(1, 0, 0),
            VoxelSide::BACK => Vector3::new(0, 0, -1),
            VoxelSide::LEFT => Vector3::new(-1, 0, 0),
        }
    }

    /// Outward normal of this face.
    pub fn normal(self) -> Vector3<f32> {
        let offset = self.offset();
        Vector3::new(offset.x as f32, offset.y as f32, offset.z as f32)
    }
}

/// A set of voxel faces packed into six bits.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, Default)]
pub struct VoxelSides(u8);

impl VoxelSides {
    /// No faces.
    pub const NONE: VoxelSides = VoxelSides(0);
    /// All six faces.
    pub const ALL: VoxelSides = VoxelSides(63);

    /// Builds a mask from raw bits; bits above the sixth are dropped.
    pub fn from_bits(bits: u8) -> Self {
        VoxelSides(bits & Self::ALL.0)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, side: VoxelSide) -> bool {
        self.0 & side.bit() != 0
    }

    pub fn insert(&mut self, side: VoxelSide) {
        self.0 |= side.bit();
    }

    pub fn remove(&mut self, side: VoxelSide) {
        self.0 &= !side.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Faces in the mask, in bit order.
    pub fn iter(self) -> impl Iterator<Item = VoxelSide> {
        (0..6u8)
            .map(|shift| 1u8 << shift)
            .filter(move |bit| self.0 & bit != 0)
            .filter_map(VoxelSide::from_u8)
    }
}

impl From<VoxelSide> for VoxelSides {
    fn from(side: VoxelSide) -> Self {
        VoxelSides(side.bit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_every_side() {
        let mut sides = VoxelSides::NONE;
        for side in VoxelSide::all() {
            sides.insert(side);
        }
        assert_eq!(sides, VoxelSides::ALL);
        assert_eq!(sides.iter().collect::<Vec<_>>(), VoxelSide::all().to_vec());
    }

    #[test]
    fn opposite_offsets_cancel() {
        let sum = VoxelSide::all()
            .iter()
            .fold(Vector3::new(0, 0, 0), |acc, side| acc + side.offset());
        assert_eq!(sum, Vector3::new(0, 0, 0));
    }

    #[test]
    fn remove_clears_only_that_bit() {
        let mut sides = VoxelSides::ALL;
        sides.remove(VoxelSide::LEFT);
        assert!(!sides.contains(VoxelSide::LEFT));
        assert!(sides.contains(VoxelSide::RIGHT));
        assert_eq!(sides.len(), 5);
    }
}
