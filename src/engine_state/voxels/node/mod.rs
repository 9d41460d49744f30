//! # Voxel Node Module
//!
//! A voxel node is the record stored in every voxel index: a Morton key, a run length along the
//! key axis and an RGB colour. The three colour channels double as per-axis texture ids for the
//! mesher.

use std::cmp::Ordering;

pub mod voxel_side;

/// Size value marking a logically deleted record.
pub const TOMBSTONE: u32 = u32::MAX;

/// A run of `size` cells starting at Morton key `start`, all sharing one colour.
///
/// # Memory Layout
/// `#[repr(C)]` with an explicit padding byte so the record can be uploaded or dumped as raw
/// bytes through `bytemuck`.
///
/// # Ordering
/// Records order by `start` ascending, then by `size` descending. Equality ignores colour.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct VoxNode {
    /// Morton key of the first cell.
    pub start: u32,
    /// Run length in keys, or [`TOMBSTONE`].
    pub size: u32,
    /// Red channel, texture id of front-facing XZ quads.
    pub r: u8,
    /// Green channel, texture id of XY and YZ quads.
    pub g: u8,
    /// Blue channel, texture id of back-facing XZ quads.
    pub b: u8,
    _padding: u8,
}

impl VoxNode {
    /// Creates a new record.
    pub fn new(start: u32, size: u32, r: u8, g: u8, b: u8) -> Self {
        VoxNode {
            start,
            size,
            r,
            g,
            b,
            _padding: 0,
        }
    }

    /// A single cell whose three channels all carry the same texture id.
    pub fn with_texture(start: u32, texture: u8) -> Self {
        VoxNode::new(start, 1, texture, texture, texture)
    }

    /// A tombstoned record at `start`, used as the "nothing found" value.
    pub fn tombstone(start: u32) -> Self {
        VoxNode::new(start, TOMBSTONE, 0, 0, 0)
    }

    #[inline]
    pub fn is_tombstone(&self) -> bool {
        self.size == TOMBSTONE
    }

    /// `true` when the record covers at least one cell and is not deleted.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.size != TOMBSTONE && self.size > 0
    }

    /// One past the last key covered by the run.
    pub fn end(&self) -> u32 {
        if self.is_alive() {
            self.start.saturating_add(self.size)
        } else {
            self.start
        }
    }

    /// Colour channels as an array.
    pub fn color(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl PartialEq for VoxNode {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.size == other.size
    }
}

impl Eq for VoxNode {}

impl PartialOrd for VoxNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VoxNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| other.size.cmp(&self.size))
    }
}
