//! Quad extraction for voxel rendering.
//!
//! # Architecture
//! - [`Face`]: one merged rectangle and how it becomes four vertices
//! - [`VoxelMesh`]: the attribute streams handed to the render backend
//! - greedy: the slice-mask rectangle merge that produces faces

mod face;
mod greedy;
mod mesh;

pub use face::{Face, FacePlane};
pub use greedy::{build_faces_from_mask, MaskCell, SliceMask, MASK_EDGE};
pub use mesh::*;
