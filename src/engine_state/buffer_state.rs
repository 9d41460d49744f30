//! # Buffer State Module
//!
//! The boundary between the engine and whatever draws its meshes.
//!
//! ## Architecture
//!
//! [`RenderBackend`] is the interface the renderer talks to: it creates one array of typed
//! attribute buffers per mesh, uploads raw bytes into them, binds the voxel material and issues
//! indexed draws. [`HeadlessBufferState`] implements it in memory, keeping buffer contents,
//! analytics and a log of draw calls so that tests and the demo binary can run without a GPU.

use std::collections::HashMap;

use log::trace;

/// Opaque id of one buffer array created by a [`RenderBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub u32);

/// What a buffer is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Index,
    Vertex,
}

/// Layout of one buffer in an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescriptor {
    /// Descriptive name (for debugging)
    pub label: &'static str,
    pub kind: BufferKind,
    /// Size in bytes of one element; every upload must be a whole number of elements.
    pub element_size: u32,
}

/// Buffer layout of a voxel mesh: indices, positions, UVs with texture id, normals.
pub const VOXEL_MESH_BUFFERS: [BufferDescriptor; 4] = [
    BufferDescriptor {
        label: "Index Buffer",
        kind: BufferKind::Index,
        element_size: 4,
    },
    BufferDescriptor {
        label: "Position Buffer",
        kind: BufferKind::Vertex,
        element_size: 12,
    },
    BufferDescriptor {
        label: "UV Buffer",
        kind: BufferKind::Vertex,
        element_size: 12,
    },
    BufferDescriptor {
        label: "Normal Buffer",
        kind: BufferKind::Vertex,
        element_size: 12,
    },
];

/// Per-draw shader inputs.
///
/// # Memory Layout
/// Three column-major 4×4 matrices followed by the light position and power, 208 bytes with no
/// padding, so it can be uploaded as a uniform block directly.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub light_position: [f32; 3],
    pub light_power: f32,
}

/// GPU buffer interface consumed by the renderer.
///
/// All calls happen on the thread that owns the renderer.
pub trait RenderBackend {
    /// Allocates an empty buffer per descriptor and returns the handle of the array.
    fn create_buffer_array(&mut self, descriptors: &[BufferDescriptor]) -> MeshHandle;

    /// Replaces the contents of buffer `buffer_index` of `handle` with `data`.
    ///
    /// # Panics
    /// Implementations panic on an unknown handle or index, or when `data` is not a whole number
    /// of elements.
    fn write_buffer(&mut self, handle: MeshHandle, buffer_index: usize, data: &[u8]);

    /// Binds the shared voxel material before a batch of draws.
    fn bind_material(&mut self);

    /// Draws `index_count` indices from the buffer array.
    fn draw_indexed(&mut self, handle: MeshHandle, index_count: u32, uniforms: &DrawUniforms);
}

/// Analytics data for a buffer
///
/// Tracks memory allocation, usage, and write operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferAnalytics {
    /// Largest size the buffer has held, in bytes
    pub allocated_memory: u64,
    /// Size of the current contents in bytes
    pub used_memory: u64,
    /// Number of times the buffer has been written to
    pub times_written: u64,
}

#[derive(Debug)]
struct HeadlessBuffer {
    descriptor: BufferDescriptor,
    data: Vec<u8>,
    analytics: BufferAnalytics,
}

/// A draw call recorded by [`HeadlessBufferState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRecord {
    pub handle: MeshHandle,
    pub index_count: u32,
    pub uniforms: DrawUniforms,
}

/// In-memory [`RenderBackend`].
#[derive(Debug, Default)]
pub struct HeadlessBufferState {
    buffers: HashMap<MeshHandle, Vec<HeadlessBuffer>>,
    next_handle: u32,
    materials_bound: u64,
    draws: Vec<DrawRecord>,
}

impl HeadlessBufferState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffer arrays created so far.
    pub fn buffer_array_count(&self) -> usize {
        self.buffers.len()
    }

    /// Current contents of one buffer.
    pub fn buffer_data(&self, handle: MeshHandle, buffer_index: usize) -> Option<&[u8]> {
        self.buffers
            .get(&handle)
            .and_then(|array| array.get(buffer_index))
            .map(|buffer| buffer.data.as_slice())
    }

    pub fn analytics(&self, handle: MeshHandle, buffer_index: usize) -> Option<BufferAnalytics> {
        self.buffers
            .get(&handle)
            .and_then(|array| array.get(buffer_index))
            .map(|buffer| buffer.analytics)
    }

    /// Draw calls issued since the last [`HeadlessBufferState::clear_draws`].
    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }

    pub fn materials_bound(&self) -> u64 {
        self.materials_bound
    }

    /// Gets the total allocated memory across all buffers
    pub fn get_total_allocated_memory(&self) -> u64 {
        self.buffers
            .values()
            .flatten()
            .fold(0, |acc, buffer| acc + buffer.analytics.allocated_memory)
    }

    /// Gets the total used memory across all buffers
    pub fn get_total_used_memory(&self) -> u64 {
        self.buffers
            .values()
            .flatten()
            .fold(0, |acc, buffer| acc + buffer.analytics.used_memory)
    }
}

impl RenderBackend for HeadlessBufferState {
    fn create_buffer_array(&mut self, descriptors: &[BufferDescriptor]) -> MeshHandle {
        let handle = MeshHandle(self.next_handle);
        self.next_handle += 1;
        self.buffers.insert(
            handle,
            descriptors
                .iter()
                .map(|descriptor| HeadlessBuffer {
                    descriptor: *descriptor,
                    data: Vec::new(),
                    analytics: BufferAnalytics::default(),
                })
                .collect(),
        );
        trace!("Created buffer array {:?} with {} buffers", handle, descriptors.len());
        handle
    }

    fn write_buffer(&mut self, handle: MeshHandle, buffer_index: usize, data: &[u8]) {
        let array = self
            .buffers
            .get_mut(&handle)
            .unwrap_or_else(|| panic!("Buffer write to unknown buffer array {:?}", handle));
        let buffer = array.get_mut(buffer_index).unwrap_or_else(|| {
            panic!(
                "Buffer write out of bounds: array {:?} has no buffer {}",
                handle, buffer_index
            )
        });

        let element_size = buffer.descriptor.element_size as usize;
        assert!(
            data.len() % element_size == 0,
            "Buffer write of {} bytes to '{}' is not a multiple of {}",
            data.len(),
            buffer.descriptor.label,
            element_size
        );

        buffer.data.clear();
        buffer.data.extend_from_slice(data);
        let analytics = &mut buffer.analytics;
        analytics.used_memory = data.len() as u64;
        analytics.allocated_memory = analytics.allocated_memory.max(analytics.used_memory);
        analytics.times_written += 1;
    }

    fn bind_material(&mut self) {
        self.materials_bound += 1;
    }

    fn draw_indexed(&mut self, handle: MeshHandle, index_count: u32, uniforms: &DrawUniforms) {
        assert!(
            self.buffers.contains_key(&handle),
            "Draw of unknown buffer array {:?}",
            handle
        );
        self.draws.push(DrawRecord {
            handle,
            index_count,
            uniforms: *uniforms,
        });
    }
}

#[cfg(test)]
mod tests {
    use bytemuck::Zeroable;

    use super::*;

    #[test]
    fn writes_replace_contents_and_track_memory() {
        let mut backend = HeadlessBufferState::new();
        let handle = backend.create_buffer_array(&VOXEL_MESH_BUFFERS);
        assert_eq!(backend.buffer_array_count(), 1);

        backend.write_buffer(handle, 0, bytemuck::cast_slice(&[0u32, 1, 2, 0, 2, 3]));
        backend.write_buffer(handle, 0, bytemuck::cast_slice(&[0u32, 1, 2]));

        assert_eq!(backend.buffer_data(handle, 0).map(|data| data.len()), Some(12));
        let analytics = backend.analytics(handle, 0).unwrap();
        assert_eq!(analytics.times_written, 2);
        assert_eq!(analytics.allocated_memory, 24);
        assert_eq!(backend.get_total_used_memory(), 12);
        assert_eq!(backend.get_total_allocated_memory(), 24);
    }

    #[test]
    #[should_panic]
    fn partial_elements_are_rejected() {
        let mut backend = HeadlessBufferState::new();
        let handle = backend.create_buffer_array(&VOXEL_MESH_BUFFERS);
        backend.write_buffer(handle, 1, &[0u8; 10]);
    }

    #[test]
    #[should_panic]
    fn unknown_handle_is_rejected() {
        HeadlessBufferState::new().write_buffer(MeshHandle(3), 0, &[]);
    }

    #[test]
    fn draws_are_recorded() {
        let mut backend = HeadlessBufferState::new();
        let handle = backend.create_buffer_array(&VOXEL_MESH_BUFFERS);
        let uniforms = DrawUniforms::zeroed();
        backend.bind_material();
        backend.draw_indexed(handle, 36, &uniforms);

        assert_eq!(backend.materials_bound(), 1);
        assert_eq!(backend.draws().len(), 1);
        assert_eq!(backend.draws()[0].index_count, 36);
        backend.clear_draws();
        assert!(backend.draws().is_empty());
    }
}
