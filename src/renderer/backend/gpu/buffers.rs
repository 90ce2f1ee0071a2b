use std::mem;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};

use crate::renderer::uniforms::DrawUniforms;
use crate::renderer::Vertex;

/// `DrawUniforms` padded to the 256 byte dynamic offset alignment.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct UniformSlot {
    uniforms: DrawUniforms,
    _padding: [u32; 8],
}

pub(crate) const UNIFORM_SLOT_SIZE: u64 = mem::size_of::<UniformSlot>() as u64;

impl From<DrawUniforms> for UniformSlot {
    fn from(uniforms: DrawUniforms) -> Self {
        Self {
            uniforms,
            _padding: [0; 8],
        }
    }
}

/// Holds every vertex drawn in a frame.
pub(crate) struct FrameVertexBuffer {
    pub(crate) buffer: wgpu::Buffer,
    capacity: u64,
}

impl FrameVertexBuffer {
    pub(crate) fn new(device: &wgpu::Device, capacity: u64) -> Self {
        Self {
            buffer: Self::create(device, capacity),
            capacity,
        }
    }

    pub(crate) fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, vertices: &[Vertex]) {
        if vertices.is_empty() {
            return;
        }
        let required = vertices.len() as u64;
        if required > self.capacity {
            self.grow(device, required);
        }
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(vertices));
    }

    fn grow(&mut self, device: &wgpu::Device, required: u64) {
        let new_capacity = required.max(self.capacity * 2).max(1);
        log::info!(
            "Growing vertex buffer: {} -> {}",
            self.capacity,
            new_capacity
        );
        self.buffer = Self::create(device, new_capacity);
        self.capacity = new_capacity;
    }

    fn create(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("FrameVertexBuffer"),
            size: capacity.max(1) * mem::size_of::<Vertex>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }
}

/// One uniform slot per draw, bound with a dynamic offset.
pub(crate) struct DrawUniformsBuffer {
    pub(crate) buffer: wgpu::Buffer,
    capacity: u32,
    pub(crate) bind_group: wgpu::BindGroup,
    pub(crate) bind_layout: wgpu::BindGroupLayout,
}

impl DrawUniformsBuffer {
    pub(crate) fn new(device: &wgpu::Device, capacity: u32) -> Self {
        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("DrawUniformsBindLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(mem::size_of::<DrawUniforms>() as u64),
                },
                count: None,
            }],
        });

        let capacity = capacity.max(1);
        let buffer = Self::create_buffer(device, capacity);
        let bind_group = Self::create_bind_group(device, &bind_layout, &buffer);

        Self {
            buffer,
            capacity,
            bind_group,
            bind_layout,
        }
    }

    pub(crate) fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, slots: &[UniformSlot]) {
        if slots.is_empty() {
            return;
        }
        let required = slots.len() as u32;
        if required > self.capacity {
            self.grow(device, required);
        }
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(slots));
    }

    pub(crate) fn offset(index: usize) -> u32 {
        (index as u64 * UNIFORM_SLOT_SIZE) as u32
    }

    fn grow(&mut self, device: &wgpu::Device, required: u32) {
        let new_capacity = required.max(self.capacity * 2);
        log::info!(
            "Growing draw uniforms buffer: {} -> {}",
            self.capacity,
            new_capacity
        );
        self.buffer = Self::create_buffer(device, new_capacity);
        self.bind_group = Self::create_bind_group(device, &self.bind_layout, &self.buffer);
        self.capacity = new_capacity;
    }

    fn create_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("DrawUniformsBuffer"),
            size: capacity as u64 * UNIFORM_SLOT_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("DrawUniformsBindGroup"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: NonZeroU64::new(mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        })
    }
}
