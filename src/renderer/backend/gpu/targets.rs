use glam::UVec2;

use super::pipeline::{BACK_BUFFER_FORMAT, DEPTH_FORMAT};

struct RenderTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl RenderTarget {
    fn new(
        device: &wgpu::Device,
        size: UVec2,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.x.max(1),
                height: size.y.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Color and depth targets at the internal render resolution.
pub(crate) struct BackBuffer {
    color: RenderTarget,
    depth: RenderTarget,
}

impl BackBuffer {
    pub(crate) fn new(device: &wgpu::Device, size: UVec2) -> Self {
        log::info!("Creating {}x{} back buffer", size.x, size.y);
        Self {
            color: RenderTarget::new(
                device,
                size,
                BACK_BUFFER_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                "Back Buffer Color",
            ),
            depth: RenderTarget::new(
                device,
                size,
                DEPTH_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
                "Back Buffer Depth",
            ),
        }
    }

    pub(crate) fn color_view(&self) -> &wgpu::TextureView {
        &self.color.view
    }

    pub(crate) fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth.view
    }
}
