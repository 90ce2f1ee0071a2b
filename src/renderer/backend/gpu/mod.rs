mod atlas_texture;
mod buffers;
mod context;
mod pipeline;
mod pipeline_builder;
mod post;
mod recording;
mod targets;

pub use context::InitError;

use std::sync::Arc;

use glam::UVec2;
use winit::window::Window;

use atlas_texture::AtlasTexture;
use buffers::{DrawUniformsBuffer, FrameVertexBuffer};
use context::GpuContext;
use pipeline::GamePipelines;
use post::PostProcess;
use recording::FrameRecording;
use targets::BackBuffer;

use super::{DrawCall, PostPass, RenderBackend};
use crate::renderer::{AtlasFilter, Result, Rgba};
use crate::settings::RenderSettings;

const INITIAL_VERTEX_CAPACITY: u64 = 2048 * 3 * 8;
const INITIAL_DRAW_CAPACITY: u32 = 256;

/// wgpu implementation of [`RenderBackend`].
///
/// Draws are recorded as they are flushed and encoded into a single pass over
/// the back buffer when the frame ends. Recorded draws are submitted early
/// whenever the atlas or the back buffer is about to change under them.
pub struct WgpuBackend {
    context: GpuContext,
    atlas: AtlasTexture,
    pipelines: GamePipelines,
    uniforms: DrawUniformsBuffer,
    vertices: FrameVertexBuffer,
    back_buffer: BackBuffer,
    post: PostProcess,
    recording: FrameRecording,
}

impl WgpuBackend {
    pub async fn new(
        window: Arc<Window>,
        settings: &RenderSettings,
    ) -> std::result::Result<Self, InitError> {
        let context = GpuContext::new(window, settings).await?;
        let device = &context.device;

        let atlas = AtlasTexture::new(device, AtlasFilter::LinearMipmap);
        let uniforms = DrawUniformsBuffer::new(device, INITIAL_DRAW_CAPACITY);
        let pipelines = GamePipelines::new(device, &uniforms.bind_layout, &atlas.bind_layout);
        let vertices = FrameVertexBuffer::new(device, INITIAL_VERTEX_CAPACITY);
        let back_buffer = BackBuffer::new(device, context.surface_size());
        let post = PostProcess::new(device, context.config.format, back_buffer.color_view());

        Ok(Self {
            context,
            atlas,
            pipelines,
            uniforms,
            vertices,
            back_buffer,
            post,
            recording: FrameRecording::new(),
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.context.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.context.queue
    }

    /// Encode every recorded draw into one pass over the back buffer.
    fn encode_main_pass(&mut self, encoder: &mut wgpu::CommandEncoder) {
        let device = &self.context.device;
        let queue = &self.context.queue;

        for draw in self.recording.draws() {
            self.pipelines.ensure(device, draw.pipeline);
        }
        self.vertices.upload(device, queue, self.recording.vertices());
        self.uniforms.upload(device, queue, self.recording.uniforms());

        let (color_load, depth_load) = if self.recording.clear_pending() {
            (wgpu::LoadOp::Clear(wgpu::Color::BLACK), wgpu::LoadOp::Clear(1.0))
        } else {
            (wgpu::LoadOp::Load, wgpu::LoadOp::Load)
        };

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Game Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.back_buffer.color_view(),
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.back_buffer.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_bind_group(1, &self.atlas.bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertices.buffer.slice(..));

            for draw in self.recording.draws() {
                let Some(pipeline) = self.pipelines.get(&draw.pipeline) else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(
                    0,
                    &self.uniforms.bind_group,
                    &[DrawUniformsBuffer::offset(draw.uniform_slot)],
                );
                pass.draw(draw.vertices.clone(), 0..1);
            }
        }

        self.recording.reset();
    }

    /// Draw what was recorded so far into the current back buffer.
    fn submit_recorded(&mut self) {
        if !self.recording.needs_pass() {
            return;
        }
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Game Encoder"),
            });
        self.encode_main_pass(&mut encoder);
        self.context.queue.submit(Some(encoder.finish()));
    }
}

impl RenderBackend for WgpuBackend {
    fn write_atlas(&mut self, origin: UVec2, size: UVec2, pixels: &[Rgba]) {
        if self.recording.has_draws() {
            self.submit_recorded();
        }
        self.atlas.write(&self.context.queue, origin, size, pixels);
    }

    fn generate_atlas_mipmaps(&mut self) {
        if self.recording.has_draws() {
            self.submit_recorded();
        }
        self.atlas.generate_mipmaps(&self.context.device, &self.context.queue);
    }

    fn set_atlas_filter(&mut self, filter: AtlasFilter) {
        self.atlas.set_filter(&self.context.device, filter);
    }

    fn configure_back_buffer(&mut self, size: UVec2) {
        if self.recording.has_draws() {
            self.submit_recorded();
        }
        self.back_buffer = BackBuffer::new(&self.context.device, size);
        self.post.set_source(&self.context.device, self.back_buffer.color_view());
        self.recording.request_clear();
    }

    fn resize_surface(&mut self, size: UVec2) {
        self.context.resize(size);
    }

    fn begin_frame(&mut self) {
        // Anything recorded before the clear belongs to the previous frame.
        if self.recording.has_draws() {
            self.submit_recorded();
        }
        self.recording.request_clear();
    }

    fn draw(&mut self, call: DrawCall<'_>) {
        self.recording.record(call);
    }

    fn end_frame(&mut self, post: &PostPass) -> Result<()> {
        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err) => {
                if matches!(err, wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) {
                    log::warn!("Surface {:?}, reconfiguring", err);
                    let size = self.context.surface_size();
                    self.context.resize(size);
                }
                self.recording.reset();
                return Err(err.into());
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.encode_main_pass(&mut encoder);
        self.post.execute(
            &self.context.queue,
            &mut encoder,
            &view,
            post.effect,
            &post.uniforms,
            &post.quad,
        );

        self.context.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}
