use glam::UVec2;

use super::{DrawCall, PostPass, RenderBackend};
use crate::renderer::uniforms::DrawUniforms;
use crate::renderer::{AtlasFilter, PipelineState, Result, Rgba, Vertex};

/// Everything a [`HeadlessBackend`] was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    AtlasWrite { origin: UVec2, size: UVec2 },
    GenerateMipmaps,
    SetFilter(AtlasFilter),
    ConfigureBackBuffer(UVec2),
    ResizeSurface(UVec2),
    BeginFrame,
    Draw {
        pipeline: PipelineState,
        uniforms: DrawUniforms,
        vertices: Vec<Vertex>,
    },
    EndFrame(PostPass),
}

/// Backend that records calls instead of touching a GPU.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    events: Vec<BackendEvent>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[BackendEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<BackendEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn draws(&self) -> impl Iterator<Item = (&PipelineState, &DrawUniforms, &[Vertex])> {
        self.events.iter().filter_map(|event| match event {
            BackendEvent::Draw {
                pipeline,
                uniforms,
                vertices,
            } => Some((pipeline, uniforms, vertices.as_slice())),
            _ => None,
        })
    }

    pub fn draw_count(&self) -> usize {
        self.draws().count()
    }

    pub fn count(&self, pred: impl Fn(&BackendEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl RenderBackend for HeadlessBackend {
    fn write_atlas(&mut self, origin: UVec2, size: UVec2, _pixels: &[Rgba]) {
        self.events.push(BackendEvent::AtlasWrite { origin, size });
    }

    fn generate_atlas_mipmaps(&mut self) {
        self.events.push(BackendEvent::GenerateMipmaps);
    }

    fn set_atlas_filter(&mut self, filter: AtlasFilter) {
        self.events.push(BackendEvent::SetFilter(filter));
    }

    fn configure_back_buffer(&mut self, size: UVec2) {
        self.events.push(BackendEvent::ConfigureBackBuffer(size));
    }

    fn resize_surface(&mut self, size: UVec2) {
        self.events.push(BackendEvent::ResizeSurface(size));
    }

    fn begin_frame(&mut self) {
        self.events.push(BackendEvent::BeginFrame);
    }

    fn draw(&mut self, call: DrawCall<'_>) {
        self.events.push(BackendEvent::Draw {
            pipeline: call.pipeline,
            uniforms: call.uniforms,
            vertices: call.vertices.to_vec(),
        });
    }

    fn end_frame(&mut self, post: &PostPass) -> Result<()> {
        self.events.push(BackendEvent::EndFrame(*post));
        Ok(())
    }
}
