use std::ops::Range;

use super::buffers::UniformSlot;
use crate::renderer::backend::DrawCall;
use crate::renderer::{PipelineState, Vertex};

pub(crate) struct RecordedDraw {
    pub(crate) pipeline: PipelineState,
    pub(crate) uniform_slot: usize,
    pub(crate) vertices: Range<u32>,
}

/// Draws flushed since the last submission, with the vertex and uniform data
/// they reference.
pub(crate) struct FrameRecording {
    draws: Vec<RecordedDraw>,
    vertices: Vec<Vertex>,
    uniforms: Vec<UniformSlot>,
    clear_pending: bool,
}

impl FrameRecording {
    pub(crate) fn new() -> Self {
        Self {
            draws: Vec::new(),
            vertices: Vec::new(),
            uniforms: Vec::new(),
            clear_pending: true,
        }
    }

    pub(crate) fn record(&mut self, call: DrawCall<'_>) {
        let start = self.vertices.len() as u32;
        self.vertices.extend_from_slice(call.vertices);
        let end = self.vertices.len() as u32;

        self.draws.push(RecordedDraw {
            pipeline: call.pipeline,
            uniform_slot: self.uniforms.len(),
            vertices: start..end,
        });
        self.uniforms.push(UniformSlot::from(call.uniforms));
    }

    /// Recorded draws must reach the queue before anything they sample from
    /// or render into is changed.
    pub(crate) fn has_draws(&self) -> bool {
        !self.draws.is_empty()
    }

    /// Whether a pass is needed at all, either to draw or to clear.
    pub(crate) fn needs_pass(&self) -> bool {
        self.has_draws() || self.clear_pending
    }

    pub(crate) fn request_clear(&mut self) {
        self.clear_pending = true;
    }

    pub(crate) fn clear_pending(&self) -> bool {
        self.clear_pending
    }

    pub(crate) fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    pub(crate) fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub(crate) fn uniforms(&self) -> &[UniformSlot] {
        &self.uniforms
    }

    /// Forget everything once it has been encoded, or dropped with the frame.
    pub(crate) fn reset(&mut self) {
        self.draws.clear();
        self.vertices.clear();
        self.uniforms.clear();
        self.clear_pending = false;
    }
}
