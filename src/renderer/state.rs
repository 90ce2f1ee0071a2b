use crate::renderer::{PostEffect, Resolution};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Source over.
    #[default]
    Normal,
    /// Additive.
    Lighter,
}

/// Mutable render state. Changing anything a draw depends on flushes the
/// pending batch first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    pub blend_mode: BlendMode,
    pub depth_test: bool,
    pub depth_write: bool,
    pub cull_backface: bool,
    pub depth_offset: f32,
    pub resolution: Resolution,
    pub post_effect: PostEffect,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            blend_mode: BlendMode::Normal,
            depth_test: true,
            depth_write: true,
            cull_backface: true,
            depth_offset: 0.0,
            resolution: Resolution::Native,
            post_effect: PostEffect::None,
        }
    }
}

impl RenderState {
    pub fn pipeline(&self) -> PipelineState {
        PipelineState {
            blend_mode: self.blend_mode,
            depth_test: self.depth_test,
            depth_write: self.depth_write,
            cull_backface: self.cull_backface,
            depth_offset_bits: self.depth_offset.to_bits(),
        }
    }
}

/// The part of [`RenderState`] baked into a render pipeline. Used as the
/// pipeline cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineState {
    pub blend_mode: BlendMode,
    pub depth_test: bool,
    pub depth_write: bool,
    pub cull_backface: bool,
    depth_offset_bits: u32,
}

impl PipelineState {
    pub fn depth_offset(&self) -> f32 {
        f32::from_bits(self.depth_offset_bits)
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        RenderState::default().pipeline()
    }
}
