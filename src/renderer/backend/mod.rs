//! The seam between the batching core and the GPU.

pub mod gpu;
mod headless;

pub use gpu::{InitError, WgpuBackend};
pub use headless::{BackendEvent, HeadlessBackend};

use glam::UVec2;

use crate::renderer::uniforms::{DrawUniforms, PostUniforms};
use crate::renderer::{AtlasFilter, PipelineState, PostEffect, Result, Rgba, Vertex};

/// One flushed batch: triangle list vertices drawn with a single pipeline
/// state and uniform block.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub pipeline: PipelineState,
    pub uniforms: DrawUniforms,
    pub vertices: &'a [Vertex],
}

/// Final copy of the back buffer into the swap chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostPass {
    pub effect: PostEffect,
    pub uniforms: PostUniforms,
    pub quad: [Vertex; 6],
}

pub trait RenderBackend {
    /// Copy a block of pixels into the atlas texture at `origin`.
    fn write_atlas(&mut self, origin: UVec2, size: UVec2, pixels: &[Rgba]);

    fn generate_atlas_mipmaps(&mut self);

    fn set_atlas_filter(&mut self, filter: AtlasFilter);

    /// Recreate the color and depth targets the game renders into.
    fn configure_back_buffer(&mut self, size: UVec2);

    fn resize_surface(&mut self, size: UVec2);

    /// Clear the back buffer for a new frame.
    fn begin_frame(&mut self);

    fn draw(&mut self, call: DrawCall<'_>);

    /// Run the post pass into the swap chain and present.
    fn end_frame(&mut self, post: &PostPass) -> Result<()>;
}
