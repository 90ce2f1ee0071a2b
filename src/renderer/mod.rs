pub mod atlas;
pub mod back_buffer;
pub mod backend;
pub mod batch;
pub mod color;
pub mod error;
pub mod projection;
#[allow(clippy::module_inception)]
mod renderer;
pub mod state;
pub mod textures;
pub mod uniforms;
pub mod vertex;

pub use atlas::{AtlasAllocator, AtlasUpload, Placement, ATLAS_BORDER, ATLAS_GRID, ATLAS_SIZE};
pub use back_buffer::{AtlasFilter, BackBufferManager, PostEffect, Resolution};
pub use backend::{DrawCall, HeadlessBackend, PostPass, RenderBackend, WgpuBackend};
pub use batch::TrisBuffer;
pub use color::{Bitmap, Rgba};
pub use error::{RenderError, Result};
pub use renderer::Renderer;
pub use state::{BlendMode, PipelineState, RenderState};
pub use textures::{TextureHandle, TextureRegistry, TEXTURES_MAX};
pub use vertex::{Triangle, Vertex};
