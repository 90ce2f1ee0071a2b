use thiserror::Error;

/// Failures reported by the rendering core. None of them are fatal; callers
/// are expected to fall back to the probe texture or skip the draw.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid texture handle {handle} (textures len {len})")]
    InvalidTexture { handle: usize, len: usize },

    #[error("render atlas full, no room for a {width}x{height} texture")]
    AtlasFull { width: u32, height: u32 },

    #[error("texture max reached ({max})")]
    TooManyTextures { max: usize },

    #[error("pixel data holds {actual} pixels, expected {expected}")]
    PixelCount { expected: usize, actual: usize },

    #[error("invalid texture reset len {requested} > {len}")]
    InvalidReset { requested: usize, len: usize },

    #[error("invalid resolution {0}")]
    InvalidResolution(u8),

    #[error("invalid post effect {0}")]
    InvalidPostEffect(u8),

    #[error("failed to write atlas image: {0}")]
    Image(#[from] image::ImageError),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
