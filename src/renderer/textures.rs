use glam::UVec2;

use crate::renderer::atlas::{AtlasAllocator, AtlasUpload, Placement};
use crate::renderer::{RenderError, Result, Rgba};

pub const TEXTURES_MAX: usize = 1024;

/// Index of a texture in the registry. Handles are dense and stay valid until
/// a reset truncates the registry below them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u32);

impl TextureHandle {
    /// 2x2 neutral texture used when drawing untextured geometry.
    pub const PROBE: TextureHandle = TextureHandle(0);

    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Default for TextureHandle {
    fn default() -> Self {
        Self::PROBE
    }
}

pub struct TextureRegistry {
    atlas: AtlasAllocator,
    textures: Vec<Placement>,
}

impl TextureRegistry {
    /// Creates an empty registry and the probe texture. The returned upload
    /// must reach the atlas texture before the first draw.
    pub fn new(use_mipmaps: bool) -> Result<(Self, Option<AtlasUpload>)> {
        let mut registry = Self {
            atlas: AtlasAllocator::new(use_mipmaps),
            textures: Vec::with_capacity(TEXTURES_MAX),
        };
        let upload = registry.create_probe()?;
        Ok((registry, upload))
    }

    pub fn atlas(&self) -> &AtlasAllocator {
        &self.atlas
    }

    pub fn atlas_mut(&mut self) -> &mut AtlasAllocator {
        &mut self.atlas
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn placements(&self) -> &[Placement] {
        &self.textures
    }

    pub fn get(&self, handle: TextureHandle) -> Result<Placement> {
        self.textures
            .get(handle.index())
            .copied()
            .ok_or(RenderError::InvalidTexture {
                handle: handle.index(),
                len: self.textures.len(),
            })
    }

    pub fn size(&self, handle: TextureHandle) -> Result<UVec2> {
        self.get(handle).map(|p| p.size)
    }

    pub fn create(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[Rgba],
    ) -> Result<(TextureHandle, Option<AtlasUpload>)> {
        if self.textures.len() >= TEXTURES_MAX {
            return Err(RenderError::TooManyTextures { max: TEXTURES_MAX });
        }

        let (placement, upload) = self.atlas.allocate(width, height, pixels)?;
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(placement);
        Ok((handle, upload))
    }

    pub fn replace_pixels(
        &mut self,
        handle: TextureHandle,
        pixels: &[Rgba],
    ) -> Result<Option<AtlasUpload>> {
        let placement = self.get(handle)?;
        self.atlas.repaint(&placement, pixels)
    }

    /// Drop every texture from `len` on. Resetting to zero also recreates the
    /// probe texture, which then needs uploading.
    pub fn reset(&mut self, len: usize) -> Result<Option<AtlasUpload>> {
        if len > self.textures.len() {
            return Err(RenderError::InvalidReset {
                requested: len,
                len: self.textures.len(),
            });
        }

        if len == 0 {
            self.textures.clear();
            self.atlas.clear();
            return self.create_probe();
        }

        self.textures.truncate(len);
        self.atlas.rebuild(&self.textures);
        Ok(None)
    }

    fn create_probe(&mut self) -> Result<Option<AtlasUpload>> {
        let (handle, upload) = self.create(2, 2, &[Rgba::NEUTRAL; 4])?;
        debug_assert_eq!(handle, TextureHandle::PROBE);
        Ok(upload)
    }
}
