// renderer/renderer.rs
use std::path::Path;

use glam::{Mat4, UVec2, Vec2, Vec3};

use crate::renderer::atlas::AtlasUpload;
use crate::renderer::backend::{DrawCall, PostPass, RenderBackend};
use crate::renderer::batch::TrisBuffer;
use crate::renderer::projection::ProjectionState;
use crate::renderer::uniforms::PostUniforms;
use crate::renderer::vertex::{v, Triangle, Vertex};
use crate::renderer::{
    BackBufferManager, BlendMode, Bitmap, PostEffect, RenderState, Resolution, Result, Rgba,
    TextureHandle, TextureRegistry,
};
use crate::settings::RenderSettings;

/// Batching renderer. Owns the texture atlas, the triangle buffer and all
/// transform state, and talks to the GPU through `B`.
pub struct Renderer<B: RenderBackend> {
    backend: B,
    textures: TextureRegistry,
    tris: TrisBuffer,
    projection: ProjectionState,
    back_buffer: BackBufferManager,
    state: RenderState,
    screen_offset: Vec2,
}

impl<B: RenderBackend> Renderer<B> {
    pub fn new(mut backend: B, screen_size: UVec2, settings: &RenderSettings) -> Result<Self> {
        let (textures, probe) = TextureRegistry::new(settings.use_mipmaps)?;
        let back_buffer =
            BackBufferManager::new(settings.resolution, screen_size, settings.use_mipmaps);
        let mut projection = ProjectionState::new(
            settings.near_plane,
            settings.far_plane,
            Vec2::new(settings.fade_near, settings.fade_far),
        );
        projection.resize(back_buffer.size(), back_buffer.screen_size());

        backend.resize_surface(back_buffer.screen_size());
        backend.configure_back_buffer(back_buffer.size());
        backend.set_atlas_filter(back_buffer.filter());

        let state = RenderState {
            resolution: settings.resolution,
            post_effect: settings.post_effect,
            ..RenderState::default()
        };

        let mut renderer = Self {
            backend,
            textures,
            tris: TrisBuffer::new(settings.tris_buffer_capacity),
            projection,
            back_buffer,
            state,
            screen_offset: Vec2::ZERO,
        };
        renderer.upload(probe);
        Ok(renderer)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn projection(&self) -> &ProjectionState {
        &self.projection
    }

    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    /// Triangles waiting for the next flush.
    pub fn pending_tris(&self) -> usize {
        self.tris.len()
    }

    /// Back buffer size in pixels.
    pub fn size(&self) -> UVec2 {
        self.back_buffer.size()
    }

    pub fn screen_size(&self) -> UVec2 {
        self.back_buffer.screen_size()
    }

    // Frame

    pub fn frame_prepare(&mut self) {
        self.backend.begin_frame();
        self.flush();
        self.state.depth_test = true;
        self.state.depth_write = true;
        self.state.depth_offset = 0.0;
        self.screen_offset = Vec2::ZERO;
    }

    pub fn frame_end(&mut self, time: f64) -> Result<()> {
        self.flush();

        let screen = self.back_buffer.screen_size().as_vec2();
        let post = PostPass {
            effect: self.state.post_effect,
            uniforms: PostUniforms::new(self.projection.projection_screen(), screen, time as f32),
            quad: screen_quad(screen),
        };
        self.backend.end_frame(&post)
    }

    /// Submit pending triangles as one draw.
    pub fn flush(&mut self) {
        if self.tris.is_empty() {
            return;
        }

        if self.textures.atlas_mut().take_mipmaps_dirty() {
            self.backend.generate_atlas_mipmaps();
        }

        self.backend.draw(DrawCall {
            pipeline: self.state.pipeline(),
            uniforms: self.projection.uniforms(self.screen_offset),
            vertices: self.tris.vertices(),
        });
        self.tris.clear();
    }

    // State

    pub fn set_view(&mut self, pos: Vec3, angles: Vec3) {
        self.flush();
        self.state.depth_write = true;
        self.state.depth_test = true;
        self.projection.set_view(pos, angles);
    }

    pub fn set_view_2d(&mut self) {
        self.flush();
        self.state.depth_write = true;
        self.state.depth_test = false;
        self.projection.set_view_2d();
    }

    pub fn set_model_mat(&mut self, model: Mat4) {
        self.flush();
        self.projection.set_model(model);
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        if self.state.blend_mode == mode {
            return;
        }
        self.flush();
        self.state.blend_mode = mode;
    }

    pub fn set_depth_test(&mut self, enabled: bool) {
        self.flush();
        self.state.depth_test = enabled;
    }

    pub fn set_depth_write(&mut self, enabled: bool) {
        self.flush();
        self.state.depth_write = enabled;
    }

    pub fn set_depth_offset(&mut self, offset: f32) {
        self.flush();
        self.state.depth_offset = offset;
    }

    pub fn set_cull_backface(&mut self, enabled: bool) {
        self.flush();
        self.state.cull_backface = enabled;
    }

    /// Offset the whole image, in clip space units.
    pub fn set_screen_position(&mut self, pos: Vec2) {
        self.flush();
        self.screen_offset = Vec2::new(pos.x, -pos.y);
    }

    pub fn set_post_effect(&mut self, effect: PostEffect) {
        self.state.post_effect = effect;
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.flush();
        self.state.resolution = resolution;
        self.back_buffer.set_resolution(resolution);
        self.reconfigure_back_buffer();
    }

    /// Window resize. Zero sized windows are ignored.
    pub fn set_screen_size(&mut self, size: UVec2) {
        if size.x == 0 || size.y == 0 {
            log::debug!("Ignoring screen size {:?}", size);
            return;
        }
        self.flush();
        self.back_buffer.set_screen_size(size);
        self.backend.resize_surface(size);
        self.reconfigure_back_buffer();
    }

    fn reconfigure_back_buffer(&mut self) {
        let size = self.back_buffer.size();
        self.backend.configure_back_buffer(size);
        self.backend.set_atlas_filter(self.back_buffer.filter());
        self.projection.resize(size, self.back_buffer.screen_size());
    }

    /// World position to normalized device coordinates using the current view.
    pub fn project(&self, pos: Vec3) -> Vec3 {
        self.projection.project(pos)
    }

    // Geometry

    pub fn push_triangle(&mut self, mut tri: Triangle, handle: TextureHandle) -> Result<()> {
        let placement = self.textures.get(handle)?;

        if self.tris.is_full() {
            self.flush();
        }

        let offset = placement.offset.as_vec2();
        for vertex in &mut tri.vertices {
            vertex.uv[0] += offset.x;
            vertex.uv[1] += offset.y;
        }

        let pushed = self.tris.try_push(tri);
        debug_assert!(pushed.is_ok());
        Ok(())
    }

    /// Camera facing quad centered on `pos`.
    pub fn push_sprite(
        &mut self,
        pos: Vec3,
        size: Vec2,
        color: Rgba,
        handle: TextureHandle,
    ) -> Result<()> {
        let uv = self.textures.size(handle)?.as_vec2();
        let half = size * 0.5;
        let orientation = self.projection.sprite_orientation();
        let corner = |x: f32, y: f32| pos + orientation.transform_vector3(Vec3::new(x, y, 0.0));

        let p1 = corner(-half.x, half.y);
        let p2 = corner(half.x, half.y);
        let p3 = corner(-half.x, -half.y);
        let p4 = corner(half.x, -half.y);

        let uv1 = Vec2::ZERO;
        let uv2 = Vec2::new(uv.x, 0.0);
        let uv3 = Vec2::new(0.0, uv.y);
        let uv4 = uv;

        self.push_triangle(
            Triangle::new(v(p1, uv1, color), v(p3, uv3, color), v(p2, uv2, color)),
            handle,
        )?;
        self.push_triangle(
            Triangle::new(v(p2, uv2, color), v(p3, uv3, color), v(p4, uv4, color)),
            handle,
        )
    }

    /// Screen space quad in back buffer pixels showing the whole texture.
    pub fn push_2d(
        &mut self,
        pos: Vec2,
        size: Vec2,
        color: Rgba,
        handle: TextureHandle,
    ) -> Result<()> {
        let uv_size = self.textures.size(handle)?.as_vec2();
        self.push_2d_sub(pos, Vec2::ZERO, uv_size, size, color, handle)
    }

    /// Screen space quad showing the `uv_offset..uv_offset + uv_size` part
    /// of the texture.
    pub fn push_2d_sub(
        &mut self,
        pos: Vec2,
        uv_offset: Vec2,
        uv_size: Vec2,
        size: Vec2,
        color: Rgba,
        handle: TextureHandle,
    ) -> Result<()> {
        let [a, b, c, d, e, f] = quad(pos, size, uv_offset, uv_size, color);
        self.push_triangle(Triangle::new(a, b, c), handle)?;
        self.push_triangle(Triangle::new(d, e, f), handle)
    }

    // Textures

    pub fn texture_create(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[Rgba],
    ) -> Result<TextureHandle> {
        let (handle, upload) = self.textures.create(width, height, pixels)?;
        self.upload(upload);
        Ok(handle)
    }

    pub fn texture_create_bitmap(&mut self, bitmap: &Bitmap) -> Result<TextureHandle> {
        self.texture_create(bitmap.width(), bitmap.height(), bitmap.pixels())
    }

    pub fn texture_replace_pixels(
        &mut self,
        handle: TextureHandle,
        pixels: &[Rgba],
    ) -> Result<()> {
        let upload = self.textures.replace_pixels(handle, pixels)?;
        self.upload(upload);
        Ok(())
    }

    pub fn texture_size(&self, handle: TextureHandle) -> Result<UVec2> {
        self.textures.size(handle)
    }

    pub fn textures_len(&self) -> usize {
        self.textures.len()
    }

    pub fn textures_reset(&mut self, len: usize) -> Result<()> {
        let upload = self.textures.reset(len)?;
        self.upload(upload);
        Ok(())
    }

    pub fn textures_dump<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.textures.atlas().dump(path)
    }

    fn upload(&mut self, upload: Option<AtlasUpload>) {
        if let Some(upload) = upload {
            self.backend.write_atlas(upload.origin, upload.size, &upload.pixels);
        }
    }
}

/// Two triangles covering `pos..pos + size` in y-down pixel space, wound
/// counter-clockwise once projected.
fn quad(pos: Vec2, size: Vec2, uv_offset: Vec2, uv_size: Vec2, color: Rgba) -> [Vertex; 6] {
    let corner = |fx: f32, fy: f32| {
        let p = pos + size * Vec2::new(fx, fy);
        let uv = uv_offset + uv_size * Vec2::new(fx, fy);
        v(p.extend(0.0), uv, color)
    };
    let bottom_right = corner(1.0, 1.0);
    let top_right = corner(1.0, 0.0);
    let top_left = corner(0.0, 0.0);
    let bottom_left = corner(0.0, 1.0);
    [
        bottom_right,
        top_right,
        top_left,
        bottom_right,
        top_left,
        bottom_left,
    ]
}

/// Fullscreen quad for the post pass, uv in 0..1.
fn screen_quad(screen: Vec2) -> [Vertex; 6] {
    quad(Vec2::ZERO, screen, Vec2::ZERO, Vec2::ONE, Rgba::NEUTRAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
        (b - a).perp_dot(c - a)
    }

    #[test]
    fn quad_is_counter_clockwise_in_clip_space() {
        let proj = crate::renderer::projection::ortho_y_down(Vec2::new(320.0, 240.0));
        let verts = quad(
            Vec2::new(10.0, 20.0),
            Vec2::new(30.0, 40.0),
            Vec2::ZERO,
            Vec2::ONE,
            Rgba::NEUTRAL,
        );
        for tri in verts.chunks(3) {
            let ndc: Vec<Vec2> = tri
                .iter()
                .map(|v| proj.project_point3(v.position()).truncate())
                .collect();
            assert!(signed_area(ndc[0], ndc[1], ndc[2]) > 0.0);
        }
    }

    #[test]
    fn quad_maps_uv_corners() {
        let verts = quad(
            Vec2::ZERO,
            Vec2::new(8.0, 8.0),
            Vec2::new(2.0, 3.0),
            Vec2::new(4.0, 5.0),
            Rgba::NEUTRAL,
        );
        assert_eq!(verts[0].uv, [6.0, 8.0]);
        assert_eq!(verts[2].uv, [2.0, 3.0]);
        assert_eq!(verts[0].pos, [8.0, 8.0, 0.0]);
    }
}
