// renderer/uniforms.rs
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

/// Per-draw transform block for the game shader.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct DrawUniforms {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub screen: [f32; 2],
    pub fade: [f32; 2],
}

impl DrawUniforms {
    pub fn new(
        projection: Mat4,
        view: Mat4,
        model: Mat4,
        camera_pos: Vec3,
        screen: Vec2,
        fade: Vec2,
    ) -> Self {
        Self {
            projection: projection.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            camera_pos: camera_pos.extend(1.0).to_array(),
            screen: screen.to_array(),
            fade: fade.to_array(),
        }
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.projection)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view)
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }
}

impl Default for DrawUniforms {
    fn default() -> Self {
        Self::new(
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Vec3::ZERO,
            Vec2::ZERO,
            Vec2::ZERO,
        )
    }
}

/// Uniforms for the final back buffer to swap chain pass.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct PostUniforms {
    pub projection: [[f32; 4]; 4],
    pub screen_size: [f32; 2],
    pub time: f32,
    pub _padding: f32,
}

impl PostUniforms {
    pub fn new(projection: Mat4, screen_size: Vec2, time: f32) -> Self {
        Self {
            projection: projection.to_cols_array_2d(),
            screen_size: screen_size.to_array(),
            time,
            _padding: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_uniforms_is_224_bytes() {
        // 3 * mat4x4<f32> = 192 bytes, vec4 = 16 bytes, 2 * vec2 = 16 bytes
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 224);
    }

    #[test]
    fn post_uniforms_is_80_bytes() {
        assert_eq!(std::mem::size_of::<PostUniforms>(), 80);
    }

    #[test]
    fn matrices_roundtrip_through_column_arrays() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let u = DrawUniforms::new(m, Mat4::IDENTITY, m, Vec3::ZERO, Vec2::ZERO, Vec2::ZERO);
        assert_eq!(u.projection(), m);
        assert_eq!(u.model(), m);
        assert_eq!(u.view(), Mat4::IDENTITY);
    }
}
