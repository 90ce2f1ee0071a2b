use glam::{Mat4, UVec2, Vec2, Vec3};

use crate::renderer::uniforms::DrawUniforms;

pub const FOV_DEGREES: f32 = 73.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    TwoD,
    ThreeD,
}

/// Projection, view and model transforms for the game shader.
///
/// Angles are `(pitch, yaw, roll)` packed into a `Vec3` as x/y/z.
#[derive(Debug, Clone)]
pub struct ProjectionState {
    mode: ProjectionMode,
    near: f32,
    far: f32,
    fade: Vec2,
    projection_2d: Mat4,
    projection_3d: Mat4,
    projection_screen: Mat4,
    view: Mat4,
    sprite: Mat4,
    model: Mat4,
    camera_pos: Vec3,
}

impl ProjectionState {
    pub fn new(near: f32, far: f32, fade: Vec2) -> Self {
        Self {
            mode: ProjectionMode::TwoD,
            near,
            far,
            fade,
            projection_2d: Mat4::IDENTITY,
            projection_3d: Mat4::IDENTITY,
            projection_screen: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            sprite: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
            camera_pos: Vec3::ZERO,
        }
    }

    /// Recompute the size dependent projections.
    pub fn resize(&mut self, back_buffer: UVec2, screen: UVec2) {
        let bb = back_buffer.as_vec2();
        self.projection_2d = ortho_y_down(bb);
        self.projection_screen = ortho_y_down(screen.as_vec2());
        self.projection_3d = Mat4::perspective_rh(
            FOV_DEGREES.to_radians(),
            bb.x / bb.y.max(1.0),
            self.near,
            self.far,
        );
    }

    pub fn set_view(&mut self, pos: Vec3, angles: Vec3) {
        self.mode = ProjectionMode::ThreeD;
        self.view = view_matrix(pos, angles);
        self.sprite = sprite_orientation(angles);
        self.model = Mat4::IDENTITY;
        self.camera_pos = pos;
    }

    pub fn set_view_2d(&mut self) {
        self.mode = ProjectionMode::TwoD;
        self.view = Mat4::IDENTITY;
        self.model = Mat4::IDENTITY;
        self.camera_pos = Vec3::ZERO;
    }

    pub fn set_model(&mut self, model: Mat4) {
        self.model = model;
    }

    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    pub fn projection(&self) -> Mat4 {
        match self.mode {
            ProjectionMode::TwoD => self.projection_2d,
            ProjectionMode::ThreeD => self.projection_3d,
        }
    }

    pub fn projection_2d(&self) -> Mat4 {
        self.projection_2d
    }

    pub fn projection_3d(&self) -> Mat4 {
        self.projection_3d
    }

    pub fn projection_screen(&self) -> Mat4 {
        self.projection_screen
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn sprite_orientation(&self) -> Mat4 {
        self.sprite
    }

    pub fn camera_pos(&self) -> Vec3 {
        self.camera_pos
    }

    /// World position to normalized device coordinates.
    pub fn project(&self, pos: Vec3) -> Vec3 {
        self.projection_3d
            .project_point3(self.view.transform_point3(pos))
    }

    pub fn uniforms(&self, screen_offset: Vec2) -> DrawUniforms {
        let fade = match self.mode {
            ProjectionMode::TwoD => Vec2::ZERO,
            ProjectionMode::ThreeD => self.fade,
        };
        DrawUniforms::new(
            self.projection(),
            self.view,
            self.model,
            self.camera_pos,
            screen_offset,
            fade,
        )
    }
}

/// Pixel space orthographic projection with the origin at the top left.
pub fn ortho_y_down(size: Vec2) -> Mat4 {
    Mat4::orthographic_rh(0.0, size.x, size.y, 0.0, -1.0, 1.0)
}

pub fn view_matrix(pos: Vec3, angles: Vec3) -> Mat4 {
    Mat4::from_rotation_z(-angles.z)
        * Mat4::from_rotation_x(-angles.x)
        * Mat4::from_rotation_y(-angles.y)
        * Mat4::from_translation(-pos)
}

/// Undoes the camera's yaw and pitch so quads built in the xy plane face it.
pub fn sprite_orientation(angles: Vec3) -> Mat4 {
    Mat4::from_rotation_y(angles.y) * Mat4::from_rotation_x(angles.x)
}
