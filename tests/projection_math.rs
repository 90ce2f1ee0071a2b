//! Projection conventions of the game renderer.
//!
//! - Right-handed view space, camera looks down -Z.
//! - Angles are (pitch, yaw, roll) in radians.
//! - NDC y points up and depth runs 0..1; front faces wind counter-clockwise.
use glam::{UVec2, Vec2, Vec3};
use wipeout_render::renderer::projection::{sprite_orientation, view_matrix, ProjectionState};
use wipeout_render::renderer::{HeadlessBackend, Renderer, Resolution, Rgba, TextureHandle};
use wipeout_render::settings::RenderSettings;

fn approx(a: Vec3, b: Vec3, eps: f32) -> bool {
    (a - b).abs().max_element() <= eps
}

fn signed_area(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    let (ab, ac) = (b - a, c - a);
    ab.x * ac.y - ab.y * ac.x
}

fn renderer(resolution: Resolution, screen: UVec2) -> Renderer<HeadlessBackend> {
    let settings = RenderSettings {
        resolution,
        ..RenderSettings::default()
    };
    Renderer::new(HeadlessBackend::new(), screen, &settings).unwrap()
}

#[test]
fn fixed_resolutions_keep_the_window_aspect() {
    let screen = UVec2::new(1280, 720);
    assert_eq!(renderer(Resolution::Lines240, screen).size(), UVec2::new(427, 240));
    assert_eq!(renderer(Resolution::Lines480, screen).size(), UVec2::new(853, 480));
    assert_eq!(renderer(Resolution::Native, screen).size(), screen);
    assert_eq!(
        renderer(Resolution::Lines240, UVec2::new(800, 600)).size(),
        UVec2::new(320, 240)
    );
}

#[test]
fn camera_looks_down_negative_z_without_rotation() {
    let mut state = ProjectionState::new(16.0, 64000.0, Vec2::ZERO);
    state.resize(UVec2::new(320, 240), UVec2::new(320, 240));
    state.set_view(Vec3::new(0.0, 0.0, 500.0), Vec3::ZERO);

    let center = state.project(Vec3::ZERO);
    assert!(approx(center, Vec3::new(0.0, 0.0, center.z), 1e-5));
    assert!(center.z > 0.0 && center.z < 1.0);

    let above = state.project(Vec3::new(0.0, 100.0, 0.0));
    assert!(above.y > 0.0);
}

#[test]
fn depth_grows_with_distance() {
    let mut state = ProjectionState::new(16.0, 64000.0, Vec2::ZERO);
    state.resize(UVec2::new(320, 240), UVec2::new(320, 240));
    state.set_view(Vec3::ZERO, Vec3::ZERO);

    let near = state.project(Vec3::new(0.0, 0.0, -100.0));
    let far = state.project(Vec3::new(0.0, 0.0, -10000.0));
    assert!(near.z < far.z);
}

#[test]
fn sprite_orientation_cancels_camera_rotation() {
    for angles in [
        Vec3::ZERO,
        Vec3::new(0.3, 0.0, 0.0),
        Vec3::new(0.0, 1.2, 0.0),
        Vec3::new(-0.4, 2.5, 0.0),
    ] {
        let combined = view_matrix(Vec3::ZERO, angles) * sprite_orientation(angles);
        let normal = combined.transform_vector3(Vec3::Z);
        assert!(approx(normal, Vec3::Z, 1e-5), "{angles:?} -> {normal:?}");
    }
}

#[test]
fn sprites_face_the_camera_and_wind_counter_clockwise() {
    for angles in [Vec3::ZERO, Vec3::new(0.2, 0.8, 0.0), Vec3::new(-0.5, -2.0, 0.0)] {
        let mut renderer = renderer(Resolution::Native, UVec2::new(640, 480));
        let camera = Vec3::new(100.0, -50.0, 20.0);
        renderer.set_view(camera, angles);

        let forward = sprite_orientation(angles).transform_vector3(Vec3::NEG_Z);
        let center = camera + forward * 500.0;
        renderer
            .push_sprite(center, Vec2::splat(64.0), Rgba::NEUTRAL, TextureHandle::PROBE)
            .unwrap();
        renderer.flush();

        let (_, _, vertices) = renderer.backend().draws().next().unwrap();
        let projected: Vec<_> = vertices
            .iter()
            .map(|v| renderer.project(v.position()))
            .collect();
        for tri in projected.chunks(3) {
            assert!(signed_area(tri[0], tri[1], tri[2]) > 0.0, "{angles:?}");
        }

        let mid = renderer.project(center);
        assert!(approx(mid, Vec3::new(0.0, 0.0, mid.z), 1e-4), "{angles:?}");
    }
}
