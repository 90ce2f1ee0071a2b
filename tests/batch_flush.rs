//! Flush protocol of the batching renderer, observed through the recording
//! headless backend.
use glam::{UVec2, Vec2, Vec3};
use wipeout_render::renderer::backend::BackendEvent;
use wipeout_render::renderer::vertex::v;
use wipeout_render::renderer::{
    AtlasFilter, BlendMode, HeadlessBackend, PostEffect, RenderError, Renderer, Resolution, Rgba,
    TextureHandle, Triangle,
};
use wipeout_render::settings::RenderSettings;

const SCREEN: UVec2 = UVec2::new(1280, 720);

fn settings() -> RenderSettings {
    RenderSettings {
        use_mipmaps: false,
        ..RenderSettings::default()
    }
}

fn renderer_with(settings: &RenderSettings) -> Renderer<HeadlessBackend> {
    let mut renderer = Renderer::new(HeadlessBackend::new(), SCREEN, settings).unwrap();
    renderer.backend_mut().take_events();
    renderer
}

fn renderer() -> Renderer<HeadlessBackend> {
    renderer_with(&settings())
}

fn tri() -> Triangle {
    Triangle::new(
        v(Vec3::new(0.0, 0.0, 0.0), Vec2::new(0.0, 0.0), Rgba::NEUTRAL),
        v(Vec3::new(0.0, 10.0, 0.0), Vec2::new(0.0, 2.0), Rgba::NEUTRAL),
        v(Vec3::new(10.0, 0.0, 0.0), Vec2::new(2.0, 0.0), Rgba::NEUTRAL),
    )
}

fn push(renderer: &mut Renderer<HeadlessBackend>, count: usize) {
    for _ in 0..count {
        renderer.push_triangle(tri(), TextureHandle::PROBE).unwrap();
    }
}

#[test]
fn construction_configures_targets_and_uploads_the_probe() {
    let renderer = Renderer::new(HeadlessBackend::new(), SCREEN, &settings()).unwrap();
    assert_eq!(
        renderer.backend().events(),
        &[
            BackendEvent::ResizeSurface(SCREEN),
            BackendEvent::ConfigureBackBuffer(SCREEN),
            BackendEvent::SetFilter(AtlasFilter::Linear),
            BackendEvent::AtlasWrite {
                origin: UVec2::ZERO,
                size: UVec2::splat(34),
            },
        ]
    );
    assert_eq!(renderer.textures_len(), 1);
}

#[test]
fn state_change_flushes_pending_triangles_with_the_old_state() {
    let mut renderer = renderer();
    renderer.frame_prepare();
    renderer.set_view(Vec3::ZERO, Vec3::ZERO);

    push(&mut renderer, 2);
    renderer.set_depth_test(false);
    assert_eq!(renderer.pending_tris(), 0);

    push(&mut renderer, 1);
    renderer.flush();

    let draws: Vec<_> = renderer.backend().draws().collect();
    assert_eq!(draws.len(), 2);
    assert!(draws[0].0.depth_test);
    assert_eq!(draws[0].2.len(), 6);
    assert!(!draws[1].0.depth_test);
    assert_eq!(draws[1].2.len(), 3);
}

#[test]
fn setters_without_pending_triangles_emit_no_draws() {
    let mut renderer = renderer();
    renderer.set_depth_write(false);
    renderer.set_cull_backface(false);
    renderer.set_depth_offset(-4.0);
    renderer.set_view_2d();
    renderer.flush();
    assert_eq!(renderer.backend().draw_count(), 0);
}

#[test]
fn blend_mode_flushes_only_when_it_changes() {
    let mut renderer = renderer();
    push(&mut renderer, 1);

    renderer.set_blend_mode(BlendMode::Normal);
    assert_eq!(renderer.pending_tris(), 1);
    assert_eq!(renderer.backend().draw_count(), 0);

    renderer.set_blend_mode(BlendMode::Lighter);
    assert_eq!(renderer.pending_tris(), 0);

    push(&mut renderer, 1);
    renderer.flush();
    let blends: Vec<_> = renderer.backend().draws().map(|d| d.0.blend_mode).collect();
    assert_eq!(blends, vec![BlendMode::Normal, BlendMode::Lighter]);
}

#[test]
fn full_buffer_flushes_before_accepting_more() {
    let settings = RenderSettings {
        tris_buffer_capacity: 4,
        ..settings()
    };
    let mut renderer = renderer_with(&settings);

    push(&mut renderer, 10);
    assert_eq!(renderer.backend().draw_count(), 2);
    assert_eq!(renderer.pending_tris(), 2);

    renderer.flush();
    let sizes: Vec<_> = renderer.backend().draws().map(|d| d.2.len()).collect();
    assert_eq!(sizes, vec![12, 12, 6]);
}

#[test]
fn mipmaps_regenerate_once_per_dirty_flush() {
    let settings = RenderSettings {
        use_mipmaps: true,
        ..settings()
    };
    let mut renderer = renderer_with(&settings);
    let mipmaps = |r: &Renderer<HeadlessBackend>| {
        r.backend()
            .count(|e| matches!(e, BackendEvent::GenerateMipmaps))
    };

    // The probe upload left the atlas dirty.
    push(&mut renderer, 1);
    renderer.flush();
    assert_eq!(mipmaps(&renderer), 1);
    assert!(matches!(
        renderer.backend().events()[0],
        BackendEvent::GenerateMipmaps
    ));

    push(&mut renderer, 1);
    renderer.flush();
    assert_eq!(mipmaps(&renderer), 1);

    renderer.texture_create(4, 4, &[Rgba::NEUTRAL; 16]).unwrap();
    renderer.texture_create(4, 4, &[Rgba::NEUTRAL; 16]).unwrap();
    push(&mut renderer, 1);
    renderer.flush();
    assert_eq!(mipmaps(&renderer), 2);
}

#[test]
fn mipmaps_are_never_generated_when_disabled() {
    let mut renderer = renderer();
    renderer.texture_create(4, 4, &[Rgba::NEUTRAL; 16]).unwrap();
    push(&mut renderer, 1);
    renderer.flush();
    assert_eq!(
        renderer
            .backend()
            .count(|e| matches!(e, BackendEvent::GenerateMipmaps)),
        0
    );
}

#[test]
fn texture_coordinates_are_moved_into_the_atlas() {
    let mut renderer = renderer();
    let handle = renderer.texture_create(8, 8, &[Rgba::NEUTRAL; 64]).unwrap();
    let offset = renderer.textures().get(handle).unwrap().offset;
    // The probe holds the first two columns, so the next block sits beside it.
    assert_eq!(offset, UVec2::new(80, 16));

    renderer.push_triangle(tri(), handle).unwrap();
    renderer.flush();

    let (_, _, vertices) = renderer.backend().draws().next().unwrap();
    let uvs: Vec<_> = vertices.iter().map(|v| v.uv).collect();
    assert_eq!(uvs, vec![[80.0, 16.0], [80.0, 18.0], [82.0, 16.0]]);
    assert_eq!(vertices[1].pos, [0.0, 10.0, 0.0]);
}

#[test]
fn unknown_texture_handles_are_rejected() {
    let mut renderer = renderer();
    let bad = TextureHandle::new(99);

    let err = renderer.push_triangle(tri(), bad).unwrap_err();
    assert!(matches!(err, RenderError::InvalidTexture { handle: 99, len: 1 }));
    assert!(renderer
        .push_sprite(Vec3::ZERO, Vec2::ONE, Rgba::NEUTRAL, bad)
        .is_err());
    assert!(renderer
        .push_2d(Vec2::ZERO, Vec2::ONE, Rgba::NEUTRAL, bad)
        .is_err());
    assert_eq!(renderer.pending_tris(), 0);
}

#[test]
fn quads_push_two_triangles() {
    let mut renderer = renderer();
    renderer
        .push_sprite(Vec3::ZERO, Vec2::splat(4.0), Rgba::NEUTRAL, TextureHandle::PROBE)
        .unwrap();
    renderer
        .push_2d(Vec2::ZERO, Vec2::splat(4.0), Rgba::NEUTRAL, TextureHandle::PROBE)
        .unwrap();
    renderer
        .push_2d_sub(
            Vec2::ZERO,
            Vec2::ONE,
            Vec2::ONE,
            Vec2::splat(4.0),
            Rgba::NEUTRAL,
            TextureHandle::PROBE,
        )
        .unwrap();
    assert_eq!(renderer.pending_tris(), 6);
}

#[test]
fn frame_runs_begin_draw_end_in_order() {
    let mut renderer = renderer();
    renderer.set_post_effect(PostEffect::Crt);

    renderer.frame_prepare();
    push(&mut renderer, 1);
    renderer.frame_end(1.5).unwrap();

    let events = renderer.backend().events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], BackendEvent::BeginFrame);
    assert!(matches!(events[1], BackendEvent::Draw { .. }));
    match &events[2] {
        BackendEvent::EndFrame(post) => {
            assert_eq!(post.effect, PostEffect::Crt);
            assert_eq!(post.uniforms.time, 1.5);
            assert_eq!(post.uniforms.screen_size, [1280.0, 720.0]);
        }
        other => panic!("expected end of frame, got {other:?}"),
    }
}

#[test]
fn post_effect_change_keeps_the_batch() {
    let mut renderer = renderer();
    push(&mut renderer, 1);
    renderer.set_post_effect(PostEffect::Crt);
    assert_eq!(renderer.pending_tris(), 1);
}

#[test]
fn frame_prepare_restores_depth_state_and_screen_position() {
    let mut renderer = renderer();
    renderer.set_depth_write(false);
    renderer.set_depth_test(false);
    renderer.set_depth_offset(2.0);
    renderer.set_screen_position(Vec2::new(0.25, 0.5));

    renderer.frame_prepare();
    push(&mut renderer, 1);
    renderer.flush();

    let (pipeline, uniforms, _) = renderer.backend().draws().next().unwrap();
    assert!(pipeline.depth_test);
    assert!(pipeline.depth_write);
    assert_eq!(pipeline.depth_offset(), 0.0);
    assert_eq!(uniforms.screen, [0.0, 0.0]);
}

#[test]
fn screen_position_is_passed_with_y_flipped() {
    let mut renderer = renderer();
    renderer.set_screen_position(Vec2::new(0.25, 0.5));
    push(&mut renderer, 1);
    renderer.flush();

    let (_, uniforms, _) = renderer.backend().draws().next().unwrap();
    assert_eq!(uniforms.screen, [0.25, -0.5]);
}

#[test]
fn fade_applies_to_3d_draws_only() {
    let mut renderer = renderer();
    let defaults = RenderSettings::default();

    renderer.set_view(Vec3::new(0.0, 0.0, 100.0), Vec3::ZERO);
    push(&mut renderer, 1);
    renderer.set_view_2d();
    push(&mut renderer, 1);
    renderer.flush();

    let fades: Vec<_> = renderer.backend().draws().map(|d| d.1.fade).collect();
    assert_eq!(
        fades,
        vec![[defaults.fade_near, defaults.fade_far], [0.0, 0.0]]
    );
    let cameras: Vec<_> = renderer.backend().draws().map(|d| d.1.camera_pos).collect();
    assert_eq!(cameras[0][..3], [0.0, 0.0, 100.0]);
}

#[test]
fn fade_range_comes_from_settings() {
    let settings = RenderSettings {
        fade_near: 1000.0,
        fade_far: 2000.0,
        ..settings()
    };
    let mut renderer = renderer_with(&settings);

    renderer.set_view(Vec3::ZERO, Vec3::ZERO);
    push(&mut renderer, 1);
    renderer.flush();

    let (_, uniforms, _) = renderer.backend().draws().next().unwrap();
    assert_eq!(uniforms.fade, [1000.0, 2000.0]);
}

#[test]
fn view_2d_disables_depth_test_and_view_3d_restores_it() {
    let mut renderer = renderer();
    renderer.set_view_2d();
    assert!(!renderer.state().depth_test);
    renderer.set_view(Vec3::ZERO, Vec3::ZERO);
    assert!(renderer.state().depth_test);
    assert!(renderer.state().depth_write);
}

#[test]
fn zero_screen_size_is_ignored() {
    let mut renderer = renderer();
    push(&mut renderer, 1);

    renderer.set_screen_size(UVec2::new(0, 720));
    assert!(renderer.backend().events().is_empty());
    assert_eq!(renderer.pending_tris(), 1);
    assert_eq!(renderer.screen_size(), SCREEN);
}

#[test]
fn resize_flushes_then_reconfigures() {
    let mut renderer = renderer();
    push(&mut renderer, 1);

    let screen = UVec2::new(1920, 1080);
    renderer.set_screen_size(screen);

    let events = renderer.backend().events();
    assert!(matches!(events[0], BackendEvent::Draw { .. }));
    assert_eq!(
        events[1..],
        [
            BackendEvent::ResizeSurface(screen),
            BackendEvent::ConfigureBackBuffer(screen),
            BackendEvent::SetFilter(AtlasFilter::Linear),
        ]
    );
    assert_eq!(renderer.size(), screen);
}

#[test]
fn resolution_change_resizes_the_back_buffer_and_switches_filter() {
    let mut renderer = renderer();
    renderer.set_resolution(Resolution::Lines240);

    assert_eq!(renderer.size(), UVec2::new(427, 240));
    assert_eq!(renderer.screen_size(), SCREEN);
    assert_eq!(
        renderer.backend().events(),
        &[
            BackendEvent::ConfigureBackBuffer(UVec2::new(427, 240)),
            BackendEvent::SetFilter(AtlasFilter::Nearest),
        ]
    );
}

#[test]
fn textures_reset_to_zero_reuploads_the_probe() {
    let mut renderer = renderer();
    renderer.texture_create(4, 4, &[Rgba::NEUTRAL; 16]).unwrap();
    renderer.backend_mut().take_events();

    renderer.textures_reset(0).unwrap();
    assert_eq!(renderer.textures_len(), 1);
    assert_eq!(
        renderer.backend().events(),
        &[BackendEvent::AtlasWrite {
            origin: UVec2::ZERO,
            size: UVec2::splat(34),
        }]
    );
    assert!(renderer.textures_reset(3).is_err());
}

#[test]
fn replace_pixels_uploads_the_padded_block() {
    let mut renderer = renderer();
    let handle = renderer.texture_create(4, 2, &[Rgba::NEUTRAL; 8]).unwrap();
    renderer.backend_mut().take_events();

    renderer
        .texture_replace_pixels(handle, &[Rgba::new(1, 2, 3, 4); 8])
        .unwrap();
    let origin = renderer.textures().get(handle).unwrap().padded_origin();
    assert_eq!(
        renderer.backend().events(),
        &[BackendEvent::AtlasWrite {
            origin,
            size: UVec2::new(36, 34),
        }]
    );
    assert_eq!(renderer.texture_size(handle).unwrap(), UVec2::new(4, 2));
}
