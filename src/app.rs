// app.rs
use std::sync::Arc;
use std::time::Instant;

use glam::{UVec2, Vec2, Vec3};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::renderer::{
    Bitmap, BlendMode, PostEffect, RenderError, Renderer, Rgba, TextureHandle, WgpuBackend,
};
use crate::settings::RenderSettings;

const ATLAS_DUMP_PATH: &str = "atlas.png";

struct DemoTextures {
    checker: TextureHandle,
    glow: TextureHandle,
}

impl DemoTextures {
    fn create(renderer: &mut Renderer<WgpuBackend>) -> crate::renderer::Result<Self> {
        let checker = checker_bitmap(64, 8);
        let glow = glow_bitmap(32);
        Ok(Self {
            checker: renderer.texture_create_bitmap(&checker)?,
            glow: renderer.texture_create_bitmap(&glow)?,
        })
    }
}

fn checker_bitmap(size: u32, cell: u32) -> Bitmap {
    let mut image = image::RgbaImage::new(size, size);
    for (x, y, px) in image.enumerate_pixels_mut() {
        let on = ((x / cell) + (y / cell)) % 2 == 0;
        *px = if on {
            image::Rgba([200, 200, 200, 255])
        } else {
            image::Rgba([60, 60, 90, 255])
        };
    }
    Bitmap::from_image(&image)
}

fn glow_bitmap(size: u32) -> Bitmap {
    let center = Vec2::splat(size as f32 * 0.5);
    let pixels = (0..size * size)
        .map(|i| {
            let p = Vec2::new((i % size) as f32, (i / size) as f32) + 0.5;
            let falloff = (1.0 - p.distance(center) / center.x).clamp(0.0, 1.0);
            Rgba::new(128, 128, 128, (falloff * 255.0) as u8)
        })
        .collect();
    Bitmap::new(size, size, pixels).unwrap_or_else(|_| Bitmap::solid(size, size, Rgba::NEUTRAL))
}

pub struct App {
    settings: RenderSettings,
    renderer: Option<Renderer<WgpuBackend>>,
    window: Option<Arc<Window>>,
    window_id: Option<WindowId>,
    textures: Option<DemoTextures>,
    start: Instant,
}

impl App {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            renderer: None,
            window: None,
            window_id: None,
            textures: None,
            start: Instant::now(),
        }
    }

    fn handle_key(&mut self, key: &Key) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        let Key::Character(c) = key else {
            return;
        };

        match c.as_str() {
            "r" => {
                let next = renderer.state().resolution.next();
                log::info!("Resolution {:?}", next);
                renderer.set_resolution(next);
            }
            "p" => {
                let effect = match renderer.state().post_effect {
                    PostEffect::None => PostEffect::Crt,
                    PostEffect::Crt => PostEffect::None,
                };
                renderer.set_post_effect(effect);
            }
            "d" => {
                if let Err(err) = renderer.textures_dump(ATLAS_DUMP_PATH) {
                    log::warn!("Atlas dump failed: {}", err);
                }
            }
            _ => {}
        }
    }

    fn draw(&mut self) {
        let (Some(renderer), Some(textures)) = (self.renderer.as_mut(), self.textures.as_ref())
        else {
            return;
        };
        let time = self.start.elapsed().as_secs_f64();
        let t = time as f32;

        renderer.frame_prepare();

        let camera = Vec3::new(t.sin() * 800.0, 200.0, t.cos() * 800.0);
        renderer.set_view(camera, Vec3::new(-0.2, t, 0.0));
        for i in 0..12 {
            let angle = i as f32 / 12.0 * std::f32::consts::TAU;
            let pos = Vec3::new(angle.cos() * 300.0, 0.0, angle.sin() * 300.0);
            let _ = renderer.push_sprite(pos, Vec2::splat(96.0), Rgba::NEUTRAL, textures.checker);
        }

        renderer.set_blend_mode(BlendMode::Lighter);
        renderer.set_depth_write(false);
        let _ = renderer.push_sprite(Vec3::ZERO, Vec2::splat(256.0), Rgba::NEUTRAL, textures.glow);
        renderer.set_blend_mode(BlendMode::Normal);

        renderer.set_view_2d();
        let size = renderer.size().as_vec2();
        let hud = Vec2::new(size.x * 0.25, size.y * 0.05);
        let _ = renderer.push_2d(
            Vec2::new(size.x * 0.5 - hud.x * 0.5, size.y - hud.y * 2.0),
            hud,
            Rgba::new(128, 64, 32, 200),
            TextureHandle::PROBE,
        );
        let _ = renderer.push_2d_sub(
            Vec2::splat(8.0),
            Vec2::ZERO,
            Vec2::splat(16.0),
            Vec2::splat(32.0),
            Rgba::NEUTRAL,
            textures.checker,
        );

        match renderer.frame_end(time) {
            Ok(()) => {}
            Err(RenderError::Surface(err)) => log::warn!("Skipped frame: {}", err),
            Err(err) => log::error!("Frame failed: {}", err),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes().with_title("wipeout renderer");
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Window creation failed: {}", err);
                event_loop.exit();
                return;
            }
        };
        let size = window.inner_size();
        let id = window.id();

        let backend = match pollster::block_on(WgpuBackend::new(window.clone(), &self.settings)) {
            Ok(backend) => backend,
            Err(err) => {
                log::error!("GPU initialization failed: {}", err);
                event_loop.exit();
                return;
            }
        };

        let renderer = Renderer::new(backend, UVec2::new(size.width, size.height), &self.settings);
        let mut renderer = match renderer {
            Ok(renderer) => renderer,
            Err(err) => {
                log::error!("Renderer initialization failed: {}", err);
                event_loop.exit();
                return;
            }
        };

        match DemoTextures::create(&mut renderer) {
            Ok(textures) => self.textures = Some(textures),
            Err(err) => log::warn!("Demo textures unavailable: {}", err),
        }

        window.request_redraw();
        self.window = Some(window);
        self.window_id = Some(id);
        self.renderer = Some(renderer);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if Some(id) != self.window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.set_screen_size(UVec2::new(size.width, size.height));
                }
            }
            WindowEvent::RedrawRequested => {
                self.draw();
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.handle_key(&logical_key);
            }
            _ => {}
        }
    }
}
