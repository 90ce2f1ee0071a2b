use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::renderer::batch::DEFAULT_TRIS_CAPACITY;
use crate::renderer::{PostEffect, Resolution};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default)]
    pub post_effect: PostEffect,
    #[serde(default = "RenderSettings::default_use_mipmaps")]
    pub use_mipmaps: bool,
    #[serde(default = "RenderSettings::default_near_plane")]
    pub near_plane: f32,
    #[serde(default = "RenderSettings::default_far_plane")]
    pub far_plane: f32,
    #[serde(default = "RenderSettings::default_fade_near")]
    pub fade_near: f32,
    #[serde(default = "RenderSettings::default_fade_far")]
    pub fade_far: f32,
    #[serde(default = "RenderSettings::default_tris_buffer_capacity")]
    pub tris_buffer_capacity: usize,
    #[serde(default)]
    pub present_mode: PresentModeSetting,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            post_effect: PostEffect::default(),
            use_mipmaps: Self::default_use_mipmaps(),
            near_plane: Self::default_near_plane(),
            far_plane: Self::default_far_plane(),
            fade_near: Self::default_fade_near(),
            fade_far: Self::default_fade_far(),
            tris_buffer_capacity: Self::default_tris_buffer_capacity(),
            present_mode: PresentModeSetting::default(),
        }
    }
}

impl RenderSettings {
    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RenderSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded render settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default render settings.",
                        path, err
                    );
                    RenderSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Render settings file {:?} not found. Using default settings.",
                    path
                );
                RenderSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default render settings.",
                    path, err
                );
                RenderSettings::default()
            }
        }
    }

    fn validate(mut self) -> Self {
        if !(self.near_plane > 0.0 && self.far_plane > self.near_plane) {
            warn!(
                "Clip planes {} / {} are invalid. Using defaults.",
                self.near_plane, self.far_plane
            );
            self.near_plane = Self::default_near_plane();
            self.far_plane = Self::default_far_plane();
        }

        if !(self.fade_far > self.fade_near && self.fade_near >= 0.0) {
            warn!("Fade range must be increasing. Using default range.");
            self.fade_near = Self::default_fade_near();
            self.fade_far = Self::default_fade_far();
        }

        if self.tris_buffer_capacity == 0 {
            warn!("Triangle buffer capacity must be greater than zero. Using default value.");
            self.tris_buffer_capacity = Self::default_tris_buffer_capacity();
        }

        self
    }

    pub fn present_mode(&self, available: &[wgpu::PresentMode]) -> wgpu::PresentMode {
        let desired = self.present_mode.to_wgpu();
        if available.contains(&desired) {
            return desired;
        }

        warn!(
            "Requested present mode {:?} is not supported. Falling back to FIFO.",
            desired
        );

        if available.contains(&wgpu::PresentMode::Fifo) {
            wgpu::PresentMode::Fifo
        } else {
            available
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo)
        }
    }

    const fn default_use_mipmaps() -> bool {
        true
    }

    const fn default_near_plane() -> f32 {
        16.0
    }

    const fn default_far_plane() -> f32 {
        64000.0
    }

    const fn default_fade_near() -> f32 {
        48000.0
    }

    const fn default_fade_far() -> f32 {
        64000.0
    }

    const fn default_tris_buffer_capacity() -> usize {
        DEFAULT_TRIS_CAPACITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentModeSetting {
    #[default]
    Fifo,
    FifoRelaxed,
    Immediate,
    Mailbox,
    AutoVsync,
    AutoNoVsync,
}

impl PresentModeSetting {
    fn to_wgpu(self) -> wgpu::PresentMode {
        match self {
            PresentModeSetting::Fifo => wgpu::PresentMode::Fifo,
            PresentModeSetting::FifoRelaxed => wgpu::PresentMode::FifoRelaxed,
            PresentModeSetting::Immediate => wgpu::PresentMode::Immediate,
            PresentModeSetting::Mailbox => wgpu::PresentMode::Mailbox,
            PresentModeSetting::AutoVsync => wgpu::PresentMode::AutoVsync,
            PresentModeSetting::AutoNoVsync => wgpu::PresentMode::AutoNoVsync,
        }
    }
}
