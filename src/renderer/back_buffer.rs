use glam::UVec2;
use serde::{Deserialize, Serialize};

use crate::renderer::RenderError;

/// Internal render resolution. Fixed modes keep the window's aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    #[default]
    Native,
    Lines240,
    Lines480,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [
        Resolution::Native,
        Resolution::Lines240,
        Resolution::Lines480,
    ];

    pub fn lines(self) -> Option<u32> {
        match self {
            Resolution::Native => None,
            Resolution::Lines240 => Some(240),
            Resolution::Lines480 => Some(480),
        }
    }

    /// Back buffer size for a window of `screen` pixels.
    pub fn back_buffer_size(self, screen: UVec2) -> UVec2 {
        match self.lines() {
            None => screen,
            Some(lines) => {
                let aspect = screen.x as f32 / screen.y.max(1) as f32;
                let width = (lines as f32 * aspect).round();
                UVec2::new((width as u32).max(1), lines)
            }
        }
    }

    pub fn next(self) -> Self {
        match self {
            Resolution::Native => Resolution::Lines240,
            Resolution::Lines240 => Resolution::Lines480,
            Resolution::Lines480 => Resolution::Native,
        }
    }
}

impl TryFrom<u8> for Resolution {
    type Error = RenderError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Resolution::ALL
            .get(value as usize)
            .copied()
            .ok_or(RenderError::InvalidResolution(value))
    }
}

/// Effect applied while copying the back buffer to the swap chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostEffect {
    #[default]
    None,
    Crt,
}

impl TryFrom<u8> for PostEffect {
    type Error = RenderError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PostEffect::None),
            1 => Ok(PostEffect::Crt),
            _ => Err(RenderError::InvalidPostEffect(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtlasFilter {
    Nearest,
    Linear,
    LinearMipmap,
}

/// Tracks the window and back buffer sizes for the active resolution mode.
#[derive(Debug, Clone)]
pub struct BackBufferManager {
    resolution: Resolution,
    screen_size: UVec2,
    size: UVec2,
    use_mipmaps: bool,
}

impl BackBufferManager {
    pub fn new(resolution: Resolution, screen_size: UVec2, use_mipmaps: bool) -> Self {
        let screen_size = screen_size.max(UVec2::ONE);
        Self {
            resolution,
            screen_size,
            size: resolution.back_buffer_size(screen_size),
            use_mipmaps,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn screen_size(&self) -> UVec2 {
        self.screen_size
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn filter(&self) -> AtlasFilter {
        match (self.resolution, self.use_mipmaps) {
            (Resolution::Native, true) => AtlasFilter::LinearMipmap,
            (Resolution::Native, false) => AtlasFilter::Linear,
            _ => AtlasFilter::Nearest,
        }
    }

    pub fn set_resolution(&mut self, resolution: Resolution) -> UVec2 {
        self.resolution = resolution;
        self.size = resolution.back_buffer_size(self.screen_size);
        log::info!(
            "Back buffer {}x{} for {:?}",
            self.size.x,
            self.size.y,
            resolution
        );
        self.size
    }

    /// Returns `false` when the size was ignored.
    pub fn set_screen_size(&mut self, screen_size: UVec2) -> bool {
        if screen_size.x == 0 || screen_size.y == 0 {
            log::debug!("Ignoring zero screen size {:?}", screen_size);
            return false;
        }
        self.screen_size = screen_size;
        self.set_resolution(self.resolution);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_modes_round_width_to_aspect() {
        let screen = UVec2::new(1280, 720);
        assert_eq!(Resolution::Native.back_buffer_size(screen), screen);
        assert_eq!(
            Resolution::Lines240.back_buffer_size(screen),
            UVec2::new(427, 240)
        );
        assert_eq!(
            Resolution::Lines480.back_buffer_size(screen),
            UVec2::new(853, 480)
        );
    }

    #[test]
    fn unknown_indices_are_rejected() {
        assert_eq!(Resolution::try_from(2).unwrap(), Resolution::Lines480);
        assert!(matches!(
            Resolution::try_from(3),
            Err(RenderError::InvalidResolution(3))
        ));
        assert_eq!(PostEffect::try_from(1).unwrap(), PostEffect::Crt);
        assert!(matches!(
            PostEffect::try_from(9),
            Err(RenderError::InvalidPostEffect(9))
        ));
    }

    #[test]
    fn filter_follows_resolution_and_mipmaps() {
        let mut manager =
            BackBufferManager::new(Resolution::Native, UVec2::new(640, 480), true);
        assert_eq!(manager.filter(), AtlasFilter::LinearMipmap);
        manager.set_resolution(Resolution::Lines240);
        assert_eq!(manager.filter(), AtlasFilter::Nearest);

        let manager = BackBufferManager::new(Resolution::Native, UVec2::new(640, 480), false);
        assert_eq!(manager.filter(), AtlasFilter::Linear);
    }

    #[test]
    fn zero_screen_size_is_ignored() {
        let mut manager =
            BackBufferManager::new(Resolution::Lines240, UVec2::new(1280, 720), true);
        assert!(!manager.set_screen_size(UVec2::new(0, 720)));
        assert_eq!(manager.size(), UVec2::new(427, 240));
        assert!(manager.set_screen_size(UVec2::new(640, 480)));
        assert_eq!(manager.size(), UVec2::new(320, 240));
    }
}
