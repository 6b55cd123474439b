// This is free and unencumbered software released into the public domain.

use crate::shared::{LOW_LIGHT_FPS_LOWER, MIN_FPS_LOWER, Size};
use derive_more::Display;

/// Which lens the session opens.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum Facing {
    #[default]
    #[display("front")]
    Front,
    #[display("back")]
    Back,
}

impl Facing {
    pub fn flip(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }

    /// Sensor orientation assumed when the device does not report one.
    pub fn default_orientation(self) -> u32 {
        match self {
            Self::Front => 270,
            Self::Back => 90,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    pub facing: Facing,
    pub max_preview: Size,
    pub buffer_frames: usize,
    pub min_fps: i32,
    pub low_light_fps: i32,
    pub diagnostics: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            facing: Facing::Front,
            max_preview: Size::new(1920, 1080),
            buffer_frames: 3,
            min_fps: MIN_FPS_LOWER,
            low_light_fps: LOW_LIGHT_FPS_LOWER,
            diagnostics: false,
        }
    }
}

impl CameraConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_max_preview(mut self, max: Size) -> Self {
        self.max_preview = max;
        self
    }

    pub fn with_buffer_frames(mut self, n: usize) -> Self {
        self.buffer_frames = n.max(1);
        self
    }

    pub fn with_fps_bounds(mut self, min_fps: i32, low_light_fps: i32) -> Self {
        self.min_fps = min_fps;
        self.low_light_fps = low_light_fps;
        self
    }

    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    pub fn desired_size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_clamps_buffer_frames() {
        let config = CameraConfig::new(640, 480).with_buffer_frames(0);
        assert_eq!(config.buffer_frames, 1);
        assert_eq!(config.desired_size(), Size::new(640, 480));
    }

    #[test]
    fn facing_flips() {
        assert_eq!(Facing::Front.flip(), Facing::Back);
        assert_eq!(Facing::Back.flip().default_orientation(), 270);
        assert_eq!(Facing::Back.to_string(), "back");
    }
}
