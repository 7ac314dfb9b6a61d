use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Frame rate the delta factor is normalised against.
pub const REFERENCE_FPS: f32 = 60.0;

/// Elapsed time for a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDelta {
    /// Elapsed real seconds.
    pub value: f32,
    /// `value` normalised to a 60 fps frame, clamped and optionally smoothed.
    pub factor: f32,
}

impl FrameDelta {
    pub fn from_seconds(value: f32) -> Self {
        let value = value.max(0.0);
        Self {
            value,
            factor: value * REFERENCE_FPS,
        }
    }
}

impl Default for FrameDelta {
    fn default() -> Self {
        Self::from_seconds(1.0 / REFERENCE_FPS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    /// Upper bound for the delta factor so a stalled frame does not teleport
    /// particles.
    pub max_factor: f32,
    /// Number of frames averaged for the factor; `0` disables smoothing.
    pub smoothing_window: usize,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            max_factor: 4.0,
            smoothing_window: 0,
        }
    }
}

/// Running clock that turns wall-clock elapsed times into [`FrameDelta`]s.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    pub time_seconds: f32,
    pub frames: u64,
    settings: ClockSettings,
    history: VecDeque<f32>,
}

impl FrameClock {
    pub fn new(settings: ClockSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
        self.frames = 0;
        self.history.clear();
    }

    /// Advances the clock and returns the delta for the frame.
    pub fn advance(&mut self, elapsed: f32) -> FrameDelta {
        let elapsed = if elapsed.is_finite() { elapsed.max(0.0) } else { 0.0 };
        self.time_seconds += elapsed;
        self.frames += 1;

        let mut delta = FrameDelta::from_seconds(elapsed);

        let window = self.settings.smoothing_window;
        if window > 0 {
            self.history.push_back(delta.factor);
            while self.history.len() > window {
                self.history.pop_front();
            }
            delta.factor = self.history.iter().sum::<f32>() / self.history.len() as f32;
        }

        if self.settings.max_factor > 0.0 {
            delta.factor = delta.factor.min(self.settings.max_factor);
        }

        delta
    }
}
