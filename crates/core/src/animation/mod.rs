//! Velocity-driven numeric channels with wrap or reflect boundaries.
//!
//! A channel is the building block for every animated scalar on a particle:
//! the three HSL components of the fill color, the stroke color and anything
//! a plugin wants to oscillate. The update step is frame-rate independent:
//! velocities are expressed in units per second and decay is a per-second
//! retention factor.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{math::RangeValue, timeline::FrameDelta};

/// Direction of travel for reflecting channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnimationStatus {
    #[default]
    Increasing,
    Decreasing,
}

/// What happens when a channel crosses its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// Modulo wrap into `[min, max)`, used for hue-like values.
    Wrap,
    /// Mirror at the boundary and reverse travel, used for percentages.
    Reflect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedChannel {
    pub value: f32,
    /// Units per second; the sign is honoured by wrapping channels while
    /// reflecting channels use the magnitude together with `status`.
    pub velocity: f32,
    /// Fraction of velocity retained per second; `1.0` disables decay.
    pub decay: f32,
    pub enable: bool,
    pub min: f32,
    pub max: f32,
    pub policy: BoundaryPolicy,
    pub status: AnimationStatus,
    pub loops: u32,
    /// Animation stops once `loops` exceeds this; `0` is unlimited.
    pub max_loops: u32,
    /// Seconds to wait before the first step.
    pub delay_time: f32,
    pub time: f32,
    /// Extra random velocity (units per second) rolled every step.
    pub offset: Option<RangeValue>,
}

impl AnimatedChannel {
    /// A disabled channel holding a constant value.
    pub fn fixed(value: f32, min: f32, max: f32, policy: BoundaryPolicy) -> Self {
        Self {
            value,
            velocity: 0.0,
            decay: 1.0,
            enable: false,
            min,
            max,
            policy,
            status: AnimationStatus::Increasing,
            loops: 0,
            max_loops: 0,
            delay_time: 0.0,
            time: 0.0,
            offset: None,
        }
    }

    /// Hue-like channel over `[0, 360)`.
    pub fn hue(value: f32) -> Self {
        Self::fixed(value, 0.0, 360.0, BoundaryPolicy::Wrap)
    }

    /// Percentage channel over `[0, 100]`.
    pub fn percent(value: f32) -> Self {
        Self::fixed(value, 0.0, 100.0, BoundaryPolicy::Reflect)
    }

    /// Arms the channel from configured animation options.
    pub fn animate<R: Rng + ?Sized>(
        mut self,
        options: &ChannelAnimation,
        reduce_factor: f32,
        rng: &mut R,
    ) -> Self {
        self.enable = options.enable;
        if !self.enable {
            self.velocity = 0.0;
            return self;
        }

        self.velocity = options.speed.pick(rng) * reduce_factor;
        self.decay = 1.0 - options.decay.pick(rng);
        self.status = AnimationStatus::Increasing;
        self.loops = 0;
        self.max_loops = options.count.pick(rng).max(0.0) as u32;
        self.time = 0.0;
        self.delay_time = options.delay.pick(rng).max(0.0);
        self.offset = options.offset;

        if !options.sync {
            self.velocity *= rng.gen::<f32>();
            self.value *= rng.gen::<f32>();
        }

        self
    }

    pub fn is_finished(&self) -> bool {
        self.max_loops > 0 && self.loops > self.max_loops
    }

    /// Advances the channel by one frame. Disabled or finished channels are
    /// left untouched.
    pub fn update<R: Rng + ?Sized>(&mut self, delta: &FrameDelta, rng: &mut R) {
        if !self.enable || self.is_finished() {
            return;
        }

        if self.delay_time > 0.0 && self.time < self.delay_time {
            self.time += delta.value;
            if self.time < self.delay_time {
                return;
            }
        }

        let offset = self.offset.map_or(0.0, |range| range.pick(rng));
        let step = (self.velocity + offset) * delta.value;

        match self.policy {
            BoundaryPolicy::Wrap => self.wrap(step),
            BoundaryPolicy::Reflect => self.reflect(step.abs()),
        }

        if self.decay != 1.0 && self.velocity != 0.0 {
            self.velocity *= self.decay.max(0.0).powf(delta.value);
        }
    }

    fn wrap(&mut self, step: f32) {
        let span = self.max - self.min;
        if span <= 0.0 {
            return;
        }

        let next = self.value + step;
        if next >= self.max || next < self.min {
            self.loops += 1;
        }
        self.value = self.min + (next - self.min).rem_euclid(span);
    }

    fn reflect(&mut self, step: f32) {
        if self.max <= self.min {
            return;
        }

        match self.status {
            AnimationStatus::Increasing => {
                self.value += step;
                if self.value > self.max {
                    self.loops += 1;
                    self.status = AnimationStatus::Decreasing;
                    self.value = self.max - (self.value - self.max);
                }
            }
            AnimationStatus::Decreasing => {
                self.value -= step;
                if self.value < self.min {
                    self.loops += 1;
                    self.status = AnimationStatus::Increasing;
                    self.value = self.min + (self.min - self.value);
                }
            }
        }

        self.value = self.value.clamp(self.min, self.max);
    }
}

/// Configuration for animating a single channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelAnimation {
    pub enable: bool,
    /// Units per second.
    pub speed: RangeValue,
    /// Fraction of velocity lost per second.
    pub decay: RangeValue,
    pub sync: bool,
    /// Maximum number of boundary crossings; `0` is unlimited.
    pub count: RangeValue,
    /// Seconds before the animation starts.
    pub delay: RangeValue,
    pub offset: Option<RangeValue>,
}

impl Default for ChannelAnimation {
    fn default() -> Self {
        Self {
            enable: false,
            speed: RangeValue::Fixed(0.0),
            decay: RangeValue::Fixed(0.0),
            sync: true,
            count: RangeValue::Fixed(0.0),
            delay: RangeValue::Fixed(0.0),
            offset: None,
        }
    }
}
