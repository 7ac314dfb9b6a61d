//! Spawn delay, lifetime and respawn handling.
//!
//! A particle moves through `NotSpawned → Spawning → Alive → Destroyed`.
//! Particles without a spawn delay skip `Spawning`. When a finite lifetime
//! expires the remaining life count is decremented; the particle is either
//! respawned at a random canvas position or destroyed once the count reaches
//! zero. An infinite count (`-1`) never destroys through expiry.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::ParticleOptions,
    math::{random_in_range, CanvasSize, RangeValue},
    particle::Particle,
    timeline::FrameDelta,
    Result,
};

/// Marker for an infinite duration or life count.
pub const INFINITE: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeState {
    NotSpawned,
    Spawning,
    Alive,
    Destroyed,
}

/// Outcome of a single lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeTransition {
    Unchanged,
    /// Still waiting for the spawn delay.
    Waiting,
    /// The spawn delay elapsed this frame.
    Spawned,
    /// The lifetime expired and the particle was relocated.
    Respawned,
    Destroyed,
}

/// Per-particle life data. Times are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Life {
    pub delay: f32,
    pub delay_time: f32,
    /// `-1.0` means infinite.
    pub duration: f32,
    pub time: f32,
    /// Remaining lives; `-1` means infinite.
    pub count: i32,
}

impl Life {
    pub fn is_infinite(&self) -> bool {
        self.duration == INFINITE as f32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeTiming {
    /// Seconds.
    pub value: RangeValue,
    /// Without sync the value is scaled by a random factor per particle.
    pub sync: bool,
}

impl Default for LifeTiming {
    fn default() -> Self {
        Self {
            value: RangeValue::Fixed(0.0),
            sync: false,
        }
    }
}

impl LifeTiming {
    fn roll<R: Rng + ?Sized>(&self, reduce_factor: f32, rng: &mut R) -> f32 {
        if reduce_factor <= 0.0 {
            return 0.0;
        }
        let factor = if self.sync { 1.0 } else { rng.gen::<f32>() };
        self.value.pick(rng) * factor / reduce_factor
    }

    fn load(&mut self, source: &Value) -> Result<()> {
        if let Some(value) = source.get("value") {
            self.value = serde_json::from_value(value.clone())?;
        }
        if let Some(sync) = source.get("sync").and_then(Value::as_bool) {
            self.sync = sync;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeOptions {
    /// Number of lives; `0` or less is infinite.
    pub count: i32,
    pub delay: LifeTiming,
    pub duration: LifeTiming,
}

impl LifeOptions {
    /// Merges a partial JSON object into these options. Missing keys keep
    /// their current value.
    pub fn load(&mut self, source: &Value) -> Result<()> {
        if let Some(count) = source.get("count") {
            if let Some(count) = count.as_i64() {
                self.count = i32::try_from(count)
                    .unwrap_or(if count < 0 { i32::MIN } else { i32::MAX });
            } else if count.as_u64().is_some() {
                self.count = i32::MAX;
            }
        }
        if let Some(delay) = source.get("delay") {
            self.delay.load(delay)?;
        }
        if let Some(duration) = source.get("duration") {
            self.duration.load(duration)?;
        }
        Ok(())
    }

    fn roll_duration<R: Rng + ?Sized>(&self, reduce_factor: f32, rng: &mut R) -> f32 {
        let duration = self.duration.roll(reduce_factor, rng);
        if duration <= 0.0 {
            INFINITE as f32
        } else {
            duration
        }
    }
}

/// Drives [`Life`] for every particle.
#[derive(Debug, Default, Clone)]
pub struct LifeUpdater {
    reduce_factor: f32,
}

impl LifeUpdater {
    pub fn new(reduce_factor: f32) -> Self {
        Self { reduce_factor }
    }

    /// Merges `life` sections from each source into `options`.
    pub fn load_options(&self, options: &mut ParticleOptions, sources: &[Value]) -> Result<()> {
        for source in sources {
            if let Some(life) = source.get("life") {
                options.life.get_or_insert_with(LifeOptions::default).load(life)?;
            }
        }
        Ok(())
    }

    /// Rolls the particle's life from `options`. Without life options the
    /// particle is left untouched.
    pub fn init<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        options: Option<&LifeOptions>,
        rng: &mut R,
    ) {
        let Some(options) = options else {
            return;
        };

        let life = Life {
            delay: options.delay.roll(self.reduce_factor, rng),
            delay_time: 0.0,
            duration: options.roll_duration(self.reduce_factor, rng),
            time: 0.0,
            count: if options.count <= 0 {
                INFINITE
            } else {
                options.count
            },
        };

        particle.spawning = life.delay > 0.0;
        particle.life = Some(life);
    }

    pub fn is_enabled(&self, particle: &Particle) -> bool {
        !particle.destroyed && particle.life.is_some()
    }

    pub fn update<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        delta: &FrameDelta,
        canvas: CanvasSize,
        options: Option<&LifeOptions>,
        rng: &mut R,
    ) -> LifeTransition {
        if !self.is_enabled(particle) {
            return LifeTransition::Unchanged;
        }
        let spawning = particle.spawning;
        let Some(life) = particle.life.as_mut() else {
            return LifeTransition::Unchanged;
        };

        let mut just_spawned = false;
        if spawning {
            life.delay_time += delta.value;
            if life.delay_time < life.delay {
                return LifeTransition::Waiting;
            }
            just_spawned = true;
            life.delay_time = 0.0;
            life.time = 0.0;
            particle.spawning = false;
        }

        let settled = if just_spawned {
            LifeTransition::Spawned
        } else {
            LifeTransition::Unchanged
        };

        if life.is_infinite() {
            return settled;
        }

        if !just_spawned {
            life.time += delta.value;
        }
        if life.time < life.duration {
            return settled;
        }

        life.time = 0.0;
        if life.count > 0 {
            life.count -= 1;
        }
        if life.count == 0 {
            particle.destroy();
            return LifeTransition::Destroyed;
        }

        life.delay_time = 0.0;
        if let Some(options) = options {
            life.delay = options.delay.roll(self.reduce_factor, rng);
            life.duration = options.roll_duration(self.reduce_factor, rng);
        }
        let respawn_delay = life.delay;

        particle.position.x = random_in_range(rng, 0.0, canvas.width);
        particle.position.y = random_in_range(rng, 0.0, canvas.height);
        particle.initial_position = particle.position;
        particle.spawning = respawn_delay > 0.0;

        LifeTransition::Respawned
    }
}
