//! Movement path generators and the random-function table they draw from.

use std::{collections::HashMap, f32::consts::TAU};

use glam::Vec2;
use rand::{rngs::StdRng, Rng};
use serde::{Deserialize, Serialize};

use crate::{
    capability::{FrameEnv, PathGenerator, SetupContext},
    math::{angle_of, from_polar, random_in_range},
    particle::Particle,
    timeline::FrameDelta,
    Result,
};

pub const CURVES_PATH_KEY: &str = "curves";

/// A named source of numbers in `[0, 1)`.
pub type RandomFn = fn(&mut StdRng) -> f32;

fn uniform(rng: &mut StdRng) -> f32 {
    rng.gen()
}

fn triangular(rng: &mut StdRng) -> f32 {
    (rng.gen::<f32>() + rng.gen::<f32>()) / 2.0
}

/// Random functions addressable by name from configuration.
#[derive(Debug, Clone, Default)]
pub struct RandomFnRegistry {
    functions: HashMap<String, RandomFn>,
}

impl RandomFnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `uniform` and `triangular`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("uniform", uniform);
        registry.register("triangular", triangular);
        registry
    }

    /// Registers `function`, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, function: RandomFn) {
        self.functions.insert(name.into(), function);
    }

    pub fn get(&self, name: &str) -> Option<RandomFn> {
        self.functions.get(name).copied()
    }
}

/// Settings read from `move.path.options`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurvesOptions {
    /// Name looked up in the [`RandomFnRegistry`]; uniform when absent.
    pub rnd_func: Option<String>,
    /// Frames for one period of the base harmonic.
    pub period: f32,
    pub nb_harmonics: usize,
    /// Amplitude ratio between consecutive harmonics.
    pub atten_harmonics: f32,
    pub low_value: f32,
    pub high_value: f32,
}

impl Default for CurvesOptions {
    fn default() -> Self {
        Self {
            rnd_func: None,
            period: 100.0,
            nb_harmonics: 2,
            atten_harmonics: 0.8,
            low_value: -0.03,
            high_value: 0.03,
        }
    }
}

#[derive(Debug, Clone)]
struct Harmonic {
    from: f32,
    to: f32,
    amplitude: f32,
    increment: f32,
    phase: f32,
}

/// Smoothed sum of harmonics, each interpolating between random control
/// points and drawing a new one whenever its phase wraps.
#[derive(Debug, Clone)]
pub struct CurvesSignal {
    harmonics: Vec<Harmonic>,
    total_amplitude: f32,
    low: f32,
    high: f32,
    random: RandomFn,
}

impl CurvesSignal {
    pub fn new(options: &CurvesOptions, random: RandomFn, rng: &mut StdRng) -> Self {
        let count = options.nb_harmonics.max(1);
        let period = if options.period > 0.0 {
            options.period
        } else {
            CurvesOptions::default().period
        };

        let mut harmonics = Vec::with_capacity(count);
        let mut amplitude = 1.0;
        for index in 1..=count {
            if index > 1 {
                amplitude *= options.atten_harmonics;
            }
            harmonics.push(Harmonic {
                from: random(rng),
                to: random(rng),
                amplitude,
                increment: index as f32 / period,
                phase: random(rng),
            });
        }
        let total_amplitude = harmonics.iter().map(|h| h.amplitude).sum();

        Self {
            harmonics,
            total_amplitude,
            low: options.low_value,
            high: options.high_value,
            random,
        }
    }

    /// Next sample, scaled into `[low, high]`.
    pub fn next_value(&mut self, rng: &mut StdRng) -> f32 {
        let mut signal = 0.0;
        for harmonic in self.harmonics.iter_mut().rev() {
            harmonic.phase += harmonic.increment;
            if harmonic.phase >= 1.0 {
                harmonic.phase -= 1.0;
                harmonic.from = harmonic.to;
                harmonic.to = (self.random)(rng);
            }
            let pf = harmonic.phase;
            let eased = pf * pf * (3.0 - 2.0 * pf);
            signal += (harmonic.from * (1.0 - eased) + harmonic.to * eased) * harmonic.amplitude;
        }

        if self.total_amplitude == 0.0 {
            return self.low;
        }
        signal / self.total_amplitude * (self.high - self.low) + self.low
    }
}

/// Particle-local state of the curves generator.
#[derive(Debug, Clone)]
pub struct CurvesPathState {
    pub signal: CurvesSignal,
    pub curve_velocity: Option<Vec2>,
}

/// Steers particles along smooth random curves. The particle's own velocity
/// is replaced by the curve velocity, which slowly speeds up and turns by the
/// signal each step.
#[derive(Debug, Clone)]
pub struct CurvesPathGenerator {
    options: CurvesOptions,
    random: RandomFn,
}

impl CurvesPathGenerator {
    pub fn new() -> Self {
        Self {
            options: CurvesOptions::default(),
            random: uniform,
        }
    }

    pub fn options(&self) -> &CurvesOptions {
        &self.options
    }
}

impl Default for CurvesPathGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PathGenerator for CurvesPathGenerator {
    fn init(&mut self, ctx: &mut SetupContext<'_>) -> Result<()> {
        let source = &ctx.options.movement.path.options;
        if !source.is_null() {
            self.options = serde_json::from_value(source.clone())?;
        }

        self.random = match self.options.rnd_func.as_deref() {
            Some(name) => ctx.random_fns.get(name).unwrap_or_else(|| {
                tracing::debug!(name, "unknown random function, using uniform");
                uniform as RandomFn
            }),
            None => uniform,
        };
        tracing::debug!(options = ?self.options, "curves path generator ready");
        Ok(())
    }

    fn generate(&self, particle: &mut Particle, _delta: &FrameDelta, env: &mut FrameEnv<'_>) -> Vec2 {
        let rng = &mut *env.rng;
        let state = particle.attachments.get_or_insert_with(|| CurvesPathState {
            signal: CurvesSignal::new(&self.options, self.random, rng),
            curve_velocity: None,
        });

        let velocity = match state.curve_velocity {
            None => from_polar(random_in_range(rng, 0.8, 1.4), rng.gen::<f32>() * TAU),
            Some(current) => {
                let turn = state.signal.next_value(rng);
                from_polar(current.length() + 0.01, (angle_of(current) + turn) % TAU)
            }
        };
        state.curve_velocity = Some(velocity);

        particle.velocity = Vec2::ZERO;
        velocity
    }

    fn reset(&self, particle: &mut Particle) {
        particle.attachments.remove::<CurvesPathState>();
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use serde_json::json;

    use super::*;
    use crate::{
        assets::AssetStore, config::ParticleOptions, math::CanvasSize, particle::ParticleId,
    };

    fn frame_env<'a>(options: &'a ParticleOptions, rng: &'a mut StdRng) -> FrameEnv<'a> {
        FrameEnv {
            options,
            canvas: CanvasSize::default(),
            pixel_ratio: 1.0,
            reduce_factor: 1.0,
            rng,
        }
    }

    fn constant_half(_rng: &mut StdRng) -> f32 {
        0.5
    }

    #[test]
    fn signal_stays_within_configured_range() {
        let mut rng = StdRng::seed_from_u64(9);
        let options = CurvesOptions {
            period: 7.0,
            nb_harmonics: 3,
            ..Default::default()
        };
        let mut signal = CurvesSignal::new(&options, uniform, &mut rng);

        for _ in 0..500 {
            let value = signal.next_value(&mut rng);
            assert!((-0.03..=0.03).contains(&value), "{value}");
        }
    }

    #[test]
    fn constant_source_yields_midpoint() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut signal = CurvesSignal::new(&CurvesOptions::default(), constant_half, &mut rng);
        assert!(signal.next_value(&mut rng).abs() < 1e-6);
    }

    #[test]
    fn curve_velocity_accelerates_and_replaces_particle_velocity() {
        let options = ParticleOptions::default();
        let mut rng = StdRng::seed_from_u64(3);
        let generator = CurvesPathGenerator::new();
        let mut particle = Particle::new(ParticleId(0), Vec2::ZERO);
        particle.velocity = Vec2::new(4.0, 4.0);

        let delta = FrameDelta::default();
        let first = generator.generate(&mut particle, &delta, &mut frame_env(&options, &mut rng));
        assert!((0.8..1.4).contains(&first.length()));
        assert_eq!(particle.velocity, Vec2::ZERO);

        let second = generator.generate(&mut particle, &delta, &mut frame_env(&options, &mut rng));
        assert!((second.length() - first.length() - 0.01).abs() < 1e-4);
    }

    #[test]
    fn reset_drops_particle_state() {
        let options = ParticleOptions::default();
        let mut rng = StdRng::seed_from_u64(3);
        let generator = CurvesPathGenerator::new();
        let mut particle = Particle::new(ParticleId(0), Vec2::ZERO);

        let delta = FrameDelta::default();
        generator.generate(&mut particle, &delta, &mut frame_env(&options, &mut rng));
        assert!(particle.attachments.contains::<CurvesPathState>());

        generator.reset(&mut particle);
        generator.reset(&mut particle);
        assert!(!particle.attachments.contains::<CurvesPathState>());
    }

    #[test]
    fn init_reads_options_and_resolves_random_fn() {
        let mut options = ParticleOptions::default();
        options.movement.path.options = json!({ "rnd_func": "half", "period": 50, "high_value": 0.1 });
        let mut assets = AssetStore::new();
        let mut random_fns = RandomFnRegistry::with_builtins();
        random_fns.register("half", constant_half);
        let mut rng = StdRng::seed_from_u64(1);
        let mut ctx = SetupContext {
            options: &options,
            canvas: CanvasSize::default(),
            pixel_ratio: 1.0,
            reduce_factor: 1.0,
            assets: &mut assets,
            random_fns: &random_fns,
            rng: &mut rng,
        };

        let mut generator = CurvesPathGenerator::new();
        generator.init(&mut ctx).unwrap();

        assert_eq!(generator.options().period, 50.0);
        assert_eq!(generator.options().high_value, 0.1);
        assert_eq!(generator.options().nb_harmonics, 2);
        assert_eq!((generator.random)(&mut rng), 0.5);
    }

    #[test]
    fn registry_knows_builtins() {
        let registry = RandomFnRegistry::with_builtins();
        let mut rng = StdRng::seed_from_u64(1);
        let value = registry.get("triangular").map(|f| f(&mut rng)).unwrap();
        assert!((0.0..1.0).contains(&value));
        assert!(registry.get("missing").is_none());
    }
}
