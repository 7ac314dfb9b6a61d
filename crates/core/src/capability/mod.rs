//! Contracts for pluggable per-particle behaviour.
//!
//! Each family is a trait with a fixed method set. Concrete handlers are
//! stored as trait objects in a [`CapabilityRegistry`](crate::registry::CapabilityRegistry)
//! and looked up by key; the core never names their concrete types.
//!
//! Methods taking a [`SetupContext`] run at setup boundaries and may fail.
//! Methods taking a [`FrameEnv`] run inside the frame loop and cannot.

use glam::Vec2;
use rand::rngs::StdRng;
use serde_json::Value;

use crate::{
    assets::AssetStore,
    config::ParticleOptions,
    math::{CanvasSize, OutModeDirection},
    out_modes::OutMode,
    particle::Particle,
    paths::RandomFnRegistry,
    render::{DrawData, DrawingSurface},
    timeline::FrameDelta,
    Result,
};

/// Everything a handler may consult while initialising.
pub struct SetupContext<'a> {
    pub options: &'a ParticleOptions,
    pub canvas: CanvasSize,
    pub pixel_ratio: f32,
    pub reduce_factor: f32,
    pub assets: &'a mut AssetStore,
    pub random_fns: &'a RandomFnRegistry,
    pub rng: &'a mut StdRng,
}

/// Per-frame environment shared by updaters, out modes and path generators.
pub struct FrameEnv<'a> {
    pub options: &'a ParticleOptions,
    pub canvas: CanvasSize,
    pub pixel_ratio: f32,
    pub reduce_factor: f32,
    pub rng: &'a mut StdRng,
}

/// Draws a particle's base shape. The surface origin is already translated to
/// the particle position and rotated.
pub trait ShapeDrawer {
    fn init(&mut self, _ctx: &mut SetupContext<'_>) -> Result<()> {
        Ok(())
    }

    fn particle_init(&mut self, _ctx: &mut SetupContext<'_>, _particle: &mut Particle) -> Result<()> {
        Ok(())
    }

    fn draw(&self, surface: &mut dyn DrawingSurface, data: &DrawData<'_>);

    fn after_draw(&self, _surface: &mut dyn DrawingSurface, _data: &DrawData<'_>) {}

    fn particle_destroy(&mut self, _particle: &mut Particle) {}

    /// Releases cached resources. Called once when the container stops.
    fn destroy(&mut self) {}
}

/// Overlay drawn after the shape, independent of it.
pub trait EffectDrawer {
    fn init(&mut self, _ctx: &mut SetupContext<'_>) -> Result<()> {
        Ok(())
    }

    fn particle_init(&mut self, _ctx: &mut SetupContext<'_>, _particle: &mut Particle) -> Result<()> {
        Ok(())
    }

    /// Drawn once per frame after the shape and its after-draw hook.
    fn draw(&self, surface: &mut dyn DrawingSurface, data: &DrawData<'_>);

    fn particle_destroy(&mut self, _particle: &mut Particle) {}

    fn destroy(&mut self) {}
}

/// Boundary policy for one or more [`OutMode`]s.
pub trait OutModeManager {
    /// Modes this manager reacts to; any other mode is a no-op.
    fn modes(&self) -> &[OutMode];

    fn handles(&self, mode: OutMode) -> bool {
        self.modes().contains(&mode)
    }

    fn update(
        &self,
        particle: &mut Particle,
        direction: OutModeDirection,
        delta: &FrameDelta,
        mode: OutMode,
        env: &mut FrameEnv<'_>,
    );
}

/// Produces the velocity contribution of a movement path.
pub trait PathGenerator {
    fn init(&mut self, _ctx: &mut SetupContext<'_>) -> Result<()> {
        Ok(())
    }

    fn generate(&self, particle: &mut Particle, delta: &FrameDelta, env: &mut FrameEnv<'_>) -> Vec2;

    /// Global hook run once per frame before any particle moves.
    fn update(&mut self) {}

    /// Drops particle-local generator state on respawn or destroy.
    fn reset(&self, particle: &mut Particle);
}

/// Per-frame mutation of one slice of particle state.
pub trait ParticleUpdater {
    fn name(&self) -> &str;

    fn init(&mut self, particle: &mut Particle, env: &mut FrameEnv<'_>) -> Result<()>;

    /// Callers must skip `update` when this is false.
    fn is_enabled(&self, particle: &Particle) -> bool;

    fn update(&mut self, particle: &mut Particle, delta: &FrameDelta, env: &mut FrameEnv<'_>);

    /// Merges partial option sources before particles are created.
    fn load_options(&self, _options: &mut ParticleOptions, _sources: &[Value]) -> Result<()> {
        Ok(())
    }
}
